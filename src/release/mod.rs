//! Release state machine: version determination, stability tags and rollbacks
//!
//! Every workflow here works against [`crate::git::Repository`] and returns a
//! plain outcome value; reporting to the console and to GitHub Actions is the
//! caller's job.

pub mod determine;
pub mod rollback;
pub mod stability;

pub use determine::{determine_version, resolve_current, CurrentVersion, Determination};
pub use rollback::{
    check_environment, confirm_rollback, select_target, verify_confirmation, RollbackOutcome,
};
pub use stability::{apply_stability_tag, StabilityOutcome};

use crate::boundary::BoundaryWarning;
use crate::domain::{TagPattern, Version};
use crate::error::{CiError, Result};
use crate::git::Repository;
use git2::Oid;
use tracing::debug;

/// A tag that carries a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    pub name: String,
    pub version: Version,
}

/// All version tags, sorted by ascending precedence
///
/// Tags that start like a version tag (prefix followed by a digit) but do
/// not parse are reported as warnings; other tags are silently ignored.
pub fn version_tags<R: Repository>(
    repo: &R,
    pattern: &TagPattern,
) -> Result<(Vec<VersionTag>, Vec<BoundaryWarning>)> {
    let mut tags = Vec::new();
    let mut warnings = Vec::new();
    let prefix = pattern
        .pattern
        .split_once("{version}")
        .map(|(p, _)| p)
        .unwrap_or_default();

    for name in repo.list_tags()? {
        match pattern.extract(&name)? {
            Some(version) => tags.push(VersionTag { name, version }),
            None => {
                let looks_like_version = name
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
                if looks_like_version {
                    debug!(tag = %name, "skipping unparsable version tag");
                    warnings.push(BoundaryWarning::UnparsableTag {
                        tag: name,
                        reason: "not a valid semantic version".to_string(),
                    });
                }
            }
        }
    }

    tags.sort_by(|a, b| a.version.cmp(&b.version));
    Ok((tags, warnings))
}

/// Commit a release target points at
///
/// `target` is tried as a version (`1.2.3` or `v1.2.3`, formatted through the
/// tag pattern), then as a literal tag name, then as any git revision.
pub fn resolve_target<R: Repository>(
    repo: &R,
    pattern: &TagPattern,
    target: &str,
) -> Result<(Oid, Option<Version>)> {
    let version = Version::parse(target).ok();

    if let Some(version) = &version {
        let tag = pattern.format(version);
        if let Some(oid) = repo.find_tag_oid(&tag)? {
            return Ok((oid, Some(version.clone())));
        }
    }

    if let Some(oid) = repo.find_tag_oid(target)? {
        let tagged = pattern.extract(target)?;
        return Ok((oid, tagged.or(version)));
    }

    match repo.resolve_commit(target) {
        Ok(oid) => Ok((oid, None)),
        Err(_) if version.is_some() => Err(CiError::tag(format!(
            "Version tag '{}' not found",
            version
                .as_ref()
                .map(|v| pattern.format(v))
                .unwrap_or_else(|| target.to_string())
        ))),
        Err(e) => Err(e),
    }
}
