use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::domain::{StabilityTag, Version};
use crate::error::Result;
use crate::git::Repository;
use crate::release::resolve_target;
use git2::Oid;
use tracing::{info, warn};

/// Result of moving a stability tag
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityOutcome {
    pub tag: String,
    pub commit: Oid,
    pub version: Option<Version>,
    pub previous: Option<Oid>,
    pub pushed: bool,
    pub warnings: Vec<BoundaryWarning>,
}

fn tag_name(config: &Config, tag: StabilityTag) -> &str {
    match tag {
        StabilityTag::Stable => &config.tags.stable,
        StabilityTag::Unstable => &config.tags.unstable,
    }
}

/// Point `stable`/`unstable` at the commit of `target` and force-push it
///
/// The move is last writer wins: whatever the tag pointed at before is
/// replaced without further checks, and only reported back.
pub fn apply_stability_tag<R: Repository>(
    repo: &R,
    config: &Config,
    tag: StabilityTag,
    target: &str,
    push: bool,
) -> Result<StabilityOutcome> {
    let name = tag_name(config, tag).to_string();
    let (commit, version) = resolve_target(repo, &config.version.tag_pattern(), target)?;

    let previous = repo.move_tag(&name, commit)?;
    info!(tag = %name, %commit, "applied stability tag");

    let mut warnings = Vec::new();
    if let Some(previous) = previous.filter(|p| *p != commit) {
        warnings.push(BoundaryWarning::TagMoved {
            tag: name.clone(),
            from_commit: previous.to_string(),
            to_commit: commit.to_string(),
        });
    }

    let other = tag_name(config, tag.opposite());
    if repo.find_tag_oid(other)? == Some(commit) {
        warn!(tag = %name, other, "stability tags share a commit");
        warnings.push(BoundaryWarning::StabilityConflict {
            tag: name.clone(),
            other: other.to_string(),
            commit: commit.to_string(),
        });
    }

    let pushed = if push {
        let remote = &config.tags.remote;
        if repo.has_remote(remote)? {
            repo.push_tags(remote, &[name.as_str()], true)?;
            info!(tag = %name, remote = %remote, "force-pushed stability tag");
            true
        } else {
            warnings.push(BoundaryWarning::RemoteMissing {
                remote: remote.clone(),
            });
            false
        }
    } else {
        false
    };

    Ok(StabilityOutcome {
        tag: name,
        commit,
        version,
        previous,
        pushed,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    fn repo() -> MockRepository {
        let mut repo = MockRepository::new();
        repo.add_tag("v1.2.3", MockRepository::oid(1));
        repo.add_tag("v1.3.0", MockRepository::oid(2));
        repo.add_remote("origin");
        repo
    }

    #[test]
    fn test_apply_stable_points_at_version_commit() {
        let repo = repo();
        let outcome =
            apply_stability_tag(&repo, &Config::default(), StabilityTag::Stable, "v1.2.3", true)
                .unwrap();

        assert_eq!(repo.tag_target("stable"), repo.tag_target("v1.2.3"));
        assert_eq!(outcome.version, Some(Version::new(1, 2, 3)));
        assert_eq!(outcome.previous, None);
        assert!(outcome.pushed);
        assert_eq!(repo.pushes()[0].tags, vec!["stable".to_string()]);
        assert!(repo.pushes()[0].force);
    }

    #[test]
    fn test_apply_accepts_bare_version() {
        let repo = repo();
        apply_stability_tag(&repo, &Config::default(), StabilityTag::Unstable, "1.3.0", false)
            .unwrap();
        assert_eq!(repo.tag_target("unstable"), Some(MockRepository::oid(2)));
        assert!(repo.pushes().is_empty());
    }

    #[test]
    fn test_move_reports_previous_target() {
        let mut repo = repo();
        repo.add_tag("stable", MockRepository::oid(2));

        let outcome =
            apply_stability_tag(&repo, &Config::default(), StabilityTag::Stable, "1.2.3", false)
                .unwrap();

        assert_eq!(outcome.previous, Some(MockRepository::oid(2)));
        assert!(matches!(
            outcome.warnings.as_slice(),
            [BoundaryWarning::TagMoved { .. }]
        ));
    }

    #[test]
    fn test_conflict_with_opposite_tag() {
        let mut repo = repo();
        repo.add_tag("unstable", MockRepository::oid(1));

        let outcome =
            apply_stability_tag(&repo, &Config::default(), StabilityTag::Stable, "1.2.3", false)
                .unwrap();

        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, BoundaryWarning::StabilityConflict { .. })));
    }

    #[test]
    fn test_missing_remote_skips_push() {
        let mut repo = MockRepository::new();
        repo.add_tag("v1.2.3", MockRepository::oid(1));

        let outcome =
            apply_stability_tag(&repo, &Config::default(), StabilityTag::Stable, "1.2.3", true)
                .unwrap();

        assert!(!outcome.pushed);
        assert_eq!(
            outcome.warnings,
            vec![BoundaryWarning::RemoteMissing {
                remote: "origin".to_string()
            }]
        );
    }

    #[test]
    fn test_push_failure_propagates() {
        let mut repo = repo();
        repo.fail_pushes();
        assert!(
            apply_stability_tag(&repo, &Config::default(), StabilityTag::Stable, "1.2.3", true)
                .is_err()
        );
    }

    #[test]
    fn test_unknown_target() {
        let repo = repo();
        assert!(
            apply_stability_tag(&repo, &Config::default(), StabilityTag::Stable, "9.9.9", false)
                .is_err()
        );
    }
}
