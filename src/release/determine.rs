use crate::boundary::BoundaryWarning;
use crate::config::VersionConfig;
use crate::domain::{PreReleaseLabel, ReleaseType, TagPattern, Version};
use crate::error::Result;
use crate::git::Repository;
use crate::release::version_tags;
use tracing::debug;

/// Where the current version came from
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentVersion {
    /// Passed on the command line
    Explicit(Version),
    /// Latest matching version tag
    Tag { name: String, version: Version },
    /// No version tag exists yet
    Default(Version),
}

impl CurrentVersion {
    pub fn version(&self) -> &Version {
        match self {
            CurrentVersion::Explicit(v) => v,
            CurrentVersion::Tag { version, .. } => version,
            CurrentVersion::Default(v) => v,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            CurrentVersion::Tag { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Result of a version determination
#[derive(Debug, Clone, PartialEq)]
pub struct Determination {
    pub current: CurrentVersion,
    pub release_type: ReleaseType,
    pub label: PreReleaseLabel,
    pub next: Version,
    pub next_tag: String,
}

/// Current version from the latest matching tag, or the configured default
pub fn resolve_current<R: Repository>(
    repo: &R,
    config: &VersionConfig,
) -> Result<(CurrentVersion, Vec<BoundaryWarning>)> {
    let (tags, mut warnings) = version_tags(repo, &config.tag_pattern())?;

    let current = match tags.into_iter().last() {
        Some(latest) => {
            debug!(tag = %latest.name, version = %latest.version, "latest version tag");
            CurrentVersion::Tag {
                name: latest.name,
                version: latest.version,
            }
        }
        None => {
            let default = config.default_version()?;
            warnings.push(BoundaryWarning::NoVersionTag {
                default_version: default.to_string(),
            });
            CurrentVersion::Default(default)
        }
    };

    Ok((current, warnings))
}

/// Next version for `release_type` starting from `current`
pub fn determine_version(
    current: CurrentVersion,
    release_type: ReleaseType,
    label: PreReleaseLabel,
    pattern: &TagPattern,
) -> Result<Determination> {
    let next = current.version().bump(release_type, &label)?;
    let next_tag = pattern.format(&next);
    debug!(
        current = %current.version(),
        %release_type,
        %label,
        %next,
        "determined next version"
    );

    Ok(Determination {
        current,
        release_type,
        label,
        next,
        next_tag,
    })
}
