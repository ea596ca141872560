use crate::domain::prerelease::{PreRelease, PreReleaseLabel};
use crate::domain::release::ReleaseType;
use crate::error::{CiError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Semantic version `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<PreRelease>,
    pub build: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            pre: None,
            build: None,
        }
    }

    pub fn with_pre(mut self, pre: PreRelease) -> Self {
        self.pre = Some(pre);
        self
    }

    /// Parse a version, tolerating a leading `v`/`V` (e.g., "v1.2.3-beta.1")
    pub fn parse(input: &str) -> Result<Self> {
        let clean = input.trim().trim_start_matches(['v', 'V']);

        let parsed = semver::Version::parse(clean)
            .map_err(|e| CiError::version(format!("Invalid version '{}': {}", input, e)))?;

        let pre = if parsed.pre.is_empty() {
            None
        } else {
            Some(PreRelease::parse(parsed.pre.as_str())?)
        };
        let build = (!parsed.build.is_empty()).then(|| parsed.build.to_string());

        Ok(Version {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            pre,
            build,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// Compute the next version for a release type
    ///
    /// - major/minor/patch: bump the component, reset lower ones, drop pre-release
    /// - premajor/preminor/prepatch: same bump, then append the bare `label`
    /// - prerelease: bump patch + `label` on a release version, increment the
    ///   iteration when labels match, otherwise switch to the bare `label`
    ///
    /// Build metadata never survives a bump.
    ///
    /// # Errors
    /// Fails when the bumped component or iteration would overflow `u64`
    pub fn bump(&self, release: ReleaseType, label: &PreReleaseLabel) -> Result<Self> {
        let bare = || PreRelease::new(label.clone(), None);
        let next_major =
            || -> Result<Version> { Ok(Version::new(increment(self.major, "major")?, 0, 0)) };
        let next_minor = || -> Result<Version> {
            Ok(Version::new(self.major, increment(self.minor, "minor")?, 0))
        };
        let next_patch = || -> Result<Version> {
            Ok(Version::new(
                self.major,
                self.minor,
                increment(self.patch, "patch")?,
            ))
        };

        match release {
            ReleaseType::Major => next_major(),
            ReleaseType::Minor => next_minor(),
            ReleaseType::Patch => next_patch(),
            ReleaseType::PreMajor => Ok(next_major()?.with_pre(bare())),
            ReleaseType::PreMinor => Ok(next_minor()?.with_pre(bare())),
            ReleaseType::PrePatch => Ok(next_patch()?.with_pre(bare())),
            ReleaseType::PreRelease => {
                let core = Version::new(self.major, self.minor, self.patch);
                match &self.pre {
                    None => Ok(next_patch()?.with_pre(bare())),
                    Some(pre) if &pre.label == label => {
                        Ok(core.with_pre(pre.increment_iteration()?))
                    }
                    Some(_) => Ok(core.with_pre(bare())),
                }
            }
        }
    }

    /// Equivalent `semver::Version`, used for precedence
    pub fn to_semver(&self) -> semver::Version {
        let mut v = semver::Version::new(self.major, self.minor, self.patch);
        if let Some(pre) = &self.pre {
            // Components were validated on construction
            v.pre = semver::Prerelease::new(&pre.to_string()).unwrap_or(semver::Prerelease::EMPTY);
        }
        if let Some(build) = &self.build {
            v.build = semver::BuildMetadata::new(build).unwrap_or(semver::BuildMetadata::EMPTY);
        }
        v
    }
}

fn increment(value: u64, component: &str) -> Result<u64> {
    value.checked_add(1).ok_or_else(|| {
        CiError::version(format!(
            "Cannot bump {} version {}: overflows u64",
            component, value
        ))
    })
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_semver()
            .cmp_precedence(&other.to_semver())
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}
