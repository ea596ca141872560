use crate::error::{CiError, Result};
use std::fmt;
use std::str::FromStr;

/// Release type requested for the next version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    Major,
    Minor,
    Patch,
    PreMajor,
    PreMinor,
    PrePatch,
    PreRelease,
}

impl ReleaseType {
    pub const ALL: [ReleaseType; 7] = [
        ReleaseType::Major,
        ReleaseType::Minor,
        ReleaseType::Patch,
        ReleaseType::PreMajor,
        ReleaseType::PreMinor,
        ReleaseType::PrePatch,
        ReleaseType::PreRelease,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Major => "major",
            ReleaseType::Minor => "minor",
            ReleaseType::Patch => "patch",
            ReleaseType::PreMajor => "premajor",
            ReleaseType::PreMinor => "preminor",
            ReleaseType::PrePatch => "prepatch",
            ReleaseType::PreRelease => "prerelease",
        }
    }

    /// Whether the resulting version always carries a pre-release identifier
    pub fn is_prerelease(&self) -> bool {
        matches!(
            self,
            ReleaseType::PreMajor
                | ReleaseType::PreMinor
                | ReleaseType::PrePatch
                | ReleaseType::PreRelease
        )
    }
}

impl FromStr for ReleaseType {
    type Err = CiError;

    fn from_str(s: &str) -> Result<Self> {
        ReleaseType::ALL
            .into_iter()
            .find(|rt| rt.as_str() == s)
            .ok_or_else(|| CiError::UnknownReleaseType(s.to_string()))
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
