use crate::domain::version::Version;
use crate::error::{CiError, Result};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

/// Timestamp layout embedded in rollback tags
pub const ROLLBACK_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Version tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone)]
pub struct TagPattern {
    pub pattern: String,
}

impl TagPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        TagPattern {
            pattern: pattern.into(),
        }
    }

    /// Pattern for a plain prefix: "v" -> "v{version}"
    pub fn from_prefix(prefix: &str) -> Self {
        TagPattern::new(format!("{}{{version}}", prefix))
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version=1.2.3 -> "v1.2.3"
    pub fn format(&self, version: &Version) -> String {
        self.pattern.replace("{version}", &version.to_string())
    }

    /// Extract the version from a tag matching this pattern
    ///
    /// Returns `Ok(None)` for tags that do not match the pattern or whose
    /// version part does not parse.
    pub fn extract(&self, tag: &str) -> Result<Option<Version>> {
        let Some((prefix, suffix)) = self.pattern.split_once("{version}") else {
            return Err(CiError::tag("Pattern must contain {version} placeholder"));
        };

        let version_part = tag
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix));

        Ok(version_part
            .filter(|v| v.starts_with(|c: char| c.is_ascii_digit()))
            .and_then(|v| Version::parse(v).ok()))
    }

    /// Whether a tag matches this pattern with a parsable version
    pub fn matches(&self, tag: &str) -> Result<bool> {
        Ok(self.extract(tag)?.is_some())
    }
}

/// Movable tag describing deployment confidence in a version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityTag {
    Stable,
    Unstable,
}

impl StabilityTag {
    pub fn opposite(&self) -> Self {
        match self {
            StabilityTag::Stable => StabilityTag::Unstable,
            StabilityTag::Unstable => StabilityTag::Stable,
        }
    }
}

impl FromStr for StabilityTag {
    type Err = CiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stable" => Ok(StabilityTag::Stable),
            "unstable" => Ok(StabilityTag::Unstable),
            other => Err(CiError::tag(format!(
                "Invalid stability tag '{}': expected 'stable' or 'unstable'",
                other
            ))),
        }
    }
}

impl fmt::Display for StabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StabilityTag::Stable => write!(f, "stable"),
            StabilityTag::Unstable => write!(f, "unstable"),
        }
    }
}

/// Marker tag recording a rollback: `<prefix>-<YYYYMMDD-HHMMSS>-<environment>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackTag {
    pub prefix: String,
    pub timestamp: NaiveDateTime,
    pub environment: String,
}

impl RollbackTag {
    pub fn new(
        prefix: impl Into<String>,
        at: DateTime<Utc>,
        environment: impl Into<String>,
    ) -> Self {
        RollbackTag {
            prefix: prefix.into(),
            // Tag names only carry second precision
            timestamp: at
                .naive_utc()
                .with_nanosecond(0)
                .unwrap_or_else(|| at.naive_utc()),
            environment: environment.into(),
        }
    }

    pub fn name(&self) -> String {
        format!(
            "{}-{}-{}",
            self.prefix,
            self.timestamp.format(ROLLBACK_TIMESTAMP_FORMAT),
            self.environment
        )
    }

    /// Parse a rollback tag name produced by [`RollbackTag::name`]
    pub fn parse(prefix: &str, tag: &str) -> Result<Self> {
        let pattern = format!(r"^{}-(\d{{8}}-\d{{6}})-(.+)$", regex::escape(prefix));
        let re = regex::Regex::new(&pattern)
            .map_err(|e| CiError::tag(format!("Invalid rollback prefix '{}': {}", prefix, e)))?;

        let captures = re
            .captures(tag)
            .ok_or_else(|| CiError::tag(format!("Not a rollback tag: '{}'", tag)))?;

        let timestamp =
            NaiveDateTime::parse_from_str(&captures[1], ROLLBACK_TIMESTAMP_FORMAT).map_err(
                |e| CiError::tag(format!("Invalid rollback timestamp in '{}': {}", tag, e)),
            )?;

        Ok(RollbackTag {
            prefix: prefix.to_string(),
            timestamp,
            environment: captures[2].to_string(),
        })
    }
}

impl fmt::Display for RollbackTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Validate an environment name used as a tag
pub fn validate_environment(environment: &str) -> Result<()> {
    let valid = !environment.is_empty()
        && environment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CiError::tag(format!(
            "Invalid environment name '{}'",
            environment
        )))
    }
}
