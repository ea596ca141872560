//! Pre-release identifiers of the form `<word>[.<number>]`
//!
//! `word` is made of ASCII alphanumerics and hyphens and must contain at least
//! one non-digit, so it can never be confused with the numeric iteration.
//! See https://semver.org/#spec-item-9 for the general grammar this narrows.

use crate::error::{CiError, Result};
use std::fmt;
use std::str::FromStr;

/// Validated pre-release label (`alpha`, `beta`, `rc`, `nightly-x`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreReleaseLabel(String);

impl PreReleaseLabel {
    /// Parse and validate a label
    ///
    /// # Returns
    /// * `Ok(PreReleaseLabel)` - Valid label
    /// * `Err` - Empty, purely numeric, or containing anything other than
    ///   `[0-9A-Za-z-]`
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PreReleaseLabel {
    type Err = CiError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(CiError::version("Empty pre-release label"));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(CiError::version(format!(
                "Invalid pre-release label: '{}'",
                s
            )));
        }
        if s.chars().all(|c| c.is_ascii_digit()) {
            return Err(CiError::version(format!(
                "Pre-release label must not be numeric: '{}'",
                s
            )));
        }
        Ok(PreReleaseLabel(s.to_string()))
    }
}

impl Default for PreReleaseLabel {
    fn default() -> Self {
        PreReleaseLabel("alpha".to_string())
    }
}

impl fmt::Display for PreReleaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pre-release identifier with optional iteration number
///
/// # Examples
/// - "alpha" -> PreRelease { label: alpha, iteration: None }
/// - "beta.1" -> PreRelease { label: beta, iteration: Some(1) }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRelease {
    pub label: PreReleaseLabel,
    pub iteration: Option<u64>,
}

impl PreRelease {
    pub fn new(label: PreReleaseLabel, iteration: Option<u64>) -> Self {
        PreRelease { label, iteration }
    }

    /// Parse a pre-release identifier such as "beta" or "rc.2"
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(CiError::version("Empty pre-release identifier"));
        }

        let (label, iteration) = match s.split_once('.') {
            Some((label, number)) => {
                let iteration = number.parse::<u64>().map_err(|_| {
                    CiError::version(format!(
                        "Invalid pre-release identifier '{}': expected <word>[.<number>]",
                        s
                    ))
                })?;
                (label, Some(iteration))
            }
            None => (s, None),
        };

        Ok(PreRelease {
            label: PreReleaseLabel::parse(label)?,
            iteration,
        })
    }

    /// Next iteration of the same label; an absent suffix counts as 0
    pub fn increment_iteration(&self) -> Result<Self> {
        let current = self.iteration.unwrap_or(0);
        let next = current.checked_add(1).ok_or_else(|| {
            CiError::version(format!(
                "Cannot increment pre-release '{}': iteration overflows u64",
                self
            ))
        })?;
        Ok(PreRelease {
            label: self.label.clone(),
            iteration: Some(next),
        })
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if let Some(iter) = self.iteration {
            write!(f, ".{}", iter)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_valid() {
        assert_eq!(PreReleaseLabel::parse("alpha").unwrap().as_str(), "alpha");
        assert_eq!(PreReleaseLabel::parse("rc1").unwrap().as_str(), "rc1");
        assert_eq!(
            PreReleaseLabel::parse("nightly-build").unwrap().as_str(),
            "nightly-build"
        );
    }

    #[test]
    fn test_label_parse_invalid() {
        assert!(PreReleaseLabel::parse("").is_err());
        assert!(PreReleaseLabel::parse("alpha.1").is_err());
        assert!(PreReleaseLabel::parse("bad!label").is_err());
        assert!(PreReleaseLabel::parse("42").is_err());
    }

    #[test]
    fn test_label_default_is_alpha() {
        assert_eq!(PreReleaseLabel::default().to_string(), "alpha");
    }

    #[test]
    fn test_prerelease_parse_with_iteration() {
        let pr = PreRelease::parse("beta.1").unwrap();
        assert_eq!(pr.label.as_str(), "beta");
        assert_eq!(pr.iteration, Some(1));
    }

    #[test]
    fn test_prerelease_parse_no_iteration() {
        let pr = PreRelease::parse("alpha").unwrap();
        assert_eq!(pr.label.as_str(), "alpha");
        assert_eq!(pr.iteration, None);
    }

    #[test]
    fn test_prerelease_parse_rejects_extra_parts() {
        assert!(PreRelease::parse("beta.abc").is_err());
        assert!(PreRelease::parse("beta.1.2").is_err());
        assert!(PreRelease::parse("").is_err());
    }

    #[test]
    fn test_prerelease_increment_from_none() {
        let pr = PreRelease::parse("alpha").unwrap();
        assert_eq!(pr.increment_iteration().unwrap().to_string(), "alpha.1");
    }

    #[test]
    fn test_prerelease_increment_high_number() {
        let pr = PreRelease::parse("rc.99").unwrap();
        assert_eq!(pr.increment_iteration().unwrap().iteration, Some(100));
    }

    #[test]
    fn test_prerelease_increment_overflow() {
        let pr = PreRelease::parse("alpha.18446744073709551615").unwrap();
        let err = pr.increment_iteration().unwrap_err();
        assert!(err.to_string().contains("overflows u64"));
    }

    #[test]
    fn test_prerelease_display() {
        assert_eq!(PreRelease::parse("staging.3").unwrap().to_string(), "staging.3");
        assert_eq!(PreRelease::parse("alpha").unwrap().to_string(), "alpha");
    }
}
