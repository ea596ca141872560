use crate::domain::{ExecutionMode, PreReleaseLabel, TagPattern, Version};
use crate::error::{CiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "ci-excellence.toml";

/// Represents the complete configuration for ci-excellence.
///
/// Contains version calculation settings, tag names, behavior options and
/// per-step commands.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub version: VersionConfig,

    #[serde(default)]
    pub tags: TagsConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,

    #[serde(default)]
    pub steps: BTreeMap<String, StepConfig>,
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

fn default_version() -> String {
    "0.0.1-alpha".to_string()
}

fn default_prerelease_label() -> String {
    "alpha".to_string()
}

/// Settings for version determination.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VersionConfig {
    /// Prefix of version tags ("v" -> "v1.2.3")
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Version assumed when no version tag exists yet
    #[serde(default = "default_version")]
    pub default_version: String,

    /// Label used when none is passed on the command line
    #[serde(default = "default_prerelease_label")]
    pub prerelease_label: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        VersionConfig {
            tag_prefix: default_tag_prefix(),
            default_version: default_version(),
            prerelease_label: default_prerelease_label(),
        }
    }
}

impl VersionConfig {
    pub fn tag_pattern(&self) -> TagPattern {
        TagPattern::from_prefix(&self.tag_prefix)
    }

    /// Parsed default version; malformed values fail fast
    pub fn default_version(&self) -> Result<Version> {
        Version::parse(&self.default_version).map_err(|e| {
            CiError::config(format!(
                "Invalid version.default_version '{}': {}",
                self.default_version, e
            ))
        })
    }

    pub fn prerelease_label(&self) -> Result<PreReleaseLabel> {
        PreReleaseLabel::parse(&self.prerelease_label)
    }
}

fn default_stable_tag() -> String {
    "stable".to_string()
}

fn default_unstable_tag() -> String {
    "unstable".to_string()
}

fn default_rollback_prefix() -> String {
    "rollback".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

/// Names of the movable marker tags and the remote they are pushed to.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TagsConfig {
    #[serde(default = "default_stable_tag")]
    pub stable: String,

    #[serde(default = "default_unstable_tag")]
    pub unstable: String,

    #[serde(default = "default_rollback_prefix")]
    pub rollback_prefix: String,

    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for TagsConfig {
    fn default() -> Self {
        TagsConfig {
            stable: default_stable_tag(),
            unstable: default_unstable_tag(),
            rollback_prefix: default_rollback_prefix(),
            remote: default_remote(),
        }
    }
}

fn default_push() -> bool {
    true
}

/// Configuration for behavior customization.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BehaviorConfig {
    /// Mode used when no environment variable selects one
    #[serde(default)]
    pub default_mode: Option<ExecutionMode>,

    /// Push tags after moving them
    #[serde(default = "default_push")]
    pub push: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            default_mode: None,
            push: default_push(),
        }
    }
}

/// A single CI step.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct StepConfig {
    /// Shell command run in execute mode; the stub banner is printed without one
    #[serde(default)]
    pub command: Option<String>,

    /// Banner text, e.g. "Compiling/Building Project"
    #[serde(default)]
    pub banner: Option<String>,
}

impl Config {
    pub fn step(&self, name: &str) -> StepConfig {
        self.steps.get(name).cloned().unwrap_or_default()
    }

    /// Validate values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        self.version.default_version()?;
        self.version.prerelease_label()?;
        if self.tags.stable == self.tags.unstable {
            return Err(CiError::config(format!(
                "tags.stable and tags.unstable must differ (both '{}')",
                self.tags.stable
            )));
        }
        if self.tags.rollback_prefix.is_empty() {
            return Err(CiError::config("tags.rollback_prefix must not be empty"));
        }
        Ok(())
    }
}

/// Location of the configuration file, if any.
///
/// Search order:
/// 1. Custom path provided as parameter (must exist)
/// 2. `ci-excellence.toml` in current directory
/// 3. `<config dir>/ci-excellence/config.toml`
pub fn find_config(config_path: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = config_path {
        if !path.exists() {
            return Err(CiError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    Ok(dirs::config_dir()
        .map(|dir| dir.join("ci-excellence").join("config.toml"))
        .filter(|path| path.exists()))
}

/// Loads configuration from file or returns defaults.
///
/// # Returns
/// * `Ok(Config)` - Loaded and validated, or default configuration
/// * `Err` - If a file exists but cannot be read, parsed, or validated
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = match find_config(config_path)? {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            parse_config(&fs::read_to_string(&path)?)?
        }
        None => {
            debug!("no configuration file found, using defaults");
            Config::default()
        }
    };

    config.validate()?;
    Ok(config)
}

/// Parse configuration from TOML text
pub fn parse_config(text: &str) -> Result<Config> {
    toml::from_str(text).map_err(|e| CiError::config(e.to_string()))
}
