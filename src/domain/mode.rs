//! Execution mode of a CI step and its resolution from the environment
//!
//! Lookup order for a step named `build`, first hit wins:
//! 1. `PIPELINE_SCRIPT_BUILD_BEHAVIOR`
//! 2. `BUILD_MODE`
//! 3. `CI_TEST_MODE`
//! 4. the configured default
//! 5. [`ExecutionMode::Execute`]

use crate::error::{CiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Global override consulted for every step
pub const GLOBAL_MODE_VAR: &str = "CI_TEST_MODE";

/// How a step behaves when invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExecutionMode {
    /// Run the real command (or the stub banner when none is configured)
    #[default]
    Execute,
    /// Print what would run
    DryRun,
    /// Succeed without doing anything
    Pass,
    /// Fail without doing anything
    Fail,
    /// Skip the step
    Skip,
    /// Simulate a timeout (exit code 124)
    Timeout,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Execute => "execute",
            ExecutionMode::DryRun => "dry-run",
            ExecutionMode::Pass => "pass",
            ExecutionMode::Fail => "fail",
            ExecutionMode::Skip => "skip",
            ExecutionMode::Timeout => "timeout",
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = CiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "execute" | "exec" | "run" => Ok(ExecutionMode::Execute),
            "dry-run" | "dry_run" | "dryrun" => Ok(ExecutionMode::DryRun),
            "pass" | "success" => Ok(ExecutionMode::Pass),
            "fail" | "failure" => Ok(ExecutionMode::Fail),
            "skip" => Ok(ExecutionMode::Skip),
            "timeout" => Ok(ExecutionMode::Timeout),
            _ => Err(CiError::config(format!("Unknown execution mode: '{}'", s))),
        }
    }
}

impl TryFrom<String> for ExecutionMode {
    type Error = CiError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ExecutionMode> for String {
    fn from(mode: ExecutionMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resolved mode came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSource {
    Variable(String),
    ConfigDefault,
    BuiltinDefault,
}

impl fmt::Display for ModeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeSource::Variable(name) => write!(f, "${}", name),
            ModeSource::ConfigDefault => write!(f, "config default"),
            ModeSource::BuiltinDefault => write!(f, "built-in default"),
        }
    }
}

/// Resolves step modes from a captured environment
#[derive(Debug, Clone)]
pub struct ModeResolver<'a> {
    vars: &'a HashMap<String, String>,
    default: Option<ExecutionMode>,
}

impl<'a> ModeResolver<'a> {
    pub fn new(vars: &'a HashMap<String, String>, default: Option<ExecutionMode>) -> Self {
        ModeResolver { vars, default }
    }

    /// Environment variable names consulted for a step, highest priority first
    pub fn variable_names(step: &str) -> Vec<String> {
        let key = env_key(step);
        vec![
            format!("PIPELINE_SCRIPT_{}_BEHAVIOR", key),
            format!("{}_MODE", key),
            GLOBAL_MODE_VAR.to_string(),
        ]
    }

    /// Resolve the mode for `step`
    ///
    /// Empty variables are treated as unset. An unrecognised value is an
    /// error rather than a silent fallback.
    pub fn resolve(&self, step: &str) -> Result<(ExecutionMode, ModeSource)> {
        for name in Self::variable_names(step) {
            match self.vars.get(&name).map(|v| v.trim()) {
                Some(value) if !value.is_empty() => {
                    let mode = value.parse().map_err(|_| {
                        CiError::config(format!(
                            "Unknown execution mode '{}' in ${}",
                            value, name
                        ))
                    })?;
                    return Ok((mode, ModeSource::Variable(name)));
                }
                _ => continue,
            }
        }

        Ok(match self.default {
            Some(mode) => (mode, ModeSource::ConfigDefault),
            None => (ExecutionMode::Execute, ModeSource::BuiltinDefault),
        })
    }
}

/// Step name as used in environment variable names: "unit-tests" -> "UNIT_TESTS"
///
/// Anything other than an ASCII letter or digit becomes `_`.
pub fn env_key(step: &str) -> String {
    step.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Reject step names whose variables cannot be told apart from the globals
pub fn validate_step_name(step: &str) -> Result<()> {
    if step.trim().is_empty() {
        return Err(CiError::step("Step name must not be empty"));
    }
    if format!("{}_MODE", env_key(step)) == GLOBAL_MODE_VAR {
        return Err(CiError::step(format!(
            "Step name '{}' collides with ${}",
            step, GLOBAL_MODE_VAR
        )));
    }
    Ok(())
}
