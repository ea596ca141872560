use crate::ci::CiEnv;
use crate::config::Config;
use crate::domain::mode::{env_key, validate_step_name};
use crate::domain::{ExecutionMode, ModeResolver, ModeSource};
use crate::error::{CiError, Result, EXIT_TIMEOUT};
use crate::steps::StepContext;
use std::fmt;
use std::process::Command;
use tracing::{debug, info};

/// What happened to a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Executed,
    DryRun,
    Passed,
    Skipped,
    Failed(String),
    TimedOut,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Executed => "executed",
            StepStatus::DryRun => "dry-run",
            StepStatus::Passed => "passed",
            StepStatus::Skipped => "skipped",
            StepStatus::Failed(_) => "failed",
            StepStatus::TimedOut => "timeout",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one step
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub context: StepContext,
    pub status: StepStatus,
    /// Lines for the console, in order
    pub messages: Vec<String>,
}

impl StepOutcome {
    pub fn skipped(&self) -> bool {
        self.status == StepStatus::Skipped
    }

    /// Turn failure and timeout statuses into errors
    pub fn into_result(self) -> Result<Self> {
        match &self.status {
            StepStatus::Failed(reason) => Err(CiError::step(format!(
                "{}: {}",
                self.context.name, reason
            ))),
            StepStatus::TimedOut => Err(CiError::Timeout(self.context.name.clone())),
            _ => Ok(self),
        }
    }
}

/// Runs CI steps according to their resolved execution mode
pub struct StepExecutor<'a> {
    env: &'a CiEnv,
    config: &'a Config,
}

impl<'a> StepExecutor<'a> {
    pub fn new(env: &'a CiEnv, config: &'a Config) -> Self {
        StepExecutor { env, config }
    }

    /// Resolve the context for `name` without running anything
    ///
    /// `ENABLE_<NAME>=false` forces [`ExecutionMode::Skip`].
    pub fn context(&self, name: &str) -> Result<StepContext> {
        let name = name.trim();
        validate_step_name(name)?;

        let key = env_key(name);
        if self.env.feature_flag(&key) == Some(false) {
            return Ok(StepContext {
                name: name.to_string(),
                mode: ExecutionMode::Skip,
                source: ModeSource::Variable(format!("ENABLE_{}", key)),
            });
        }

        let resolver = ModeResolver::new(self.env.vars(), self.config.behavior.default_mode);
        let (mode, source) = resolver.resolve(name)?;
        debug!(step = name, %mode, %source, "resolved execution mode");
        Ok(StepContext {
            name: name.to_string(),
            mode,
            source,
        })
    }

    /// Run a step
    ///
    /// # Returns
    /// * `Ok(StepOutcome)` - including failed and timed-out steps; use
    ///   [`StepOutcome::into_result`] to turn those into errors
    /// * `Err` - if the mode is invalid or the command cannot be spawned
    pub fn run(&self, name: &str) -> Result<StepOutcome> {
        let context = self.context(name)?;
        let step = self.config.step(&context.name);
        let display = context.display_name();
        let mut messages = Vec::new();

        let status = match context.mode {
            ExecutionMode::Execute => match &step.command {
                Some(command) => {
                    info!(step = %context.name, command = %command, "running step command");
                    run_command(command, &context)?
                }
                None => {
                    let banner = step.banner.clone().unwrap_or_else(|| display.clone());
                    messages.push(format!("{}...", banner));
                    messages.push(format!("✓ {} stub executed", display));
                    StepStatus::Executed
                }
            },
            ExecutionMode::DryRun => {
                match &step.command {
                    Some(command) => messages.push(format!("[dry-run] Would run: {}", command)),
                    None => messages.push(format!("[dry-run] Would run {} stub", display)),
                }
                StepStatus::DryRun
            }
            ExecutionMode::Pass => {
                messages.push(format!("✓ {} passed (mode: pass)", display));
                StepStatus::Passed
            }
            ExecutionMode::Skip => {
                messages.push(format!("⏭ {} skipped ({})", display, context.source));
                StepStatus::Skipped
            }
            ExecutionMode::Fail => {
                StepStatus::Failed(format!("forced failure ({})", context.source))
            }
            ExecutionMode::Timeout => StepStatus::TimedOut,
        };

        Ok(StepOutcome {
            context,
            status,
            messages,
        })
    }
}

fn run_command(command: &str, context: &StepContext) -> Result<StepStatus> {
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .envs(context.to_env_vars())
        .status()
        .map_err(|e| {
            CiError::step(format!(
                "Failed to execute command for {}: {}",
                context.name, e
            ))
        })?;

    Ok(match status.code() {
        Some(0) => StepStatus::Executed,
        Some(code) if code == i32::from(EXIT_TIMEOUT) => StepStatus::TimedOut,
        Some(code) => StepStatus::Failed(format!("command exited with code {}", code)),
        None => StepStatus::Failed("command terminated by signal".to_string()),
    })
}
