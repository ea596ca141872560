//! Command workflows
//!
//! Each workflow runs one command against its dependencies, prints the
//! human-facing lines and records outputs and summary lines into the
//! [`CiReport`]. Writing the report is left to the caller so it happens once,
//! even when the command fails.

use anyhow::{Context as _, Result};
use chrono::Utc;
use std::io;
use tracing::warn;

use crate::boundary::BoundaryWarning;
use crate::ci::summary::{code, field, markdown_table};
use crate::ci::{CiEnv, CiReport};
use crate::cli::Command;
use crate::config::Config;
use crate::domain::{
    JobResult, JobResults, PipelineStatus, PreReleaseLabel, ReleaseType, StabilityTag, Version,
};
use crate::error::CiError;
use crate::git::{short_oid, Git2Repository, Repository};
use crate::notify::{self, Notification};
use crate::release::{
    apply_stability_tag, check_environment, confirm_rollback, determine_version, resolve_current,
    CurrentVersion, Determination, RollbackOutcome, StabilityOutcome,
};
use crate::steps::{StepExecutor, StepOutcome, StepStatus};
use crate::ui;

/// Everything a command needs from the outside world
pub struct Context<'a> {
    pub env: &'a CiEnv,
    pub config: &'a Config,
    /// Whether prompts may be shown
    pub interactive: bool,
}

impl<'a> Context<'a> {
    pub fn new(env: &'a CiEnv, config: &'a Config) -> Self {
        // CI runners set CI=true; never block on a prompt there
        let interactive = env.get("CI").is_none() && ui::is_interactive();
        Context {
            env,
            config,
            interactive,
        }
    }

    fn open_repo(&self) -> Result<Git2Repository> {
        let repo = Git2Repository::open(".").context("Failed to open git repository")?;
        Ok(repo.with_token(self.env.token().map(String::from)))
    }

    fn push(&self, no_push: bool) -> bool {
        !no_push && self.config.behavior.push
    }
}

/// Run a parsed command
pub fn run(command: &Command, ctx: &Context, report: &mut CiReport) -> Result<()> {
    match command {
        Command::DetermineVersion {
            release_type,
            prerelease_label,
            current,
        } => {
            let release_type: ReleaseType = release_type.parse()?;
            let label = match prerelease_label {
                Some(label) => PreReleaseLabel::parse(label)?,
                None => ctx.config.version.prerelease_label()?,
            };
            let (current, warnings) = match current {
                Some(current) => {
                    let current = CurrentVersion::Explicit(Version::parse(current)?);
                    (current, Vec::new())
                }
                None => resolve_current(&ctx.open_repo()?, &ctx.config.version)?,
            };
            let determination =
                run_determine_version(ctx.config, current, release_type, label, &warnings, report)?;
            println!("{}", determination.next);
        }
        Command::ApplyStabilityTag {
            tag,
            version,
            no_push,
        } => {
            let tag: StabilityTag = tag.parse()?;
            let repo = ctx.open_repo()?;
            run_apply_stability_tag(&repo, ctx.config, tag, version, ctx.push(*no_push), report)?;
        }
        Command::ConfirmRollback {
            environment,
            target,
            confirm,
            no_push,
        } => {
            check_environment(ctx.config, environment)?;
            let confirmation = match confirm {
                Some(token) => Some(token.clone()),
                None => prompt_rollback(ctx, environment)?,
            };
            let repo = ctx.open_repo()?;
            run_confirm_rollback(
                &repo,
                ctx.config,
                environment,
                target.as_deref(),
                confirmation.as_deref(),
                ctx.push(*no_push),
                report,
            )?;
        }
        Command::Status {
            jobs,
            needs_json,
            fail_on_failure,
        } => {
            let results = match needs_json {
                Some(json) => JobResults::from_needs_json(&read_json_arg(json)?)?,
                None => {
                    let mut results = JobResults::new();
                    for pair in jobs {
                        results.insert_pair(pair)?;
                    }
                    results
                }
            };
            let status = run_status(&results, report);
            println!("{}", status);
            if *fail_on_failure && status == PipelineStatus::Failure {
                return Err(CiError::step(format!(
                    "Pipeline failed: {}",
                    results.with_result(JobResult::Failure).join(", ")
                ))
                .into());
            }
        }
        Command::Notify { status, title } => {
            let status: PipelineStatus = status.parse()?;
            run_notify(ctx.env, status, title.as_deref(), report);
        }
        Command::Step { name } => {
            run_step(ctx.env, ctx.config, name, report)?;
        }
    }
    Ok(())
}

/// Compute, display and record the next version
pub fn run_determine_version(
    config: &Config,
    current: CurrentVersion,
    release_type: ReleaseType,
    label: PreReleaseLabel,
    warnings: &[BoundaryWarning],
    report: &mut CiReport,
) -> Result<Determination> {
    report_warnings(warnings, report);
    let determination = determine_version(
        current,
        release_type,
        label,
        &config.version.tag_pattern(),
    )?;
    ui::display_determination(&determination);

    let previous = determination.current.version().to_string();
    report.set_output("version", &determination.next);
    report.set_output("tag", &determination.next_tag);
    report.set_output("previous_version", &previous);
    report.set_output("is_prerelease", determination.next.is_prerelease());
    report.set_output("release_type", determination.release_type);

    report.add_summary("## 🏷️ Version");
    report.add_summary("");
    report.add_summary(field("Current", &code(&previous)));
    report.add_summary(field(
        "Release type",
        &code(determination.release_type.as_str()),
    ));
    report.add_summary(field("Next", &code(&determination.next.to_string())));
    report.add_summary(field("Tag", &code(&determination.next_tag)));

    Ok(determination)
}

/// Move a stability tag and record the outcome
pub fn run_apply_stability_tag<R: Repository>(
    repo: &R,
    config: &Config,
    tag: StabilityTag,
    target: &str,
    push: bool,
    report: &mut CiReport,
) -> Result<StabilityOutcome> {
    let outcome = apply_stability_tag(repo, config, tag, target, push)
        .with_context(|| format!("Failed to apply '{}' to {}", tag, target))?;
    report_warnings(&outcome.warnings, report);
    ui::display_stability(&outcome);

    let previous = outcome.previous.map(|p| p.to_string()).unwrap_or_default();
    report.set_output("stability_tag", &outcome.tag);
    report.set_output("commit", outcome.commit);
    report.set_output("previous_commit", previous);

    report.add_summary(format!("## 🔖 Stability tag `{}`", outcome.tag));
    report.add_summary("");
    report.add_summary(field("Commit", &code(&short_oid(outcome.commit))));
    if let Some(version) = &outcome.version {
        report.add_summary(field("Version", &code(&version.to_string())));
    }
    if let Some(previous) = outcome.previous {
        report.add_summary(field("Previous", &code(&short_oid(previous))));
    }
    report.add_summary(field("Pushed", if outcome.pushed { "yes" } else { "no" }));

    Ok(outcome)
}

/// Perform a confirmed rollback and record the outcome
pub fn run_confirm_rollback<R: Repository>(
    repo: &R,
    config: &Config,
    environment: &str,
    target: Option<&str>,
    confirmation: Option<&str>,
    push: bool,
    report: &mut CiReport,
) -> Result<RollbackOutcome> {
    let outcome = confirm_rollback(
        repo,
        config,
        environment,
        target,
        confirmation,
        push,
        Utc::now(),
    )?;
    report_warnings(&outcome.warnings, report);
    ui::display_rollback(&outcome);

    let version = outcome
        .version
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_default();
    report.set_output("rollback_tag", &outcome.rollback_tag);
    report.set_output("rollback_version", &version);
    report.set_output("rollback_commit", outcome.commit);
    report.set_output("environment", &outcome.environment);

    report.add_summary(format!("## ⏪ Rollback of `{}`", outcome.environment));
    report.add_summary("");
    if !version.is_empty() {
        report.add_summary(field("Version", &code(&version)));
    }
    report.add_summary(field("Commit", &code(&short_oid(outcome.commit))));
    report.add_summary(field("Marker", &code(&outcome.rollback_tag)));

    Ok(outcome)
}

/// Aggregate job results and record the overall status
pub fn run_status(results: &JobResults, report: &mut CiReport) -> PipelineStatus {
    let status = results.overall();
    ui::display_pipeline_status(status, results);

    report.set_output("status", status);
    report.set_output(
        "failed_jobs",
        results.with_result(JobResult::Failure).join(","),
    );

    report.add_summary(format!("## {} Pipeline {}", status.emoji(), status));
    if !results.is_empty() {
        let rows: Vec<Vec<String>> = results
            .iter()
            .map(|(name, result)| vec![name.to_string(), result.to_string()])
            .collect();
        report.add_summary("");
        for line in markdown_table(&["Job", "Result"], &rows) {
            report.add_summary(line);
        }
    }

    status
}

/// Compose a notification and record it
pub fn run_notify(
    env: &CiEnv,
    status: PipelineStatus,
    title: Option<&str>,
    report: &mut CiReport,
) -> Notification {
    let notification = notify::compose(env, status, title);
    ui::display_notification(&notification);

    report.set_output("should_notify", notification.should_notify);
    report.set_output("channels", notification.channel_list());
    report.set_output("title", &notification.title);
    report.set_output("body", &notification.body);

    notification
}

/// Run a step; outputs are recorded before failures are turned into errors
pub fn run_step(
    env: &CiEnv,
    config: &Config,
    name: &str,
    report: &mut CiReport,
) -> Result<StepOutcome> {
    let outcome = StepExecutor::new(env, config).run(name)?;
    ui::display_step(&outcome);

    report.set_output("step", &outcome.context.name);
    report.set_output("mode", outcome.context.mode);
    report.set_output("outcome", &outcome.status);
    if outcome.skipped() {
        report.set_output("skipped", true);
    }
    report.add_summary(format!(
        "- {} `{}`: {} ({})",
        status_icon(&outcome),
        outcome.context.name,
        outcome.status,
        outcome.context.mode
    ));

    Ok(outcome.into_result()?)
}

fn status_icon(outcome: &StepOutcome) -> &'static str {
    match outcome.status {
        StepStatus::Executed | StepStatus::Passed => "✅",
        StepStatus::DryRun => "📝",
        StepStatus::Skipped => "⏭️",
        StepStatus::Failed(_) => "❌",
        StepStatus::TimedOut => "⏱️",
    }
}

fn report_warnings(warnings: &[BoundaryWarning], report: &mut CiReport) {
    for warning in warnings {
        warn!("{}", warning);
        ui::display_boundary_warning(warning);
        report.add_summary(format!("> ⚠️ {}", warning));
    }
}

/// Ask for confirmation on a terminal; `None` when nobody can answer
fn prompt_rollback(ctx: &Context, environment: &str) -> Result<Option<String>> {
    if !ctx.interactive {
        return Ok(None);
    }
    let confirmed = ui::confirm_action(&format!(
        "Roll back '{}'? This force-moves the environment tag",
        environment
    ))?;
    Ok(confirmed.then(|| environment.to_string()))
}

fn read_json_arg(value: &str) -> Result<String> {
    if value == "-" {
        io::read_to_string(io::stdin()).context("Failed to read needs JSON from stdin")
    } else {
        Ok(value.to_string())
    }
}
