//! Pure formatting functions for UI output.
//!
//! Human-facing lines go to stderr so stdout only carries command results
//! (the computed version, the pipeline status).

use crate::boundary::BoundaryWarning;
use crate::domain::{JobResult, JobResults, PipelineStatus};
use crate::git::short_oid;
use crate::notify::Notification;
use crate::release::{CurrentVersion, Determination, RollbackOutcome, StabilityOutcome};
use crate::steps::StepOutcome;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Where the current version came from, e.g. "1.2.3 (tag v1.2.3)"
pub fn describe_current(current: &CurrentVersion) -> String {
    match current {
        CurrentVersion::Explicit(v) => format!("{} (given)", v),
        CurrentVersion::Tag { name, version } => format!("{} (tag {})", version, name),
        CurrentVersion::Default(v) => format!("{} (default)", v),
    }
}

pub fn display_determination(determination: &Determination) {
    display_status(&format!(
        "Current version: {}",
        describe_current(&determination.current)
    ));
    display_success(&format!(
        "Next {} version: {} (tag {})",
        determination.release_type, determination.next, determination.next_tag
    ));
}

pub fn display_stability(outcome: &StabilityOutcome) {
    let version = outcome
        .version
        .as_ref()
        .map(|v| format!(" ({})", v))
        .unwrap_or_default();
    display_success(&format!(
        "Tagged {} as {}{}",
        short_oid(outcome.commit),
        style(&outcome.tag).bold(),
        version
    ));
    if !outcome.pushed {
        display_status(&format!("Tag '{}' was not pushed", outcome.tag));
    }
}

pub fn display_rollback(outcome: &RollbackOutcome) {
    let target = outcome
        .version
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| short_oid(outcome.commit));
    display_success(&format!(
        "Rolled back {} to {}",
        style(&outcome.environment).bold(),
        target
    ));
    display_status(&format!("Rollback marker: {}", outcome.rollback_tag));
    if !outcome.pushed {
        display_status("Tags were not pushed");
    }
}

pub fn display_pipeline_status(status: PipelineStatus, jobs: &JobResults) {
    for (name, result) in jobs.iter() {
        let marker = match result {
            JobResult::Success => style("✓").green(),
            JobResult::Failure => style("✗").red(),
            JobResult::Cancelled => style("⊘").yellow(),
            JobResult::Skipped => style("-").dim(),
        };
        eprintln!("  {} {} ({})", marker, name, result);
    }
    display_status(&format!("Pipeline status: {} {}", status.emoji(), status));
}

pub fn display_notification(notification: &Notification) {
    if notification.should_notify {
        display_success(&format!(
            "Notification ready for {}",
            notification.channel_list()
        ));
    } else {
        display_status("Notifications disabled or no channel configured");
    }
    eprintln!("{}", style(&notification.title).bold());
    for line in notification.body.lines() {
        eprintln!("  {}", line);
    }
}

/// Step messages are the step's own output and go to stdout
pub fn display_step(outcome: &StepOutcome) {
    for message in &outcome.messages {
        println!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Version;

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }

    #[test]
    fn test_display_success() {
        // Visual verification test - output is printed to stderr
        display_success("test success");
    }

    #[test]
    fn test_describe_current() {
        let tagged = CurrentVersion::Tag {
            name: "v1.2.3".to_string(),
            version: Version::new(1, 2, 3),
        };
        assert_eq!(describe_current(&tagged), "1.2.3 (tag v1.2.3)");
        assert_eq!(
            describe_current(&CurrentVersion::Explicit(Version::new(2, 0, 0))),
            "2.0.0 (given)"
        );
    }
}
