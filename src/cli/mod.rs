//! Command-line interface definition and dispatch

pub mod orchestration;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ci-excellence",
    about = "Release versioning, stability tags, rollbacks and CI step helpers",
    version
)]
pub struct Cli {
    /// Custom configuration file path
    #[arg(short, long, global = true, env = "CI_EXCELLENCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr (overrides CI_EXCELLENCE_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Compute the next version from the latest version tag
    DetermineVersion {
        /// major, minor, patch, premajor, preminor, prepatch or prerelease
        release_type: String,

        /// Pre-release identifier (default from config, usually "alpha")
        prerelease_label: Option<String>,

        /// Start from this version instead of the latest tag
        #[arg(long)]
        current: Option<String>,
    },

    /// Point the stable or unstable tag at a version and force-push it
    ApplyStabilityTag {
        /// stable or unstable
        tag: String,

        /// Version (1.2.3 or v1.2.3) or any git revision
        version: String,

        /// Move the tag locally only
        #[arg(long)]
        no_push: bool,
    },

    /// Roll an environment tag back to an earlier version
    ConfirmRollback {
        /// Environment name, e.g. production
        environment: String,

        /// Version to roll back to (default: the release before stable)
        #[arg(long)]
        target: Option<String>,

        /// Confirmation token: the environment name or ROLLBACK
        #[arg(long)]
        confirm: Option<String>,

        /// Move the tags locally only
        #[arg(long)]
        no_push: bool,
    },

    /// Aggregate job results into an overall pipeline status
    Status {
        /// Job result as name=result (repeatable)
        #[arg(long = "job", value_name = "NAME=RESULT")]
        jobs: Vec<String>,

        /// GitHub `toJSON(needs)` document, or "-" to read it from stdin
        #[arg(long, conflicts_with = "jobs")]
        needs_json: Option<String>,

        /// Exit with an error when the pipeline failed
        #[arg(long)]
        fail_on_failure: bool,
    },

    /// Compose a pipeline notification
    Notify {
        /// success, failure, cancelled or skipped
        #[arg(long)]
        status: String,

        /// Title override
        #[arg(long)]
        title: Option<String>,
    },

    /// Run a CI step in its configured execution mode
    Step {
        /// Step name, e.g. build or unit-tests
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_determine_version() {
        let cli = Cli::parse_from([
            "ci-excellence",
            "determine-version",
            "prerelease",
            "beta",
            "--current",
            "1.2.3",
        ]);
        assert_eq!(
            cli.command,
            Command::DetermineVersion {
                release_type: "prerelease".to_string(),
                prerelease_label: Some("beta".to_string()),
                current: Some("1.2.3".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_status_jobs() {
        let cli = Cli::parse_from([
            "ci-excellence",
            "status",
            "--job",
            "build=success",
            "--job",
            "test=failure",
            "--fail-on-failure",
        ]);
        match cli.command {
            Command::Status {
                jobs,
                needs_json,
                fail_on_failure,
            } => {
                assert_eq!(jobs, vec!["build=success", "test=failure"]);
                assert_eq!(needs_json, None);
                assert!(fail_on_failure);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["ci-excellence", "step", "build", "--verbose"]);
        assert!(cli.verbose);
    }
}
