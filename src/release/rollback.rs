use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::domain::tag::validate_environment;
use crate::domain::{RollbackTag, Version};
use crate::error::{CiError, Result};
use crate::git::Repository;
use crate::release::{resolve_target, version_tags, VersionTag};
use chrono::{DateTime, Utc};
use git2::Oid;
use tracing::{debug, info, warn};

/// Literal accepted as confirmation for any environment
pub const CONFIRMATION_KEYWORD: &str = "ROLLBACK";

/// Result of a confirmed rollback
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackOutcome {
    pub environment: String,
    pub rollback_tag: String,
    pub commit: Oid,
    pub version: Option<Version>,
    pub previous: Option<Oid>,
    pub pushed: bool,
    pub warnings: Vec<BoundaryWarning>,
}

/// The confirmation token must repeat the environment name or be `ROLLBACK`
pub fn verify_confirmation(environment: &str, token: Option<&str>) -> Result<()> {
    match token.map(str::trim) {
        Some(t) if t == environment || t == CONFIRMATION_KEYWORD => Ok(()),
        Some(t) => Err(CiError::rollback(format!(
            "Confirmation '{}' does not match environment '{}' (type the environment name or {})",
            t, environment, CONFIRMATION_KEYWORD
        ))),
        None => Err(CiError::rollback(format!(
            "Rollback of '{}' requires confirmation",
            environment
        ))),
    }
}

/// Reject environment names that would overwrite a tag this tool manages
///
/// Stability tags and rollback markers share the tag namespace with
/// environments. Version tags cannot collide since environment names never
/// contain a dot.
pub fn check_environment(config: &Config, environment: &str) -> Result<()> {
    validate_environment(environment)?;

    let reserved = |what: &str| -> Result<()> {
        Err(CiError::rollback(format!(
            "Environment '{}' clashes with the {} tag namespace",
            environment, what
        )))
    };
    if environment == config.tags.stable || environment == config.tags.unstable {
        return reserved("stability");
    }
    if environment.starts_with(&format!("{}-", config.tags.rollback_prefix)) {
        return reserved("rollback marker");
    }
    Ok(())
}

/// Highest release version below the one currently marked stable
///
/// The reference is the highest version tag on the stable commit; without a
/// usable stable tag it is the latest version tag. Pre-releases are never
/// picked as automatic targets.
pub fn select_target<R: Repository>(repo: &R, config: &Config) -> Result<VersionTag> {
    let (tags, _) = version_tags(repo, &config.version.tag_pattern())?;

    let stable_commit = repo.find_tag_oid(&config.tags.stable)?;
    let mut on_stable = Vec::new();
    if let Some(commit) = stable_commit {
        for tag in &tags {
            if repo.find_tag_oid(&tag.name)? == Some(commit) {
                on_stable.push(tag);
            }
        }
    }

    let reference = on_stable
        .last()
        .copied()
        .or(tags.last())
        .ok_or_else(|| CiError::rollback("No version tags found to roll back to"))?;
    debug!(reference = %reference.name, "rollback reference version");

    tags.iter()
        .rev()
        .find(|t| !t.version.is_prerelease() && t.version < reference.version)
        .cloned()
        .ok_or_else(|| {
            CiError::rollback(format!(
                "No release version older than {} to roll back to",
                reference.name
            ))
        })
}

/// Roll `environment` back to `target` (or the automatically selected version)
///
/// Creates the `rollback-<timestamp>-<env>` marker at the target commit and
/// force-moves the environment tag there. `confirmation` is checked before
/// anything is touched; if the environment tag cannot be moved the marker is
/// removed again.
pub fn confirm_rollback<R: Repository>(
    repo: &R,
    config: &Config,
    environment: &str,
    target: Option<&str>,
    confirmation: Option<&str>,
    push: bool,
    now: DateTime<Utc>,
) -> Result<RollbackOutcome> {
    check_environment(config, environment)?;
    verify_confirmation(environment, confirmation)?;

    let (commit, version) = match target {
        Some(target) => resolve_target(repo, &config.version.tag_pattern(), target)?,
        None => {
            let selected = select_target(repo, config)?;
            let commit = repo.find_tag_oid(&selected.name)?.ok_or_else(|| {
                CiError::rollback(format!("Tag '{}' disappeared", selected.name))
            })?;
            (commit, Some(selected.version))
        }
    };

    let marker = RollbackTag::new(&config.tags.rollback_prefix, now, environment).name();
    repo.create_tag(&marker, commit)?;
    let previous = match repo.move_tag(environment, commit) {
        Ok(previous) => previous,
        Err(e) => {
            if let Err(cleanup) = repo.delete_tag(&marker) {
                warn!(marker = %marker, error = %cleanup, "failed to remove rollback marker");
            }
            return Err(e);
        }
    };
    info!(%environment, %commit, marker = %marker, "rolled back environment");

    let mut warnings = Vec::new();
    if let Some(previous) = previous.filter(|p| *p != commit) {
        warnings.push(BoundaryWarning::TagMoved {
            tag: environment.to_string(),
            from_commit: previous.to_string(),
            to_commit: commit.to_string(),
        });
    }

    let pushed = if push {
        let remote = &config.tags.remote;
        if repo.has_remote(remote)? {
            repo.push_tags(remote, &[marker.as_str(), environment], true)?;
            true
        } else {
            warnings.push(BoundaryWarning::RemoteMissing {
                remote: remote.clone(),
            });
            false
        }
    } else {
        false
    };

    Ok(RollbackOutcome {
        environment: environment.to_string(),
        rollback_tag: marker,
        commit,
        version,
        previous,
        pushed,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()
    }

    fn repo() -> MockRepository {
        let mut repo = MockRepository::new();
        repo.add_tag("v1.0.0", MockRepository::oid(1));
        repo.add_tag("v1.1.0", MockRepository::oid(2));
        repo.add_tag("v1.2.0-rc.1", MockRepository::oid(3));
        repo.add_tag("v1.2.0", MockRepository::oid(4));
        repo.add_tag("v1.3.0-alpha", MockRepository::oid(5));
        repo.add_remote("origin");
        repo
    }

    #[test]
    fn test_verify_confirmation() {
        assert!(verify_confirmation("production", Some("production")).is_ok());
        assert!(verify_confirmation("production", Some("ROLLBACK")).is_ok());
        assert!(verify_confirmation("production", Some("staging")).is_err());
        assert!(verify_confirmation("production", Some("rollback")).is_err());
        assert!(verify_confirmation("production", None).is_err());
    }

    #[test]
    fn test_select_target_below_stable() {
        let mut repo = repo();
        repo.add_tag("stable", MockRepository::oid(4));

        let target = select_target(&repo, &Config::default()).unwrap();
        assert_eq!(target.name, "v1.1.0");
    }

    #[test]
    fn test_select_target_without_stable_uses_latest() {
        // latest is v1.3.0-alpha, so the newest release below it is v1.2.0
        let target = select_target(&repo(), &Config::default()).unwrap();
        assert_eq!(target.name, "v1.2.0");
    }

    #[test]
    fn test_select_target_nothing_older() {
        let mut repo = MockRepository::new();
        repo.add_tag("v1.0.0", MockRepository::oid(1));
        repo.add_tag("stable", MockRepository::oid(1));
        assert!(select_target(&repo, &Config::default()).is_err());
        assert!(select_target(&MockRepository::new(), &Config::default()).is_err());
    }

    #[test]
    fn test_confirm_rollback_automatic_target() {
        let mut repo = repo();
        repo.add_tag("stable", MockRepository::oid(4));
        repo.add_tag("production", MockRepository::oid(4));

        let outcome = confirm_rollback(
            &repo,
            &Config::default(),
            "production",
            None,
            Some("production"),
            true,
            now(),
        )
        .unwrap();

        assert_eq!(outcome.rollback_tag, "rollback-20240601-123000-production");
        assert_eq!(outcome.version, Some(Version::new(1, 1, 0)));
        assert_eq!(repo.tag_target("production"), Some(MockRepository::oid(2)));
        assert_eq!(
            repo.tag_target("rollback-20240601-123000-production"),
            Some(MockRepository::oid(2))
        );
        assert_eq!(outcome.previous, Some(MockRepository::oid(4)));
        assert!(outcome.pushed);
        assert_eq!(
            repo.pushes()[0].tags,
            vec!["rollback-20240601-123000-production", "production"]
        );
    }

    #[test]
    fn test_confirm_rollback_explicit_target() {
        let repo = repo();
        let outcome = confirm_rollback(
            &repo,
            &Config::default(),
            "staging",
            Some("1.0.0"),
            Some("ROLLBACK"),
            false,
            now(),
        )
        .unwrap();

        assert_eq!(outcome.commit, MockRepository::oid(1));
        assert!(!outcome.pushed);
        assert!(repo.pushes().is_empty());
    }

    #[test]
    fn test_unconfirmed_rollback_touches_nothing() {
        let repo = repo();
        let result = confirm_rollback(
            &repo,
            &Config::default(),
            "production",
            Some("1.0.0"),
            Some("nope"),
            true,
            now(),
        );

        assert!(result.is_err());
        assert_eq!(repo.tag_target("production"), None);
        assert_eq!(repo.list_tags().unwrap().len(), 5);
    }

    #[test]
    fn test_invalid_environment() {
        let result = confirm_rollback(
            &repo(),
            &Config::default(),
            "prod/eu",
            None,
            Some("prod/eu"),
            false,
            now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reserved_environment_names() {
        let config = Config::default();
        assert!(check_environment(&config, "production").is_ok());
        assert!(check_environment(&config, "stable").is_err());
        assert!(check_environment(&config, "unstable").is_err());
        assert!(check_environment(&config, "rollback-20240601-123000-prod").is_err());
        assert!(check_environment(&config, "v1-2-3").is_ok());
        // Only "-" and "_" are allowed, so dotted versions fail validation first
        assert!(check_environment(&config, "v1.2.3").is_err());
    }

    #[test]
    fn test_rollback_of_stability_tag_is_refused() {
        let mut repo = MockRepository::new();
        repo.add_tag("v1.0.0", MockRepository::oid(1));
        repo.add_tag("v1.1.0", MockRepository::oid(2));
        repo.add_tag("stable", MockRepository::oid(2));

        let result = confirm_rollback(
            &repo,
            &Config::default(),
            "stable",
            None,
            Some("stable"),
            false,
            now(),
        );

        assert!(result.is_err());
        assert_eq!(repo.tag_target("stable"), Some(MockRepository::oid(2)));
        assert_eq!(repo.list_tags().unwrap().len(), 3);
    }

    #[test]
    fn test_configured_stability_names_are_reserved() {
        let mut config = Config::default();
        config.tags.stable = "prod-stable".to_string();
        config.tags.rollback_prefix = "rb".to_string();

        assert!(check_environment(&config, "prod-stable").is_err());
        assert!(check_environment(&config, "stable").is_ok());
        assert!(check_environment(&config, "rb-staging").is_err());
        assert!(check_environment(&config, "rollback-staging").is_ok());
    }

    #[test]
    fn test_failed_move_removes_marker() {
        let mut repo = repo();
        repo.fail_moves();

        let result = confirm_rollback(
            &repo,
            &Config::default(),
            "production",
            Some("1.0.0"),
            Some("ROLLBACK"),
            true,
            now(),
        );

        assert!(result.is_err());
        assert_eq!(repo.tag_target("rollback-20240601-123000-production"), None);
        assert_eq!(repo.list_tags().unwrap().len(), 5);
        assert!(repo.pushes().is_empty());
    }
}
