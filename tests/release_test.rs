// tests/release_test.rs
//
// Release workflows against real repositories created with git2.

use chrono::{TimeZone, Utc};
use ci_excellence::boundary::BoundaryWarning;
use ci_excellence::config::Config;
use ci_excellence::domain::StabilityTag;
use ci_excellence::git::{Git2Repository, Repository};
use ci_excellence::release::{apply_stability_tag, confirm_rollback, resolve_current};
use git2::{Oid, Repository as Git2Repo, Signature};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    path: std::path::PathBuf,
    commits: Vec<Oid>,
}

/// Repository with `count` linear commits
fn fixture(count: usize) -> Fixture {
    let dir = TempDir::new().unwrap();
    let repo = Git2Repo::init(dir.path()).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();

    let mut commits: Vec<Oid> = Vec::new();
    for i in 0..count {
        let tree = repo.find_tree(tree_id).unwrap();
        let parents: Vec<git2::Commit> = commits
            .last()
            .map(|oid| vec![repo.find_commit(*oid).unwrap()])
            .unwrap_or_default();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        let oid = repo
            .commit(
                Some("HEAD"),
                &sig,
                &sig,
                &format!("commit {}", i),
                &tree,
                &parent_refs,
            )
            .unwrap();
        commits.push(oid);
    }

    Fixture {
        path: dir.path().to_path_buf(),
        _dir: dir,
        commits,
    }
}

impl Fixture {
    fn git2(&self) -> Git2Repo {
        Git2Repo::open(&self.path).unwrap()
    }

    fn repo(&self) -> Git2Repository {
        Git2Repository::open(&self.path).unwrap()
    }

    fn tag(&self, name: &str, commit: usize) {
        let repo = self.git2();
        let object = repo.find_object(self.commits[commit], None).unwrap();
        repo.tag_lightweight(name, &object, false).unwrap();
    }

    fn annotated_tag(&self, name: &str, commit: usize) {
        let repo = self.git2();
        let object = repo.find_object(self.commits[commit], None).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        repo.tag(name, &object, &sig, "release", false).unwrap();
    }

    fn peeled(&self, name: &str) -> Oid {
        self.git2()
            .revparse_single(&format!("refs/tags/{}", name))
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .id()
    }

    /// Add a bare repository as `origin`
    fn bare_origin(&self) -> TempDir {
        let remote = TempDir::new().unwrap();
        Git2Repo::init_bare(remote.path()).unwrap();
        self.git2()
            .remote("origin", remote.path().to_str().unwrap())
            .unwrap();
        remote
    }
}

#[test]
fn test_stable_points_at_version_commit() {
    let fx = fixture(3);
    fx.tag("v1.2.2", 0);
    fx.tag("v1.2.3", 1);

    let outcome = apply_stability_tag(
        &fx.repo(),
        &Config::default(),
        StabilityTag::Stable,
        "v1.2.3",
        false,
    )
    .unwrap();

    assert_eq!(fx.peeled("stable"), fx.peeled("v1.2.3"));
    assert_eq!(outcome.commit, fx.commits[1]);
    assert!(!outcome.pushed);
}

#[test]
fn test_stable_on_annotated_tag_points_at_commit() {
    let fx = fixture(2);
    fx.annotated_tag("v2.0.0", 1);

    apply_stability_tag(
        &fx.repo(),
        &Config::default(),
        StabilityTag::Stable,
        "2.0.0",
        false,
    )
    .unwrap();

    let repo = fx.git2();
    let reference = repo.find_reference("refs/tags/stable").unwrap();
    assert_eq!(reference.target(), Some(fx.commits[1]));
}

#[test]
fn test_stable_moves_and_force_pushes() {
    let fx = fixture(3);
    fx.tag("v1.0.0", 0);
    fx.tag("v1.1.0", 2);
    let remote = fx.bare_origin();
    let config = Config::default();

    apply_stability_tag(&fx.repo(), &config, StabilityTag::Stable, "1.1.0", true).unwrap();
    let outcome =
        apply_stability_tag(&fx.repo(), &config, StabilityTag::Stable, "1.0.0", true).unwrap();

    assert!(outcome.pushed);
    assert_eq!(outcome.previous, Some(fx.commits[2]));
    assert!(outcome
        .warnings
        .iter()
        .any(|w| matches!(w, BoundaryWarning::TagMoved { .. })));

    let bare = Git2Repo::open_bare(remote.path()).unwrap();
    let pushed = bare.find_reference("refs/tags/stable").unwrap();
    assert_eq!(pushed.target(), Some(fx.commits[0]));
}

#[test]
fn test_stable_without_remote_warns() {
    let fx = fixture(1);
    fx.tag("v1.0.0", 0);

    let outcome = apply_stability_tag(
        &fx.repo(),
        &Config::default(),
        StabilityTag::Unstable,
        "HEAD",
        true,
    )
    .unwrap();

    assert!(!outcome.pushed);
    assert_eq!(
        outcome.warnings,
        vec![BoundaryWarning::RemoteMissing {
            remote: "origin".to_string()
        }]
    );
}

#[test]
fn test_resolve_current_uses_highest_precedence() {
    let fx = fixture(4);
    fx.tag("v1.9.0", 0);
    fx.tag("v1.10.0-rc.1", 1);
    fx.tag("v1.10.0", 2);
    fx.tag("v1.10", 3);

    let (current, warnings) = resolve_current(&fx.repo(), &Config::default().version).unwrap();
    assert_eq!(current.tag(), Some("v1.10.0"));
    assert!(warnings
        .iter()
        .any(|w| matches!(w, BoundaryWarning::UnparsableTag { tag, .. } if tag == "v1.10")));
}

#[test]
fn test_rollback_to_previous_release() {
    let fx = fixture(3);
    fx.tag("v1.0.0", 0);
    fx.tag("v1.1.0", 1);
    fx.tag("v1.2.0", 2);
    fx.tag("stable", 2);
    fx.tag("production", 2);
    let remote = fx.bare_origin();
    let now = Utc.with_ymd_and_hms(2024, 1, 15, 8, 5, 9).unwrap();

    let outcome = confirm_rollback(
        &fx.repo(),
        &Config::default(),
        "production",
        None,
        Some("production"),
        true,
        now,
    )
    .unwrap();

    assert_eq!(outcome.rollback_tag, "rollback-20240115-080509-production");
    assert_eq!(fx.peeled("production"), fx.commits[1]);
    assert_eq!(fx.peeled("rollback-20240115-080509-production"), fx.commits[1]);

    let bare = Git2Repo::open_bare(remote.path()).unwrap();
    assert!(bare
        .find_reference("refs/tags/rollback-20240115-080509-production")
        .is_ok());
    assert_eq!(
        bare.find_reference("refs/tags/production").unwrap().target(),
        Some(fx.commits[1])
    );
}

#[test]
fn test_rollback_requires_confirmation() {
    let fx = fixture(2);
    fx.tag("v1.0.0", 0);
    fx.tag("v1.1.0", 1);
    let repo = fx.repo();
    let now = Utc::now();

    let result = confirm_rollback(
        &repo,
        &Config::default(),
        "staging",
        Some("1.0.0"),
        Some("production"),
        false,
        now,
    );

    assert!(result.is_err());
    assert_eq!(repo.find_tag_oid("staging").unwrap(), None);
}
