use crate::error::{CiError, Result};
use crate::git::tag_refspecs;
use git2::{Oid, Repository as Git2Repo};
use std::path::Path;
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    token: Option<String>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo, token: None })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo, token: None }
    }

    /// Token used for HTTPS pushes (e.g., `GITHUB_TOKEN` in Actions)
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn remote_callbacks(&self) -> git2::RemoteCallbacks<'_> {
        let mut callbacks = git2::RemoteCallbacks::new();
        let token = self.token.clone();

        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(token) = &token {
                    return git2::Cred::userpass_plaintext("x-access-token", token);
                }
            }

            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let username = username_from_url.unwrap_or("git");
                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }

                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path = home.join(".ssh").join(key);
                        if path.exists() {
                            if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }
            }

            git2::Cred::default()
        });

        // A rejected ref (e.g., protected tag) is reported here, not as a push error
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        callbacks
    }
}

impl super::Repository for Git2Repository {
    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let commit = reference.peel_to_commit().map_err(|e| {
                    CiError::tag(format!("Tag '{}' does not point at a commit: {}", tag_name, e))
                })?;

                Ok(Some(commit.id()))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::InvalidSpec => Ok(None),
            Err(e) => Err(CiError::tag(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn resolve_commit(&self, rev: &str) -> Result<Oid> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| CiError::tag(format!("Cannot resolve revision '{}': {}", rev, e)))?;

        let commit = object
            .peel_to_commit()
            .map_err(|e| CiError::tag(format!("Revision '{}' is not a commit: {}", rev, e)))?;

        Ok(commit.id())
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| CiError::tag(format!("Cannot find object: {}", e)))?;

        self.repo
            .tag_lightweight(name, &object, false)
            .map_err(|e| CiError::tag(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }

    fn move_tag(&self, name: &str, oid: Oid) -> Result<Option<Oid>> {
        let previous = self.find_tag_oid(name)?;

        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| CiError::tag(format!("Cannot find object: {}", e)))?;

        self.repo
            .tag_lightweight(name, &object, true)
            .map_err(|e| CiError::tag(format!("Cannot move tag '{}': {}", name, e)))?;

        debug!(tag = name, target = %oid, ?previous, "moved tag");
        Ok(previous)
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.repo
            .tag_delete(name)
            .map_err(|e| CiError::tag(format!("Cannot delete tag '{}': {}", name, e)))
    }

    fn has_remote(&self, remote: &str) -> Result<bool> {
        let remotes = self.repo.remotes()?;
        Ok(remotes.iter().flatten().any(|name| name == remote))
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str], force: bool) -> Result<()> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| CiError::remote(format!("Cannot find remote '{}': {}", remote, e)))?;

        let refspecs = tag_refspecs(tag_names, force);
        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(self.remote_callbacks());

        remote_handle
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| {
                if e.class() == git2::ErrorClass::Net {
                    CiError::remote(format!("Network error during push to '{}': {}", remote, e))
                } else {
                    CiError::remote(format!("Push to '{}' failed: {}", remote, e))
                }
            })?;

        debug!(remote, ?refspecs, "pushed tags");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository;
    use tempfile::TempDir;

    fn repo_with_commit() -> (TempDir, Git2Repository, Oid) {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        let oid = {
            let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
                .unwrap()
        };
        (dir, Git2Repository::from_git2(repo), oid)
    }

    #[test]
    fn test_create_and_find_tag() {
        let (_dir, repo, oid) = repo_with_commit();
        repo.create_tag("v1.0.0", oid).unwrap();

        assert_eq!(repo.find_tag_oid("v1.0.0").unwrap(), Some(oid));
        assert_eq!(repo.find_tag_oid("v2.0.0").unwrap(), None);
        assert!(repo.create_tag("v1.0.0", oid).is_err());
    }

    #[test]
    fn test_move_tag_reports_previous() {
        let (_dir, repo, oid) = repo_with_commit();
        assert_eq!(repo.move_tag("stable", oid).unwrap(), None);
        assert_eq!(repo.move_tag("stable", oid).unwrap(), Some(oid));
    }

    #[test]
    fn test_delete_tag() {
        let (_dir, repo, oid) = repo_with_commit();
        repo.create_tag("rollback-20240601-123000-staging", oid).unwrap();
        repo.delete_tag("rollback-20240601-123000-staging").unwrap();

        assert_eq!(
            repo.find_tag_oid("rollback-20240601-123000-staging").unwrap(),
            None
        );
        assert!(repo.delete_tag("missing").is_err());
    }

    #[test]
    fn test_resolve_head() {
        let (_dir, repo, oid) = repo_with_commit();
        assert_eq!(repo.head_oid().unwrap(), oid);
        assert!(repo.resolve_commit("does-not-exist").is_err());
    }

    #[test]
    fn test_no_remote() {
        let (_dir, repo, _oid) = repo_with_commit();
        assert!(!repo.has_remote("origin").unwrap());
        assert!(repo.push_tags("origin", &["stable"], true).is_err());
    }
}
