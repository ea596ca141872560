//! Git operations abstraction layer
//!
//! Tags are the only persistent state this tool manages, so the [Repository]
//! trait is deliberately tag-centric: list, resolve, create, force-move and
//! push. Two implementations exist:
//!
//! - [repository::Git2Repository]: real repository access through `git2`
//! - [mock::MockRepository]: in-memory implementation for tests
//!
//! Release workflows depend on the trait only:
//!
//! ```rust
//! # use ci_excellence::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> Result<(), Box<dyn std::error::Error>> {
//! if let Some(oid) = repo.find_tag_oid("v1.0.0")? {
//!     repo.move_tag("stable", oid)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;

/// Tag-level git operations
///
/// All OIDs exchanged through this trait are commit ids: annotated tags are
/// peeled to the commit they point at.
pub trait Repository {
    /// All tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Commit a tag points at
    ///
    /// # Returns
    /// * `Ok(Some(Oid))` - The peeled commit id
    /// * `Ok(None)` - If the tag doesn't exist
    /// * `Err` - If the tag exists but cannot be peeled to a commit
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>>;

    /// Resolve any revision (sha, branch, tag, `HEAD~1`) to a commit
    fn resolve_commit(&self, rev: &str) -> Result<Oid>;

    /// Commit at HEAD
    fn head_oid(&self) -> Result<Oid> {
        self.resolve_commit("HEAD")
    }

    /// Create a lightweight tag; fails if it already exists
    fn create_tag(&self, name: &str, oid: Oid) -> Result<()>;

    /// Point a lightweight tag at `oid`, replacing any existing tag
    ///
    /// # Returns
    /// The commit the tag pointed at before the move, if it existed
    fn move_tag(&self, name: &str, oid: Oid) -> Result<Option<Oid>>;

    /// Delete a local tag
    fn delete_tag(&self, name: &str) -> Result<()>;

    /// Whether a remote with this name is configured
    fn has_remote(&self, remote: &str) -> Result<bool>;

    /// Push tags to a remote, force-updating them when `force` is set
    fn push_tags(&self, remote: &str, tag_names: &[&str], force: bool) -> Result<()>;
}

/// Refspecs for pushing tags: `[+]refs/tags/<t>:refs/tags/<t>`
pub fn tag_refspecs(tag_names: &[&str], force: bool) -> Vec<String> {
    let marker = if force { "+" } else { "" };
    tag_names
        .iter()
        .map(|tag| format!("{}refs/tags/{}:refs/tags/{}", marker, tag, tag))
        .collect()
}

/// First 7 characters of a commit id
pub fn short_oid(oid: Oid) -> String {
    oid.to_string().chars().take(7).collect()
}
