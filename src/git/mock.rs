use crate::error::{CiError, Result};
use crate::git::Repository;
use git2::Oid;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// A push recorded by [`MockRepository`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub remote: String,
    pub tags: Vec<String>,
    pub force: bool,
}

/// In-memory repository for testing without actual git operations
pub struct MockRepository {
    tags: Mutex<BTreeMap<String, Oid>>,
    revisions: HashMap<String, Oid>,
    head: Option<Oid>,
    remotes: HashSet<String>,
    pushes: Mutex<Vec<RecordedPush>>,
    fail_push: bool,
    fail_move: bool,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            tags: Mutex::new(BTreeMap::new()),
            revisions: HashMap::new(),
            head: None,
            remotes: HashSet::new(),
            pushes: Mutex::new(Vec::new()),
            fail_push: false,
            fail_move: false,
        }
    }

    /// Deterministic fake commit id derived from a small number
    pub fn oid(n: u8) -> Oid {
        Oid::from_bytes(&[n; 20]).unwrap_or_else(|_| Oid::zero())
    }

    /// Add a tag pointing to an OID
    pub fn add_tag(&mut self, name: impl Into<String>, oid: Oid) {
        self.tags_mut().insert(name.into(), oid);
    }

    /// Register a revision name (branch, sha) resolvable by `resolve_commit`
    pub fn add_revision(&mut self, rev: impl Into<String>, oid: Oid) {
        self.revisions.insert(rev.into(), oid);
    }

    pub fn set_head(&mut self, oid: Oid) {
        self.head = Some(oid);
    }

    pub fn add_remote(&mut self, name: impl Into<String>) {
        self.remotes.insert(name.into());
    }

    /// Make every push fail with a remote error
    pub fn fail_pushes(&mut self) {
        self.fail_push = true;
    }

    /// Make every tag move fail
    pub fn fail_moves(&mut self) {
        self.fail_move = true;
    }

    /// Pushes performed so far
    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Current target of a tag
    pub fn tag_target(&self, name: &str) -> Option<Oid> {
        self.tags.lock().ok().and_then(|t| t.get(name).copied())
    }

    fn tags_mut(&mut self) -> &mut BTreeMap<String, Oid> {
        match self.tags.get_mut() {
            Ok(tags) => tags,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn with_tags<T>(&self, f: impl FnOnce(&mut BTreeMap<String, Oid>) -> T) -> Result<T> {
        let mut tags = self
            .tags
            .lock()
            .map_err(|_| CiError::tag("mock tag store poisoned"))?;
        Ok(f(&mut tags))
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn list_tags(&self) -> Result<Vec<String>> {
        self.with_tags(|tags| tags.keys().cloned().collect())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        self.with_tags(|tags| tags.get(tag_name).copied())
    }

    fn resolve_commit(&self, rev: &str) -> Result<Oid> {
        if rev == "HEAD" {
            return self
                .head
                .ok_or_else(|| CiError::tag("HEAD is not set in mock repository"));
        }
        if let Some(oid) = self.find_tag_oid(rev)? {
            return Ok(oid);
        }
        self.revisions
            .get(rev)
            .copied()
            .ok_or_else(|| CiError::tag(format!("Cannot resolve revision '{}'", rev)))
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        self.with_tags(|tags| {
            if tags.contains_key(name) {
                Err(CiError::tag(format!("Tag '{}' already exists", name)))
            } else {
                tags.insert(name.to_string(), oid);
                Ok(())
            }
        })?
    }

    fn move_tag(&self, name: &str, oid: Oid) -> Result<Option<Oid>> {
        if self.fail_move {
            return Err(CiError::tag(format!("Cannot move tag '{}'", name)));
        }
        self.with_tags(|tags| tags.insert(name.to_string(), oid))
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.with_tags(|tags| tags.remove(name))?
            .map(|_| ())
            .ok_or_else(|| CiError::tag(format!("Tag '{}' not found", name)))
    }

    fn has_remote(&self, remote: &str) -> Result<bool> {
        Ok(self.remotes.contains(remote))
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str], force: bool) -> Result<()> {
        if !self.remotes.contains(remote) {
            return Err(CiError::remote(format!("Cannot find remote '{}'", remote)));
        }
        if self.fail_push {
            return Err(CiError::remote(format!("Push to '{}' failed", remote)));
        }
        self.pushes
            .lock()
            .map_err(|_| CiError::remote("mock push log poisoned"))?
            .push(RecordedPush {
                remote: remote.to_string(),
                tags: tag_names.iter().map(|t| t.to_string()).collect(),
                force,
            });
        Ok(())
    }
}
