//! In-memory [`Vcs`] used by unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::errors::GitError;

use super::{MergeStart, Vcs};

pub(crate) const TARGET: &str = "main";
pub(crate) const SOURCE: &str = "feature";
const TARGET_ID: &str = "1111";
const SOURCE_ID: &str = "2222";
const BASE_ID: &str = "0000";

/// A repository with one merge base and a configurable set of conflicts.
pub(crate) struct FakeVcs {
    pub dirty: bool,
    pub in_progress: Option<String>,
    pub start: MergeStart,
    pub has_base: bool,
    pub fail_staging: bool,
    pub fail_commit: bool,
    blobs: HashMap<(&'static str, String), Vec<u8>>,
    conflicts: Vec<String>,
    pub calls: RefCell<Vec<String>>,
    pub staged: RefCell<BTreeMap<String, Option<Vec<u8>>>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self {
            dirty: false,
            in_progress: None,
            start: MergeStart::Conflicted,
            has_base: true,
            fail_staging: false,
            fail_commit: false,
            blobs: HashMap::new(),
            conflicts: Vec::new(),
            calls: RefCell::new(Vec::new()),
            staged: RefCell::new(BTreeMap::new()),
        }
    }

    /// Register a conflicted path with its content at base, target and source.
    pub fn with_conflict(
        mut self,
        path: &str,
        base: Option<&[u8]>,
        ours: Option<&[u8]>,
        theirs: Option<&[u8]>,
    ) -> Self {
        for (id, content) in [(BASE_ID, base), (TARGET_ID, ours), (SOURCE_ID, theirs)] {
            if let Some(content) = content {
                self.blobs.insert((id, path.to_string()), content.to_vec());
            }
        }
        self.conflicts.push(path.to_string());
        self.conflicts.sort();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn id(&self, id: &str) -> Result<&'static str, GitError> {
        [TARGET_ID, SOURCE_ID, BASE_ID]
            .into_iter()
            .find(|known| *known == id)
            .ok_or_else(|| GitError::RefNotFound(id.to_string()))
    }
}

impl Vcs for FakeVcs {
    fn is_dirty(&self) -> Result<bool, GitError> {
        Ok(self.dirty)
    }

    fn operation_in_progress(&self) -> Result<Option<String>, GitError> {
        Ok(self.in_progress.clone())
    }

    fn resolve_commit(&self, rev: &str) -> Result<String, GitError> {
        match rev {
            TARGET => Ok(TARGET_ID.to_string()),
            SOURCE => Ok(SOURCE_ID.to_string()),
            other => Err(GitError::RefNotFound(other.to_string())),
        }
    }

    fn merge_base(&self, _a: &str, _b: &str) -> Result<Option<String>, GitError> {
        Ok(self.has_base.then(|| BASE_ID.to_string()))
    }

    fn read_blob(&self, commit: &str, path: &str) -> Result<Option<Vec<u8>>, GitError> {
        let id = self.id(commit)?;
        Ok(self.blobs.get(&(id, path.to_string())).cloned())
    }

    fn checkout(&self, rev: &str) -> Result<(), GitError> {
        self.record(format!("checkout {rev}"));
        Ok(())
    }

    fn begin_merge(&self, rev: &str) -> Result<MergeStart, GitError> {
        self.record(format!("merge {rev}"));
        Ok(self.start)
    }

    fn conflicted_paths(&self) -> Result<Vec<String>, GitError> {
        Ok(self.conflicts.clone())
    }

    fn write_and_stage(&self, path: &str, content: &[u8]) -> Result<(), GitError> {
        if self.fail_staging {
            return Err(GitError::CommandFailed {
                command: format!("git add -- {path}"),
                exit_code: Some(128),
                stderr: "fatal: unable to write index".into(),
            });
        }
        self.record(format!("add {path}"));
        self.staged
            .borrow_mut()
            .insert(path.to_string(), Some(content.to_vec()));
        Ok(())
    }

    fn stage_removal(&self, path: &str) -> Result<(), GitError> {
        self.record(format!("rm {path}"));
        self.staged.borrow_mut().insert(path.to_string(), None);
        Ok(())
    }

    fn commit_merge(&self) -> Result<String, GitError> {
        if self.fail_commit {
            return Err(GitError::CommandFailed {
                command: "git commit --no-edit -q".into(),
                exit_code: Some(1),
                stderr: "hook rejected commit".into(),
            });
        }
        self.record("commit".into());
        Ok("3333".into())
    }

    fn abort_merge(&self) -> Result<(), GitError> {
        self.record("abort".into());
        Ok(())
    }
}
