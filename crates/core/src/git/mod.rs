//! The version-control collaborator.
//!
//! The merge driver only talks to git through the [`Vcs`] trait, so the
//! resolution logic can be exercised against an in-memory fake.

pub mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::GitClient;

use serde::Serialize;

use crate::errors::GitError;

/// How starting a merge went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStart {
    /// The source is already contained in the target; no merge state exists.
    UpToDate,
    /// A merge is in progress with nothing conflicted.
    Clean,
    /// A merge is in progress with conflicted paths in the index.
    Conflicted,
}

/// Operations the merge driver needs from the repository.
///
/// Commits are addressed by the hex ids returned from [`Vcs::resolve_commit`].
pub trait Vcs {
    /// Whether tracked files differ from HEAD (untracked files are ignored).
    fn is_dirty(&self) -> Result<bool, GitError>;

    /// Name of the multi-step operation in progress (merge, rebase, ...), if any.
    fn operation_in_progress(&self) -> Result<Option<String>, GitError>;

    /// Resolve a branch, tag or revision expression to a commit id.
    fn resolve_commit(&self, rev: &str) -> Result<String, GitError>;

    /// Best common ancestor of two commits, if they share history.
    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>, GitError>;

    /// Full content of `path` at `commit`, or `None` when the path is absent.
    fn read_blob(&self, commit: &str, path: &str) -> Result<Option<Vec<u8>>, GitError>;

    fn checkout(&self, rev: &str) -> Result<(), GitError>;

    /// Start merging `rev` into the checked-out branch without committing.
    fn begin_merge(&self, rev: &str) -> Result<MergeStart, GitError>;

    /// Paths left conflicted in the index, sorted.
    fn conflicted_paths(&self) -> Result<Vec<String>, GitError>;

    /// Write `content` to `path` in the working tree and stage it.
    fn write_and_stage(&self, path: &str, content: &[u8]) -> Result<(), GitError>;

    /// Remove `path` from the working tree and stage the removal.
    fn stage_removal(&self, path: &str) -> Result<(), GitError>;

    /// Commit the in-progress merge, returning the new commit id.
    fn commit_merge(&self) -> Result<String, GitError>;

    fn abort_merge(&self) -> Result<(), GitError>;
}
