//! Local Git repository operations.
//!
//! Reads go through `git2`. Anything that mutates the working tree, the index
//! or the merge state is delegated to the `git` binary so that hooks,
//! attributes and merge drivers behave exactly as they would for a user.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use git2::{ErrorCode, ObjectType, Oid, Repository, RepositoryState, Status, StatusOptions};
use tracing::{debug, info, instrument, warn};

use crate::errors::GitError;

use super::{MergeStart, Vcs};

/// Git client wrapping a `git2::Repository` and its working directory.
pub struct GitClient {
    repo: Repository,
    workdir: PathBuf,
}

impl GitClient {
    /// Open an existing, non-bare Git repository at `repo_path`.
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Result<Self, GitError> {
        let path = repo_path.as_ref();
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path)
            .map_err(|_| GitError::RepositoryNotFound(path.display().to_string()))?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::RepositoryNotFound(path.display().to_string()))?;
        Ok(Self { repo, workdir })
    }

    /// Root of the working tree.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    fn git(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!(?args, "running git");
        let output = Command::new("git")
            .current_dir(&self.workdir)
            .env("GIT_MERGE_AUTOEDIT", "no")
            .args(args)
            .output()?;
        Ok(output)
    }

    fn git_checked(&self, args: &[&str]) -> Result<Output, GitError> {
        let output = self.git(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(?args, %stderr, "git command failed");
            return Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                exit_code: output.status.code(),
                stderr,
            });
        }
        Ok(output)
    }

    fn find_commit(&self, id: &str) -> Result<git2::Commit<'_>, GitError> {
        let oid = Oid::from_str(id).map_err(|_| GitError::RefNotFound(id.to_string()))?;
        Ok(self.repo.find_commit(oid)?)
    }
}

fn describe_state(state: RepositoryState) -> Option<&'static str> {
    match state {
        RepositoryState::Clean => None,
        RepositoryState::Merge => Some("merge"),
        RepositoryState::Revert | RepositoryState::RevertSequence => Some("revert"),
        RepositoryState::CherryPick | RepositoryState::CherryPickSequence => Some("cherry-pick"),
        RepositoryState::Bisect => Some("bisect"),
        RepositoryState::Rebase
        | RepositoryState::RebaseInteractive
        | RepositoryState::RebaseMerge => Some("rebase"),
        RepositoryState::ApplyMailbox | RepositoryState::ApplyMailboxOrRebase => Some("am"),
    }
}

impl Vcs for GitClient {
    fn is_dirty(&self) -> Result<bool, GitError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        let dirty = statuses.iter().any(|entry| entry.status() != Status::CURRENT);
        debug!(dirty, "checked working tree");
        Ok(dirty)
    }

    fn operation_in_progress(&self) -> Result<Option<String>, GitError> {
        Ok(describe_state(self.repo.state()).map(str::to_string))
    }

    #[instrument(skip(self))]
    fn resolve_commit(&self, rev: &str) -> Result<String, GitError> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|_| GitError::RefNotFound(rev.to_string()))?;
        let commit = object
            .peel_to_commit()
            .map_err(|_| GitError::RefNotFound(rev.to_string()))?;
        Ok(commit.id().to_string())
    }

    #[instrument(skip(self))]
    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>, GitError> {
        let a = self.find_commit(a)?.id();
        let b = self.find_commit(b)?.id();
        match self.repo.merge_base(a, b) {
            Ok(oid) => Ok(Some(oid.to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => {
                warn!("commits share no history");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_blob(&self, commit: &str, path: &str) -> Result<Option<Vec<u8>>, GitError> {
        let tree = self.find_commit(commit)?.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if entry.kind() != Some(ObjectType::Blob) {
            debug!(path, "path is not a regular file at this commit");
            return Ok(None);
        }
        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        Ok(Some(blob.content().to_vec()))
    }

    #[instrument(skip(self))]
    fn checkout(&self, rev: &str) -> Result<(), GitError> {
        self.git_checked(&["checkout", "-q", rev])?;
        info!("checked out");
        Ok(())
    }

    #[instrument(skip(self))]
    fn begin_merge(&self, rev: &str) -> Result<MergeStart, GitError> {
        let args = ["merge", "--no-commit", "--no-ff", "-q", rev];
        let output = self.git(&args)?;

        if self.repo.state() == RepositoryState::Merge {
            let start = if self.conflicted_paths()?.is_empty() {
                MergeStart::Clean
            } else {
                MergeStart::Conflicted
            };
            info!(?start, "merge started");
            return Ok(start);
        }
        if output.status.success() {
            info!("already up to date");
            return Ok(MergeStart::UpToDate);
        }
        Err(GitError::CommandFailed {
            command: format!("git {}", args.join(" ")),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn conflicted_paths(&self) -> Result<Vec<String>, GitError> {
        let mut index = self.repo.index()?;
        index.read(true)?;
        let mut paths = BTreeSet::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
            if let Some(entry) = entry {
                paths.insert(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }
        debug!(count = paths.len(), "collected conflicted paths");
        Ok(paths.into_iter().collect())
    }

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    fn write_and_stage(&self, path: &str, content: &[u8]) -> Result<(), GitError> {
        let target = self.workdir.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content)?;
        self.git_checked(&["add", "--", path])?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn stage_removal(&self, path: &str) -> Result<(), GitError> {
        self.git_checked(&["rm", "-q", "-f", "--ignore-unmatch", "--", path])?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn commit_merge(&self) -> Result<String, GitError> {
        self.git_checked(&["commit", "--no-edit", "-q"])?;
        let sha = self.repo.head()?.peel_to_commit()?.id().to_string();
        info!(%sha, "committed merge");
        Ok(sha)
    }

    #[instrument(skip(self))]
    fn abort_merge(&self) -> Result<(), GitError> {
        self.git_checked(&["merge", "--abort"])?;
        info!("merge aborted");
        Ok(())
    }
}
