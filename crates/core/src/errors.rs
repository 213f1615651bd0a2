//! Error types for the commute core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Whether this error is a precondition failure raised before any
    /// repository state was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Session(SessionError::DirtyWorktree | SessionError::OperationInProgress { .. })
        )
    }
}

// ---------------------------------------------------------------------------
// Merge errors
// ---------------------------------------------------------------------------

/// Errors from the edit-script / commutation / synthesis pipeline.
///
/// Edits that fail to commute are not errors: they are reported as an
/// unresolved outcome. Everything here indicates a bug or unusable input.
#[derive(Debug, Error)]
pub enum MergeError {
    /// An edit starts before the synthesis cursor or runs past the base.
    #[error(
        "internal error: edit at base line {base_start}..{base_end} violates synthesis cursor {cursor} (base has {base_len} lines)"
    )]
    InvariantViolation {
        cursor: usize,
        base_start: usize,
        base_end: usize,
        base_len: usize,
    },
}

// ---------------------------------------------------------------------------
// Conflict errors
// ---------------------------------------------------------------------------

/// Which anchor of a hunk could not be located in the resolved file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSide {
    Before,
    After,
}

impl fmt::Display for AnchorSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// Errors from conflict reconstruction and resolution extraction.
#[derive(Debug, Error)]
pub enum ConflictError {
    /// Unconflicted text surrounding a hunk was not found in the resolved file.
    #[error("{anchor} anchor of hunk {hunk} not found in resolved content")]
    AnchorNotFound { hunk: usize, anchor: AnchorSide },

    /// Two hunks with no unconflicted text between them cannot be separated.
    #[error("hunk {hunk} is directly followed by another hunk; adjacent hunks are unsupported")]
    AdjacentHunks { hunk: usize },

    /// The reconstructed conflict contained no conflict markers.
    #[error("no conflict hunks found in reconstructed conflict")]
    NoHunks,

    /// The external three-way merge tool failed.
    #[error("merge tool failed (exit {exit_code:?}): {command}: {stderr}")]
    MergeTool {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Storage error while reading or writing resolutions.
    #[error("conflict store error: {0}")]
    Store(#[from] StoreError),

    /// Generic I/O wrapper.
    #[error("conflict I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git operations (git2 reads and `git` subprocesses).
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// A ref (branch, tag, SHA) could not be resolved.
    #[error("git ref not found: {0}")]
    RefNotFound(String),

    /// A `git` subprocess exited unsuccessfully.
    #[error("git command failed (exit {exit_code:?}): {command}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Errors from the merge session state machine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The working tree has uncommitted changes.
    #[error("working tree has uncommitted changes (use --allow-dirty to skip this check)")]
    DirtyWorktree,

    /// A merge (or another multi-step operation) is already in progress.
    #[error("a {state} is already in progress; complete or abort it first")]
    OperationInProgress { state: String },

    /// A state-machine transition was invalid.
    #[error("invalid merge session transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Underlying Git error.
    #[error("session Git error: {0}")]
    GitError(#[from] GitError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors from the content-addressed resolution store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A key string is not a well-formed resolution key.
    #[error("invalid resolution key '{0}'")]
    InvalidKey(String),

    /// Generic I/O wrapper.
    #[error("store I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
