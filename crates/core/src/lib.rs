//! Commute core library.
//!
//! This crate provides the merge-conflict resolution engine: the commuting
//! three-way merge pipeline, conflict hunk parsing and resolution recording,
//! a content-addressed resolution store, the git collaborator, and the merge
//! driver that ties them together.

pub mod config;
pub mod conflict;
pub mod driver;
pub mod errors;
pub mod git;
pub mod merge;
pub mod session;
pub mod text;

// Re-exports for convenience.
pub use config::CommuteConfig;
pub use driver::{MergeDriver, MergeOptions, MergeReport, UnresolvedFile};
pub use errors::CoreError;
pub use git::{GitClient, Vcs};
pub use session::{MergeSession, SessionState};
