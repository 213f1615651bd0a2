//! Lifecycle of one merge in the working checkout.
//!
//! The checkout's merge state moves `Idle -> MergeInProgress` and then to
//! exactly one of `Committed` or `Aborted`. Every mutation of that state goes
//! through [`MergeSession`], which refuses any other transition.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::SessionError;
use crate::git::{MergeStart, Vcs};

/// Where a merge session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    MergeInProgress,
    Committed,
    Aborted,
}

impl SessionState {
    fn can_transition_to(self, to: SessionState) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::MergeInProgress)
                | (Self::MergeInProgress, Self::Committed)
                | (Self::MergeInProgress, Self::Aborted)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::MergeInProgress => write!(f, "merge in progress"),
            Self::Committed => write!(f, "committed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Guards the merge state of a checkout.
pub struct MergeSession<'v, V: Vcs + ?Sized> {
    vcs: &'v V,
    state: SessionState,
}

impl<'v, V: Vcs + ?Sized> MergeSession<'v, V> {
    pub fn new(vcs: &'v V) -> Self {
        Self {
            vcs,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Fail unless the checkout is ready for a merge. Touches nothing.
    pub fn check_preconditions(&self, allow_dirty: bool) -> Result<(), SessionError> {
        if let Some(state) = self.vcs.operation_in_progress()? {
            return Err(SessionError::OperationInProgress { state });
        }
        if !allow_dirty && self.vcs.is_dirty()? {
            return Err(SessionError::DirtyWorktree);
        }
        debug!("merge preconditions hold");
        Ok(())
    }

    /// Check out `target` and start merging `source` into it.
    ///
    /// When `source` is already merged no merge state is created and the
    /// session stays idle.
    pub fn begin(&mut self, target: &str, source: &str) -> Result<MergeStart, SessionError> {
        self.ensure(SessionState::MergeInProgress)?;
        self.vcs.checkout(target)?;
        let start = self.vcs.begin_merge(source)?;
        if start != MergeStart::UpToDate {
            self.state = SessionState::MergeInProgress;
        }
        info!(target, source, ?start, "merge session begun");
        Ok(start)
    }

    /// Commit the merge, returning the new commit id.
    pub fn commit(&mut self) -> Result<String, SessionError> {
        self.ensure(SessionState::Committed)?;
        let sha = self.vcs.commit_merge()?;
        self.state = SessionState::Committed;
        Ok(sha)
    }

    /// Abort the merge, restoring the pre-merge checkout.
    pub fn abort(&mut self) -> Result<(), SessionError> {
        self.ensure(SessionState::Aborted)?;
        self.vcs.abort_merge()?;
        self.state = SessionState::Aborted;
        Ok(())
    }

    fn ensure(&self, to: SessionState) -> Result<(), SessionError> {
        if self.state.can_transition_to(to) {
            Ok(())
        } else {
            Err(SessionError::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            })
        }
    }
}
