//! Top-level commuting-merge driver.
//!
//! The [`MergeDriver`] runs one merge of a source branch into a target branch:
//!
//! 1. Check preconditions (no operation in progress, clean tree) without
//!    touching anything.
//! 2. Check out the target and start a non-committing merge of the source.
//! 3. For every conflicted path, three-way merge the base, target and source
//!    versions through the commuting pipeline. Files that do not commute may
//!    still be resolved from a store of recorded resolutions.
//! 4. Abort (or keep, on request) when anything stays unresolved or fails,
//!    otherwise optionally commit.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MergeConfig;
use crate::conflict::{replay_resolutions, Reconstructor, ResolutionStore};
use crate::errors::CoreError;
use crate::git::{MergeStart, Vcs};
use crate::merge::{merge_file, CommutePolicy, FileOutcome, UnresolvedReason};
use crate::session::{MergeSession, SessionState};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs for a single merge run.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Skip the clean-working-tree precondition.
    pub allow_dirty: bool,
    /// Leave the merge in progress instead of aborting on failure.
    pub keep_merge: bool,
    /// Commit once every conflicted file is resolved.
    pub auto_continue: bool,
    /// Reject same-position inserts from both sides.
    pub strict_commute: bool,
    /// Store of recorded resolutions to replay for non-commuting files.
    pub replay_store: Option<PathBuf>,
    /// Conflict text generator used for replay.
    pub reconstructor: Reconstructor,
}

impl MergeOptions {
    /// Options seeded from the `[merge]` config section.
    pub fn from_config(config: &MergeConfig) -> Self {
        Self {
            allow_dirty: config.allow_dirty,
            keep_merge: config.keep_merge,
            auto_continue: config.auto_continue,
            strict_commute: config.strict_commute,
            replay_store: config.replay_store.clone(),
            reconstructor: Reconstructor::default(),
        }
    }

    pub fn policy(&self) -> CommutePolicy {
        if self.strict_commute {
            CommutePolicy::STRICT
        } else {
            CommutePolicy::UNION
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A conflicted path left for a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedFile {
    pub path: String,
    pub reason: UnresolvedReason,
}

/// What a merge run did.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub target: String,
    pub source: String,
    /// The source was already merged; nothing happened.
    pub up_to_date: bool,
    /// Paths merged by commutation and staged.
    pub resolved: Vec<String>,
    /// Paths whose removal was staged.
    pub deleted: Vec<String>,
    /// Paths resolved from recorded resolutions and staged.
    pub replayed: Vec<String>,
    pub unresolved: Vec<UnresolvedFile>,
    /// Final state of the merge session.
    pub state: SessionState,
    /// Merge commit id, when one was created.
    pub commit: Option<String>,
}

impl MergeReport {
    fn new(target: &str, source: &str) -> Self {
        Self {
            target: target.to_string(),
            source: source.to_string(),
            up_to_date: false,
            resolved: Vec::new(),
            deleted: Vec::new(),
            replayed: Vec::new(),
            unresolved: Vec::new(),
            state: SessionState::Idle,
            commit: None,
        }
    }

    /// True when no file was left unresolved.
    pub fn is_success(&self) -> bool {
        self.unresolved.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Merges one branch into another through a [`Vcs`].
pub struct MergeDriver<'v, V: Vcs + ?Sized> {
    vcs: &'v V,
    options: MergeOptions,
}

impl<'v, V: Vcs + ?Sized> MergeDriver<'v, V> {
    pub fn new(vcs: &'v V, options: MergeOptions) -> Self {
        Self { vcs, options }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge `source` into `target`.
    ///
    /// Errors leave the checkout as it was before the merge unless
    /// `keep_merge` is set. Unresolved files are not errors; they are listed
    /// in the report.
    pub fn run(&self, target: &str, source: &str) -> Result<MergeReport, CoreError> {
        let mut session = MergeSession::new(self.vcs);
        session.check_preconditions(self.options.allow_dirty)?;

        let target_id = self.vcs.resolve_commit(target)?;
        let source_id = self.vcs.resolve_commit(source)?;
        let store = self
            .options
            .replay_store
            .as_ref()
            .map(ResolutionStore::open)
            .transpose()?;

        let mut report = MergeReport::new(target, source);
        if session.begin(target, source)? == MergeStart::UpToDate {
            report.up_to_date = true;
            report.state = session.state();
            return Ok(report);
        }

        if let Err(e) = self.resolve_all(&target_id, &source_id, store.as_ref(), &mut report) {
            self.bail(&mut session);
            return Err(e);
        }

        if !report.is_success() {
            warn!(count = report.unresolved.len(), "files left unresolved");
            if self.options.keep_merge {
                info!("leaving merge in progress for manual resolution");
            } else {
                session.abort()?;
            }
        } else if self.options.auto_continue {
            match session.commit() {
                Ok(sha) => report.commit = Some(sha),
                Err(e) => {
                    self.bail(&mut session);
                    return Err(e.into());
                }
            }
        }

        report.state = session.state();
        info!(
            resolved = report.resolved.len(),
            deleted = report.deleted.len(),
            replayed = report.replayed.len(),
            unresolved = report.unresolved.len(),
            state = %report.state,
            "merge run finished"
        );
        Ok(report)
    }

    /// Abort after a failure unless asked to keep the merge.
    fn bail(&self, session: &mut MergeSession<'_, V>) {
        if self.options.keep_merge {
            return;
        }
        if let Err(e) = session.abort() {
            warn!(error = %e, "failed to abort merge");
        }
    }

    fn resolve_all(
        &self,
        target_id: &str,
        source_id: &str,
        store: Option<&ResolutionStore>,
        report: &mut MergeReport,
    ) -> Result<(), CoreError> {
        let base_id = self.vcs.merge_base(target_id, source_id)?;
        let paths = self.vcs.conflicted_paths()?;
        info!(count = paths.len(), "resolving conflicted paths");

        for path in paths {
            let base = match &base_id {
                Some(id) => self.vcs.read_blob(id, &path)?,
                None => None,
            };
            let ours = self.vcs.read_blob(target_id, &path)?;
            let theirs = self.vcs.read_blob(source_id, &path)?;

            let outcome = merge_file(
                base.as_deref(),
                ours.as_deref(),
                theirs.as_deref(),
                self.options.policy(),
            )?;
            match outcome {
                FileOutcome::Merged(content) => {
                    debug!(%path, "edits commute");
                    self.vcs.write_and_stage(&path, &content)?;
                    report.resolved.push(path);
                }
                FileOutcome::Deleted => {
                    debug!(%path, "file removed");
                    self.vcs.stage_removal(&path)?;
                    report.deleted.push(path);
                }
                FileOutcome::Unresolved(reason) => {
                    let replayed = match (store, ours.as_deref(), theirs.as_deref()) {
                        (Some(store), Some(ours), Some(theirs)) if replayable(reason) => {
                            replay_resolutions(
                                &self.options.reconstructor,
                                store,
                                base.as_deref().unwrap_or_default(),
                                ours,
                                theirs,
                                &path,
                            )?
                        }
                        _ => None,
                    };
                    match replayed {
                        Some(content) => {
                            self.vcs.write_and_stage(&path, &content)?;
                            report.replayed.push(path);
                        }
                        None => {
                            info!(%path, %reason, "left unresolved");
                            report.unresolved.push(UnresolvedFile { path, reason });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn replayable(reason: UnresolvedReason) -> bool {
    matches!(
        reason,
        UnresolvedReason::EditsConflict | UnresolvedReason::AddedDifferently
    )
}
