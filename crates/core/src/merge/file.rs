//! Whole-file three-way merge.
//!
//! Combines the presence rules for added and deleted files with the
//! edit-script / commute / synthesize pipeline for files present on all
//! three sides.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::MergeError;
use crate::text::{is_binary, split_lines};

use super::commute::{commute, CommutePolicy};
use super::edit::{edit_script, Side};
use super::synth::synthesize;

/// Why a file could not be merged automatically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Both sides changed overlapping base lines.
    EditsConflict,
    /// Both sides added the file with different content.
    AddedDifferently,
    /// One side deleted the file, the other modified it.
    DeletedVsModified,
    /// At least one version is binary.
    Binary,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EditsConflict => write!(f, "edits do not commute"),
            Self::AddedDifferently => write!(f, "added differently on both sides"),
            Self::DeletedVsModified => write!(f, "deleted vs modified"),
            Self::Binary => write!(f, "binary content"),
        }
    }
}

/// Result of merging one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The merged content to write.
    Merged(Vec<u8>),
    /// The file should not exist after the merge.
    Deleted,
    /// Left for a human.
    Unresolved(UnresolvedReason),
}

/// Merge one file given its content on each side (`None` = absent).
pub fn merge_file(
    base: Option<&[u8]>,
    ours: Option<&[u8]>,
    theirs: Option<&[u8]>,
    policy: CommutePolicy,
) -> Result<FileOutcome, MergeError> {
    Ok(match (base, ours, theirs) {
        (_, None, None) => FileOutcome::Deleted,
        (None, Some(side), None) | (None, None, Some(side)) => FileOutcome::Merged(side.to_vec()),
        (None, Some(o), Some(t)) if o == t => FileOutcome::Merged(o.to_vec()),
        (None, Some(_), Some(_)) => FileOutcome::Unresolved(UnresolvedReason::AddedDifferently),
        (Some(b), None, Some(kept)) | (Some(b), Some(kept), None) => {
            if kept == b {
                FileOutcome::Deleted
            } else {
                FileOutcome::Unresolved(UnresolvedReason::DeletedVsModified)
            }
        }
        (Some(b), Some(o), Some(t)) => merge_contents(b, o, t, policy)?,
    })
}

fn merge_contents(
    base: &[u8],
    ours: &[u8],
    theirs: &[u8],
    policy: CommutePolicy,
) -> Result<FileOutcome, MergeError> {
    if ours == theirs || theirs == base {
        return Ok(FileOutcome::Merged(ours.to_vec()));
    }
    if ours == base {
        return Ok(FileOutcome::Merged(theirs.to_vec()));
    }
    if is_binary(base) || is_binary(ours) || is_binary(theirs) {
        return Ok(FileOutcome::Unresolved(UnresolvedReason::Binary));
    }

    let base_lines = split_lines(base);
    let ours_edits = edit_script(Side::Ours, &base_lines, &split_lines(ours));
    let theirs_edits = edit_script(Side::Theirs, &base_lines, &split_lines(theirs));
    debug!(
        ours = ours_edits.len(),
        theirs = theirs_edits.len(),
        "computed edit scripts"
    );

    match commute(&ours_edits, &theirs_edits, policy) {
        Some(edits) => Ok(FileOutcome::Merged(synthesize(&base_lines, &edits)?)),
        None => Ok(FileOutcome::Unresolved(UnresolvedReason::EditsConflict)),
    }
}
