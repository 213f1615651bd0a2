//! Recover per-hunk resolutions from a human-edited file.
//!
//! The unconflicted text around each hunk in the original conflict text acts
//! as an anchor. Walking the resolved file once, each hunk's resolution is
//! whatever now sits between its before-anchor and its after-anchor.

use tracing::debug;

use crate::errors::{AnchorSide, ConflictError};
use crate::text::find_from;

use super::markers::Hunk;

/// Slice `resolved` into one resolution per hunk of `original`.
///
/// `hunks` must come from parsing `original`. Fails when an anchor cannot be
/// found in order, or when two hunks have no text between them.
pub fn extract_resolutions<'r>(
    original: &[u8],
    resolved: &'r [u8],
    hunks: &[Hunk],
) -> Result<Vec<&'r [u8]>, ConflictError> {
    let mut cursor = 0;
    let mut out = Vec::with_capacity(hunks.len());

    for (i, hunk) in hunks.iter().enumerate() {
        let prev_end = if i == 0 { 0 } else { hunks[i - 1].end };
        let before = &original[prev_end..hunk.start];
        if !before.is_empty() {
            let pos = find_from(resolved, before, cursor).ok_or(ConflictError::AnchorNotFound {
                hunk: i,
                anchor: AnchorSide::Before,
            })?;
            cursor = pos + before.len();
        }

        let is_last = i + 1 == hunks.len();
        let next_start = hunks.get(i + 1).map_or(original.len(), |next| next.start);
        let after = &original[hunk.end..next_start];

        let resolution = if after.is_empty() {
            if !is_last {
                return Err(ConflictError::AdjacentHunks { hunk: i });
            }
            let rest = &resolved[cursor..];
            cursor = resolved.len();
            rest
        } else {
            let pos = find_from(resolved, after, cursor).ok_or(ConflictError::AnchorNotFound {
                hunk: i,
                anchor: AnchorSide::After,
            })?;
            let slice = &resolved[cursor..pos];
            cursor = pos;
            slice
        };

        debug!(hunk = i, len = resolution.len(), "extracted resolution");
        out.push(resolution);
    }

    Ok(out)
}
