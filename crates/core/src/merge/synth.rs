//! Apply a sorted, commuting edit list to the base.

use crate::errors::MergeError;

use super::edit::Edit;

/// Build the merged content by walking `edits` over `base` with a cursor.
///
/// Base lines between edits are copied verbatim; each edit contributes its
/// `new_lines` and moves the cursor to its `base_end`. An edit starting
/// behind the cursor, or reaching past the end of the base, is an internal
/// error: the commutation check never produces such a list.
pub fn synthesize(base: &[&[u8]], edits: &[Edit<'_>]) -> Result<Vec<u8>, MergeError> {
    let mut out = Vec::with_capacity(base.iter().map(|l| l.len()).sum());
    let mut cursor = 0;

    for edit in edits {
        if edit.base_start < cursor || edit.base_end < edit.base_start || edit.base_end > base.len() {
            return Err(MergeError::InvariantViolation {
                cursor,
                base_start: edit.base_start,
                base_end: edit.base_end,
                base_len: base.len(),
            });
        }
        for line in &base[cursor..edit.base_start] {
            out.extend_from_slice(line);
        }
        for line in &edit.new_lines {
            out.extend_from_slice(line);
        }
        cursor = edit.base_end;
    }

    for line in &base[cursor..] {
        out.extend_from_slice(line);
    }
    Ok(out)
}
