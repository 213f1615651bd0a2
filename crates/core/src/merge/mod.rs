//! Commuting three-way merge.
//!
//! The merge subsystem decides whether two diverging edits of a file can be
//! combined without a human:
//! 1. **Edit scripts** -- diff each side against the base, line by line.
//! 2. **Commutation** -- check that no pair of edits touches the same lines.
//! 3. **Synthesis** -- apply the combined edits to the base in one pass.

pub mod commute;
pub mod edit;
pub mod file;
pub mod synth;

pub use commute::{commute, CommutePolicy};
pub use edit::{edit_script, Edit, EditKind, Side};
pub use file::{merge_file, FileOutcome, UnresolvedReason};
pub use synth::synthesize;
