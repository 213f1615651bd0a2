//! Conflict hunks and their recorded resolutions.
//!
//! The conflict subsystem is responsible for:
//! 1. **Reconstruction** -- regenerating diff3 conflict text from three blobs.
//! 2. **Parsing** -- locating conflict hunks in that text.
//! 3. **Extraction** -- slicing a human-resolved file into per-hunk resolutions.
//! 4. **Storage** -- keying resolutions by content and persisting them for replay.

pub mod extract;
pub mod key;
pub mod markers;
pub mod reconstruct;
pub mod resolver;
pub mod store;

pub use extract::extract_resolutions;
pub use key::{ResolutionKey, KEY_LEN};
pub use markers::{parse_hunks, parse_hunks_with_marker_size, Hunk, DEFAULT_MARKER_SIZE};
pub use reconstruct::{MergeBackend, Reconstruction, Reconstructor};
pub use resolver::{record_resolutions, replay_resolutions, RecordedHunk};
pub use store::{PutOutcome, ResolutionStore};
