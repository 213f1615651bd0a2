//! Recording and replaying hunk resolutions.
//!
//! Recording turns (base, ours, theirs, human-resolved file) into one
//! [`RecordedHunk`] per conflict hunk. Replay goes the other way: given the
//! three blobs and a store, it rebuilds the resolved file if every hunk has a
//! stored resolution.

use tracing::{debug, info};

use crate::errors::ConflictError;

use super::extract::extract_resolutions;
use super::key::ResolutionKey;
use super::markers::{parse_hunks_with_marker_size, Hunk};
use super::reconstruct::{Reconstruction, Reconstructor};
use super::store::ResolutionStore;

/// A hunk's key together with the text the human chose for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedHunk {
    pub key: ResolutionKey,
    pub resolution: Vec<u8>,
}

/// Rebuild the conflict text and parse its hunks.
///
/// Returns `None` when the backend merges cleanly or emits no hunks.
fn conflict_hunks(
    reconstructor: &Reconstructor,
    base: &[u8],
    ours: &[u8],
    theirs: &[u8],
) -> Result<Option<(Vec<u8>, Vec<Hunk>)>, ConflictError> {
    let text = match reconstructor.reconstruct(base, ours, theirs)? {
        Reconstruction::Clean(_) => return Ok(None),
        Reconstruction::Conflicted(text) => text,
    };
    let hunks = parse_hunks_with_marker_size(&text, reconstructor.marker_size);
    if hunks.is_empty() {
        return Ok(None);
    }
    Ok(Some((text, hunks)))
}

/// Derive the key and resolution of every hunk in the conflict between
/// `ours` and `theirs`, as resolved by a human in `resolved`.
///
/// Fails with [`ConflictError::NoHunks`] when the sides do not conflict.
pub fn record_resolutions(
    reconstructor: &Reconstructor,
    base: &[u8],
    ours: &[u8],
    theirs: &[u8],
    resolved: &[u8],
    path: &str,
) -> Result<Vec<RecordedHunk>, ConflictError> {
    let (text, hunks) =
        conflict_hunks(reconstructor, base, ours, theirs)?.ok_or(ConflictError::NoHunks)?;
    info!(path, hunks = hunks.len(), "recording resolutions");

    let resolutions = extract_resolutions(&text, resolved, &hunks)?;
    Ok(hunks
        .iter()
        .zip(resolutions)
        .map(|(hunk, resolution)| RecordedHunk {
            key: ResolutionKey::for_hunk(hunk, path),
            resolution: resolution.to_vec(),
        })
        .collect())
}

/// Resolve the conflict between `ours` and `theirs` from stored resolutions.
///
/// Returns `None` unless every hunk has an entry in `store`.
pub fn replay_resolutions(
    reconstructor: &Reconstructor,
    store: &ResolutionStore,
    base: &[u8],
    ours: &[u8],
    theirs: &[u8],
    path: &str,
) -> Result<Option<Vec<u8>>, ConflictError> {
    let Some((text, hunks)) = conflict_hunks(reconstructor, base, ours, theirs)? else {
        return Ok(None);
    };

    let mut out = Vec::with_capacity(text.len());
    let mut cursor = 0;
    for hunk in &hunks {
        let key = ResolutionKey::for_hunk(hunk, path);
        let Some(resolution) = store.get(&key)? else {
            debug!(path, %key, "no stored resolution for hunk");
            return Ok(None);
        };
        out.extend_from_slice(&text[cursor..hunk.start]);
        out.extend_from_slice(&resolution);
        cursor = hunk.end;
    }
    out.extend_from_slice(&text[cursor..]);

    info!(path, hunks = hunks.len(), "replayed stored resolutions");
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &[u8] = b"head\noriginal\nmiddle\nsecond\ntail\n";
    const OURS: &[u8] = b"head\nours one\nmiddle\nours two\ntail\n";
    const THEIRS: &[u8] = b"head\ntheirs one\nmiddle\ntheirs two\ntail\n";
    const RESOLVED: &[u8] = b"head\nmerged one\nmiddle\nours two\ntail\n";

    #[test]
    fn test_record_two_hunks() {
        let recorded =
            record_resolutions(&Reconstructor::default(), BASE, OURS, THEIRS, RESOLVED, "f.txt")
                .unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].resolution, b"merged one\n");
        assert_eq!(recorded[1].resolution, b"ours two\n");
        assert_ne!(recorded[0].key, recorded[1].key);
    }

    #[test]
    fn test_record_without_conflict_is_an_error() {
        let err = record_resolutions(&Reconstructor::default(), BASE, OURS, BASE, OURS, "f.txt")
            .unwrap_err();
        assert!(matches!(err, ConflictError::NoHunks));
    }

    #[test]
    fn test_replay_reverse_direction() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResolutionStore::open(dir.path()).unwrap();
        let reconstructor = Reconstructor::default();
        for hunk in record_resolutions(&reconstructor, BASE, OURS, THEIRS, RESOLVED, "f.txt").unwrap() {
            store.put(&hunk.key, &hunk.resolution).unwrap();
        }

        let replayed = replay_resolutions(&reconstructor, &store, BASE, THEIRS, OURS, "f.txt").unwrap();
        assert_eq!(replayed.as_deref(), Some(RESOLVED));
    }

    #[test]
    fn test_replay_requires_every_hunk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResolutionStore::open(dir.path()).unwrap();
        let reconstructor = Reconstructor::default();
        let recorded =
            record_resolutions(&reconstructor, BASE, OURS, THEIRS, RESOLVED, "f.txt").unwrap();
        store.put(&recorded[0].key, &recorded[0].resolution).unwrap();

        let replayed = replay_resolutions(&reconstructor, &store, BASE, OURS, THEIRS, "f.txt").unwrap();
        assert!(replayed.is_none());
    }

    #[test]
    fn test_replay_is_path_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResolutionStore::open(dir.path()).unwrap();
        let reconstructor = Reconstructor::default();
        for hunk in record_resolutions(&reconstructor, BASE, OURS, THEIRS, RESOLVED, "a.txt").unwrap() {
            store.put(&hunk.key, &hunk.resolution).unwrap();
        }
        let replayed = replay_resolutions(&reconstructor, &store, BASE, OURS, THEIRS, "b.txt").unwrap();
        assert!(replayed.is_none());
    }

    #[test]
    fn test_unterminated_last_line_round_trips_on_both_backends() {
        use crate::conflict::MergeBackend;

        let git_available = std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        let mut backends = vec![MergeBackend::Diffy];
        if git_available {
            backends.push(MergeBackend::Git);
        }

        for backend in backends {
            let reconstructor = Reconstructor::new(backend, 7);
            let recorded =
                record_resolutions(&reconstructor, b"a\nb", b"a\nB", b"a\nY", b"a\nB", "f")
                    .unwrap();
            assert_eq!(recorded.len(), 1, "{backend}");
            assert_eq!(recorded[0].resolution, b"B", "{backend}");

            let dir = tempfile::tempdir().unwrap();
            let store = ResolutionStore::open(dir.path()).unwrap();
            store.put(&recorded[0].key, &recorded[0].resolution).unwrap();
            let replayed =
                replay_resolutions(&reconstructor, &store, b"a\nb", b"a\nY", b"a\nB", "f")
                    .unwrap();
            assert_eq!(replayed.as_deref(), Some(&b"a\nB"[..]), "{backend}");
        }
    }
}
