//! Flat, append-only directory of resolutions keyed by [`ResolutionKey`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::StoreError;

use super::key::ResolutionKey;

/// What [`ResolutionStore::put`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new entry was written.
    Written,
    /// An identical entry already existed.
    Unchanged,
    /// A different entry already existed and was left in place.
    KeptExisting,
}

/// One file per key in a single directory.
#[derive(Debug, Clone)]
pub struct ResolutionStore {
    root: PathBuf,
}

impl ResolutionStore {
    /// Open (creating if needed) the store rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened resolution store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry for `key`.
    pub fn entry_path(&self, key: &ResolutionKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    pub fn contains(&self, key: &ResolutionKey) -> bool {
        self.entry_path(key).is_file()
    }

    /// Read the stored resolution for `key`, if any.
    pub fn get(&self, key: &ResolutionKey) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.entry_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store `content` under `key`.
    ///
    /// Entries are never overwritten. New entries are written to a temporary
    /// file in the store directory and renamed into place.
    pub fn put(&self, key: &ResolutionKey, content: &[u8]) -> Result<PutOutcome, StoreError> {
        if let Some(existing) = self.get(key)? {
            if existing == content {
                debug!(%key, "resolution already stored");
                return Ok(PutOutcome::Unchanged);
            }
            warn!(%key, "a different resolution is already stored for this key; keeping it");
            return Ok(PutOutcome::KeptExisting);
        }

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.entry_path(key)).map_err(|e| e.error)?;
        info!(%key, bytes = content.len(), "stored resolution");
        Ok(PutOutcome::Written)
    }
}
