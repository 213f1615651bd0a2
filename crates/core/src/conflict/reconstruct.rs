//! Regenerate conflict-marker text from base / ours / theirs blobs.
//!
//! Two three-way merge primitives are supported: the `diffy` crate in
//! process, or `git merge-file --diff3` as a subprocess. Both emit diff3-style
//! markers that [`parse_hunks_with_marker_size`](super::markers::parse_hunks_with_marker_size)
//! understands.

use std::borrow::Cow;
use std::fs;
use std::process::Command;

use diffy::{ConflictStyle, MergeOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConflictError;
use crate::text::split_lines;

use super::markers::DEFAULT_MARKER_SIZE;

/// Which three-way merge primitive produces the conflict text.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MergeBackend {
    /// In-process merge via `diffy`.
    #[default]
    Diffy,
    /// `git merge-file -p --diff3`.
    Git,
}

impl std::str::FromStr for MergeBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diffy" => Ok(Self::Diffy),
            "git" => Ok(Self::Git),
            other => Err(format!("unknown merge backend '{other}' (expected 'diffy' or 'git')")),
        }
    }
}

impl std::fmt::Display for MergeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diffy => write!(f, "diffy"),
            Self::Git => write!(f, "git"),
        }
    }
}

/// Output of a three-way merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconstruction {
    /// The sides merged without conflicts; no markers present.
    Clean(Vec<u8>),
    /// Merged text containing one or more conflict blocks.
    Conflicted(Vec<u8>),
}

/// Stateless conflict text generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconstructor {
    pub backend: MergeBackend,
    pub marker_size: usize,
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self {
            backend: MergeBackend::default(),
            marker_size: DEFAULT_MARKER_SIZE,
        }
    }
}

impl Reconstructor {
    pub fn new(backend: MergeBackend, marker_size: usize) -> Self {
        Self {
            backend,
            marker_size,
        }
    }

    /// Three-way merge `ours` and `theirs` against `base`, keeping diff3
    /// markers (with a base section) wherever the sides conflict.
    pub fn reconstruct(
        &self,
        base: &[u8],
        ours: &[u8],
        theirs: &[u8],
    ) -> Result<Reconstruction, ConflictError> {
        info!(backend = %self.backend, "reconstructing conflict text");
        match self.backend {
            MergeBackend::Diffy => Ok(self.reconstruct_diffy(base, ours, theirs)),
            MergeBackend::Git => self.reconstruct_git(base, ours, theirs),
        }
    }

    /// diffy glues markers onto a final line that has no terminator, so such
    /// inputs are terminated before merging. The terminator is taken off
    /// again when the merged text ends in an unconflicted line that one of
    /// the inputs left unterminated.
    fn reconstruct_diffy(&self, base: &[u8], ours: &[u8], theirs: &[u8]) -> Reconstruction {
        let unterminated: Vec<&[u8]> = [base, ours, theirs]
            .into_iter()
            .filter(|text| !text.is_empty() && !text.ends_with(b"\n"))
            .collect();
        if unterminated.is_empty() {
            return self.merge_diffy(base, ours, theirs);
        }

        debug!(inputs = unterminated.len(), "terminating final lines for diffy");
        let result = self.merge_diffy(&terminated(base), &terminated(ours), &terminated(theirs));
        match result {
            Reconstruction::Clean(text) => {
                Reconstruction::Clean(self.restore_tail(text, &unterminated))
            }
            Reconstruction::Conflicted(text) => {
                Reconstruction::Conflicted(self.restore_tail(text, &unterminated))
            }
        }
    }

    fn merge_diffy(&self, base: &[u8], ours: &[u8], theirs: &[u8]) -> Reconstruction {
        let mut options = MergeOptions::new();
        options
            .set_conflict_marker_length(self.marker_size)
            .set_conflict_style(ConflictStyle::Diff3);

        match options.merge_bytes(base, ours, theirs) {
            Ok(merged) => {
                debug!("diffy merged cleanly");
                Reconstruction::Clean(merged)
            }
            Err(conflicted) => {
                debug!("diffy produced conflict markers");
                Reconstruction::Conflicted(conflicted)
            }
        }
    }

    fn restore_tail(&self, mut text: Vec<u8>, unterminated: &[&[u8]]) -> Vec<u8> {
        let Some(body) = text.strip_suffix(b"\n") else {
            return text;
        };
        let last = split_lines(body).last().copied().unwrap_or_default();
        let closing = vec![b'>'; self.marker_size];
        if last.starts_with(&closing) {
            return text;
        }
        let matches_input = unterminated
            .iter()
            .any(|input| split_lines(input).last().copied() == Some(last));
        if matches_input {
            text.pop();
        }
        text
    }

    fn reconstruct_git(
        &self,
        base: &[u8],
        ours: &[u8],
        theirs: &[u8],
    ) -> Result<Reconstruction, ConflictError> {
        let dir = tempfile::tempdir()?;
        let ours_path = dir.path().join("ours");
        let base_path = dir.path().join("base");
        let theirs_path = dir.path().join("theirs");
        fs::write(&ours_path, ours)?;
        fs::write(&base_path, base)?;
        fs::write(&theirs_path, theirs)?;

        let marker_arg = format!("--marker-size={}", self.marker_size);
        let output = Command::new("git")
            .args(["merge-file", "-p", "--diff3", &marker_arg])
            .args(["-L", "ours", "-L", "base", "-L", "theirs"])
            .arg(&ours_path)
            .arg(&base_path)
            .arg(&theirs_path)
            .output()?;

        // Positive exit codes count conflicts; git caps them at 127.
        match output.status.code() {
            Some(0) => Ok(Reconstruction::Clean(output.stdout)),
            Some(code) if (1..=127).contains(&code) => {
                debug!(conflicts = code, "git merge-file produced conflict markers");
                Ok(Reconstruction::Conflicted(output.stdout))
            }
            code => Err(ConflictError::MergeTool {
                command: "git merge-file -p --diff3 <ours> <base> <theirs>".to_string(),
                exit_code: code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

fn terminated(text: &[u8]) -> Cow<'_, [u8]> {
    if text.is_empty() || text.ends_with(b"\n") {
        Cow::Borrowed(text)
    } else {
        let mut owned = text.to_vec();
        owned.push(b'\n');
        Cow::Owned(owned)
    }
}
