//! Line-granularity edit scripts.
//!
//! An edit script describes how one version of a file differs from the common
//! base as a list of non-overlapping [`Edit`]s, each replacing a half-open
//! range of base lines with new lines. Unchanged spans are implicit.

use std::fmt;

use similar::algorithms::{myers, Capture, Replace};
use similar::DiffTag;

/// Which version of the file produced an edit.
///
/// `Ours` orders before `Theirs`; the ordering is only used to break ties
/// when sorting combined edit lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Ours,
    Theirs,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Theirs => write!(f, "theirs"),
        }
    }
}

/// Shape of a single edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Zero-width base range, non-empty replacement.
    Insert,
    /// Non-empty base range, empty replacement.
    Delete,
    /// Non-empty base range, non-empty replacement.
    Replace,
}

impl EditKind {
    /// Whether the edit consumes base lines (delete or replace).
    pub fn consumes_base(self) -> bool {
        matches!(self, Self::Delete | Self::Replace)
    }

    /// Sort rank at a shared base position: inserts go first.
    pub(crate) fn rank(self) -> u8 {
        match self {
            Self::Insert => 0,
            Self::Delete | Self::Replace => 1,
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Delete => write!(f, "delete"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// One contiguous change against the base.
///
/// `base_start..base_end` indexes base lines, not bytes. `new_lines` borrow
/// from the modified version and keep their terminators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit<'a> {
    pub side: Side,
    pub kind: EditKind,
    pub base_start: usize,
    pub base_end: usize,
    pub new_lines: Vec<&'a [u8]>,
}

impl Edit<'_> {
    /// Number of base lines the edit consumes.
    pub fn base_len(&self) -> usize {
        self.base_end - self.base_start
    }
}

/// Compute the edit script turning `base` into `other`.
///
/// Every line takes part in the alignment: there is no popularity-based junk
/// filtering, since source and config files are full of short repeated lines.
/// Adjacent delete/insert pairs are folded into replacements, but the ops are
/// not compacted, so consecutive edits never overlap in the base.
pub fn edit_script<'a>(side: Side, base: &[&'a [u8]], other: &[&'a [u8]]) -> Vec<Edit<'a>> {
    let mut hook = Replace::new(Capture::new());
    if let Err(never) = myers::diff(&mut hook, base, 0..base.len(), other, 0..other.len()) {
        match never {}
    }

    hook.into_inner()
        .into_ops()
        .iter()
        .filter_map(|op| {
            let (tag, old, new) = op.as_tag_tuple();
            let kind = match tag {
                DiffTag::Equal => return None,
                DiffTag::Insert => EditKind::Insert,
                DiffTag::Delete => EditKind::Delete,
                DiffTag::Replace => EditKind::Replace,
            };
            Some(Edit {
                side,
                kind,
                base_start: old.start,
                base_end: old.end,
                new_lines: other[new].to_vec(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::synth::synthesize;
    use crate::text::split_lines;

    fn script<'a>(base: &'a [u8], other: &'a [u8]) -> Vec<Edit<'a>> {
        edit_script(Side::Ours, &split_lines(base), &split_lines(other))
    }

    #[test]
    fn test_identical_versions_produce_no_edits() {
        assert!(script(b"a\nb\nc\n", b"a\nb\nc\n").is_empty());
        assert!(script(b"", b"").is_empty());
    }

    #[test]
    fn test_single_replace() {
        let edits = script(b"a\nb\nc\n", b"a\nB\nc\n");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].kind, EditKind::Replace);
        assert_eq!((edits[0].base_start, edits[0].base_end), (1, 2));
        assert_eq!(edits[0].new_lines, vec![&b"B\n"[..]]);
    }

    #[test]
    fn test_insert_has_zero_width_range() {
        let edits = script(b"a\nb\n", b"a\nb\nx\n");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].kind, EditKind::Insert);
        assert_eq!(edits[0].base_start, 2);
        assert_eq!(edits[0].base_end, 2);
        assert_eq!(edits[0].base_len(), 0);
    }

    #[test]
    fn test_delete_has_empty_replacement() {
        let edits = script(b"a\nb\nc\n", b"a\nc\n");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].kind, EditKind::Delete);
        assert_eq!((edits[0].base_start, edits[0].base_end), (1, 2));
        assert!(edits[0].new_lines.is_empty());
    }

    #[test]
    fn test_repeated_short_lines_are_all_matchable() {
        let base = b"}\n}\n}\n}\n}\n}\n}\n}\n";
        let other = b"}\n}\n}\n}\nx\n}\n}\n}\n}\n";
        let edits = script(base, other);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].kind, EditKind::Insert);
    }

    #[test]
    fn test_edits_are_ordered_and_disjoint() {
        let edits = script(b"1\n2\n3\n4\n5\n6\n", b"0\n1\nX\n3\n5\n6\n7\n");
        for pair in edits.windows(2) {
            assert!(pair[0].base_end <= pair[1].base_start);
        }
    }

    #[test]
    fn test_round_trip_reconstructs_other() {
        let cases: &[(&[u8], &[u8])] = &[
            (b"a\nb\nc\n", b"a\nB\nc\n"),
            (b"a\nb\nc\n", b""),
            (b"", b"new\nfile\n"),
            (b"a\nb\nc", b"a\nb\nc\n"),
            (b"x\ny\nz\n", b"z\ny\nx\n"),
            (b"fn main() {\n}\n", b"// header\nfn main() {\n    run();\n}\n"),
            (b"a\r\nb\r\n", b"a\r\nc\r\nb\r\n"),
            (b"x\nc\nx\nx\nb\n}\n", b"a\n}\nc\n}\n}\nc\n"),
        ];
        for (base, other) in cases {
            let base_lines = split_lines(base);
            let edits = edit_script(Side::Theirs, &base_lines, &split_lines(other));
            let rebuilt = synthesize(&base_lines, &edits).unwrap();
            assert_eq!(&rebuilt[..], *other);
        }
    }

    /// Small deterministic generator so the cases below are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: usize) -> usize {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize) % bound
        }

        /// Up to seven lines drawn from a tiny alphabet, so repeats are common.
        fn text(&mut self) -> Vec<u8> {
            const ALPHABET: [&[u8]; 5] = [b"x\n", b"c\n", b"}\n", b"a\n", b"b\n"];
            let mut out = Vec::new();
            for _ in 0..self.next(8) {
                out.extend_from_slice(ALPHABET[self.next(ALPHABET.len())]);
            }
            out
        }
    }

    #[test]
    fn test_generated_scripts_are_disjoint_and_round_trip() {
        let mut rng = Lcg(0x5eed);
        for _ in 0..5_000 {
            let base = rng.text();
            let other = rng.text();
            let base_lines = split_lines(&base);
            let edits = edit_script(Side::Ours, &base_lines, &split_lines(&other));

            for edit in &edits {
                assert!(edit.base_start <= edit.base_end && edit.base_end <= base_lines.len());
            }
            for pair in edits.windows(2) {
                assert!(
                    pair[0].base_end <= pair[1].base_start,
                    "overlapping edits for {:?} -> {:?}: {:?}",
                    String::from_utf8_lossy(&base),
                    String::from_utf8_lossy(&other),
                    edits
                );
            }
            let rebuilt = synthesize(&base_lines, &edits).unwrap();
            assert_eq!(rebuilt, other);
        }
    }
}
