//! diff3-style conflict-marker parsing.
//!
//! Recognises blocks of the form
//!
//! ```text
//! <<<<<<< ours
//! ...
//! ||||||| base        (optional)
//! ...
//! =======
//! ...
//! >>>>>>> theirs
//! ```
//!
//! where every marker occupies a whole line.

use crate::text::{split_lines, trim_line_end};

/// Default conflict marker length used by git and diffy.
pub const DEFAULT_MARKER_SIZE: usize = 7;

/// One conflict region of a conflict-marker text.
///
/// `start..end` is the byte span of the whole block, from the first byte of
/// the opening marker line to the end of the closing marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub start: usize,
    pub end: usize,
    pub ours: Vec<u8>,
    /// Empty when the block has no `|||||||` section.
    pub base: Vec<u8>,
    pub theirs: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Open,
    Base,
    Separator,
    Close,
}

#[derive(Debug, Clone, Copy)]
enum Scan {
    Outside,
    Ours { start: usize, body: usize },
    Base { start: usize, ours: (usize, usize), body: usize },
    Theirs { start: usize, ours: (usize, usize), base: (usize, usize), body: usize },
}

fn classify(line: &[u8], size: usize) -> Option<Marker> {
    let line = trim_line_end(line);
    let run = |ch: u8| {
        line.len() >= size
            && line[..size].iter().all(|&b| b == ch)
            && (line.len() == size || line[size] == b' ')
    };
    if run(b'<') {
        Some(Marker::Open)
    } else if run(b'|') {
        Some(Marker::Base)
    } else if line.len() == size && line.iter().all(|&b| b == b'=') {
        Some(Marker::Separator)
    } else if run(b'>') {
        Some(Marker::Close)
    } else {
        None
    }
}

/// Parse all conflict hunks using the default marker length.
pub fn parse_hunks(content: &[u8]) -> Vec<Hunk> {
    parse_hunks_with_marker_size(content, DEFAULT_MARKER_SIZE)
}

/// Parse all conflict hunks, in file order.
///
/// A block that is still open when the content ends is dropped. Callers
/// decide whether an empty result is an error.
pub fn parse_hunks_with_marker_size(content: &[u8], marker_size: usize) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut state = Scan::Outside;
    let mut offset = 0;

    for line in split_lines(content) {
        let line_start = offset;
        offset += line.len();

        state = match (state, classify(line, marker_size)) {
            (Scan::Outside, Some(Marker::Open)) => Scan::Ours {
                start: line_start,
                body: offset,
            },
            (Scan::Ours { start, body }, Some(Marker::Base)) => Scan::Base {
                start,
                ours: (body, line_start),
                body: offset,
            },
            (Scan::Ours { start, body }, Some(Marker::Separator)) => Scan::Theirs {
                start,
                ours: (body, line_start),
                base: (line_start, line_start),
                body: offset,
            },
            (Scan::Base { start, ours, body }, Some(Marker::Separator)) => Scan::Theirs {
                start,
                ours,
                base: (body, line_start),
                body: offset,
            },
            (Scan::Theirs { start, ours, base, body }, Some(Marker::Close)) => {
                hunks.push(Hunk {
                    start,
                    end: offset,
                    ours: content[ours.0..ours.1].to_vec(),
                    base: content[base.0..base.1].to_vec(),
                    theirs: content[body..line_start].to_vec(),
                });
                Scan::Outside
            }
            (state, _) => state,
        };
    }

    hunks
}
