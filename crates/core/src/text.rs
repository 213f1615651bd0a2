//! Byte-level text helpers shared by the merge and conflict subsystems.

/// Number of leading bytes inspected when sniffing for binary content.
const BINARY_SNIFF_LEN: usize = 8000;

/// Split `content` into lines, each keeping its own `\n` terminator.
///
/// A final line without a terminator is returned as-is. Empty content yields
/// no lines.
pub fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    content.split_inclusive(|&b| b == b'\n').collect()
}

/// Strip a trailing `\n` (and a preceding `\r`, if any) from a line.
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Find the first occurrence of `needle` in `haystack` at or after `from`.
///
/// An empty needle matches at `from`.
pub fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    memchr::memmem::find(&haystack[from..], needle).map(|pos| pos + from)
}

/// Heuristic binary check: a NUL byte within the first 8000 bytes.
pub fn is_binary(content: &[u8]) -> bool {
    content.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_keeps_terminators() {
        let lines = split_lines(b"a\nb\r\nc");
        assert_eq!(lines, vec![&b"a\n"[..], &b"b\r\n"[..], &b"c"[..]]);
        assert!(split_lines(b"").is_empty());
        assert_eq!(split_lines(b"\n\n").len(), 2);
    }

    #[test]
    fn test_trim_line_end() {
        assert_eq!(trim_line_end(b"=======\n"), b"=======");
        assert_eq!(trim_line_end(b"=======\r\n"), b"=======");
        assert_eq!(trim_line_end(b"tail"), b"tail");
    }

    #[test]
    fn test_find_from() {
        let hay = b"one two one";
        assert_eq!(find_from(hay, b"one", 0), Some(0));
        assert_eq!(find_from(hay, b"one", 1), Some(8));
        assert_eq!(find_from(hay, b"three", 0), None);
        assert_eq!(find_from(hay, b"", 4), Some(4));
        assert_eq!(find_from(hay, b"one", 99), None);
        assert_eq!(find_from(hay, b"", 11), Some(11));
    }

    #[test]
    fn test_find_from_large_anchor() {
        let line = b"let value = compute(input);\n";
        let mut hay = line.repeat(20_000);
        let anchor = b"unique tail\n".to_vec();
        hay.extend_from_slice(&anchor);
        let needle = [&line.repeat(500)[..], &anchor[..]].concat();

        let expected = hay.len() - needle.len();
        assert_eq!(find_from(&hay, &needle, 0), Some(expected));
        assert_eq!(find_from(&hay, &needle, expected + 1), None);
    }

    #[test]
    fn test_is_binary() {
        assert!(!is_binary(b"plain text\n"));
        assert!(is_binary(b"PNG\0\x01\x02"));
    }
}
