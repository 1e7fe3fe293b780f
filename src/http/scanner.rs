//! Byte sequence search over a bounded region of a buffer.

/// Line terminator mandated by HTTP/1.1.
pub const CRLF: &[u8] = b"\r\n";

/// Blank line separating the header block from the body.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Finds the first occurrence of `target` in `buf[start..end]`.
///
/// Returns the absolute index into `buf` of the first byte of the match.
/// `end` is exclusive and clamped to `buf.len()`. A window shorter than
/// `target`, or an empty `target`, never matches.
///
/// # Example
///
/// ```
/// # use rawhttp::http::scanner::find_sequence;
/// let buf = b"GET / HTTP/1.1\r\n\r\n";
/// assert_eq!(find_sequence(buf, b"\r\n", 0, buf.len()), Some(14));
/// assert_eq!(find_sequence(buf, b"\r\n", 0, 15), None);
/// ```
pub fn find_sequence(buf: &[u8], target: &[u8], start: usize, end: usize) -> Option<usize> {
    let end = end.min(buf.len());
    if target.is_empty() || start >= end || end - start < target.len() {
        return None;
    }

    buf[start..end]
        .windows(target.len())
        .position(|w| w == target)
        .map(|i| start + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_lowest_index() {
        let buf = b"a\r\nb\r\nc";
        assert_eq!(find_sequence(buf, CRLF, 0, buf.len()), Some(1));
        assert_eq!(find_sequence(buf, CRLF, 2, buf.len()), Some(4));
    }

    #[test]
    fn match_must_fit_inside_window() {
        let buf = b"abc\r\n";
        assert_eq!(find_sequence(buf, CRLF, 0, 4), None);
        assert_eq!(find_sequence(buf, CRLF, 0, 5), Some(3));
    }
}
