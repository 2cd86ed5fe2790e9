//! Bounds-checked helpers for reading text out of syntax nodes.

use tree_sitter::Node;

use crate::error::{KgError, Result};

/// Safely slice a byte buffer, returning None if the range is invalid.
///
/// # Example
/// ```rust
/// use codekg::common::safe_slice;
/// assert_eq!(safe_slice(b"hello world", 0, 5), Some(&b"hello"[..]));
/// assert_eq!(safe_slice(b"hello", 3, 10), None);
/// ```
pub fn safe_slice(source: &[u8], start: usize, end: usize) -> Option<&[u8]> {
    if start <= end && end <= source.len() {
        Some(&source[start..end])
    } else {
        None
    }
}

/// Source text covered by a node.
///
/// Fails if the node's byte range lies outside `source` or splits a
/// multi-byte character, which would otherwise panic on slicing.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> Result<&'a str> {
    let (start, end) = (node.start_byte(), node.end_byte());
    let bytes = safe_slice(source.as_bytes(), start, end).ok_or_else(|| KgError::NodeOutOfBounds {
        kind: node.kind().to_string(),
        line: start_line(node),
    })?;
    std::str::from_utf8(bytes).map_err(|_| KgError::InvalidUtf8 {
        kind: node.kind().to_string(),
        line: start_line(node),
    })
}

/// 1-indexed first line of a node.
pub fn start_line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// 1-indexed last line of a node.
pub fn end_line(node: Node<'_>) -> usize {
    node.end_position().row + 1
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
