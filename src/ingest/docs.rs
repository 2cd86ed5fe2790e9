//! Documentation extraction: leading comments and docstrings.

use tree_sitter::Node;

use crate::common::{node_text, truncate_chars};
use crate::error::Result;

/// Maximum stored description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// How a language attaches comments to declarations.
pub struct CommentStyle {
    /// Node kinds that are comments
    pub comment_kinds: &'static [&'static str],
    /// Siblings allowed between the comment block and the declaration
    pub transparent_kinds: &'static [&'static str],
    /// Filter on raw comment text (e.g. only `///` in Rust)
    pub accept: fn(&str) -> bool,
}

fn accept_any(_: &str) -> bool {
    true
}

impl CommentStyle {
    pub const fn any(comment_kinds: &'static [&'static str]) -> Self {
        Self {
            comment_kinds,
            transparent_kinds: &[],
            accept: accept_any,
        }
    }
}

/// Contiguous block of comments directly above `anchor`, cleaned and capped.
///
/// A blank line between two comments, or between the last comment and the
/// declaration, ends the block.
pub fn leading_comment(
    anchor: Node<'_>,
    source: &str,
    style: &CommentStyle,
) -> Result<Option<String>> {
    let mut parts: Vec<&str> = Vec::new();
    let mut next_row = anchor.start_position().row;
    let mut sibling = anchor.prev_named_sibling();

    while let Some(node) = sibling {
        let kind = node.kind();
        if style.transparent_kinds.contains(&kind) {
            next_row = node.start_position().row;
            sibling = node.prev_named_sibling();
            continue;
        }
        if !style.comment_kinds.contains(&kind) {
            break;
        }
        // Some grammars include the trailing newline in line comments.
        let end = node.end_position();
        let end_row = if end.column == 0 && end.row > node.start_position().row {
            end.row - 1
        } else {
            end.row
        };
        if next_row > end_row + 1 {
            break;
        }
        let text = node_text(node, source)?;
        if !(style.accept)(text) {
            break;
        }
        parts.push(text);
        next_row = node.start_position().row;
        sibling = node.prev_named_sibling();
    }

    if parts.is_empty() {
        return Ok(None);
    }
    parts.reverse();
    let joined = parts
        .iter()
        .map(|raw| clean_comment(raw))
        .collect::<Vec<_>>()
        .join(" ");
    Ok(cap_description(&joined))
}

/// First string-literal statement of a body block (Python docstring).
pub fn docstring(body: Node<'_>, source: &str) -> Result<Option<String>> {
    let Some(first) = body.named_child(0) else {
        return Ok(None);
    };
    if first.kind() != "expression_statement" {
        return Ok(None);
    }
    match first.named_child(0) {
        Some(literal) if literal.kind() == "string" => {
            let raw = node_text(literal, source)?;
            Ok(cap_description(strip_quotes(raw)))
        }
        _ => Ok(None),
    }
}

/// Remove comment markers from every line of a raw comment.
pub fn clean_comment(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let line = line.trim();
            let line = line
                .strip_prefix("///")
                .or_else(|| line.strip_prefix("//!"))
                .or_else(|| line.strip_prefix("//"))
                .or_else(|| line.strip_prefix("/**"))
                .or_else(|| line.strip_prefix("/*!"))
                .or_else(|| line.strip_prefix("/*"))
                .or_else(|| line.strip_prefix('#'))
                .unwrap_or(line);
            let line = line.strip_suffix("*/").unwrap_or(line).trim();
            line.strip_prefix('*').unwrap_or(line).trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip string prefixes and quotes: `r"""x"""` -> `x`.
pub fn strip_quotes(raw: &str) -> &str {
    let body = raw.trim_start_matches(|c: char| {
        matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B' | 'f' | 'F')
    });
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    body
}

/// Collapse whitespace and cap at [`MAX_DESCRIPTION_CHARS`]; None when empty.
pub fn cap_description(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(truncate_chars(&collapsed, MAX_DESCRIPTION_CHARS).to_string())
    }
}
