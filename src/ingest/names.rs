//! Type-name normalisation shared by the relation extractors.

use tree_sitter::Node;

use crate::common::node_text;
use crate::error::Result;
use crate::ingest::walk::Preorder;

const PREFIX_WORDS: &[&str] = &["mut ", "dyn ", "impl ", "const "];

/// Base identifier of a written type reference.
///
/// Strips references, pointers, slices, variadics, lifetimes, generic
/// arguments and package or module qualifiers:
///
/// ```rust
/// use codekg::ingest::names::base_type_name;
/// assert_eq!(base_type_name("*models.Repo"), "Repo");
/// assert_eq!(base_type_name("&'a mut dyn crate::store::Store<K>"), "Store");
/// assert_eq!(base_type_name("List<String>"), "List");
/// assert_eq!(base_type_name("[]Item"), "Item");
/// ```
pub fn base_type_name(raw: &str) -> &str {
    let mut s = raw.trim();
    loop {
        let before = s.len();
        s = s.trim_start_matches(|c: char| c == '&' || c == '*' || c.is_whitespace());
        if let Some(rest) = s.strip_prefix("[]") {
            s = rest;
        }
        if let Some(rest) = s.strip_prefix("...") {
            s = rest;
        }
        if s.starts_with('\'') {
            s = s.split_once(char::is_whitespace).map(|(_, rest)| rest).unwrap_or("");
        }
        for word in PREFIX_WORDS {
            if let Some(rest) = s.strip_prefix(word) {
                s = rest;
            }
        }
        if s.len() == before {
            break;
        }
    }

    let end = s
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '$')))
        .unwrap_or(s.len());
    s[..end].rsplit(['.', ':']).next().unwrap_or("")
}

/// Type-name node kinds for grammars that give types their own identifier kind.
pub const TYPE_IDENTIFIERS: &[&str] = &["type_identifier"];
/// Python annotations are ordinary expressions.
pub const PYTHON_TYPE_NAMES: &[&str] = &["identifier"];

/// Qualified names; only their last segment names the type.
const QUALIFIED_KINDS: &[&str] = &[
    "scoped_type_identifier",
    "qualified_type",
    "nested_type_identifier",
    "attribute",
];

/// Type names referenced by a type node, including generic arguments.
///
/// `Map<String, List<Repo>>` yields `Map`, `String`, `List`, `Repo`. Only
/// nodes whose kind is in `kinds` count, qualified names contribute their
/// last segment, and parameter names inside function types are skipped.
pub fn type_references<'a>(
    type_node: Node<'_>,
    source: &'a str,
    kinds: &[&str],
) -> Result<Vec<&'a str>> {
    let mut names = Vec::new();
    let mut walk = Preorder::new(type_node);
    while let Some(node) = walk.next() {
        if QUALIFIED_KINDS.contains(&node.kind()) {
            walk.skip_subtree();
            let last = node
                .child_by_field_name("name")
                .or_else(|| node.child_by_field_name("attribute"))
                .or_else(|| node.named_child(node.named_child_count().saturating_sub(1)));
            if let Some(last) = last.filter(|n| kinds.contains(&n.kind())) {
                names.push(node_text(last, source)?);
            }
            continue;
        }
        if is_parameter_name(node) {
            walk.skip_subtree();
            continue;
        }
        if kinds.contains(&node.kind()) {
            names.push(node_text(node, source)?);
        }
    }
    Ok(names)
}

/// The `name` or `pattern` of a parameter, e.g. `ctx` in `func(ctx Ctx)`.
fn is_parameter_name(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    if !parent.kind().contains("parameter") {
        return false;
    }
    ["name", "pattern"]
        .iter()
        .any(|field| parent.child_by_field_name(field) == Some(node))
}

/// Leading-uppercase export convention (Go).
pub fn is_capitalized(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
