//! Syntax tree traversal without recursion.
//!
//! Deeply nested input (generated code, long builder chains) must not be able
//! to exhaust the call stack, so every walk keeps its own explicit stack.

use tree_sitter::Node;

/// Pre-order iterator over the named nodes of a subtree.
///
/// Children of the most recently yielded node are expanded lazily, which lets
/// callers prune with [`Preorder::skip_subtree`]:
///
/// ```rust,ignore
/// let mut walk = Preorder::new(root);
/// while let Some(node) = walk.next() {
///     if node.kind() == "function_item" {
///         walk.skip_subtree();
///     }
/// }
/// ```
pub struct Preorder<'tree> {
    stack: Vec<Node<'tree>>,
    pending: Option<Node<'tree>>,
}

impl<'tree> Preorder<'tree> {
    pub fn new(root: Node<'tree>) -> Self {
        Self {
            stack: vec![root],
            pending: None,
        }
    }

    /// Do not descend into the node returned by the last call to `next`.
    pub fn skip_subtree(&mut self) {
        self.pending = None;
    }
}

impl<'tree> Iterator for Preorder<'tree> {
    type Item = Node<'tree>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(parent) = self.pending.take() {
            let mut cursor = parent.walk();
            let children: Vec<Node<'tree>> = parent.named_children(&mut cursor).collect();
            self.stack.extend(children.into_iter().rev());
        }
        let node = self.stack.pop()?;
        self.pending = Some(node);
        Some(node)
    }
}

/// Named children of `node`, in source order.
pub fn named_children<'tree>(node: Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children of `node` including anonymous tokens such as keywords.
pub fn all_children<'tree>(node: Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Nearest ancestor whose kind is in `targets`.
///
/// The search stops with None at the first ancestor whose kind is in
/// `barriers`, so a method inside a closure or nested function is not
/// attributed to an outer type.
pub fn enclosing<'tree>(
    node: Node<'tree>,
    targets: &[&str],
    barriers: &[&str],
) -> Option<Node<'tree>> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        let kind = ancestor.kind();
        if targets.contains(&kind) {
            return Some(ancestor);
        }
        if barriers.contains(&kind) {
            return None;
        }
        current = ancestor.parent();
    }
    None
}

/// Descendants of `node` (excluding `node`) whose kind is in `kinds`.
///
/// Matching nodes are not searched further.
pub fn descendants_of_kind<'tree>(node: Node<'tree>, kinds: &[&str]) -> Vec<Node<'tree>> {
    let mut found = Vec::new();
    let mut walk = Preorder::new(node);
    walk.next();
    while let Some(current) = walk.next() {
        if kinds.contains(&current.kind()) {
            found.push(current);
            walk.skip_subtree();
        }
    }
    found
}
