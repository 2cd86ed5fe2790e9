//! Rust extraction using tree-sitter-rust.
//!
//! Structs and unions are classes, traits are interfaces. Functions inside an
//! `impl` block belong to the implemented type; functions and signatures in a
//! trait body belong to the trait.

use tree_sitter::Node;

use crate::error::Result;
use crate::graph::EdgeRelation;
use crate::ingest::docs::{leading_comment, CommentStyle};
use crate::ingest::names::{base_type_name, type_references, TYPE_IDENTIFIERS};
use crate::ingest::walk::{enclosing, named_children, Preorder};
use crate::ingest::{
    Declaration, DeclarationKind, KnownNames, LanguageExtractor, ParsedFile, Relation,
};

/// Outer doc comments only: `///` and `/** */`, not `////` or `/***`.
fn is_doc_comment(text: &str) -> bool {
    (text.starts_with("///") && !text.starts_with("////"))
        || (text.starts_with("/**") && !text.starts_with("/***") && text != "/**/")
}

const DOCS: CommentStyle = CommentStyle {
    comment_kinds: &["line_comment", "block_comment"],
    transparent_kinds: &["attribute_item"],
    accept: is_doc_comment,
};

const OWNER_KINDS: &[&str] = &["impl_item", "trait_item", "function_item", "closure_expression"];

/// Extractor for Rust source files.
pub struct RustExtractor;

impl RustExtractor {
    fn is_public(node: Node<'_>) -> bool {
        named_children(node)
            .iter()
            .any(|c| c.kind() == "visibility_modifier")
    }

    fn type_kind(kind: &str) -> Option<DeclarationKind> {
        match kind {
            "struct_item" | "union_item" => Some(DeclarationKind::Class),
            "enum_item" => Some(DeclarationKind::Enum),
            "trait_item" => Some(DeclarationKind::Interface),
            "type_item" => Some(DeclarationKind::Type),
            _ => None,
        }
    }

    /// Base name of the implemented type: `impl<T> Store<T>` -> `Store`.
    fn impl_type<'a>(file: &'a ParsedFile, impl_item: Node<'_>) -> Result<Option<&'a str>> {
        Ok(file
            .field_text(impl_item, "type")?
            .map(base_type_name)
            .filter(|name| !name.is_empty()))
    }

    fn function_declaration(file: &ParsedFile, node: Node<'_>) -> Result<Option<Declaration>> {
        let Some(name) = file.field_text(node, "name")? else {
            return Ok(None);
        };
        let (kind, parent, exported) = match enclosing(node, OWNER_KINDS, &[]) {
            Some(owner) if owner.kind() == "impl_item" => {
                let Some(parent) = Self::impl_type(file, owner)? else {
                    return Ok(None);
                };
                (DeclarationKind::Method, Some(parent), Self::is_public(node))
            }
            Some(owner) if owner.kind() == "trait_item" => {
                let parent = file.field_text(owner, "name")?;
                (DeclarationKind::Method, parent, Self::is_public(owner))
            }
            // Nested in a function body or closure
            Some(_) => return Ok(None),
            None if node.kind() == "function_signature_item" => return Ok(None),
            None => (DeclarationKind::Function, None, Self::is_public(node)),
        };
        let description = leading_comment(node, file.source(), &DOCS)?;
        file.declaration(node, name, kind, exported, description, parent)
            .map(Some)
    }

    fn struct_relations(
        file: &ParsedFile,
        owner: &str,
        item: Node<'_>,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        let Some(body) = item.child_by_field_name("body") else {
            return Ok(());
        };
        match body.kind() {
            "field_declaration_list" => {
                for field in named_children(body) {
                    if field.kind() != "field_declaration" || !Self::is_public(field) {
                        continue;
                    }
                    if let Some(ty) = field.child_by_field_name("type") {
                        for referenced in type_references(ty, file.source(), TYPE_IDENTIFIERS)? {
                            known.relate(out, owner, referenced, EdgeRelation::Injects);
                        }
                    }
                }
            }
            "ordered_field_declaration_list" => {
                // Tuple struct: `pub struct Wrapper(pub Inner, Private);`
                let mut public = false;
                for child in named_children(body) {
                    match child.kind() {
                        "visibility_modifier" => public = true,
                        "attribute_item" | "line_comment" | "block_comment" => {}
                        _ => {
                            if public {
                                let referenced =
                                    type_references(child, file.source(), TYPE_IDENTIFIERS)?;
                                for referenced in referenced {
                                    known.relate(out, owner, referenced, EdgeRelation::Injects);
                                }
                            }
                            public = false;
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn impl_relations(
        file: &ParsedFile,
        item: Node<'_>,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        let Some(target) = Self::impl_type(file, item)? else {
            return Ok(());
        };
        if !known.contains(target) {
            return Ok(());
        }
        if let Some(trait_name) = file.field_text(item, "trait")? {
            known.relate(out, target, base_type_name(trait_name), EdgeRelation::Implements);
            return Ok(());
        }

        let Some(body) = item.child_by_field_name("body") else {
            return Ok(());
        };
        for func in named_children(body) {
            if func.kind() != "function_item" || file.field_text(func, "name")? != Some("new") {
                continue;
            }
            let Some(params) = func.child_by_field_name("parameters") else {
                continue;
            };
            for param in named_children(params) {
                if param.kind() != "parameter" {
                    continue;
                }
                if let Some(ty) = param.child_by_field_name("type") {
                    for referenced in type_references(ty, file.source(), TYPE_IDENTIFIERS)? {
                        if referenced != target {
                            known.relate(out, target, referenced, EdgeRelation::Injects);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl LanguageExtractor for RustExtractor {
    fn extract_declarations(&self, file: &ParsedFile, out: &mut Vec<Declaration>) -> Result<()> {
        let mut walk = Preorder::new(file.root());
        while let Some(node) = walk.next() {
            let kind = node.kind();
            if let Some(decl_kind) = Self::type_kind(kind) {
                if let Some(name) = file.field_text(node, "name")? {
                    let description = leading_comment(node, file.source(), &DOCS)?;
                    out.push(file.declaration(
                        node,
                        name,
                        decl_kind,
                        Self::is_public(node),
                        description,
                        None,
                    )?);
                }
                if kind != "trait_item" {
                    walk.skip_subtree();
                }
            } else if matches!(kind, "function_item" | "function_signature_item") {
                if let Some(decl) = Self::function_declaration(file, node)? {
                    out.push(decl);
                }
                walk.skip_subtree();
            }
        }
        Ok(())
    }

    fn extract_relations(
        &self,
        file: &ParsedFile,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        let mut walk = Preorder::new(file.root());
        while let Some(node) = walk.next() {
            match node.kind() {
                "trait_item" => {
                    walk.skip_subtree();
                    let (Some(name), Some(bounds)) =
                        (file.field_text(node, "name")?, node.child_by_field_name("bounds"))
                    else {
                        continue;
                    };
                    for bound in named_children(bounds) {
                        let base = base_type_name(file.text(bound)?);
                        known.relate(out, name, base, EdgeRelation::Extends);
                    }
                }
                "struct_item" | "union_item" => {
                    walk.skip_subtree();
                    if let Some(name) = file.field_text(node, "name")? {
                        Self::struct_relations(file, name, node, known, out)?;
                    }
                }
                "impl_item" => {
                    walk.skip_subtree();
                    Self::impl_relations(file, node, known, out)?;
                }
                "function_item" => walk.skip_subtree(),
                _ => {}
            }
        }
        Ok(())
    }
}
