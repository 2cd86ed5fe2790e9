//! Go extraction using tree-sitter-go.
//!
//! Structs map to classes and interfaces to interfaces; any other named type
//! is a `type`. Methods take their owner from the receiver parameter.
//! Exported means a leading uppercase letter.

use tree_sitter::Node;

use crate::error::Result;
use crate::graph::EdgeRelation;
use crate::ingest::docs::{leading_comment, CommentStyle};
use crate::ingest::names::{base_type_name, is_capitalized, type_references, TYPE_IDENTIFIERS};
use crate::ingest::walk::{named_children, Preorder};
use crate::ingest::{
    Declaration, DeclarationKind, KnownNames, LanguageExtractor, ParsedFile, Relation,
};

const COMMENTS: CommentStyle = CommentStyle::any(&["comment"]);

/// Embedded-interface element kinds across grammar revisions.
const EMBEDDED_INTERFACE_KINDS: &[&str] = &[
    "type_elem",
    "constraint_elem",
    "interface_type_name",
    "type_identifier",
    "qualified_type",
];

/// Extractor for Go source files.
pub struct GoExtractor;

impl GoExtractor {
    /// The `type X ...` declaration when it holds a single spec, else the spec.
    fn doc_anchor(spec: Node<'_>) -> Node<'_> {
        match spec.parent() {
            Some(parent)
                if parent.kind() == "type_declaration"
                    && named_children(parent)
                        .iter()
                        .filter(|n| n.kind() != "comment")
                        .count()
                        == 1 =>
            {
                parent
            }
            _ => spec,
        }
    }

    fn type_declaration(file: &ParsedFile, spec: Node<'_>) -> Result<Option<Declaration>> {
        let Some(name) = file.field_text(spec, "name")? else {
            return Ok(None);
        };
        let kind = match (spec.kind(), spec.child_by_field_name("type").map(|t| t.kind())) {
            ("type_spec", Some("struct_type")) => DeclarationKind::Class,
            ("type_spec", Some("interface_type")) => DeclarationKind::Interface,
            _ => DeclarationKind::Type,
        };
        let anchor = Self::doc_anchor(spec);
        let description = leading_comment(anchor, file.source(), &COMMENTS)?;
        file.declaration(anchor, name, kind, is_capitalized(name), description, None)
            .map(Some)
    }

    /// Base type of a method receiver: `(s *Server[T])` -> `Server`.
    fn receiver_type<'a>(file: &'a ParsedFile, method: Node<'_>) -> Result<Option<&'a str>> {
        let Some(receiver) = method.child_by_field_name("receiver") else {
            return Ok(None);
        };
        for param in named_children(receiver) {
            if param.kind() != "parameter_declaration" {
                continue;
            }
            if let Some(ty) = param.child_by_field_name("type") {
                let base = base_type_name(file.text(ty)?);
                return Ok((!base.is_empty()).then_some(base));
            }
        }
        Ok(None)
    }

    fn struct_relations(
        file: &ParsedFile,
        owner: &str,
        body: Node<'_>,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        for list in named_children(body) {
            if list.kind() != "field_declaration_list" {
                continue;
            }
            for field in named_children(list) {
                if field.kind() != "field_declaration" {
                    continue;
                }
                let Some(ty) = field.child_by_field_name("type") else {
                    continue;
                };
                let mut cursor = field.walk();
                let names: Vec<Node<'_>> =
                    field.children_by_field_name("name", &mut cursor).collect();
                if names.is_empty() {
                    // Embedded field
                    known.relate(out, owner, base_type_name(file.text(ty)?), EdgeRelation::Extends);
                    continue;
                }
                let mut exported = false;
                for name in names {
                    exported |= is_capitalized(file.text(name)?);
                }
                if exported {
                    for referenced in type_references(ty, file.source(), TYPE_IDENTIFIERS)? {
                        known.relate(out, owner, referenced, EdgeRelation::Injects);
                    }
                }
            }
        }
        Ok(())
    }

    fn interface_relations(
        file: &ParsedFile,
        owner: &str,
        body: Node<'_>,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        for element in named_children(body) {
            if !EMBEDDED_INTERFACE_KINDS.contains(&element.kind()) {
                continue;
            }
            if matches!(element.kind(), "type_identifier" | "qualified_type") {
                let embedded = base_type_name(file.text(element)?);
                known.relate(out, owner, embedded, EdgeRelation::Extends);
                continue;
            }
            for embedded in named_children(element) {
                if matches!(
                    embedded.kind(),
                    "type_identifier" | "qualified_type" | "generic_type"
                ) {
                    let name = base_type_name(file.text(embedded)?);
                    known.relate(out, owner, name, EdgeRelation::Extends);
                }
            }
        }
        Ok(())
    }

    /// `func NewServer(db *DB, log Logger) *Server` injects DB and Logger into Server.
    fn constructor_relations(
        file: &ParsedFile,
        func: Node<'_>,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        let Some(name) = file.field_text(func, "name")? else {
            return Ok(());
        };
        if !name.starts_with("New") {
            return Ok(());
        }
        let Some(result) = func.child_by_field_name("result") else {
            return Ok(());
        };
        let result_type = if result.kind() == "parameter_list" {
            named_children(result)
                .into_iter()
                .find(|p| p.kind() == "parameter_declaration")
                .and_then(|p| p.child_by_field_name("type"))
        } else {
            Some(result)
        };
        let Some(result_type) = result_type else {
            return Ok(());
        };
        let owner = base_type_name(file.text(result_type)?);
        if !known.contains(owner) {
            return Ok(());
        }
        let Some(params) = func.child_by_field_name("parameters") else {
            return Ok(());
        };
        for param in named_children(params) {
            if let Some(ty) = param.child_by_field_name("type") {
                for referenced in type_references(ty, file.source(), TYPE_IDENTIFIERS)? {
                    if referenced != owner {
                        known.relate(out, owner, referenced, EdgeRelation::Injects);
                    }
                }
            }
        }
        Ok(())
    }
}

impl LanguageExtractor for GoExtractor {
    fn extract_declarations(&self, file: &ParsedFile, out: &mut Vec<Declaration>) -> Result<()> {
        let mut walk = Preorder::new(file.root());
        while let Some(node) = walk.next() {
            match node.kind() {
                "type_spec" | "type_alias" => {
                    if let Some(decl) = Self::type_declaration(file, node)? {
                        out.push(decl);
                    }
                    walk.skip_subtree();
                }
                "function_declaration" => {
                    if let Some(name) = file.field_text(node, "name")? {
                        let description = leading_comment(node, file.source(), &COMMENTS)?;
                        out.push(file.declaration(
                            node,
                            name,
                            DeclarationKind::Function,
                            is_capitalized(name),
                            description,
                            None,
                        )?);
                    }
                    walk.skip_subtree();
                }
                "method_declaration" => {
                    let name = file.field_text(node, "name")?;
                    let receiver = Self::receiver_type(file, node)?;
                    if let (Some(name), Some(receiver)) = (name, receiver) {
                        let description = leading_comment(node, file.source(), &COMMENTS)?;
                        out.push(file.declaration(
                            node,
                            name,
                            DeclarationKind::Method,
                            is_capitalized(name),
                            description,
                            Some(receiver),
                        )?);
                    }
                    walk.skip_subtree();
                }
                _ => {}
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
                "type_spec" => {
                    walk.skip_subtree();
                    let (Some(name), Some(body)) =
                        (file.field_text(node, "name")?, node.child_by_field_name("type"))
                    else {
                        continue;
                    };
                    match body.kind() {
                        "struct_type" => Self::struct_relations(file, name, body, known, out)?,
                        "interface_type" => {
                            Self::interface_relations(file, name, body, known, out)?
                        }
                        _ => {}
                    }
                }
                "function_declaration" => {
                    Self::constructor_relations(file, node, known, out)?;
                    walk.skip_subtree();
                }
                "method_declaration" => walk.skip_subtree(),
                _ => {}
            }
        }
        Ok(())
    }
}
