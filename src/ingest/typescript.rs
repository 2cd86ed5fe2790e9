//! TypeScript and JavaScript extraction.
//!
//! One extractor serves the TypeScript, TSX and JavaScript grammars; node
//! kinds the JavaScript grammar lacks (interfaces, enums, type aliases,
//! annotations) simply never occur there.

use tree_sitter::Node;

use crate::error::Result;
use crate::graph::EdgeRelation;
use crate::ingest::docs::{leading_comment, CommentStyle};
use crate::ingest::names::{base_type_name, type_references, TYPE_IDENTIFIERS};
use crate::ingest::walk::{all_children, enclosing, named_children, Preorder};
use crate::ingest::{
    Declaration, DeclarationKind, KnownNames, LanguageExtractor, ParsedFile, Relation,
};

const COMMENTS: CommentStyle = CommentStyle::any(&["comment"]);

const CLASS_KINDS: &[&str] = &["class_declaration", "abstract_class_declaration", "class"];
const OWNER_KINDS: &[&str] = &[
    "class_declaration",
    "abstract_class_declaration",
    "class",
    "interface_declaration",
];
/// Methods of object literals are not class members.
const OWNER_BARRIERS: &[&str] = &["object", "object_pattern"];
const FUNCTION_SCOPES: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "arrow_function",
    "method_definition",
];
const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// Extractor for TypeScript, TSX and JavaScript source files.
pub struct TypeScriptExtractor;

impl TypeScriptExtractor {
    fn export_parent(node: Node<'_>) -> Option<Node<'_>> {
        Self::binding(node)
            .unwrap_or(node)
            .parent()
            .filter(|p| p.kind() == "export_statement")
    }

    /// The declaration binding a class expression: `const Widget = class { ... }`.
    fn binding(node: Node<'_>) -> Option<Node<'_>> {
        if node.kind() != "class" {
            return None;
        }
        let declarator = node.parent().filter(|p| p.kind() == "variable_declarator")?;
        if declarator.child_by_field_name("value") != Some(node) {
            return None;
        }
        declarator
            .parent()
            .filter(|d| matches!(d.kind(), "lexical_declaration" | "variable_declaration"))
    }

    /// Declared name of a type; an anonymous class expression takes its binding's name.
    fn type_name<'f>(file: &'f ParsedFile, node: Node<'_>) -> Result<Option<&'f str>> {
        if let Some(name) = file.field_text(node, "name")? {
            return Ok(Some(name));
        }
        if Self::binding(node).is_none() {
            return Ok(None);
        }
        match node
            .parent()
            .and_then(|d| d.child_by_field_name("name"))
            .filter(|n| n.kind() == "identifier")
        {
            Some(name) => file.text(name).map(Some),
            None => Ok(None),
        }
    }

    fn is_exported(node: Node<'_>) -> bool {
        Self::export_parent(node).is_some()
    }

    /// Comments above `export ...` attach to the exported declaration.
    fn description(file: &ParsedFile, node: Node<'_>) -> Result<Option<String>> {
        let anchor = Self::export_parent(node)
            .or_else(|| Self::binding(node))
            .unwrap_or(node);
        leading_comment(anchor, file.source(), &COMMENTS)
    }

    fn type_kind(kind: &str) -> Option<DeclarationKind> {
        match kind {
            "class_declaration" | "abstract_class_declaration" | "class" => {
                Some(DeclarationKind::Class)
            }
            "interface_declaration" => Some(DeclarationKind::Interface),
            "enum_declaration" => Some(DeclarationKind::Enum),
            "type_alias_declaration" => Some(DeclarationKind::Type),
            _ => None,
        }
    }

    /// `private`/`protected` modifier or a `#private` name.
    fn is_private_member(file: &ParsedFile, member: Node<'_>) -> Result<bool> {
        for child in all_children(member) {
            if child.kind() == "accessibility_modifier" {
                let modifier = file.text(child)?;
                if modifier == "private" || modifier == "protected" {
                    return Ok(true);
                }
            }
        }
        Ok(member
            .child_by_field_name("name")
            .is_some_and(|name| name.kind() == "private_property_identifier"))
    }

    fn member_declaration(file: &ParsedFile, node: Node<'_>) -> Result<Option<Declaration>> {
        let Some(owner) = enclosing(node, OWNER_KINDS, OWNER_BARRIERS) else {
            return Ok(None);
        };
        let (Some(name), Some(owner_name)) =
            (file.field_text(node, "name")?, Self::type_name(file, owner)?)
        else {
            return Ok(None);
        };
        let exported = Self::is_exported(owner) && !Self::is_private_member(file, node)?;
        let description = leading_comment(node, file.source(), &COMMENTS)?;
        file.declaration(
            node,
            name,
            DeclarationKind::Method,
            exported,
            description,
            Some(owner_name),
        )
        .map(Some)
    }

    /// `const handler = () => {}` and `let f = function () {}` at module level.
    fn variable_functions(
        file: &ParsedFile,
        decl: Node<'_>,
        out: &mut Vec<Declaration>,
    ) -> Result<()> {
        let top_level = match decl.parent() {
            Some(parent) if parent.kind() == "program" => true,
            Some(parent) if parent.kind() == "export_statement" => {
                parent.parent().is_some_and(|p| p.kind() == "program")
            }
            _ => false,
        };
        if !top_level {
            return Ok(());
        }
        for declarator in named_children(decl) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let is_function = declarator
                .child_by_field_name("value")
                .is_some_and(|v| FUNCTION_VALUES.contains(&v.kind()));
            let name = declarator.child_by_field_name("name").filter(|n| n.kind() == "identifier");
            if let (true, Some(name)) = (is_function, name) {
                let description = Self::description(file, decl)?;
                out.push(file.declaration(
                    decl,
                    file.text(name)?,
                    DeclarationKind::Function,
                    Self::is_exported(decl),
                    description,
                    None,
                )?);
            }
        }
        Ok(())
    }

    fn collect_declarations(
        file: &ParsedFile,
        root: Node<'_>,
        out: &mut Vec<Declaration>,
    ) -> Result<()> {
        let mut walk = Preorder::new(root);
        while let Some(node) = walk.next() {
            let kind = node.kind();
            if let Some(decl_kind) = Self::type_kind(kind) {
                if let Some(name) = Self::type_name(file, node)? {
                    let description = Self::description(file, node)?;
                    out.push(file.declaration(
                        node,
                        name,
                        decl_kind,
                        Self::is_exported(node),
                        description,
                        None,
                    )?);
                }
                continue;
            }
            match kind {
                "function_declaration" | "generator_function_declaration" => {
                    walk.skip_subtree();
                    if enclosing(node, FUNCTION_SCOPES, &[]).is_some() {
                        continue;
                    }
                    if let Some(name) = file.field_text(node, "name")? {
                        let description = Self::description(file, node)?;
                        out.push(file.declaration(
                            node,
                            name,
                            DeclarationKind::Function,
                            Self::is_exported(node),
                            description,
                            None,
                        )?);
                    }
                }
                "lexical_declaration" | "variable_declaration" => {
                    Self::variable_functions(file, node, out)?;
                    walk.skip_subtree();
                    for class in Self::class_values(node) {
                        Self::collect_declarations(file, class, out)?;
                    }
                }
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    if let Some(decl) = Self::member_declaration(file, node)? {
                        out.push(decl);
                    }
                    walk.skip_subtree();
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Class expressions bound directly by a declaration's declarators.
    fn class_values(decl: Node<'_>) -> Vec<Node<'_>> {
        named_children(decl)
            .into_iter()
            .filter(|d| d.kind() == "variable_declarator")
            .filter_map(|d| d.child_by_field_name("value"))
            .filter(|v| v.kind() == "class")
            .collect()
    }

    fn class_relations(
        file: &ParsedFile,
        class: Node<'_>,
        owner: &str,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        for child in named_children(class) {
            if child.kind() != "class_heritage" {
                continue;
            }
            for clause in named_children(child) {
                match clause.kind() {
                    "extends_clause" => {
                        let value = clause
                            .child_by_field_name("value")
                            .or_else(|| clause.named_child(0));
                        if let Some(value) = value {
                            let base = base_type_name(file.text(value)?);
                            known.relate(out, owner, base, EdgeRelation::Extends);
                        }
                    }
                    "implements_clause" => {
                        for ty in named_children(clause) {
                            let base = base_type_name(file.text(ty)?);
                            known.relate(out, owner, base, EdgeRelation::Implements);
                        }
                    }
                    "comment" => {}
                    // JavaScript: `class A extends B` has no clause node
                    _ => {
                        let base = base_type_name(file.text(clause)?);
                        known.relate(out, owner, base, EdgeRelation::Extends);
                    }
                }
            }
        }

        let Some(body) = class.child_by_field_name("body") else {
            return Ok(());
        };
        for member in named_children(body) {
            match member.kind() {
                "method_definition" if file.field_text(member, "name")? == Some("constructor") => {
                    let Some(params) = member.child_by_field_name("parameters") else {
                        continue;
                    };
                    for param in named_children(params) {
                        if let Some(ty) = param.child_by_field_name("type") {
                            let referenced = type_references(ty, file.source(), TYPE_IDENTIFIERS)?;
                            for referenced in referenced {
                                known.relate(out, owner, referenced, EdgeRelation::Injects);
                            }
                        }
                    }
                }
                "public_field_definition" => {
                    if Self::is_private_member(file, member)? {
                        continue;
                    }
                    if let Some(ty) = member.child_by_field_name("type") {
                        for referenced in type_references(ty, file.source(), TYPE_IDENTIFIERS)? {
                            known.relate(out, owner, referenced, EdgeRelation::Injects);
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn interface_relations(
        file: &ParsedFile,
        interface: Node<'_>,
        owner: &str,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        for clause in named_children(interface) {
            if !matches!(clause.kind(), "extends_type_clause" | "extends_clause") {
                continue;
            }
            for ty in named_children(clause) {
                known.relate(out, owner, base_type_name(file.text(ty)?), EdgeRelation::Extends);
            }
        }
        Ok(())
    }
}

impl LanguageExtractor for TypeScriptExtractor {
    fn extract_declarations(&self, file: &ParsedFile, out: &mut Vec<Declaration>) -> Result<()> {
        Self::collect_declarations(file, file.root(), out)
    }

    fn extract_relations(
        &self,
        file: &ParsedFile,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        let mut walk = Preorder::new(file.root());
        while let Some(node) = walk.next() {
            let kind = node.kind();
            if CLASS_KINDS.contains(&kind) {
                if let Some(owner) = Self::type_name(file, node)? {
                    Self::class_relations(file, node, owner, known, out)?;
                }
            } else if kind == "interface_declaration" {
                if let Some(owner) = file.field_text(node, "name")? {
                    Self::interface_relations(file, node, owner, known, out)?;
                }
                walk.skip_subtree();
            }
        }
        Ok(())
    }
}
