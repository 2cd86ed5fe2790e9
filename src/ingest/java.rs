//! Java extraction using tree-sitter-java.
//!
//! Classes, records, interfaces and enums become type nodes; methods and
//! constructors are members of the nearest enclosing type declaration.

use tree_sitter::Node;

use crate::error::Result;
use crate::graph::EdgeRelation;
use crate::ingest::docs::{leading_comment, CommentStyle};
use crate::ingest::names::{base_type_name, type_references, TYPE_IDENTIFIERS};
use crate::ingest::walk::{all_children, enclosing, named_children, Preorder};
use crate::ingest::{
    Declaration, DeclarationKind, KnownNames, LanguageExtractor, ParsedFile, Relation,
};

const COMMENTS: CommentStyle = CommentStyle::any(&["line_comment", "block_comment", "comment"]);

const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "record_declaration",
    "interface_declaration",
    "enum_declaration",
];

/// Members of anonymous classes and lambdas have no named owner.
const MEMBER_BARRIERS: &[&str] = &[
    "object_creation_expression",
    "lambda_expression",
    "method_declaration",
    "constructor_declaration",
];

/// Field annotations that mark container-injected dependencies.
const INJECTION_ANNOTATIONS: &[&str] = &["Autowired", "Inject", "Resource"];

/// Extractor for Java source files.
pub struct JavaExtractor;

impl JavaExtractor {
    fn modifiers(node: Node<'_>) -> Option<Node<'_>> {
        named_children(node).into_iter().find(|c| c.kind() == "modifiers")
    }

    fn has_modifier(node: Node<'_>, keyword: &str) -> bool {
        Self::modifiers(node)
            .map(|mods| all_children(mods).iter().any(|m| m.kind() == keyword))
            .unwrap_or(false)
    }

    fn has_injection_annotation(file: &ParsedFile, node: Node<'_>) -> Result<bool> {
        let Some(mods) = Self::modifiers(node) else {
            return Ok(false);
        };
        for annotation in named_children(mods) {
            if !matches!(annotation.kind(), "marker_annotation" | "annotation") {
                continue;
            }
            if let Some(name) = file.field_text(annotation, "name")? {
                if INJECTION_ANNOTATIONS.contains(&base_type_name(name)) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn type_kind(kind: &str) -> Option<DeclarationKind> {
        match kind {
            "class_declaration" | "record_declaration" => Some(DeclarationKind::Class),
            "interface_declaration" => Some(DeclarationKind::Interface),
            "enum_declaration" => Some(DeclarationKind::Enum),
            _ => None,
        }
    }

    fn member_declaration(file: &ParsedFile, node: Node<'_>) -> Result<Option<Declaration>> {
        let Some(owner) = enclosing(node, TYPE_KINDS, MEMBER_BARRIERS) else {
            return Ok(None);
        };
        let (Some(name), Some(owner_name)) =
            (file.field_text(node, "name")?, file.field_text(owner, "name")?)
        else {
            return Ok(None);
        };
        let exported = Self::has_modifier(node, "public")
            || (owner.kind() == "interface_declaration" && !Self::has_modifier(node, "private"));
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

    /// Every type named in a `type_list` under a heritage clause.
    fn heritage_types<'a>(file: &'a ParsedFile, clause: Node<'_>) -> Result<Vec<&'a str>> {
        let mut names = Vec::new();
        for child in named_children(clause) {
            if child.kind() == "type_list" {
                for ty in named_children(child) {
                    names.push(base_type_name(file.text(ty)?));
                }
            } else {
                names.push(base_type_name(file.text(child)?));
            }
        }
        Ok(names)
    }

    fn heritage_relations(
        file: &ParsedFile,
        decl: Node<'_>,
        owner: &str,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        for clause in named_children(decl) {
            let relation = match clause.kind() {
                "superclass" | "extends_interfaces" => EdgeRelation::Extends,
                "super_interfaces" => EdgeRelation::Implements,
                _ => continue,
            };
            for name in Self::heritage_types(file, clause)? {
                known.relate(out, owner, name, relation);
            }
        }
        Ok(())
    }

    fn parameter_relations(
        file: &ParsedFile,
        params: Node<'_>,
        owner: &str,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        for param in named_children(params) {
            if !matches!(param.kind(), "formal_parameter" | "spread_parameter") {
                continue;
            }
            // spread_parameter has no `type` field
            let ty = param.child_by_field_name("type").or_else(|| {
                named_children(param)
                    .into_iter()
                    .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator"))
            });
            if let Some(ty) = ty {
                for referenced in type_references(ty, file.source(), TYPE_IDENTIFIERS)? {
                    known.relate(out, owner, referenced, EdgeRelation::Injects);
                }
            }
        }
        Ok(())
    }
}

impl LanguageExtractor for JavaExtractor {
    fn extract_declarations(&self, file: &ParsedFile, out: &mut Vec<Declaration>) -> Result<()> {
        let mut walk = Preorder::new(file.root());
        while let Some(node) = walk.next() {
            let kind = node.kind();
            if let Some(decl_kind) = Self::type_kind(kind) {
                if let Some(name) = file.field_text(node, "name")? {
                    let description = leading_comment(node, file.source(), &COMMENTS)?;
                    let exported = Self::has_modifier(node, "public");
                    out.push(file.declaration(node, name, decl_kind, exported, description, None)?);
                }
            } else if matches!(kind, "method_declaration" | "constructor_declaration") {
                if let Some(decl) = Self::member_declaration(file, node)? {
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
            let kind = node.kind();
            if TYPE_KINDS.contains(&kind) {
                let Some(owner) = file.field_text(node, "name")? else {
                    continue;
                };
                Self::heritage_relations(file, node, owner, known, out)?;
                if kind == "record_declaration" {
                    if let Some(params) = node.child_by_field_name("parameters") {
                        Self::parameter_relations(file, params, owner, known, out)?;
                    }
                }
                continue;
            }

            match kind {
                "constructor_declaration" => {
                    walk.skip_subtree();
                    let Some(owner) = enclosing(node, TYPE_KINDS, MEMBER_BARRIERS) else {
                        continue;
                    };
                    let (Some(owner), Some(params)) =
                        (file.field_text(owner, "name")?, node.child_by_field_name("parameters"))
                    else {
                        continue;
                    };
                    Self::parameter_relations(file, params, owner, known, out)?;
                }
                "field_declaration" => {
                    walk.skip_subtree();
                    let injected = Self::has_modifier(node, "public")
                        || Self::has_injection_annotation(file, node)?;
                    if !injected {
                        continue;
                    }
                    let Some(owner) = enclosing(node, TYPE_KINDS, MEMBER_BARRIERS) else {
                        continue;
                    };
                    let (Some(owner), Some(ty)) =
                        (file.field_text(owner, "name")?, node.child_by_field_name("type"))
                    else {
                        continue;
                    };
                    for referenced in type_references(ty, file.source(), TYPE_IDENTIFIERS)? {
                        known.relate(out, owner, referenced, EdgeRelation::Injects);
                    }
                }
                "method_declaration" => walk.skip_subtree(),
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{extract_declarations, extract_relations, Language};

    fn declarations(source: &str) -> Vec<Declaration> {
        extract_declarations(Language::Java, source, 2000).unwrap()
    }

    fn relations(source: &str, known: &[&str]) -> Vec<Relation> {
        let known: KnownNames = known.iter().copied().collect();
        extract_relations(Language::Java, source, &known).unwrap()
    }

    fn has(rels: &[Relation], src: &str, tgt: &str, relation: EdgeRelation) -> bool {
        rels.iter().any(|r| r.src == src && r.tgt == tgt && r.relation == relation)
    }

    #[test]
    fn test_extract_types_and_members() {
        let source = r#"
package com.example;

/**
 * Handles orders.
 */
public class OrderService {
    public OrderService() {}
    public void place() {}
    private void audit() {}
}

interface Repository {
    void save();
}

enum Status { ACTIVE, CLOSED }
"#;
        let decls = declarations(source);
        let names: Vec<_> = decls.iter().map(|d| d.key()).collect();
        assert_eq!(
            names,
            vec![
                "OrderService",
                "OrderService.OrderService",
                "OrderService.place",
                "OrderService.audit",
                "Repository",
                "Repository.save",
                "Status",
            ]
        );
        assert_eq!(decls[0].description.as_deref(), Some("Handles orders."));
        assert!(decls[0].is_exported);
        assert!(decls[2].is_exported);
        assert!(!decls[3].is_exported);
        assert!(!decls[4].is_exported);
        // Interface members are implicitly public
        assert!(decls[5].is_exported);
        assert_eq!(decls[4].kind, DeclarationKind::Interface);
        assert_eq!(decls[6].kind, DeclarationKind::Enum);
    }

    #[test]
    fn test_record_is_class() {
        let decls = declarations("public record Point(int x, int y) {}");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].kind, DeclarationKind::Class);
    }

    #[test]
    fn test_anonymous_class_methods_are_skipped() {
        let source = r#"
class Outer {
    void run() {
        Runnable r = new Runnable() {
            public void run() {}
        };
    }
}
"#;
        let decls = declarations(source);
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[1].key(), "Outer.run");
    }

    #[test]
    fn test_extends_and_implements() {
        let source = "class Foo extends Bar implements Baz, Missing {}";
        let rels = relations(source, &["Foo", "Bar", "Baz"]);
        assert_eq!(rels.len(), 2);
        assert!(has(&rels, "Foo", "Bar", EdgeRelation::Extends));
        assert!(has(&rels, "Foo", "Baz", EdgeRelation::Implements));
    }

    #[test]
    fn test_interface_extends_interfaces() {
        let source = "interface Repo<T> extends Reader<T>, Writer {}";
        let rels = relations(source, &["Repo", "Reader", "Writer"]);
        assert!(has(&rels, "Repo", "Reader", EdgeRelation::Extends));
        assert!(has(&rels, "Repo", "Writer", EdgeRelation::Extends));
    }

    #[test]
    fn test_constructor_and_field_injection() {
        let source = r#"
public class Controller {
    @Autowired
    private Clock clock;
    public Metrics metrics;
    private Cache cache;

    public Controller(OrderService service, List<Validator> validators) {}
}
"#;
        let rels = relations(
            source,
            &["Controller", "Clock", "Metrics", "Cache", "OrderService", "Validator"],
        );
        assert!(has(&rels, "Controller", "Clock", EdgeRelation::Injects));
        assert!(has(&rels, "Controller", "Metrics", EdgeRelation::Injects));
        assert!(has(&rels, "Controller", "OrderService", EdgeRelation::Injects));
        assert!(has(&rels, "Controller", "Validator", EdgeRelation::Injects));
        assert!(!has(&rels, "Controller", "Cache", EdgeRelation::Injects));
    }

    #[test]
    fn test_qualified_type_injects_last_segment() {
        let source = "class Svc {\n    public Svc(com.Repo.Inner inner) {}\n}\n";
        let rels = relations(source, &["Svc", "com", "Repo", "Inner"]);
        assert_eq!(rels.len(), 1);
        assert!(has(&rels, "Svc", "Inner", EdgeRelation::Injects));
    }

    #[test]
    fn test_record_components_inject() {
        let rels = relations("record Order(Customer customer, int qty) {}", &["Order", "Customer"]);
        assert_eq!(rels.len(), 1);
        assert!(has(&rels, "Order", "Customer", EdgeRelation::Injects));
    }
}
