//! Python extraction using tree-sitter-python.
//!
//! Classes deriving from `Protocol`/`ABC` are interfaces and those deriving
//! from an `Enum` base are enums. Functions defined directly in a class body
//! are methods; functions nested inside other functions are not tracked.

use tree_sitter::Node;

use crate::error::Result;
use crate::graph::EdgeRelation;
use crate::ingest::docs::{docstring, leading_comment, CommentStyle};
use crate::ingest::names::{base_type_name, type_references, PYTHON_TYPE_NAMES};
use crate::ingest::walk::{enclosing, named_children, Preorder};
use crate::ingest::{
    Declaration, DeclarationKind, KnownNames, LanguageExtractor, ParsedFile, Relation,
};

const COMMENTS: CommentStyle = CommentStyle::any(&["comment"]);

const INTERFACE_BASES: &[&str] = &["Protocol", "ABC"];
const ENUM_BASES: &[&str] = &["Enum", "IntEnum", "StrEnum", "Flag", "IntFlag"];
const SCOPE_KINDS: &[&str] = &["class_definition", "function_definition"];

/// Extractor for Python source files.
pub struct PythonExtractor;

/// Leading underscore marks a private name.
fn is_public(name: &str) -> bool {
    !name.starts_with('_')
}

impl PythonExtractor {
    /// `decorated_definition` wrapping `node`, if any.
    fn anchor(node: Node<'_>) -> Node<'_> {
        match node.parent() {
            Some(parent) if parent.kind() == "decorated_definition" => parent,
            _ => node,
        }
    }

    fn description(file: &ParsedFile, node: Node<'_>) -> Result<Option<String>> {
        if let Some(body) = node.child_by_field_name("body") {
            if let Some(doc) = docstring(body, file.source())? {
                return Ok(Some(doc));
            }
        }
        leading_comment(Self::anchor(node), file.source(), &COMMENTS)
    }

    /// Positional base classes and keyword arguments of a class header.
    fn bases<'a>(file: &'a ParsedFile, class: Node<'_>) -> Result<(Vec<&'a str>, Option<&'a str>)> {
        let Some(args) = class.child_by_field_name("superclasses") else {
            return Ok((Vec::new(), None));
        };
        let mut bases = Vec::new();
        let mut metaclass = None;
        for arg in named_children(args) {
            match arg.kind() {
                "keyword_argument" => {
                    if file.field_text(arg, "name")? == Some("metaclass") {
                        metaclass = file.field_text(arg, "value")?.map(base_type_name);
                    }
                }
                "identifier" | "attribute" | "subscript" => {
                    bases.push(base_type_name(file.text(arg)?))
                }
                _ => {}
            }
        }
        Ok((bases, metaclass))
    }

    fn class_kind(bases: &[&str], metaclass: Option<&str>) -> DeclarationKind {
        if bases.iter().any(|b| INTERFACE_BASES.contains(b)) || metaclass == Some("ABCMeta") {
            DeclarationKind::Interface
        } else if bases.iter().any(|b| ENUM_BASES.contains(b)) {
            DeclarationKind::Enum
        } else {
            DeclarationKind::Class
        }
    }

    /// Statements of a class body, unwrapping decorated definitions.
    fn body_statements(class: Node<'_>) -> Vec<Node<'_>> {
        let Some(body) = class.child_by_field_name("body") else {
            return Vec::new();
        };
        named_children(body)
            .into_iter()
            .map(|stmt| {
                if stmt.kind() == "decorated_definition" {
                    stmt.child_by_field_name("definition").unwrap_or(stmt)
                } else {
                    stmt
                }
            })
            .collect()
    }

    fn init_relations(
        file: &ParsedFile,
        init: Node<'_>,
        owner: &str,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        let Some(params) = init.child_by_field_name("parameters") else {
            return Ok(());
        };
        for param in named_children(params) {
            if !matches!(param.kind(), "typed_parameter" | "typed_default_parameter") {
                continue;
            }
            if let Some(ty) = param.child_by_field_name("type") {
                for referenced in type_references(ty, file.source(), PYTHON_TYPE_NAMES)? {
                    known.relate(out, owner, referenced, EdgeRelation::Injects);
                }
            }
        }
        Ok(())
    }

    /// `name: Type` class attributes with a public name.
    fn attribute_relations(
        file: &ParsedFile,
        stmt: Node<'_>,
        owner: &str,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()> {
        let Some(assignment) = stmt.named_child(0).filter(|n| n.kind() == "assignment") else {
            return Ok(());
        };
        let (Some(left), Some(ty)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("type"),
        ) else {
            return Ok(());
        };
        if left.kind() != "identifier" || !is_public(file.text(left)?) {
            return Ok(());
        }
        for referenced in type_references(ty, file.source(), PYTHON_TYPE_NAMES)? {
            known.relate(out, owner, referenced, EdgeRelation::Injects);
        }
        Ok(())
    }
}

impl LanguageExtractor for PythonExtractor {
    fn extract_declarations(&self, file: &ParsedFile, out: &mut Vec<Declaration>) -> Result<()> {
        let mut walk = Preorder::new(file.root());
        while let Some(node) = walk.next() {
            match node.kind() {
                "class_definition" => {
                    let Some(name) = file.field_text(node, "name")? else {
                        continue;
                    };
                    let (bases, metaclass) = Self::bases(file, node)?;
                    let description = Self::description(file, node)?;
                    out.push(file.declaration(
                        Self::anchor(node),
                        name,
                        Self::class_kind(&bases, metaclass),
                        is_public(name),
                        description,
                        None,
                    )?);
                }
                "function_definition" => {
                    walk.skip_subtree();
                    let Some(name) = file.field_text(node, "name")? else {
                        continue;
                    };
                    let (kind, parent) = match enclosing(node, SCOPE_KINDS, &[]) {
                        Some(scope) if scope.kind() == "class_definition" => {
                            (DeclarationKind::Method, file.field_text(scope, "name")?)
                        }
                        // Nested function
                        Some(_) => continue,
                        None => (DeclarationKind::Function, None),
                    };
                    let description = Self::description(file, node)?;
                    out.push(file.declaration(
                        Self::anchor(node),
                        name,
                        kind,
                        is_public(name),
                        description,
                        parent,
                    )?);
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
                "class_definition" => {
                    let Some(owner) = file.field_text(node, "name")? else {
                        continue;
                    };
                    let (bases, _) = Self::bases(file, node)?;
                    for base in bases {
                        known.relate(out, owner, base, EdgeRelation::Extends);
                    }
                    for stmt in Self::body_statements(node) {
                        match stmt.kind() {
                            "function_definition"
                                if file.field_text(stmt, "name")? == Some("__init__") =>
                            {
                                Self::init_relations(file, stmt, owner, known, out)?;
                            }
                            "expression_statement" => {
                                Self::attribute_relations(file, stmt, owner, known, out)?
                            }
                            _ => {}
                        }
                    }
                }
                "function_definition" => walk.skip_subtree(),
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
        extract_declarations(Language::Python, source, 2000).unwrap()
    }

    fn relations(source: &str, known: &[&str]) -> Vec<Relation> {
        let known: KnownNames = known.iter().copied().collect();
        extract_relations(Language::Python, source, &known).unwrap()
    }

    #[test]
    fn test_extract_classes_and_methods() {
        let source = r#"
class Repository:
    """Stores entities."""

    def save(self, item):
        pass

    def _flush(self):
        def inner():
            pass

def main():
    pass
"#;
        let decls = declarations(source);
        let keys: Vec<_> = decls.iter().map(|d| d.key()).collect();
        assert_eq!(keys, vec!["Repository", "Repository.save", "Repository._flush", "main"]);
        assert_eq!(decls[0].description.as_deref(), Some("Stores entities."));
        assert_eq!(decls[1].kind, DeclarationKind::Method);
        assert!(decls[1].is_exported);
        assert!(!decls[2].is_exported);
        assert_eq!(decls[3].kind, DeclarationKind::Function);
    }

    #[test]
    fn test_protocol_abc_and_enum_kinds() {
        let source = r#"
from typing import Protocol
import abc
import enum

class Reader(Protocol):
    def read(self) -> bytes: ...

class Base(abc.ABC):
    pass

class Meta(metaclass=abc.ABCMeta):
    pass

class Color(enum.Enum):
    RED = 1
"#;
        let decls = declarations(source);
        let kind = |name: &str| decls.iter().find(|d| d.name == name).unwrap().kind;
        assert_eq!(kind("Reader"), DeclarationKind::Interface);
        assert_eq!(kind("Base"), DeclarationKind::Interface);
        assert_eq!(kind("Meta"), DeclarationKind::Interface);
        assert_eq!(kind("Color"), DeclarationKind::Enum);
    }

    #[test]
    fn test_decorated_definitions() {
        let source = r#"
# Entry point.
@click.command()
def run():
    pass

class Service:
    @classmethod
    def create(cls):
        return cls()
"#;
        let decls = declarations(source);
        let keys: Vec<_> = decls.iter().map(|d| d.key()).collect();
        assert_eq!(keys, vec!["run", "Service", "Service.create"]);
        assert_eq!(decls[0].description.as_deref(), Some("Entry point."));
        assert_eq!(decls[0].start_line, 3);
        assert_eq!(decls[2].kind, DeclarationKind::Method);
    }

    #[test]
    fn test_bases_and_injection() {
        let source = r#"
class Handler(BaseHandler, Missing):
    repo: Repository
    _cache: Cache

    def __init__(self, clock: Clock, name: str = "x", *, bus: "EventBus" = None):
        self.clock = clock
"#;
        let rels = relations(source, &["Handler", "BaseHandler", "Repository", "Cache", "Clock"]);
        let summary: Vec<_> = rels.iter().map(|r| (r.tgt.as_str(), r.relation)).collect();
        assert_eq!(
            summary,
            vec![
                ("BaseHandler", EdgeRelation::Extends),
                ("Repository", EdgeRelation::Injects),
                ("Clock", EdgeRelation::Injects),
            ]
        );
    }
}
