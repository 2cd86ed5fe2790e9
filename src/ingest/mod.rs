//! Per-language declaration and relation extraction.
//!
//! Each supported grammar has one [`LanguageExtractor`]. Extractors are
//! stateless and shared across worker threads; all per-file state lives in a
//! [`ParsedFile`], which owns the syntax tree and releases it on drop.

pub mod detect;
pub mod docs;
pub mod go;
pub mod java;
pub mod names;
pub mod python;
pub mod rust;
pub mod typescript;
pub mod walk;

pub use detect::{detect_language, Language};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tree_sitter::{Node, Tree};

use crate::common::{end_line, node_text, start_line};
use crate::error::{KgError, Result};
use crate::graph::EdgeRelation;
use crate::scoring::truncate_content;

/// Kind of declaration tracked in the graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    /// Class, struct, record or union
    Class,
    /// Interface, trait or protocol
    Interface,
    Enum,
    /// Type alias or other named type
    Type,
    Function,
    /// Function with an owning type (receiver or enclosing body)
    Method,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Type => "type",
            DeclarationKind::Function => "function",
            DeclarationKind::Method => "method",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declaration found in one file during pass 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    /// 1-indexed
    pub start_line: usize,
    /// 1-indexed, inclusive
    pub end_line: usize,
    /// Leading documentation, at most 200 characters
    pub description: Option<String>,
    /// Source span after truncation
    pub content: String,
    pub is_exported: bool,
    /// Owning type for methods
    pub parent_name: Option<String>,
}

impl Declaration {
    /// Node key: `Parent.member` for owned members, the bare name otherwise.
    pub fn key(&self) -> String {
        crate::graph::node_key(&self.name, self.parent_name.as_deref())
    }
}

/// A typed relation found in one file during pass 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub src: String,
    pub tgt: String,
    pub relation: EdgeRelation,
}

/// Names declared anywhere in the file set, frozen after pass 1.
#[derive(Debug, Clone, Default)]
pub struct KnownNames {
    names: AHashSet<String>,
}

impl KnownNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Append a relation only when its target is a declared name.
    pub fn relate(&self, out: &mut Vec<Relation>, src: &str, tgt: &str, relation: EdgeRelation) {
        if !tgt.is_empty() && self.contains(tgt) {
            out.push(Relation {
                src: src.to_string(),
                tgt: tgt.to_string(),
                relation,
            });
        }
    }
}

impl<S: Into<String>> FromIterator<S> for KnownNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// One parsed source file.
///
/// Owns the tree-sitter tree; the parser is dropped as soon as parsing
/// finishes and the tree when this value goes out of scope.
pub struct ParsedFile {
    language: Language,
    source: String,
    tree: Tree,
    max_content_chars: usize,
}

impl ParsedFile {
    /// Parse `source`.
    ///
    /// Returns `Ok(None)` when the parser yields no tree and an error when
    /// the grammar cannot be loaded.
    pub fn parse(
        language: Language,
        source: String,
        max_content_chars: usize,
    ) -> Result<Option<Self>> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|err| KgError::Grammar {
                language: language.as_str(),
                source: err,
            })?;
        let Some(tree) = parser.parse(&source, None) else {
            return Ok(None);
        };
        Ok(Some(Self {
            language,
            source,
            tree,
            max_content_chars,
        }))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Release the tree and hand back the source text.
    pub fn into_source(self) -> String {
        self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Whether the tree contains syntax errors (extraction still proceeds).
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    pub fn text(&self, node: Node<'_>) -> Result<&str> {
        node_text(node, &self.source)
    }

    /// Text of the named field of `node`, if present.
    pub fn field_text(&self, node: Node<'_>, field: &str) -> Result<Option<&str>> {
        node.child_by_field_name(field)
            .map(|child| self.text(child))
            .transpose()
    }

    /// Build a declaration spanning `span`, with truncated content.
    pub fn declaration(
        &self,
        span: Node<'_>,
        name: &str,
        kind: DeclarationKind,
        is_exported: bool,
        description: Option<String>,
        parent_name: Option<&str>,
    ) -> Result<Declaration> {
        let content = truncate_content(self.text(span)?, self.max_content_chars);
        Ok(Declaration {
            name: name.to_string(),
            kind,
            start_line: start_line(span),
            end_line: end_line(span),
            description,
            content,
            is_exported,
            parent_name: parent_name.map(str::to_string),
        })
    }
}

/// Extraction behaviour for one grammar.
///
/// Both methods append to `out` so that whatever was produced before a
/// failure is kept by the caller.
pub trait LanguageExtractor: Send + Sync {
    /// Pass 1: declarations in source order.
    fn extract_declarations(&self, file: &ParsedFile, out: &mut Vec<Declaration>) -> Result<()>;

    /// Pass 2: relations whose targets are all in `known`.
    fn extract_relations(
        &self,
        file: &ParsedFile,
        known: &KnownNames,
        out: &mut Vec<Relation>,
    ) -> Result<()>;
}

static GO: go::GoExtractor = go::GoExtractor;
static JAVA: java::JavaExtractor = java::JavaExtractor;
static PYTHON: python::PythonExtractor = python::PythonExtractor;
static RUST: rust::RustExtractor = rust::RustExtractor;
static TYPESCRIPT: typescript::TypeScriptExtractor = typescript::TypeScriptExtractor;

/// Extractor for a detected language.
pub fn extractor_for(language: Language) -> &'static dyn LanguageExtractor {
    match language {
        Language::Go => &GO,
        Language::Java => &JAVA,
        Language::Python => &PYTHON,
        Language::Rust => &RUST,
        Language::TypeScript | Language::Tsx | Language::JavaScript => &TYPESCRIPT,
    }
}

/// Extractor for a language tag such as `"go"` or `"typescript"`.
pub fn extractor_for_tag(tag: &str) -> Result<&'static dyn LanguageExtractor> {
    Language::from_tag(tag)
        .map(extractor_for)
        .ok_or_else(|| KgError::UnsupportedLanguage(tag.to_string()))
}

/// Parse and extract declarations from an in-memory source.
pub fn extract_declarations(
    language: Language,
    source: &str,
    max_content_chars: usize,
) -> Result<Vec<Declaration>> {
    let mut out = Vec::new();
    if let Some(file) = ParsedFile::parse(language, source.to_string(), max_content_chars)? {
        extractor_for(language).extract_declarations(&file, &mut out)?;
    }
    Ok(out)
}

/// Parse and extract relations from an in-memory source.
pub fn extract_relations(
    language: Language,
    source: &str,
    known: &KnownNames,
) -> Result<Vec<Relation>> {
    let mut out = Vec::new();
    let max_content_chars = crate::config::DEFAULT_MAX_CONTENT_CHARS;
    if let Some(file) = ParsedFile::parse(language, source.to_string(), max_content_chars)? {
        extractor_for(language).extract_relations(&file, known, &mut out)?;
    }
    Ok(out)
}
