//! codekg: a multi-language code knowledge graph
//!
//! codekg parses a source tree with tree-sitter, records every class,
//! interface, enum, type alias, function and method as a node, and connects
//! them with typed structural edges (`extends`, `implements`, `injects`,
//! `contains`). The resulting graph can be traversed in memory or persisted
//! as a JSON snapshot.
//!
//! # Building
//!
//! Construction runs in two passes. Pass 1 extracts declarations from every
//! file and fixes the node set; pass 2 extracts relations, keeping only those
//! whose target was declared somewhere in the file set.
//!
//! ```no_run
//! use codekg::{BuildOptions, GraphBuilder, KgStorage};
//!
//! let result = GraphBuilder::new(BuildOptions::default()).build("path/to/repo".as_ref())?;
//! let storage = KgStorage::from_graph(result.graph);
//! for reached in storage.get_successors("OrderService", 2) {
//!     println!("{} (depth {})", reached.key, reached.depth);
//! }
//! # Ok::<(), codekg::KgError>(())
//! ```
//!
//! # Position Conventions
//!
//! - **Line positions**: 1-indexed, end line inclusive
//! - **File paths**: relative to the build root, `/`-separated
//!
//! # Node Keys
//!
//! Top-level declarations are keyed by their bare name, members by
//! `Parent.member`. Two files declaring the same bare name share one key; the
//! file later in walk order wins.

pub mod common;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod scoring;
pub mod version;

pub use config::{BuildOptions, DEFAULT_MAX_CONTENT_CHARS};
pub use diagnostics::{BuildDiagnostic, DiagnosticStage};
pub use error::{KgError, Result};
pub use graph::{
    collect_source_files, node_key, BuildCompletion, BuildResult, BuildStats, CancellationToken,
    EdgeRelation, Graph, GraphBuilder, GraphEdge, GraphNode, GraphStats, KgStorage, NodeEntry,
    ReachedNode, SourceFile, SCHEMA_VERSION,
};
pub use ingest::{
    detect_language, extract_declarations, extract_relations, extractor_for, extractor_for_tag,
    Declaration, DeclarationKind, KnownNames, Language, LanguageExtractor, ParsedFile, Relation,
};
pub use scoring::{truncate_content, DefaultImportanceScorer, ImportanceScorer, TRUNCATION_MARKER};
pub use version::version;
