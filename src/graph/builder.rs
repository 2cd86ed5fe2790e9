//! Two-pass graph construction.
//!
//! Pass 1 extracts declarations from every file and fixes the node set.
//! Pass 2 extracts relations against the frozen set of known names. Each pass
//! runs its files on a bounded rayon pool; results are merged in file order
//! by the calling thread, so the graph does not depend on scheduling.

use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::BuildOptions;
use crate::diagnostics::{BuildDiagnostic, DiagnosticStage};
use crate::error::{KgError, Result};
use crate::graph::scan::{collect_source_files, SourceFile};
use crate::graph::{node_key, EdgeRelation, Graph, GraphEdge, GraphNode};
use crate::ingest::{extractor_for, Declaration, KnownNames, ParsedFile, Relation};
use crate::scoring::{DefaultImportanceScorer, ImportanceScorer};

/// Shared flag that stops a running build at the next file boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How far a build got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildCompletion {
    Complete,
    /// All nodes are present; edges from files not reached in pass 2 are missing
    RelationsIncomplete,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    /// Files that parsed successfully in pass 1
    pub files_processed: usize,
    /// Files whose parse produced no tree
    pub files_skipped: usize,
    pub nodes_count: usize,
    pub edges_count: usize,
    pub errors_count: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub graph: Graph,
    pub stats: BuildStats,
    pub errors: Vec<BuildDiagnostic>,
    pub skipped: Vec<BuildDiagnostic>,
    pub completion: BuildCompletion,
}

impl BuildResult {
    /// Error list as plain messages.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.completion == BuildCompletion::Complete
    }
}

/// Pass 1 output for one file.
#[derive(Default)]
struct DeclarationOutput {
    declarations: Vec<Declaration>,
    /// Kept for pass 2 when the file parsed
    source: Option<String>,
    error: Option<BuildDiagnostic>,
    skipped: Option<BuildDiagnostic>,
}

/// Pass 2 output for one file.
#[derive(Default)]
struct RelationOutput {
    relations: Vec<Relation>,
    error: Option<BuildDiagnostic>,
}

fn read_source(file: &SourceFile) -> std::io::Result<String> {
    let bytes = std::fs::read(&file.path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

fn declarations_pass(file: &SourceFile, max_content_chars: usize) -> DeclarationOutput {
    let source = match read_source(file) {
        Ok(source) => source,
        Err(err) => {
            tracing::warn!(path = %file.relative, error = %err, "failed to read file");
            return DeclarationOutput {
                error: Some(BuildDiagnostic::new(
                    &file.relative,
                    DiagnosticStage::Read,
                    err.to_string(),
                )),
                ..DeclarationOutput::default()
            };
        }
    };

    let parsed = match ParsedFile::parse(file.language, source, max_content_chars) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            tracing::warn!(path = %file.relative, "parser produced no tree, skipping");
            return DeclarationOutput {
                skipped: Some(BuildDiagnostic::new(
                    &file.relative,
                    DiagnosticStage::Parse,
                    "parser produced no tree",
                )),
                ..DeclarationOutput::default()
            };
        }
        Err(err) => {
            tracing::warn!(path = %file.relative, error = %err, "failed to parse file");
            return DeclarationOutput {
                error: Some(BuildDiagnostic::new(
                    &file.relative,
                    DiagnosticStage::Parse,
                    err.to_string(),
                )),
                ..DeclarationOutput::default()
            };
        }
    };
    if parsed.has_errors() {
        tracing::debug!(path = %file.relative, "syntax errors in file, extracting what parsed");
    }

    let mut declarations = Vec::new();
    let error = extractor_for(file.language)
        .extract_declarations(&parsed, &mut declarations)
        .err()
        .map(|err| {
            tracing::warn!(path = %file.relative, error = %err, "declaration extraction failed");
            BuildDiagnostic::new(&file.relative, DiagnosticStage::Declarations, err.to_string())
        });
    tracing::debug!(
        path = %file.relative,
        declarations = declarations.len(),
        "declarations extracted"
    );

    DeclarationOutput {
        declarations,
        source: Some(parsed.into_source()),
        error,
        skipped: None,
    }
}

fn relations_pass(
    file: &SourceFile,
    source: String,
    known: &KnownNames,
    max_content_chars: usize,
) -> RelationOutput {
    let parsed = match ParsedFile::parse(file.language, source, max_content_chars) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => return RelationOutput::default(),
        Err(err) => {
            tracing::warn!(path = %file.relative, error = %err, "grammar load failed");
            return RelationOutput {
                relations: Vec::new(),
                error: Some(BuildDiagnostic::new(
                    &file.relative,
                    DiagnosticStage::Relations,
                    err.to_string(),
                )),
            };
        }
    };
    let mut relations = Vec::new();
    let error = extractor_for(file.language)
        .extract_relations(&parsed, known, &mut relations)
        .err()
        .map(|err| {
            tracing::warn!(path = %file.relative, error = %err, "relation extraction failed");
            BuildDiagnostic::new(&file.relative, DiagnosticStage::Relations, err.to_string())
        });
    RelationOutput { relations, error }
}

/// Builds a [`Graph`] from a directory tree.
///
/// ```no_run
/// use codekg::{BuildOptions, GraphBuilder};
///
/// let result = GraphBuilder::new(BuildOptions::default()).build("src".as_ref())?;
/// for err in result.error_messages() {
///     eprintln!("warning: {}", err);
/// }
/// # Ok::<(), codekg::KgError>(())
/// ```
pub struct GraphBuilder {
    options: BuildOptions,
    scorer: Arc<dyn ImportanceScorer>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl GraphBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            scorer: Arc::new(DefaultImportanceScorer),
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_scorer(mut self, scorer: impl ImportanceScorer + 'static) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Stop at the first file boundary after `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Discover files under `root` and build the graph.
    pub fn build(&self, root: &Path) -> Result<BuildResult> {
        self.options.validate()?;
        let files = collect_source_files(root, &self.options)?;
        tracing::info!(root = %root.display(), files = files.len(), "building knowledge graph");
        self.build_files(&files)
    }

    /// Build the graph from an already collected file list, in list order.
    pub fn build_files(&self, files: &[SourceFile]) -> Result<BuildResult> {
        let start = Instant::now();
        let max_chars = self.options.max_content_chars;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads)
            .thread_name(|i| format!("codekg-worker-{}", i))
            .build()?;

        // Pass 1
        let outputs: Vec<Option<DeclarationOutput>> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    if self.should_stop() {
                        None
                    } else {
                        Some(declarations_pass(file, max_chars))
                    }
                })
                .collect()
        });
        if outputs.iter().any(Option::is_none) {
            tracing::warn!("build cancelled during declaration pass");
            return Err(KgError::Cancelled);
        }

        let mut graph = Graph::new();
        let mut errors = Vec::new();
        let mut skipped = Vec::new();
        let mut members = Vec::new();
        let mut sources = Vec::with_capacity(files.len());
        let mut files_processed = 0;

        for (file, output) in files.iter().zip(outputs.into_iter().flatten()) {
            errors.extend(output.error);
            skipped.extend(output.skipped);
            if output.source.is_some() {
                files_processed += 1;
            }
            sources.push(output.source);

            for decl in output.declarations {
                let key = decl.key();
                if let Some(parent) = decl.parent_name.as_deref() {
                    members.push((node_key(parent, None), key.clone(), file.relative.clone()));
                }
                let mut node = GraphNode {
                    name: decl.name,
                    kind: decl.kind,
                    file_path: file.relative.clone(),
                    start_line: decl.start_line,
                    end_line: decl.end_line,
                    description: decl.description,
                    content: decl.content,
                    is_exported: decl.is_exported,
                    importance: 0.0,
                };
                node.importance = self.scorer.calculate_importance(&node);
                if let Some(previous) = graph.insert_node(key.clone(), node) {
                    if previous.file_path != file.relative {
                        tracing::debug!(
                            key = %key,
                            previous = %previous.file_path,
                            file = %file.relative,
                            "node key redeclared, keeping later declaration"
                        );
                    }
                }
            }
        }

        // Members resolve against the complete node set
        for (parent, member, src_file) in members {
            if graph.contains_key(&parent) {
                graph.push_edge(GraphEdge {
                    src: parent,
                    tgt: member,
                    relation: EdgeRelation::Contains,
                    src_file,
                });
            }
        }

        // Pass 2
        let known: KnownNames = graph.nodes.keys().cloned().collect();
        let work: Vec<(&SourceFile, String)> = files
            .iter()
            .zip(sources)
            .filter_map(|(file, source)| source.map(|s| (file, s)))
            .collect();
        let outputs: Vec<(&SourceFile, Option<RelationOutput>)> = pool.install(|| {
            work.into_par_iter()
                .map(|(file, source)| {
                    if self.should_stop() {
                        (file, None)
                    } else {
                        (file, Some(relations_pass(file, source, &known, max_chars)))
                    }
                })
                .collect()
        });

        let mut completion = BuildCompletion::Complete;
        for (file, output) in outputs {
            let Some(output) = output else {
                completion = BuildCompletion::RelationsIncomplete;
                continue;
            };
            errors.extend(output.error);
            for rel in output.relations {
                if !graph.contains_key(&rel.src) {
                    continue;
                }
                graph.push_edge(GraphEdge {
                    src: rel.src,
                    tgt: rel.tgt,
                    relation: rel.relation,
                    src_file: file.relative.clone(),
                });
            }
        }
        if completion == BuildCompletion::RelationsIncomplete {
            tracing::warn!("build cancelled during relation pass, graph is missing edges");
        }

        let stats = BuildStats {
            files_processed,
            files_skipped: skipped.len(),
            nodes_count: graph.node_count(),
            edges_count: graph.edge_count(),
            errors_count: errors.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            files = stats.files_processed,
            nodes = stats.nodes_count,
            edges = stats.edges_count,
            errors = stats.errors_count,
            duration_ms = stats.duration_ms,
            "knowledge graph built"
        );

        Ok(BuildResult {
            graph,
            stats,
            errors,
            skipped,
            completion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Language;
    use std::fs;
    use tempfile::TempDir;

    struct FixedScorer;

    impl ImportanceScorer for FixedScorer {
        fn calculate_importance(&self, _node: &GraphNode) -> f64 {
            0.25
        }
    }

    #[test]
    fn test_custom_scorer_is_used() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "package a\n\ntype Foo struct{}\n").unwrap();

        let result = GraphBuilder::new(BuildOptions::default())
            .with_scorer(FixedScorer)
            .build(dir.path())
            .unwrap();
        assert_eq!(result.graph.nodes["Foo"].importance, 0.25);
    }

    #[test]
    fn test_unreadable_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let files = vec![SourceFile {
            path: dir.path().join("missing.rs"),
            relative: "missing.rs".into(),
            language: Language::Rust,
        }];
        let result = GraphBuilder::new(BuildOptions::default()).build_files(&files).unwrap();

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].stage, DiagnosticStage::Read);
        assert_eq!(result.stats.files_processed, 0);
        assert!(result.error_messages()[0].starts_with("read failed: missing.rs"));
    }

    #[test]
    fn test_expired_deadline_cancels_first_pass() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "class A:\n    pass\n").unwrap();

        let result = GraphBuilder::new(BuildOptions::default())
            .with_deadline(Instant::now())
            .build(dir.path());
        assert!(matches!(result, Err(KgError::Cancelled)));
    }

    #[test]
    fn test_empty_file_list() {
        let result = GraphBuilder::new(BuildOptions::default()).build_files(&[]).unwrap();
        assert!(result.is_complete());
        assert_eq!(result.stats.nodes_count, 0);
        assert_eq!(
            result.stats,
            BuildStats {
                duration_ms: result.stats.duration_ms,
                ..BuildStats::default()
            }
        );
    }
}
