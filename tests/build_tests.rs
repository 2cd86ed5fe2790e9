//! End-to-end graph builds over temporary source trees.

use codekg::{
    BuildCompletion, BuildOptions, CancellationToken, DeclarationKind, DiagnosticStage,
    EdgeRelation, GraphBuilder, GraphEdge, GraphNode, ImportanceScorer, KgError,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn has_edge(edges: &[GraphEdge], src: &str, tgt: &str, relation: EdgeRelation) -> bool {
    edges
        .iter()
        .any(|e| e.src == src && e.tgt == tgt && e.relation == relation)
}

fn build(root: &Path) -> codekg::BuildResult {
    GraphBuilder::new(BuildOptions::default()).build(root).unwrap()
}

#[test]
fn test_java_extends_and_implements() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Foo.java", "public class Foo extends Bar implements Baz {}\n");
    write(dir.path(), "Bar.java", "public class Bar {}\n");
    write(dir.path(), "Baz.java", "public interface Baz {}\n");

    let result = build(dir.path());
    let edges = &result.graph.edges;
    assert!(has_edge(edges, "Foo", "Bar", EdgeRelation::Extends));
    assert!(has_edge(edges, "Foo", "Baz", EdgeRelation::Implements));
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| e.src_file == "Foo.java"));
    assert!(result.errors.is_empty());
}

#[test]
fn test_go_receiver_method_contains_edge_across_files() {
    let dir = TempDir::new().unwrap();
    // a_methods.go is processed before b_types.go declares the receiver
    write(dir.path(), "a_methods.go", "package x\n\nfunc (r *Receiver) Method() {}\n");
    write(dir.path(), "b_types.go", "package x\n\ntype Receiver struct{}\n");

    let result = build(dir.path());
    let method = &result.graph.nodes["Receiver.Method"];
    assert_eq!(method.name, "Method");
    assert_eq!(method.kind, DeclarationKind::Method);
    assert_eq!(method.file_path, "a_methods.go");
    assert!(has_edge(
        &result.graph.edges,
        "Receiver",
        "Receiver.Method",
        EdgeRelation::Contains
    ));
}

#[test]
fn test_member_without_declared_parent_has_no_contains_edge() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "m.go", "package x\n\nfunc (o Orphan) Run() {}\n");

    let result = build(dir.path());
    assert!(result.graph.contains_key("Orphan.Run"));
    assert!(result.graph.edges.is_empty());
}

#[test]
fn test_rust_trait_impl() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/lib.rs",
        "pub trait T {}\npub struct S;\nimpl T for S {}\nimpl Display for S {}\n",
    );

    let result = build(dir.path());
    assert_eq!(result.graph.edges.len(), 1);
    assert!(has_edge(&result.graph.edges, "S", "T", EdgeRelation::Implements));
    assert_eq!(result.graph.edges[0].src_file, "src/lib.rs");
}

#[test]
fn test_undeclared_base_yields_no_edge_and_no_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.py", "class Handler(UndeclaredBase):\n    pass\n");
    write(dir.path(), "b.ts", "export class Widget extends Missing implements AlsoMissing {}\n");

    let result = build(dir.path());
    assert_eq!(result.graph.node_count(), 2);
    assert!(result.graph.edges.is_empty());
    assert!(result.errors.is_empty());
    assert_eq!(result.stats.files_processed, 2);
}

#[test]
fn test_same_bare_name_keeps_later_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/config.py", "class Config:\n    pass\n");
    write(dir.path(), "b/config.py", "class Config:\n    \"\"\"Second.\"\"\"\n");

    let result = build(dir.path());
    assert_eq!(result.graph.node_count(), 1);
    let node = &result.graph.nodes["Config"];
    assert_eq!(node.file_path, "b/config.py");
    assert_eq!(node.description.as_deref(), Some("Second."));
}

#[test]
fn test_stats_and_node_fields() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "svc.go",
        "package svc\n\n// Service handles requests.\ntype Service struct {\n\tRepo Repo\n}\n\ntype Repo interface{}\n",
    );

    let result = build(dir.path());
    assert_eq!(result.stats.files_processed, 1);
    assert_eq!(result.stats.nodes_count, 2);
    assert_eq!(result.stats.edges_count, 1);
    assert_eq!(result.stats.errors_count, 0);

    let service = &result.graph.nodes["Service"];
    assert_eq!(service.kind, DeclarationKind::Class);
    assert_eq!(service.start_line, 4);
    assert_eq!(service.end_line, 6);
    assert_eq!(service.description.as_deref(), Some("Service handles requests."));
    assert!(service.is_exported);
    assert!(service.content.starts_with("type Service struct"));
    assert!(service.importance > 0.0 && service.importance <= 1.0);
    assert!(has_edge(&result.graph.edges, "Service", "Repo", EdgeRelation::Injects));
}

#[test]
fn test_max_files_caps_processing() {
    let dir = TempDir::new().unwrap();
    for name in ["a", "b", "c", "d"] {
        let source = format!("class {}Cls:\n    pass\n", name.to_uppercase());
        write(dir.path(), &format!("{}.py", name), &source);
    }
    let options = BuildOptions {
        max_files: Some(2),
        ..BuildOptions::default()
    };
    let result = GraphBuilder::new(options).build(dir.path()).unwrap();

    assert_eq!(result.stats.files_processed, 2);
    let keys: Vec<_> = result.graph.nodes.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["ACls", "BCls"]);
}

#[test]
fn test_exclude_patterns_and_gitignore() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".gitignore", "ignored/\n");
    write(dir.path(), "ignored/a.rs", "pub struct Ignored;\n");
    write(dir.path(), "gen/b.rs", "pub struct Generated;\n");
    write(dir.path(), "src/c.rs", "pub struct Kept;\n");

    let mut options = BuildOptions::default();
    options.exclude_patterns.push("gen/**".into());
    let result = GraphBuilder::new(options).build(dir.path()).unwrap();

    let keys: Vec<_> = result.graph.nodes.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Kept"]);
}

#[test]
fn test_build_is_independent_of_thread_count() {
    let dir = TempDir::new().unwrap();
    for i in 0..12 {
        write(
            dir.path(),
            &format!("pkg{}/types.go", i),
            &format!(
                "package p\n\ntype Base interface{{}}\n\ntype Impl{} struct {{\n\tBase\n}}\n",
                i
            ),
        );
    }

    let run = |threads| {
        let options = BuildOptions {
            threads,
            ..BuildOptions::default()
        };
        let result = GraphBuilder::new(options).build(dir.path()).unwrap();
        (result.graph.nodes, result.graph.edges)
    };
    let single = run(1);
    assert_eq!(single, run(4));
    assert_eq!(single.0.len(), 13);
    assert_eq!(single.1.len(), 12);
    assert_eq!(single.0["Base"].file_path, "pkg9/types.go");
}

#[test]
fn test_invalid_root_is_error() {
    let dir = TempDir::new().unwrap();
    let err = GraphBuilder::new(BuildOptions::default())
        .build(&dir.path().join("missing"))
        .unwrap_err();
    assert!(matches!(err, KgError::NotADirectory(_)));
}

#[test]
fn test_cancelled_before_start_is_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.rs", "pub struct A;\n");
    let token = CancellationToken::new();
    token.cancel();

    let result = GraphBuilder::new(BuildOptions::default())
        .with_cancellation(token)
        .build(dir.path());
    assert!(matches!(result, Err(KgError::Cancelled)));
}

/// Cancels the build while pass 1 results are being merged.
struct CancellingScorer(CancellationToken);

impl ImportanceScorer for CancellingScorer {
    fn calculate_importance(&self, _node: &GraphNode) -> f64 {
        self.0.cancel();
        0.5
    }
}

#[test]
fn test_cancelled_between_passes_keeps_nodes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.java", "class Child extends Parent {}\nclass Parent {}\n");
    let token = CancellationToken::new();

    let result = GraphBuilder::new(BuildOptions::default())
        .with_scorer(CancellingScorer(token.clone()))
        .with_cancellation(token)
        .build(dir.path())
        .unwrap();

    assert_eq!(result.completion, BuildCompletion::RelationsIncomplete);
    assert!(!result.is_complete());
    assert_eq!(result.graph.node_count(), 2);
    assert!(result.graph.edges.is_empty());
}

#[test]
fn test_syntax_errors_do_not_abort() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "broken.rs", "pub struct Fine;\nfn broken( {\n");
    write(dir.path(), "ok.rs", "pub enum Mode { A }\n");

    let result = build(dir.path());
    assert!(result.graph.contains_key("Fine"));
    assert!(result.graph.contains_key("Mode"));
    assert!(result.skipped.is_empty());
    assert_eq!(result.stats.files_processed, 2);
}

#[test]
fn test_non_utf8_file_is_read_lossily() {
    let dir = TempDir::new().unwrap();
    let mut bytes = b"# caf\xe9\nclass Menu:\n    pass\n".to_vec();
    bytes.push(b'\n');
    fs::write(dir.path().join("menu.py"), bytes).unwrap();

    let result = build(dir.path());
    assert!(result.graph.contains_key("Menu"));
    assert!(result
        .errors
        .iter()
        .all(|e| e.stage != DiagnosticStage::Read));
}
