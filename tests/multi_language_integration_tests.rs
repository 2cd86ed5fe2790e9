//! Integration tests for multi-language support
//!
//! Builds one graph from a tree mixing every supported language.

use codekg::{BuildOptions, DeclarationKind, EdgeRelation, GraphBuilder, KgStorage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn test_multi_language_build() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "go/store.go",
        r#"package store

// Store persists records.
type Store interface {
	Get(id string) string
}

type MemStore struct{}

func (m *MemStore) Get(id string) string { return id }
"#,
    );
    write(
        dir.path(),
        "java/App.java",
        r#"public class App {
    public App(Store store) {}
    public void run() {}
}
"#,
    );
    write(
        dir.path(),
        "py/jobs.py",
        r#"from enum import Enum

class Priority(Enum):
    LOW = 1

def schedule():
    """Queue a job."""
    pass
"#,
    );
    write(
        dir.path(),
        "rs/lib.rs",
        r#"/// Shared cache.
pub struct Cache;

pub trait Evict {}

impl Evict for Cache {}
"#,
    );
    write(
        dir.path(),
        "web/api.ts",
        r#"export type Handler = () => void;

export const route = (h: Handler) => {};
"#,
    );
    write(dir.path(), "web/legacy.js", "function boot() {}\n");
    write(dir.path(), "README.md", "# not source\n");

    let result = GraphBuilder::new(BuildOptions::default()).build(dir.path()).unwrap();
    assert!(result.errors.is_empty(), "{:?}", result.error_messages());
    assert_eq!(result.stats.files_processed, 6);

    let nodes = &result.graph.nodes;
    let kind = |key: &str| nodes[key].kind;
    assert_eq!(kind("Store"), DeclarationKind::Interface);
    assert_eq!(kind("MemStore"), DeclarationKind::Class);
    assert_eq!(kind("MemStore.Get"), DeclarationKind::Method);
    assert_eq!(kind("App"), DeclarationKind::Class);
    assert_eq!(kind("App.run"), DeclarationKind::Method);
    assert_eq!(kind("Priority"), DeclarationKind::Enum);
    assert_eq!(kind("schedule"), DeclarationKind::Function);
    assert_eq!(kind("Cache"), DeclarationKind::Class);
    assert_eq!(kind("Evict"), DeclarationKind::Interface);
    assert_eq!(kind("Handler"), DeclarationKind::Type);
    assert_eq!(kind("route"), DeclarationKind::Function);
    assert_eq!(kind("boot"), DeclarationKind::Function);

    assert_eq!(nodes["Store"].description.as_deref(), Some("Store persists records."));
    assert_eq!(nodes["schedule"].description.as_deref(), Some("Queue a job."));
    assert_eq!(nodes["Cache"].description.as_deref(), Some("Shared cache."));
    assert_eq!(nodes["App"].file_path, "java/App.java");

    let storage = KgStorage::from_graph(result.graph);
    // Java constructor injects a Go interface: names are matched across languages
    assert!(storage
        .outgoing("App")
        .any(|e| e.tgt == "Store" && e.relation == EdgeRelation::Injects));
    assert!(storage
        .outgoing("Cache")
        .any(|e| e.tgt == "Evict" && e.relation == EdgeRelation::Implements));
    assert!(storage.get_implementors("Store").is_empty());
    assert_eq!(storage.get_implementors("Evict").len(), 1);
}
