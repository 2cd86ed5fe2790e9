//! codekg CLI - build and query code knowledge graphs
//!
//! Usage: codekg <command> [arguments]

mod cli;

use anyhow::{Context, Result};
use codekg::{BuildOptions, DeclarationKind, GraphBuilder, GraphNode, KgStorage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{parse_args_impl, print_usage, Command, Invocation, QueryMode};

/// One line of query output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRow<'a> {
    key: &'a str,
    name: &'a str,
    kind: DeclarationKind,
    file_path: &'a str,
    start_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<usize>,
}

impl<'a> QueryRow<'a> {
    fn new(key: &'a str, node: &'a GraphNode, depth: Option<usize>) -> Self {
        Self {
            key,
            name: &node.name,
            kind: node.kind,
            file_path: &node.file_path,
            start_line: node.start_line,
            depth,
        }
    }
}

/// Logs go to stderr; stdout carries JSON only.
fn init_tracing(verbose: bool) {
    let default = if verbose { "codekg=debug" } else { "codekg=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[allow(clippy::too_many_arguments)]
fn run_build(
    root: PathBuf,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
    excludes: Vec<String>,
    max_files: Option<usize>,
    threads: Option<usize>,
    no_gitignore: bool,
    pretty: bool,
) -> Result<()> {
    let mut options = match &config {
        Some(path) => BuildOptions::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BuildOptions::default(),
    };
    options.exclude_patterns.extend(excludes);
    if max_files.is_some() {
        options.max_files = max_files;
    }
    if let Some(threads) = threads {
        options.threads = threads;
    }
    if no_gitignore {
        options.respect_gitignore = false;
    }

    let result = GraphBuilder::new(options)
        .build(&root)
        .with_context(|| format!("failed to build graph for {}", root.display()))?;
    for diagnostic in &result.errors {
        tracing::warn!("{}", diagnostic);
    }

    let stats = result.stats.clone();
    let complete = result.is_complete();
    let skipped = result.skipped.len();
    let storage = KgStorage::from_graph(result.graph);
    let json = if pretty {
        storage.to_json_pretty()?
    } else {
        storage.to_json()?
    };
    match &out {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    eprintln!(
        "Built graph: {} files ({} skipped), {} nodes, {} edges, {} errors in {}ms{}",
        stats.files_processed,
        skipped,
        stats.nodes_count,
        stats.edges_count,
        stats.errors_count,
        stats.duration_ms,
        if complete { "" } else { " (relations incomplete)" }
    );
    Ok(())
}

fn run_query(graph: &Path, mode: QueryMode, depth: usize) -> Result<()> {
    let json = std::fs::read_to_string(graph)
        .with_context(|| format!("failed to read {}", graph.display()))?;
    let storage = KgStorage::from_json(&json)
        .with_context(|| format!("failed to load {}", graph.display()))?;

    let rows: Vec<QueryRow<'_>> = match &mode {
        QueryMode::Successors(key) => reached_rows(storage.get_successors(key, depth)),
        QueryMode::Predecessors(key) => reached_rows(storage.get_predecessors(key, depth)),
        QueryMode::Neighbors(key) => reached_rows(storage.get_neighbors(key, depth)),
        QueryMode::Implementors(key) => storage
            .get_implementors(key)
            .into_iter()
            .map(|e| QueryRow::new(e.key, e.node, None))
            .collect(),
        QueryMode::File(path) => storage
            .get_types_by_file(path)
            .into_iter()
            .map(|e| QueryRow::new(e.key, e.node, None))
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn reached_rows(reached: Vec<codekg::ReachedNode<'_>>) -> Vec<QueryRow<'_>> {
    reached
        .into_iter()
        .map(|r| QueryRow::new(r.key, r.node, Some(r.depth)))
        .collect()
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let Invocation { command, verbose } = match parse_args_impl(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::from(1);
        }
    };

    let outcome = match command {
        Command::Version => {
            println!("{}", codekg::version());
            Ok(())
        }
        Command::Help => {
            print_usage();
            Ok(())
        }
        Command::Build {
            root,
            out,
            config,
            excludes,
            max_files,
            threads,
            no_gitignore,
            pretty,
        } => {
            init_tracing(verbose);
            run_build(root, out, config, excludes, max_files, threads, no_gitignore, pretty)
        }
        Command::Query { graph, mode, depth } => {
            init_tracing(verbose);
            run_query(&graph, mode, depth)
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
