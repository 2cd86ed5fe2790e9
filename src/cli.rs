//! Command-line argument parsing.

use anyhow::Result;
use std::path::PathBuf;

/// Default hop limit for traversal queries.
pub const DEFAULT_QUERY_DEPTH: usize = 1;

pub fn print_usage() {
    eprintln!("codekg - Multi-language code knowledge graph");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  codekg <command> [arguments]");
    eprintln!("  codekg --help");
    eprintln!("  codekg --version");
    eprintln!();
    eprintln!("  codekg build --root <DIR> [--out <FILE>] [--config <FILE>] [--exclude <GLOB>]...");
    eprintln!("               [--max-files <N>] [--threads <N>] [--no-gitignore] [--pretty]");
    eprintln!("  codekg query --graph <FILE> (--successors|--predecessors|--neighbors) <KEY>");
    eprintln!("               [--depth <N>]");
    eprintln!("  codekg query --graph <FILE> --implementors <KEY>");
    eprintln!("  codekg query --graph <FILE> --file <PATH>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  build     Build a graph snapshot from a source tree");
    eprintln!("  query     Query a graph snapshot");
    eprintln!();
    eprintln!("Global arguments:");
    eprintln!("  --verbose           Debug logging (RUST_LOG overrides)");
    eprintln!();
    eprintln!("Build arguments:");
    eprintln!("  --root <DIR>        Directory to index recursively");
    eprintln!("  --out <FILE>        Write the snapshot here instead of stdout");
    eprintln!("  --config <FILE>     JSON build options; flags below override it");
    eprintln!("  --exclude <GLOB>    Additional exclude glob (repeatable)");
    eprintln!("  --max-files <N>     Stop discovery after N files");
    eprintln!("  --threads <N>       Worker threads per pass (default: one per core)");
    eprintln!("  --no-gitignore      Ignore .gitignore/.ignore rules");
    eprintln!("  --pretty            Pretty-print the snapshot");
    eprintln!();
    eprintln!("Query arguments:");
    eprintln!("  --graph <FILE>      Snapshot written by `codekg build`");
    eprintln!("  --depth <N>         Hop limit for traversals (default: {})", DEFAULT_QUERY_DEPTH);
}

/// What a `query` invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMode {
    Successors(String),
    Predecessors(String),
    Neighbors(String),
    Implementors(String),
    File(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Build {
        root: PathBuf,
        out: Option<PathBuf>,
        config: Option<PathBuf>,
        excludes: Vec<String>,
        max_files: Option<usize>,
        threads: Option<usize>,
        no_gitignore: bool,
        pretty: bool,
    },
    Query {
        graph: PathBuf,
        mode: QueryMode,
        depth: usize,
    },
    Version,
    Help,
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub verbose: bool,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} requires an argument", flag))
}

fn number(args: &[String], i: usize, flag: &str) -> Result<usize> {
    let raw = value(args, i, flag)?;
    raw.parse()
        .map_err(|_| anyhow::anyhow!("{} expects a non-negative integer, got '{}'", flag, raw))
}

fn parse_build(args: &[String]) -> Result<Command> {
    let mut root: Option<PathBuf> = None;
    let mut out = None;
    let mut config = None;
    let mut excludes = Vec::new();
    let mut max_files = None;
    let mut threads = None;
    let mut no_gitignore = false;
    let mut pretty = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--root" => {
                root = Some(PathBuf::from(value(args, i, "--root")?));
                i += 2;
            }
            "--out" => {
                out = Some(PathBuf::from(value(args, i, "--out")?));
                i += 2;
            }
            "--config" => {
                config = Some(PathBuf::from(value(args, i, "--config")?));
                i += 2;
            }
            "--exclude" => {
                excludes.push(value(args, i, "--exclude")?.to_string());
                i += 2;
            }
            "--max-files" => {
                max_files = Some(number(args, i, "--max-files")?);
                i += 2;
            }
            "--threads" => {
                threads = Some(number(args, i, "--threads")?);
                i += 2;
            }
            "--no-gitignore" => {
                no_gitignore = true;
                i += 1;
            }
            "--pretty" => {
                pretty = true;
                i += 1;
            }
            other => return Err(anyhow::anyhow!("Unknown argument: {}", other)),
        }
    }

    let root = root.ok_or_else(|| anyhow::anyhow!("--root is required"))?;
    Ok(Command::Build {
        root,
        out,
        config,
        excludes,
        max_files,
        threads,
        no_gitignore,
        pretty,
    })
}

fn parse_query(args: &[String]) -> Result<Command> {
    let mut graph: Option<PathBuf> = None;
    let mut mode: Option<QueryMode> = None;
    let mut depth = DEFAULT_QUERY_DEPTH;

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let next_mode: Option<fn(String) -> QueryMode> = match flag {
            "--successors" => Some(QueryMode::Successors),
            "--predecessors" => Some(QueryMode::Predecessors),
            "--neighbors" => Some(QueryMode::Neighbors),
            "--implementors" => Some(QueryMode::Implementors),
            "--file" => Some(QueryMode::File),
            _ => None,
        };
        if let Some(make) = next_mode {
            if mode.is_some() {
                return Err(anyhow::anyhow!("only one query mode may be given"));
            }
            mode = Some(make(value(args, i, flag)?.to_string()));
            i += 2;
            continue;
        }
        match flag {
            "--graph" => {
                graph = Some(PathBuf::from(value(args, i, "--graph")?));
                i += 2;
            }
            "--depth" => {
                depth = number(args, i, "--depth")?;
                i += 2;
            }
            other => return Err(anyhow::anyhow!("Unknown argument: {}", other)),
        }
    }

    let graph = graph.ok_or_else(|| anyhow::anyhow!("--graph is required"))?;
    let mode = mode.ok_or_else(|| {
        anyhow::anyhow!(
            "one of --successors, --predecessors, --neighbors, --implementors or --file is required"
        )
    })?;
    Ok(Command::Query { graph, mode, depth })
}

/// Parse a full argument vector (program name first).
pub fn parse_args_impl(args: &[String]) -> Result<Invocation> {
    let verbose = args.iter().skip(1).any(|a| a == "--verbose");
    let rest: Vec<String> = args.iter().skip(1).filter(|a| *a != "--verbose").cloned().collect();

    let Some(command) = rest.first() else {
        return Err(anyhow::anyhow!("Missing command"));
    };
    let command = match command.as_str() {
        "--version" | "-V" => Command::Version,
        "--help" | "-h" => Command::Help,
        "build" => parse_build(&rest[1..])?,
        "query" => parse_query(&rest[1..])?,
        other => return Err(anyhow::anyhow!("Unknown command: {}", other)),
    };
    Ok(Invocation { command, verbose })
}
