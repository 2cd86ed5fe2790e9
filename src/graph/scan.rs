//! Source file discovery.
//!
//! Filtering precedence:
//! 1. Hard internal ignores (`.git/`, `target/`, `node_modules/`, ...)
//! 2. Gitignore-style rules from `.gitignore` and `.ignore` at the root
//! 3. Exclude globs from [`BuildOptions::exclude_patterns`]
//! 4. Language detection by extension
//!
//! The walk is sorted by file name, so the same tree always yields the same
//! file order.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::BuildOptions;
use crate::error::{KgError, Result};
use crate::ingest::{detect_language, Language};

/// Directories that are never descended into.
const INTERNAL_IGNORE_DIRS: &[&str] = &[
    ".git",
    "target",
    "node_modules",
    ".venv",
    "venv",
    "__pycache__",
];

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Root-relative path with `/` separators
    pub relative: String,
    pub language: Language,
}

/// Root-relative path with forward slashes, or `None` for the root itself.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn load_gitignore(root: &Path) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);
    for name in [".gitignore", ".ignore"] {
        let path = root.join(name);
        if path.is_file() {
            if let Some(err) = builder.add(&path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to load ignore file");
            }
        }
    }
    Ok(builder.build()?)
}

fn compile_excludes(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| KgError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| KgError::Glob {
        pattern: patterns.join(","),
        source,
    })
}

/// Collect every supported source file under `root`.
///
/// Unreadable directory entries are skipped with a debug log. Collection
/// stops once [`BuildOptions::max_files`] files have been found. Invalid
/// options are rejected before the walk starts.
pub fn collect_source_files(root: &Path, options: &BuildOptions) -> Result<Vec<SourceFile>> {
    options.validate()?;
    if !root.is_dir() {
        return Err(KgError::NotADirectory(root.to_path_buf()));
    }
    let gitignore = if options.respect_gitignore {
        Some(load_gitignore(root)?)
    } else {
        None
    };
    let excludes = compile_excludes(&options.exclude_patterns)?;

    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if INTERNAL_IGNORE_DIRS.contains(&name.as_ref()) {
                return false;
            }
            match &gitignore {
                Some(gi) => !gi.matched(entry.path(), true).is_ignore(),
                None => true,
            }
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(relative) = relative_path(root, path) else {
            continue;
        };
        if let Some(gi) = &gitignore {
            if gi.matched_path_or_any_parents(path, false).is_ignore() {
                continue;
            }
        }
        if excludes.is_match(&relative) {
            continue;
        }
        let Some(language) = detect_language(path) else {
            continue;
        };
        files.push(SourceFile {
            path: path.to_path_buf(),
            relative,
            language,
        });
        if options.max_files.is_some_and(|max| files.len() >= max) {
            tracing::info!(max_files = files.len(), "file limit reached, stopping discovery");
            break;
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn relatives(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative.as_str()).collect()
    }

    #[test]
    fn test_collects_supported_files_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.go", "package b");
        write(dir.path(), "a/z.py", "");
        write(dir.path(), "a/y.rs", "");
        write(dir.path(), "notes.md", "# notes");

        let files = collect_source_files(dir.path(), &BuildOptions::default()).unwrap();
        assert_eq!(relatives(&files), vec!["a/y.rs", "a/z.py", "b.go"]);
        assert_eq!(files[0].language, Language::Rust);
    }

    #[test]
    fn test_internal_and_default_excludes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/lib/index.js", "");
        write(dir.path(), "target/debug/gen.rs", "");
        write(dir.path(), "web/app.min.js", "");
        write(dir.path(), "web/app.js", "");

        let files = collect_source_files(dir.path(), &BuildOptions::default()).unwrap();
        assert_eq!(relatives(&files), vec!["web/app.js"]);
    }

    #[test]
    fn test_gitignore_respected_unless_disabled() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "generated/\nscratch.py\n");
        write(dir.path(), "generated/api.ts", "");
        write(dir.path(), "scratch.py", "");
        write(dir.path(), "main.py", "");

        let files = collect_source_files(dir.path(), &BuildOptions::default()).unwrap();
        assert_eq!(relatives(&files), vec!["main.py"]);

        let options = BuildOptions {
            respect_gitignore: false,
            ..BuildOptions::default()
        };
        let files = collect_source_files(dir.path(), &options).unwrap();
        assert_eq!(relatives(&files), vec!["generated/api.ts", "main.py", "scratch.py"]);
    }

    #[test]
    fn test_max_files_and_invalid_glob() {
        let dir = TempDir::new().unwrap();
        for name in ["a.go", "b.go", "c.go"] {
            write(dir.path(), name, "package x");
        }
        let options = BuildOptions {
            max_files: Some(2),
            ..BuildOptions::default()
        };
        assert_eq!(collect_source_files(dir.path(), &options).unwrap().len(), 2);

        let options = BuildOptions {
            max_files: Some(0),
            ..BuildOptions::default()
        };
        assert!(matches!(
            collect_source_files(dir.path(), &options),
            Err(KgError::Config(_))
        ));

        let options = BuildOptions {
            exclude_patterns: vec!["[".into()],
            ..BuildOptions::default()
        };
        assert!(matches!(
            collect_source_files(dir.path(), &options),
            Err(KgError::Glob { .. })
        ));
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "file.rs", "");
        let file = dir.path().join("file.rs");
        let err = collect_source_files(&file, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, KgError::NotADirectory(_)));
    }
}
