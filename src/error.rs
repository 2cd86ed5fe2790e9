//! Error types for graph construction, extraction, and snapshot loading.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, KgError>;

/// Errors surfaced by the library.
///
/// Per-file extraction failures during a build are converted into
/// [`BuildDiagnostic`](crate::diagnostics::BuildDiagnostic) values and do not
/// abort the build; everything else propagates to the caller.
#[derive(Debug, thiserror::Error)]
pub enum KgError {
    /// No extractor exists for the requested language tag
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The tree-sitter grammar could not be loaded into a parser
    #[error("failed to load {language} grammar: {source}")]
    Grammar {
        language: &'static str,
        #[source]
        source: tree_sitter::LanguageError,
    },

    /// A syntax node spans bytes that are not valid UTF-8
    #[error("invalid UTF-8 in {kind} node at line {line}")]
    InvalidUtf8 { kind: String, line: usize },

    /// A syntax node spans bytes outside the source buffer
    #[error("{kind} node at line {line} is out of bounds")]
    NodeOutOfBounds { kind: String, line: usize },

    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Gitignore rules could not be compiled
    #[error("failed to load ignore rules: {0}")]
    Ignore(#[from] ignore::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid build configuration: {0}")]
    Config(String),

    #[error("failed to serialize graph: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to deserialize graph: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// Snapshot written by an incompatible schema
    #[error("unsupported graph schema version {found} (expected at most {supported})")]
    SchemaVersion { found: u32, supported: u32 },

    #[error("root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The build was cancelled before the node set was complete
    #[error("build cancelled during declaration pass")]
    Cancelled,
}

impl KgError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KgError::Io {
            path: path.into(),
            source,
        }
    }
}
