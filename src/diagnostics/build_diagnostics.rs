//! Per-file diagnostics collected during a graph build.
//!
//! A diagnostic never aborts a build. The builder keeps two lists: files that
//! failed (read, grammar, extraction) and files whose parse produced no tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage in which a file-level problem occurred.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStage {
    /// Reading the file from disk
    Read,
    /// Loading the grammar or producing a syntax tree
    Parse,
    /// Pass 1
    Declarations,
    /// Pass 2
    Relations,
}

impl DiagnosticStage {
    /// Message prefix used in build error lists.
    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticStage::Read => "read failed",
            DiagnosticStage::Parse => "parse failed",
            DiagnosticStage::Declarations => "declaration extraction failed",
            DiagnosticStage::Relations => "relation extraction failed",
        }
    }
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A problem with one file, keyed by its root-relative path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildDiagnostic {
    pub path: String,
    pub stage: DiagnosticStage,
    pub message: String,
}

impl BuildDiagnostic {
    pub fn new(
        path: impl Into<String>,
        stage: DiagnosticStage,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            stage,
            message: message.into(),
        }
    }

    /// Sort by path, then by stage.
    pub fn sort_key(&self) -> (&str, DiagnosticStage) {
        (&self.path, self.stage)
    }
}

impl fmt::Display for BuildDiagnostic {
    /// "declaration extraction failed: src/a.go: invalid UTF-8 in identifier node at line 3"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.stage, self.path, self.message)
    }
}
