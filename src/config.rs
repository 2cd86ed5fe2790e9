//! Build configuration.
//!
//! Every field has a default, so a config file only needs to name the
//! settings it changes:
//!
//! ```json
//! { "excludePatterns": ["**/generated/**"], "maxFiles": 5000 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{KgError, Result};

/// Default bound on the stored source text of a single declaration.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 2000;

/// Options controlling file discovery and graph construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildOptions {
    /// Globs matched against root-relative paths with `/` separators
    pub exclude_patterns: Vec<String>,
    /// Hard cap on the number of collected files
    pub max_files: Option<usize>,
    /// Bound passed to content truncation for each declaration
    pub max_content_chars: usize,
    /// Worker threads per pass (0 = one per core)
    pub threads: usize,
    /// Honour `.gitignore` and `.ignore` at the root
    pub respect_gitignore: bool,
    /// Follow symbolic links while walking
    pub follow_links: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: default_exclude_patterns(),
            max_files: None,
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            threads: 0,
            respect_gitignore: true,
            follow_links: false,
        }
    }
}

fn default_exclude_patterns() -> Vec<String> {
    [
        "**/node_modules/**",
        "**/.git/**",
        "**/target/**",
        "**/dist/**",
        "**/build/**",
        "**/*.min.js",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl BuildOptions {
    /// Load options from a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| KgError::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(text).map_err(|e| KgError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reject settings that cannot produce a meaningful build.
    pub fn validate(&self) -> Result<()> {
        if self.max_content_chars == 0 {
            return Err(KgError::Config("maxContentChars must be at least 1".into()));
        }
        if self.max_files == Some(0) {
            return Err(KgError::Config("maxFiles must be at least 1 when set".into()));
        }
        Ok(())
    }
}
