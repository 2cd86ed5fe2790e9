//! Node importance scoring and content truncation.
//!
//! Both are pure functions of their input. The builder calls the scorer once
//! per node while merging pass 1 results and truncates declaration content
//! at extraction time.

use crate::common::truncate_chars;
use crate::graph::GraphNode;
use crate::ingest::DeclarationKind;

/// Marker appended to truncated content.
pub const TRUNCATION_MARKER: &str = "\n...";

/// Span length (in lines) at which the size bonus saturates.
const SPAN_SATURATION: usize = 200;

/// Assigns a relevance score to a graph node.
pub trait ImportanceScorer: Send + Sync {
    fn calculate_importance(&self, node: &GraphNode) -> f64;
}

/// Scores by kind, visibility, documentation and size. Output is in `[0, 1]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultImportanceScorer;

impl DefaultImportanceScorer {
    fn kind_weight(kind: DeclarationKind) -> f64 {
        match kind {
            DeclarationKind::Interface => 0.7,
            DeclarationKind::Class => 0.6,
            DeclarationKind::Function => 0.5,
            DeclarationKind::Method => 0.4,
            DeclarationKind::Enum => 0.4,
            DeclarationKind::Type => 0.3,
        }
    }
}

impl ImportanceScorer for DefaultImportanceScorer {
    fn calculate_importance(&self, node: &GraphNode) -> f64 {
        let mut score = Self::kind_weight(node.kind);
        if node.is_exported {
            score += 0.2;
        }
        if node.description.is_some() {
            score += 0.1;
        }
        let span = node.end_line.saturating_sub(node.start_line) + 1;
        score += 0.1 * span.min(SPAN_SATURATION) as f64 / SPAN_SATURATION as f64;

        (score.clamp(0.0, 1.0) * 1000.0).round() / 1000.0
    }
}

/// Bound `text` to roughly `max_chars` characters.
///
/// Text within the bound is returned unchanged. Longer text is cut at a
/// character boundary, pulled back to the last line break when that keeps at
/// least half the budget, and suffixed with [`TRUNCATION_MARKER`].
pub fn truncate_content(text: &str, max_chars: usize) -> String {
    let prefix = truncate_chars(text, max_chars);
    if prefix.len() == text.len() {
        return text.to_string();
    }

    let cut = match prefix.rfind('\n') {
        Some(pos) if prefix[..pos].chars().count() >= max_chars / 2 => &prefix[..pos],
        _ => prefix,
    };
    format!("{}{}", cut.trim_end(), TRUNCATION_MARKER)
}
