//! Core records shared by indexing, search and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One indexed unit: a run of at most `chunk_lines` contiguous lines of one file.
///
/// Line numbers are 1-based and inclusive. Snippets are never mutated after
/// the corpus builder emits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSnippet {
    /// Path of the file, prefixed by the repository directory name
    pub file: String,
    /// Name of the repository the file came from
    pub repo: String,
    pub content: String,
    pub line_start: u32,
    pub line_end: u32,
}

impl CodeSnippet {
    /// Number of lines covered by this snippet.
    pub fn line_count(&self) -> u32 {
        self.line_end + 1 - self.line_start
    }
}

/// A formatted search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub file: String,
    pub repo: String,
    pub content: String,
    pub line_start: u32,
    pub line_end: u32,
    /// `1 / (1 + distance)`, in (0, 1]
    pub similarity_score: f32,
}

impl SearchHit {
    pub fn from_snippet(snippet: &CodeSnippet, similarity_score: f32) -> Self {
        Self {
            file: snippet.file.clone(),
            repo: snippet.repo.clone(),
            content: snippet.content.clone(),
            line_start: snippet.line_start,
            line_end: snippet.line_end,
            similarity_score,
        }
    }

    /// First `max_chars` characters of the content, for terminal previews.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }
}

/// What a call to `SearchEngine::search` hands back.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Arc<Vec<SearchHit>>,
    /// Latency of the original, uncached computation
    pub search_time_ms: f64,
    pub cached: bool,
}

impl SearchOutcome {
    /// The "no index built yet" response.
    pub fn not_ready() -> Self {
        Self {
            results: Arc::new(Vec::new()),
            search_time_ms: 0.0,
            cached: false,
        }
    }

    pub fn count(&self) -> usize {
        self.results.len()
    }
}

/// Aggregate totals over everything indexed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusTotals {
    pub total_files: u64,
    pub total_lines: u64,
    pub total_repositories: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(content: &str) -> CodeSnippet {
        CodeSnippet {
            file: "repo/src/lib.rs".to_string(),
            repo: "repo".to_string(),
            content: content.to_string(),
            line_start: 51,
            line_end: 100,
        }
    }

    #[test]
    fn test_line_count_is_inclusive() {
        assert_eq!(snippet("x").line_count(), 50);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let hit = SearchHit::from_snippet(&snippet("héllo wörld"), 0.5);
        assert_eq!(hit.preview(4), "héll");
        assert_eq!(hit.preview(100), "héllo wörld");
    }

    #[test]
    fn test_not_ready_outcome_is_empty() {
        let outcome = SearchOutcome::not_ready();
        assert_eq!(outcome.count(), 0);
        assert_eq!(outcome.search_time_ms, 0.0);
        assert!(!outcome.cached);
    }
}
