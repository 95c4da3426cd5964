//! Cache-first search over a built snippet index.

mod engine;

pub use engine::SearchEngine;

use crate::types::{CodeSnippet, CorpusTotals};
use crate::vector::VectorIndex;

/// Map a squared L2 distance to a similarity score in (0, 1].
///
/// Distance 0 maps to 1 and the score falls strictly as distance grows.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

/// An immutable snippet store paired with the vector index built from it.
///
/// Row `i` of the vector index describes `snippets[i]`. The pair is only
/// ever replaced as a whole.
pub struct SearchIndex {
    snippets: Vec<CodeSnippet>,
    vectors: Box<dyn VectorIndex>,
    totals: CorpusTotals,
}

impl SearchIndex {
    pub fn new(
        snippets: Vec<CodeSnippet>,
        vectors: Box<dyn VectorIndex>,
        totals: CorpusTotals,
    ) -> Self {
        if snippets.len() != vectors.len() {
            tracing::warn!(
                "[search] index has {} rows for {} snippets",
                vectors.len(),
                snippets.len()
            );
        }
        Self {
            snippets,
            vectors,
            totals,
        }
    }

    pub fn snippets(&self) -> &[CodeSnippet] {
        &self.snippets
    }

    pub fn get(&self, position: usize) -> Option<&CodeSnippet> {
        self.snippets.get(position)
    }

    pub fn vectors(&self) -> &dyn VectorIndex {
        self.vectors.as_ref()
    }

    pub fn totals(&self) -> CorpusTotals {
        self.totals
    }

    /// Number of snippets in the store.
    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("snippets", &self.snippets.len())
            .field("rows", &self.vectors.len())
            .field("dimension", &self.vectors.dimension())
            .field("totals", &self.totals)
            .finish()
    }
}
