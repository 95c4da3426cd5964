//! Embedding generation and nearest-neighbour search.
//!
//! The search core only sees two seams: [`EmbeddingGenerator`] turns text
//! into vectors and [`VectorIndex`] answers k-nearest queries over them.
//! Rows of the index line up one-to-one with corpus positions.

mod embedding;
mod flat;
pub mod storage;
mod types;

#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{EmbeddingGenerator, FastEmbedGenerator, parse_embedding_model};
pub use flat::{FlatL2Index, VectorIndex};
pub use types::{Neighbor, VECTOR_DIMENSION_384, VectorDimension, VectorError};
