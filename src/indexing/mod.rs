//! Repository walking, line chunking and corpus accumulation.

pub mod chunker;
pub mod corpus;
pub mod progress;
pub mod walker;

pub use chunker::{Chunk, chunk_content, count_lines};
pub use corpus::CorpusBuilder;
pub use progress::IndexStats;
pub use walker::FileWalker;
