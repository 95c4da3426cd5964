//! On-disk storage of the built search index.

pub mod metadata;
pub mod persistence;

pub use metadata::{IndexMetadata, METADATA_VERSION};
pub use persistence::{IndexPersistence, METADATA_FILE, VECTOR_FILE};
