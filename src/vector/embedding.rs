//! Embedding generation for snippets and queries.
//!
//! The [`EmbeddingGenerator`] trait is the seam between the search core and
//! the model. [`FastEmbedGenerator`] is the production implementation backed
//! by fastembed; tests use a deterministic mock.

use crate::config::{SemanticConfig, models_dir};
use crate::vector::{VectorDimension, VectorError};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// Trait for generating embeddings from text.
///
/// Implementations must be thread-safe: concurrent searches call `embed`
/// from several worker threads at once.
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        self.embed_many(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::EmbeddingFailed("Model returned no embedding".to_string()))
    }

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;
}

/// Resolve a model name from settings to a fastembed model.
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, VectorError> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Ok(EmbeddingModel::BGEBaseENV15),
        other => Err(VectorError::EmbeddingFailed(format!(
            "Unknown embedding model '{other}'. Supported: AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15"
        ))),
    }
}

/// FastEmbed implementation of [`EmbeddingGenerator`].
///
/// The default model (AllMiniLML6V2) produces 384-dimensional embeddings.
/// fastembed needs `&mut` access to run inference, so the model sits behind a mutex.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    dimension: VectorDimension,
}

impl FastEmbedGenerator {
    /// Create a generator with the default AllMiniLML6V2 model.
    ///
    /// # Errors
    /// Returns an error if the model fails to initialize or download.
    pub fn new() -> Result<Self, VectorError> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2, false)
    }

    /// Create a generator for the model named in settings.
    pub fn from_config(config: &SemanticConfig) -> Result<Self, VectorError> {
        let model = parse_embedding_model(&config.model)?;
        Self::with_model(model, config.show_download_progress)
    }

    pub fn with_model(model: EmbeddingModel, show_progress: bool) -> Result<Self, VectorError> {
        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(models_dir())
                .with_show_download_progress(show_progress),
        )
        .map_err(|e| VectorError::EmbeddingFailed(
            format!("Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download")
        ))?;

        // Probe once to learn the output dimension
        let probe = text_model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| VectorError::EmbeddingFailed(e.to_string()))?;
        let dim = probe.first().map(Vec::len).unwrap_or_default();
        let dimension = VectorDimension::new(dim)?;

        tracing::debug!("[embedding] model ready, dimension {dimension}");

        Ok(Self {
            model: Mutex::new(text_model),
            dimension,
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .map_err(|_| {
                VectorError::EmbeddingFailed(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(texts.to_vec(), None)
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Mock embedding generator for testing.
///
/// Hashes whitespace-separated tokens into buckets, so texts sharing words
/// land close together. Output is unit length and fully deterministic.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
}

#[cfg(test)]
impl Default for MockEmbeddingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimension(VectorDimension::new(32).unwrap())
    }

    #[must_use]
    pub fn with_dimension(dimension: VectorDimension) -> Self {
        Self { dimension }
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        let dim = self.dimension.get();
        Ok(texts
            .iter()
            .map(|text| {
                let mut embedding = vec![0.01; dim];
                for token in text.split_whitespace() {
                    let bucket = token
                        .bytes()
                        .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
                    embedding[bucket % dim] += 1.0;
                }

                let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                for val in &mut embedding {
                    *val /= magnitude;
                }
                embedding
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}
