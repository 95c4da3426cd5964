//! Shared fixtures for integration tests.

#![allow(dead_code)]

use snipsearch::EmbeddingGenerator;
use snipsearch::vector::{VectorDimension, VectorError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway directory holding one or more fake repositories.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Write `content` to `path`, relative to the project root.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn add_bytes(&self, path: &str, content: &[u8]) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn repo(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// `count` numbered, non-blank lines of Rust-looking code.
pub fn numbered_lines(count: usize) -> String {
    (1..=count)
        .map(|i| format!("let value_{i} = compute({i});\n"))
        .collect()
}

/// Deterministic embedder: hashes whitespace tokens into buckets.
///
/// Texts sharing words end up close in L2 distance, which is all the
/// integration tests need.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dimension: 64 }
    }
}

impl EmbeddingGenerator for HashEmbedder {
    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut embedding = vec![0.01f32; self.dimension];
                for token in text.split_whitespace() {
                    let bucket = token
                        .bytes()
                        .fold(17usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
                    embedding[bucket % self.dimension] += 1.0;
                }
                let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                embedding.iter_mut().for_each(|x| *x /= norm);
                embedding
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(self.dimension).expect("non-zero dimension")
    }
}
