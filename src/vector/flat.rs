//! Exact nearest-neighbour index over a dense row-major matrix.
//!
//! Every query scans all rows and ranks them by squared L2 distance, so
//! results are exact. Row `i` always corresponds to corpus position `i`.

use crate::vector::{Neighbor, VectorDimension, VectorError};
use rayon::prelude::*;

/// Nearest-neighbour search over embedded snippets.
pub trait VectorIndex: Send + Sync {
    fn dimension(&self) -> VectorDimension;

    /// Number of indexed rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `min(k, len)` closest rows to `query`, nearest first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError>;

    /// Serialize the index into its on-disk representation.
    fn to_bytes(&self) -> Vec<u8>;
}

/// Brute-force index storing vectors contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: VectorDimension,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Build an index from one embedding per row.
    pub fn build(dimension: VectorDimension, vectors: &[Vec<f32>]) -> Result<Self, VectorError> {
        let mut index = Self::new(dimension);
        index.data.reserve(vectors.len() * dimension.get());
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    /// Append one row. Its position is the previous `len()`.
    pub fn add(&mut self, vector: &[f32]) -> Result<(), VectorError> {
        self.dimension.validate_vector(vector)?;
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub(crate) fn from_raw(dimension: VectorDimension, data: Vec<f32>) -> Result<Self, VectorError> {
        if data.len() % dimension.get() != 0 {
            return Err(VectorError::Serialization(format!(
                "{} values do not divide into rows of {dimension}",
                data.len()
            )));
        }
        Ok(Self { dimension, data })
    }

    pub(crate) fn raw(&self) -> &[f32] {
        &self.data
    }
}

impl VectorIndex for FlatL2Index {
    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension.get()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        self.dimension.validate_vector(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .par_chunks_exact(self.dimension.get())
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: squared_l2(row, query),
            })
            .collect();

        // Ties keep row order
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        Ok(neighbors)
    }

    fn to_bytes(&self) -> Vec<u8> {
        crate::vector::storage::encode(self)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
