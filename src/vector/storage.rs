//! Binary codec for [`FlatL2Index`].
//!
//! # Storage Format
//!
//! - Header (16 bytes): magic, version, dimension, row count (all u32 LE)
//! - Rows: contiguous f32 arrays in little-endian format
//!
//! Files are read through a memory map and decoded in one pass. Writes go
//! through a temporary file in the same directory and are renamed into place.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use memmap2::MmapOptions;
use tempfile::NamedTempFile;

use crate::vector::{FlatL2Index, VectorDimension, VectorError, VectorIndex};

/// Current storage format version.
const STORAGE_VERSION: u32 = 1;

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes to identify snippet index files.
const MAGIC_BYTES: &[u8; 4] = b"SNIX";

const BYTES_PER_F32: usize = 4;

/// Serialize an index into header plus row data.
pub fn encode(index: &FlatL2Index) -> Vec<u8> {
    let raw = index.raw();
    let mut bytes = Vec::with_capacity(HEADER_SIZE + raw.len() * BYTES_PER_F32);

    bytes.extend_from_slice(MAGIC_BYTES);
    bytes.extend_from_slice(&STORAGE_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(index.dimension().get() as u32).to_le_bytes());
    bytes.extend_from_slice(&(index.len() as u32).to_le_bytes());

    for value in raw {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode bytes produced by [`encode`], validating header and length.
pub fn decode(bytes: &[u8]) -> Result<FlatL2Index, VectorError> {
    if bytes.len() < HEADER_SIZE {
        return Err(VectorError::Serialization(
            "File too small to contain header".to_string(),
        ));
    }

    if &bytes[0..4] != MAGIC_BYTES {
        return Err(VectorError::Serialization("Invalid magic bytes".to_string()));
    }

    let version = read_u32(bytes, 4);
    if version != STORAGE_VERSION {
        return Err(VectorError::VersionMismatch {
            expected: STORAGE_VERSION,
            actual: version,
        });
    }

    let dimension = VectorDimension::new(read_u32(bytes, 8) as usize)?;
    let count = read_u32(bytes, 12) as usize;

    let expected = count
        .checked_mul(dimension.get())
        .and_then(|values| values.checked_mul(BYTES_PER_F32))
        .and_then(|body| body.checked_add(HEADER_SIZE))
        .ok_or_else(|| VectorError::Serialization("Row count overflows".to_string()))?;
    if bytes.len() != expected {
        return Err(VectorError::Serialization(format!(
            "Expected {expected} bytes for {count} rows of dimension {dimension}, found {}",
            bytes.len()
        )));
    }

    let data = bytes[HEADER_SIZE..]
        .chunks_exact(BYTES_PER_F32)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    FlatL2Index::from_raw(dimension, data)
}

/// Atomically write an index to `path`.
pub fn write_index_file(path: &Path, index: &dyn VectorIndex) -> Result<(), VectorError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&index.to_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| VectorError::Storage(e.error))?;
    Ok(())
}

/// Read an index file through a memory map.
pub fn read_index_file(path: &Path) -> Result<FlatL2Index, VectorError> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Err(VectorError::Serialization("Index file is empty".to_string()));
    }
    // SAFETY: the file is only replaced by rename, never truncated in place
    let mmap = unsafe { MmapOptions::new().map(&file)? };
    decode(&mmap)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
