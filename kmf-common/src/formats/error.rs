//! Error types for KMF encoding and decoding

use std::collections::TryReserveError;

use super::constants::{KMF_VERSION, MAX_SCALE_FACTOR};

/// Reasons a set of blocks cannot be encoded. Nothing is written on error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("scale factor {0} exceeds maximum {MAX_SCALE_FACTOR}")]
    InvalidScaleFactor(u8),

    #[error("model count {count} exceeds maximum {max}")]
    ModelCountExceeded { count: usize, max: usize },

    #[error("model table size {size} bytes exceeds maximum {max}")]
    TableSizeExceeded { size: usize, max: usize },

    #[error("model block size {size} bytes exceeds maximum {max}")]
    BlockSizeExceeded { size: usize, max: usize },

    #[error("block {block} has {index_count} indices, not a triangle list")]
    InvalidTriangleList { block: usize, index_count: usize },

    #[error("block {block} references vertex {index} but has {vertex_count} vertices")]
    IndexOutOfRange {
        block: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Reasons a byte buffer is not a valid KMF file. The first failing check wins.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported file size {0} bytes")]
    UnsupportedFileSize(usize),

    #[error("invalid magic {0:02X?} (expected \"KMF\\0\")")]
    InvalidMagic([u8; 4]),

    #[error("unsupported version {0} (expected {KMF_VERSION})")]
    InvalidVersion(u8),

    #[error("invalid model count {0}")]
    InvalidModelCount(u32),

    #[error("invalid model table size {size} bytes for {model_count} models")]
    InvalidModelTableSize { size: u32, model_count: u32 },

    #[error("invalid model block size: {0}")]
    InvalidModelBlockSize(String),

    #[error("table entry {index} points at offset {offset}, expected {expected}")]
    InvalidBlockOffset {
        index: usize,
        offset: u32,
        expected: usize,
    },

    #[error("block {index} is named {block:?} but its table entry says {table:?}")]
    TableNameMismatch {
        index: usize,
        table: String,
        block: String,
    },

    #[error("block {block} references vertex {index} but has {vertex_count} vertices")]
    IndexOutOfRange {
        block: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("unexpected end of file: needed {needed} bytes at offset {offset}, buffer has {len}")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("failed to allocate model data: {0}")]
    Allocation(#[from] TryReserveError),
}
