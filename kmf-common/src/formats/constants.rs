//! KMF layout constants and size limits
//!
//! Shared by the encoder and the decoder so both sides enforce the same
//! protocol limits.

/// Magic bytes at the start of every KMF file (`KMF\0`, u32 LE `0x00464D4B`)
pub const KMF_MAGIC: [u8; 4] = *b"KMF\0";

/// The only format version this codec reads and writes
pub const KMF_VERSION: u8 = 1;

/// File extension without the dot
pub const KMF_EXTENSION: &str = "kmf";

/// Size of the top header, including 16 reserved bytes
pub const HEADER_SIZE: usize = 34;

/// Bytes of the header actually carrying fields; the rest is reserved
pub const HEADER_FIELDS_SIZE: usize = 18;

/// Size of one model table entry
pub const TABLE_ENTRY_SIZE: usize = 28;

/// Size of the fixed part of a model block (names, flags, transform, layout)
pub const FIXED_BLOCK_HEADER_SIZE: usize = 148;

/// Size of one serialized vertex
pub const VERTEX_SIZE: usize = 48;

/// Size of one serialized index
pub const INDEX_SIZE: usize = 4;

/// Size of one serialized triangle in the index region
pub const TRIANGLE_SIZE: usize = 3 * INDEX_SIZE;

/// Fixed width of node and mesh names
pub const NAME_SIZE: usize = 20;

/// Fixed width of the node path
pub const PATH_SIZE: usize = 50;

/// Max models per file
pub const MAX_MODEL_COUNT: usize = 1024;

/// Max table region size in bytes (12 KB)
pub const MAX_MODEL_TABLE_SIZE: usize = 12 * 1024;

/// Max block region size in bytes (1024 KB)
pub const MAX_MODEL_BLOCK_SIZE: usize = 1024 * 1024;

/// Smallest valid file: a header followed by an empty table
pub const MIN_TOTAL_SIZE: usize = HEADER_SIZE;

/// Largest valid file
pub const MAX_TOTAL_SIZE: usize = HEADER_SIZE + MAX_MODEL_TABLE_SIZE + MAX_MODEL_BLOCK_SIZE;

/// Largest downscale exponent accepted at export time
pub const MAX_SCALE_FACTOR: u8 = 8;

/// Multiplier applied to source positions during scene acquisition
pub const SCALE_MULTIPLIER: f32 = 0.01;

/// Table region size for `model_count` entries
#[inline]
pub const fn table_size(model_count: usize) -> usize {
    model_count * TABLE_ENTRY_SIZE
}

/// Block size for a block with the given vertex and index counts
#[inline]
pub const fn block_size(vertex_count: usize, index_count: usize) -> usize {
    FIXED_BLOCK_HEADER_SIZE + vertex_count * VERTEX_SIZE + index_count * INDEX_SIZE
}

/// Largest model count whose table still fits in [`MAX_MODEL_TABLE_SIZE`]
pub const MAX_TABLE_MODEL_COUNT: usize = MAX_MODEL_TABLE_SIZE / TABLE_ENTRY_SIZE;
