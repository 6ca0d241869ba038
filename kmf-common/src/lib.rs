//! Shared types and codec for KMF model files
//!
//! - [`formats`]: entity model, layout constants, encoder and decoder
//! - [`tangent`]: per-vertex tangent space generation, run before encoding
//! - [`loader`]: reading `.kmf` files from disk with access checks

pub mod formats;
pub mod loader;
pub mod tangent;

pub use formats::{
    DecodeError, EncodeError, KmfFile, ModelBlock, ModelHeader, ModelTableEntry, Vertex, decode,
    encode,
};
pub use loader::{ImportError, import_kmf};
pub use tangent::{generate_tangents, generate_tangents_all};
