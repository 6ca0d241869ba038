//! KMF binary model interchange format
//!
//! A KMF file is three contiguous regions, all little-endian:
//!
//! ```text
//! [0, 34)                          ModelHeader
//! [34, 34 + table_size)            ModelTableEntry x model_count
//! [34 + table_size, EOF)           ModelBlock x model_count, in table order
//! ```
//!
//! [`encode`] and [`decode`] enforce the same limits from [`constants`].

pub mod constants;
mod block;
mod decode;
mod encode;
mod error;
mod header;
mod name;
mod serialization;

pub use block::*;
pub use constants::*;
pub use decode::{KmfFile, decode};
pub use encode::{encode, validate_blocks};
pub use error::{DecodeError, EncodeError};
pub use header::{ModelHeader, ModelTableEntry};
pub use name::{FixedName, MeshName, NodeName, NodePath};
pub use serialization::BinarySerializable;
