//! kmf-export library
//!
//! Scene flattening, tangent generation and `.kmf` writing, for use by the
//! `kmf-export` binary and by other tools.

pub mod export;
pub mod formats;
pub mod inspect;
pub mod manifest;
pub mod mesh;
pub mod paths;

// Re-export key types for scene conversion
pub use export::{ExportSummary, convert_scene, export_kmf, parse_model};
pub use mesh::{SourceFormat, load_gltf, load_gltf_slice, load_obj, load_scene};
