//! Scene acquisition (glTF/GLB/OBJ -> flattened model blocks)

mod gltf;
mod obj;
mod types;
mod weld;

use anyhow::{Result, bail};
use std::path::Path;

use kmf_common::ModelBlock;

// Re-export public API
pub use gltf::{load_gltf, load_gltf_slice};
pub use obj::{load_obj, parse_obj};
pub use types::SourceFormat;
pub use weld::VertexWelder;

/// Load any supported scene file, detecting the format by extension
pub fn load_scene(input: &Path) -> Result<Vec<ModelBlock>> {
    match SourceFormat::from_path(input) {
        Some(SourceFormat::Gltf) => load_gltf(input),
        Some(SourceFormat::Obj) => load_obj(input),
        None => bail!(
            "Unsupported scene format: {:?} (use .gltf, .glb, or .obj)",
            input
        ),
    }
}
