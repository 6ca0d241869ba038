//! Types shared by the scene loaders

use std::path::Path;

use kmf_common::formats::FixedName;

/// Scene file formats the exporter can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Gltf,
    Obj,
}

impl SourceFormat {
    /// Extensions accepted for input scenes, lowercase
    pub const EXTENSIONS: &'static [&'static str] = &["gltf", "glb", "obj"];

    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gltf" | "glb" => Some(Self::Gltf),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }
}

/// Build a fixed-width name field, warning when the name is cut short
pub(crate) fn fixed_name<const N: usize>(name: &str, field: &str) -> FixedName<N> {
    if !FixedName::<N>::fits(name) {
        let truncated = FixedName::<N>::new(name);
        tracing::warn!(
            "{} '{}' exceeds {} bytes, truncated to '{}'",
            field,
            name,
            N,
            truncated
        );
        return truncated;
    }
    FixedName::new(name)
}
