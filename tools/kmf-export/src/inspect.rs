//! Human-readable dump of a `.kmf` file

use anyhow::{Context, Result};
use std::path::Path;

use kmf_common::formats::{DATA_NORMAL, DATA_TANGENT, DATA_UV};
use kmf_common::{KmfFile, import_kmf};

fn flag_names(flags: u8) -> String {
    let names: Vec<&str> = [(DATA_UV, "uv"), (DATA_NORMAL, "normal"), (DATA_TANGENT, "tangent")]
        .into_iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| name)
        .collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join("|")
    }
}

/// Describe header, table and blocks, one line each
pub fn describe(file: &KmfFile) -> Vec<String> {
    let h = &file.header;
    let mut lines = vec![format!(
        "KMF v{}: scale factor {}, {} models, table {} bytes, blocks {} bytes",
        h.version, h.scale_factor, h.model_count, h.table_size, h.block_size
    )];

    for (i, (entry, block)) in file.table.iter().zip(&file.blocks).enumerate() {
        let path = if block.node_path.is_empty() {
            String::new()
        } else {
            format!("{}/", block.node_path)
        };
        lines.push(format!(
            "[{}] {}{} mesh '{}' @ {} ({} bytes): {} vertices, {} triangles, flags {}, render type {}",
            i,
            path,
            entry.node_name,
            block.mesh_name,
            entry.block_offset,
            entry.block_size,
            block.vertices.len(),
            block.triangle_count(),
            flag_names(block.data_type_flags),
            block.render_type
        ));
        lines.push(format!(
            "    position {:?} rotation {:?} size {:?}",
            block.position, block.rotation, block.size
        ));
    }
    lines
}

/// Decode `path` and log its contents
pub fn inspect(path: &Path) -> Result<KmfFile> {
    let file = import_kmf(path).with_context(|| format!("Failed to import {:?}", path))?;
    for line in describe(&file) {
        tracing::info!("{}", line);
    }
    Ok(file)
}
