//! Scene -> `.kmf` export pipeline

use anyhow::{Context, Result};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use kmf_common::formats::{MAX_SCALE_FACTOR, ModelBlock, validate_blocks};
use kmf_common::generate_tangents_all;

use crate::formats::write_kmf;
use crate::mesh::load_scene;
use crate::paths::{output_dir, validate_input, validate_output};

/// What an export produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output: PathBuf,
    pub models: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub bytes: usize,
}

/// Clamp a user-supplied scale factor into the encodable range
pub fn clamp_scale_factor(scale: u32) -> u8 {
    let clamped = scale.min(MAX_SCALE_FACTOR as u32) as u8;
    if clamped as u32 != scale {
        tracing::warn!("Scale factor {} clamped to {}", scale, clamped);
    }
    clamped
}

/// Encode `blocks` and write them to `output` atomically
///
/// Data goes to a temporary file next to `output` which is renamed into
/// place only after every byte is flushed. On any failure the temporary
/// file is removed and `output` is left as it was. When `overwrite` is
/// false an existing `output` is an error.
pub fn export_kmf(
    output: &Path,
    scale_factor: u8,
    blocks: &[ModelBlock],
    overwrite: bool,
) -> Result<ExportSummary> {
    // Reject before touching the file system
    validate_blocks(scale_factor, blocks)?;

    let dir = output_dir(output);
    let temp = tempfile::Builder::new()
        .prefix(".kmf-export")
        .suffix(".tmp")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;

    let bytes = {
        let mut writer = BufWriter::new(temp.as_file());
        let bytes = write_kmf(&mut writer, scale_factor, blocks)?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {:?}", output))?;
        bytes
    };
    temp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync {:?}", output))?;

    if overwrite {
        temp.persist(output)
            .with_context(|| format!("Failed to create output: {:?}", output))?;
    } else {
        temp.persist_noclobber(output)
            .with_context(|| format!("Failed to create output: {:?}", output))?;
    }

    let summary = ExportSummary {
        output: output.to_path_buf(),
        models: blocks.len(),
        vertices: blocks.iter().map(|b| b.vertices.len()).sum(),
        triangles: blocks.iter().map(|b| b.triangle_count()).sum(),
        bytes,
    };
    tracing::info!(
        "Exported {:?}: {} models, {} vertices, {} triangles, {} bytes",
        summary.output,
        summary.models,
        summary.vertices,
        summary.triangles,
        summary.bytes
    );
    Ok(summary)
}

/// Load a scene, build tangents and export it, applying `render_type` to every block
pub fn convert_scene(
    input: &Path,
    output: &Path,
    scale_factor: u8,
    render_type: u8,
    overwrite: bool,
) -> Result<ExportSummary> {
    let mut blocks = load_scene(input)?;
    for block in &mut blocks {
        block.render_type = render_type;
    }
    generate_tangents_all(&mut blocks);
    export_kmf(output, scale_factor, &blocks, overwrite)
}

/// The `parse` command: validate both paths, then convert
pub fn parse_model(scale: u32, input: &Path, output: &Path) -> Result<ExportSummary> {
    let scale_factor = clamp_scale_factor(scale);
    validate_input(input)?;
    validate_output(output)?;

    tracing::info!("Converting {:?} -> {:?}", input, output);
    convert_scene(input, output, scale_factor, 0, false)
}
