//! KMF encoder
//!
//! Validates every limit up front, then lays out header, table and blocks
//! into one contiguous buffer.

use super::constants::{
    HEADER_SIZE, MAX_MODEL_BLOCK_SIZE, MAX_MODEL_COUNT, MAX_MODEL_TABLE_SIZE, MAX_SCALE_FACTOR,
    table_size,
};
use super::error::EncodeError;
use super::{ModelBlock, ModelHeader, ModelTableEntry};

/// Check that `blocks` can be encoded and return the block region size
///
/// Runs every encoder pre-condition without producing output.
pub fn validate_blocks(scale_factor: u8, blocks: &[ModelBlock]) -> Result<usize, EncodeError> {
    if scale_factor > MAX_SCALE_FACTOR {
        return Err(EncodeError::InvalidScaleFactor(scale_factor));
    }

    if blocks.len() > MAX_MODEL_COUNT {
        return Err(EncodeError::ModelCountExceeded {
            count: blocks.len(),
            max: MAX_MODEL_COUNT,
        });
    }

    let table_bytes = table_size(blocks.len());
    if table_bytes > MAX_MODEL_TABLE_SIZE {
        return Err(EncodeError::TableSizeExceeded {
            size: table_bytes,
            max: MAX_MODEL_TABLE_SIZE,
        });
    }

    let mut block_bytes = 0usize;
    for (i, block) in blocks.iter().enumerate() {
        if block.indices.len() % 3 != 0 {
            return Err(EncodeError::InvalidTriangleList {
                block: i,
                index_count: block.indices.len(),
            });
        }

        let vertex_count = block.vertices.len();
        if let Some(&index) = block.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(EncodeError::IndexOutOfRange {
                block: i,
                index,
                vertex_count,
            });
        }

        block_bytes = block_bytes.saturating_add(block.byte_size());
    }

    if block_bytes > MAX_MODEL_BLOCK_SIZE {
        return Err(EncodeError::BlockSizeExceeded {
            size: block_bytes,
            max: MAX_MODEL_BLOCK_SIZE,
        });
    }

    Ok(block_bytes)
}

/// Encode blocks into a complete KMF file
///
/// Fails fast with no output if any limit is exceeded. All integers and
/// floats are written little-endian, floats as their raw bit pattern.
pub fn encode(scale_factor: u8, blocks: &[ModelBlock]) -> Result<Vec<u8>, EncodeError> {
    let block_bytes = match validate_blocks(scale_factor, blocks) {
        Ok(size) => size,
        Err(e) => {
            tracing::warn!("Rejected KMF export: {}", e);
            return Err(e);
        }
    };

    let header = ModelHeader::new(scale_factor, blocks.len() as u32, block_bytes as u32);
    let total = header.file_size();

    tracing::debug!(
        "Encoding {} models: table {} bytes, blocks {} bytes, total {} bytes",
        blocks.len(),
        header.table_size,
        block_bytes,
        total
    );

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&header.to_bytes());

    // Table entries, offsets assigned sequentially after the table
    let mut block_offset = HEADER_SIZE + header.table_size as usize;
    for block in blocks {
        let size = block.byte_size();
        let entry = ModelTableEntry::new(block.node_name, block_offset as u32, size as u32);
        out.extend_from_slice(&entry.to_bytes());
        block_offset += size;
    }

    for block in blocks {
        write_block(&mut out, block);
    }

    debug_assert_eq!(out.len(), total);
    Ok(out)
}

/// Append one block (fixed header + vertices + indices)
fn write_block(out: &mut Vec<u8>, block: &ModelBlock) {
    out.extend_from_slice(block.node_name.as_bytes());
    out.extend_from_slice(block.mesh_name.as_bytes());
    out.extend_from_slice(block.node_path.as_bytes());
    out.push(block.data_type_flags);
    out.push(block.render_type);

    for f in block.position.iter().chain(&block.rotation).chain(&block.size) {
        out.extend_from_slice(&f.to_bits().to_le_bytes());
    }

    out.extend_from_slice(&block.layout().to_bytes());

    for v in &block.vertices {
        v.write_to(out);
    }
    for i in &block.indices {
        out.extend_from_slice(&i.to_le_bytes());
    }
}
