//! KMF decoder
//!
//! Checks run in a fixed order and the first failure is returned:
//! file size, magic, version, model count and table size, table entries,
//! block region size, then each block. Every read is bounds-checked, so
//! truncated or hostile input yields an error instead of a panic.

use super::constants::{
    FIXED_BLOCK_HEADER_SIZE, HEADER_SIZE, INDEX_SIZE, KMF_MAGIC, KMF_VERSION, MAX_MODEL_BLOCK_SIZE,
    MAX_MODEL_COUNT, MAX_MODEL_TABLE_SIZE, MAX_TOTAL_SIZE, MIN_TOTAL_SIZE, TRIANGLE_SIZE,
    VERTEX_SIZE, table_size,
};
use super::error::DecodeError;
use super::{
    BlockLayout, MeshName, ModelBlock, ModelHeader, ModelTableEntry, NodeName, NodePath, Vertex,
};

/// A fully decoded KMF file
#[derive(Debug, Clone, PartialEq)]
pub struct KmfFile {
    pub header: ModelHeader,
    pub table: Vec<ModelTableEntry>,
    pub blocks: Vec<ModelBlock>,
}

impl KmfFile {
    /// Find a block by node name via the table
    pub fn find_block(&self, node_name: &str) -> Option<&ModelBlock> {
        let wanted = NodeName::new(node_name);
        self.table
            .iter()
            .position(|e| e.node_name == wanted)
            .and_then(|i| self.blocks.get(i))
    }
}

/// Bounds-checked little-endian cursor over a byte slice
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Absolute offset of `bytes[0]` within the file, for error reporting
    base: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8], base: usize) -> Self {
        Self { bytes, pos: 0, base }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(DecodeError::UnexpectedEof {
                offset: self.base + self.pos,
                needed: n,
                len: self.base + self.bytes.len(),
            }),
        }
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.u32()?))
    }

    fn f32s<const N: usize>(&mut self) -> Result<[f32; N], DecodeError> {
        let mut out = [0.0f32; N];
        for f in &mut out {
            *f = self.f32()?;
        }
        Ok(out)
    }

    /// Sub-reader over the absolute range `[start, start + len)` of this reader
    fn slice(&self, start: usize, len: usize) -> Result<ByteReader<'a>, DecodeError> {
        let end = start.checked_add(len).filter(|&end| end <= self.bytes.len());
        match end {
            Some(end) => Ok(ByteReader::new(&self.bytes[start..end], self.base + start)),
            None => Err(DecodeError::UnexpectedEof {
                offset: self.base + start,
                needed: len,
                len: self.base + self.bytes.len(),
            }),
        }
    }
}

/// Decode a complete KMF file from memory
///
/// The input is never modified. On error nothing is returned.
pub fn decode(bytes: &[u8]) -> Result<KmfFile, DecodeError> {
    let result = decode_inner(bytes);
    if let Err(e) = &result {
        tracing::warn!("Rejected KMF data ({} bytes): {}", bytes.len(), e);
    }
    result
}

fn decode_inner(bytes: &[u8]) -> Result<KmfFile, DecodeError> {
    if bytes.len() < MIN_TOTAL_SIZE || bytes.len() > MAX_TOTAL_SIZE {
        return Err(DecodeError::UnsupportedFileSize(bytes.len()));
    }

    let header = read_header(bytes)?;
    let table = read_table(bytes, &header)?;

    // Block region must match the table and the buffer exactly
    let table_total = table
        .iter()
        .fold(0usize, |acc, e| acc.saturating_add(e.block_size as usize));
    if table_total != header.block_size as usize {
        return Err(DecodeError::InvalidModelBlockSize(format!(
            "header declares {} bytes but table entries sum to {}",
            header.block_size, table_total
        )));
    }

    let declared = header.file_size();
    if declared > bytes.len() {
        return Err(DecodeError::UnexpectedEof {
            offset: bytes.len(),
            needed: declared - bytes.len(),
            len: bytes.len(),
        });
    }
    if declared < bytes.len() {
        return Err(DecodeError::InvalidModelBlockSize(format!(
            "{} trailing bytes after the block region",
            bytes.len() - declared
        )));
    }

    let mut expected_offset = header.blocks_start();
    for (i, entry) in table.iter().enumerate() {
        if entry.block_offset as usize != expected_offset {
            return Err(DecodeError::InvalidBlockOffset {
                index: i,
                offset: entry.block_offset,
                expected: expected_offset,
            });
        }
        if entry.block_end() > bytes.len() {
            return Err(DecodeError::UnexpectedEof {
                offset: entry.block_offset as usize,
                needed: entry.block_size as usize,
                len: bytes.len(),
            });
        }
        expected_offset = entry.block_end();
    }

    let file = ByteReader::new(bytes, 0);
    let mut blocks = Vec::new();
    blocks.try_reserve_exact(table.len())?;
    for (i, entry) in table.iter().enumerate() {
        let mut reader = file.slice(entry.block_offset as usize, entry.block_size as usize)?;
        let block = read_block(&mut reader, i)?;

        if block.node_name != entry.node_name {
            return Err(DecodeError::TableNameMismatch {
                index: i,
                table: entry.node_name.to_string(),
                block: block.node_name.to_string(),
            });
        }
        blocks.push(block);
    }

    tracing::debug!(
        "Decoded KMF v{}: {} models, {} bytes",
        header.version,
        blocks.len(),
        bytes.len()
    );

    Ok(KmfFile {
        header,
        table,
        blocks,
    })
}

fn read_header(bytes: &[u8]) -> Result<ModelHeader, DecodeError> {
    let mut r = ByteReader::new(bytes, 0);
    let raw: [u8; HEADER_SIZE] = r.array()?;
    let header = ModelHeader::from_bytes(&raw).ok_or(DecodeError::UnexpectedEof {
        offset: 0,
        needed: HEADER_SIZE,
        len: bytes.len(),
    })?;

    if header.magic != KMF_MAGIC {
        return Err(DecodeError::InvalidMagic(header.magic));
    }
    if header.version != KMF_VERSION {
        return Err(DecodeError::InvalidVersion(header.version));
    }
    if header.model_count as usize > MAX_MODEL_COUNT {
        return Err(DecodeError::InvalidModelCount(header.model_count));
    }
    if header.table_size as usize != table_size(header.model_count as usize)
        || header.table_size as usize > MAX_MODEL_TABLE_SIZE
    {
        return Err(DecodeError::InvalidModelTableSize {
            size: header.table_size,
            model_count: header.model_count,
        });
    }
    if header.block_size as usize > MAX_MODEL_BLOCK_SIZE {
        return Err(DecodeError::InvalidModelBlockSize(format!(
            "{} bytes exceeds maximum {}",
            header.block_size, MAX_MODEL_BLOCK_SIZE
        )));
    }

    Ok(header)
}

fn read_table(bytes: &[u8], header: &ModelHeader) -> Result<Vec<ModelTableEntry>, DecodeError> {
    let file = ByteReader::new(bytes, 0);
    let mut r = file.slice(HEADER_SIZE, header.table_size as usize)?;

    let mut table = Vec::new();
    table.try_reserve_exact(header.model_count as usize)?;
    for _ in 0..header.model_count {
        let raw: [u8; ModelTableEntry::SIZE] = r.array()?;
        let entry = ModelTableEntry::from_bytes(&raw).ok_or(DecodeError::UnexpectedEof {
            offset: r.base + r.pos,
            needed: ModelTableEntry::SIZE,
            len: bytes.len(),
        })?;
        table.push(entry);
    }
    Ok(table)
}

fn read_block(r: &mut ByteReader<'_>, index: usize) -> Result<ModelBlock, DecodeError> {
    let block_len = r.bytes.len();
    if block_len < FIXED_BLOCK_HEADER_SIZE {
        return Err(DecodeError::InvalidModelBlockSize(format!(
            "block {} is {} bytes, smaller than its {} byte header",
            index, block_len, FIXED_BLOCK_HEADER_SIZE
        )));
    }

    let node_name = NodeName::from_bytes(&r.array()?);
    let mesh_name = MeshName::from_bytes(&r.array()?);
    let node_path = NodePath::from_bytes(&r.array()?);
    let data_type_flags = r.u8()?;
    let render_type = r.u8()?;
    let position = r.f32s::<3>()?;
    let rotation = r.f32s::<4>()?;
    let size = r.f32s::<3>()?;
    let layout = BlockLayout::from_bytes(&r.array()?);

    check_layout(&layout, block_len, index)?;

    let mut vr = r.slice(layout.vertices_offset as usize, layout.vertices_size as usize)?;
    let vertex_count = layout.vertex_count();
    let mut vertices = Vec::new();
    vertices.try_reserve_exact(vertex_count)?;
    for _ in 0..vertex_count {
        vertices.push(Vertex::from_bytes(&vr.array()?));
    }

    let mut ir = r.slice(layout.indices_offset as usize, layout.indices_size as usize)?;
    let index_count = layout.index_count();
    let mut indices = Vec::new();
    indices.try_reserve_exact(index_count)?;
    for _ in 0..index_count {
        let i = ir.u32()?;
        if i as usize >= vertex_count {
            return Err(DecodeError::IndexOutOfRange {
                block: index,
                index: i,
                vertex_count,
            });
        }
        indices.push(i);
    }

    Ok(ModelBlock {
        node_name,
        mesh_name,
        node_path,
        data_type_flags,
        render_type,
        position,
        rotation,
        size,
        vertices,
        indices,
    })
}

/// Declared payload ranges must lie inside the block and follow the canonical shape
fn check_layout(layout: &BlockLayout, block_len: usize, index: usize) -> Result<(), DecodeError> {
    let vertices_end = layout.vertices_offset as u64 + layout.vertices_size as u64;
    let indices_end = layout.indices_offset as u64 + layout.indices_size as u64;
    let furthest = vertices_end.max(indices_end);
    if furthest > block_len as u64 {
        return Err(DecodeError::UnexpectedEof {
            offset: block_len,
            needed: (furthest - block_len as u64) as usize,
            len: block_len,
        });
    }
    // Both ends now fit in the block, so they fit in usize
    let (vertices_end, indices_end) = (vertices_end as usize, indices_end as usize);

    let problem = if layout.vertices_offset as usize != FIXED_BLOCK_HEADER_SIZE {
        Some("vertices do not follow the block header")
    } else if layout.vertices_size as usize % VERTEX_SIZE != 0 {
        Some("vertex region is not a whole number of vertices")
    } else if layout.indices_offset as usize != vertices_end {
        Some("indices do not follow the vertices")
    } else if layout.indices_size as usize % TRIANGLE_SIZE != 0 {
        Some("index region is not a whole number of triangles")
    } else if indices_end != block_len {
        Some("payload does not fill the block")
    } else {
        None
    };

    match problem {
        Some(msg) => Err(DecodeError::InvalidModelBlockSize(format!(
            "block {}: {} (layout {:?}, {} bytes)",
            index, msg, layout, block_len
        ))),
        None => {
            debug_assert_eq!(layout.indices_size as usize % INDEX_SIZE, 0);
            Ok(())
        }
    }
}
