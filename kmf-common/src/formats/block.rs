//! KMF model blocks
//!
//! # Block layout (148 bytes + payload)
//! ```text
//! 0x00:  node_name [u8; 20]
//! 0x14:  mesh_name [u8; 20]
//! 0x28:  node_path [u8; 50]     ancestors joined by '/', excluding the node
//! 0x5A:  data_type_flags u8
//! 0x5B:  render_type u8
//! 0x5C:  position f32 x 3
//! 0x68:  rotation f32 x 4       quaternion, w first
//! 0x78:  size f32 x 3           scale
//! 0x84:  vertices_offset u32    relative to block start
//! 0x88:  vertices_size u32
//! 0x8C:  indices_offset u32     relative to block start
//! 0x90:  indices_size u32
//! 0x94:  vertex_data (vertex_count * 48)
//! var:   index_data (index_count * 4)
//! ```

use bytemuck::{Pod, Zeroable};

use super::constants::{FIXED_BLOCK_HEADER_SIZE, INDEX_SIZE, VERTEX_SIZE, block_size};
use super::name::{MeshName, NodeName, NodePath};

/// Data type flag: vertices carry texture coordinates
pub const DATA_UV: u8 = 1;
/// Data type flag: vertices carry normals
pub const DATA_NORMAL: u8 = 2;
/// Data type flag: vertices carry generated tangents
pub const DATA_TANGENT: u8 = 4;

/// One de-duplicated mesh vertex (48 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position, pre-scaled at export
    pub position: [f32; 3],
    /// Unit normal, zero when the source mesh has none
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    /// xyz unit tangent, w handedness (1.0 when the bitangent is flipped, else 0.0)
    pub tangent: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<Vertex>() == VERTEX_SIZE);

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
            tangent: [0.0; 4],
        }
    }

    /// Write the vertex as 12 little-endian f32 values
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let floats = self
            .position
            .iter()
            .chain(&self.normal)
            .chain(&self.tex_coord)
            .chain(&self.tangent);
        for f in floats {
            out.extend_from_slice(&f.to_bits().to_le_bytes());
        }
    }

    /// Read a vertex from exactly 48 bytes
    pub fn from_bytes(bytes: &[u8; VERTEX_SIZE]) -> Self {
        let f = |i: usize| {
            let o = i * 4;
            f32::from_bits(u32::from_le_bytes([
                bytes[o],
                bytes[o + 1],
                bytes[o + 2],
                bytes[o + 3],
            ]))
        };
        Self {
            position: [f(0), f(1), f(2)],
            normal: [f(3), f(4), f(5)],
            tex_coord: [f(6), f(7)],
            tangent: [f(8), f(9), f(10), f(11)],
        }
    }
}

/// Offsets and sizes of a block's variable payload, relative to block start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub vertices_offset: u32,
    pub vertices_size: u32,
    pub indices_offset: u32,
    pub indices_size: u32,
}

impl BlockLayout {
    pub const SIZE: usize = 16;

    /// Canonical layout for the given counts: vertices right after the fixed
    /// header, indices right after the vertices
    pub fn for_counts(vertex_count: usize, index_count: usize) -> Self {
        let vertices_size = (vertex_count * VERTEX_SIZE) as u32;
        Self {
            vertices_offset: FIXED_BLOCK_HEADER_SIZE as u32,
            vertices_size,
            indices_offset: FIXED_BLOCK_HEADER_SIZE as u32 + vertices_size,
            indices_size: (index_count * INDEX_SIZE) as u32,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.vertices_offset.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.vertices_size.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.indices_offset.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.indices_size.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let u = |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        Self {
            vertices_offset: u(0),
            vertices_size: u(4),
            indices_offset: u(8),
            indices_size: u(12),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices_size as usize / VERTEX_SIZE
    }

    pub fn index_count(&self) -> usize {
        self.indices_size as usize / INDEX_SIZE
    }
}

/// One (node, mesh) pair with its world transform and geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelBlock {
    pub node_name: NodeName,
    pub mesh_name: MeshName,
    pub node_path: NodePath,

    /// Opaque to the codec
    pub data_type_flags: u8,
    /// Opaque to the codec
    pub render_type: u8,

    /// World translation
    pub position: [f32; 3],
    /// World rotation quaternion (w, x, y, z)
    pub rotation: [f32; 4],
    /// World scale
    pub size: [f32; 3],

    pub vertices: Vec<Vertex>,
    /// Triangle list; length is a multiple of 3
    pub indices: Vec<u32>,
}

impl ModelBlock {
    /// Create an empty block at the identity transform
    pub fn new(node_name: NodeName, mesh_name: MeshName, node_path: NodePath) -> Self {
        Self {
            node_name,
            mesh_name,
            node_path,
            rotation: [1.0, 0.0, 0.0, 0.0],
            size: [1.0; 3],
            ..Default::default()
        }
    }

    /// Payload layout derived from the current geometry
    pub fn layout(&self) -> BlockLayout {
        BlockLayout::for_counts(self.vertices.len(), self.indices.len())
    }

    /// Serialized size of this block in bytes
    pub fn byte_size(&self) -> usize {
        block_size(self.vertices.len(), self.indices.len())
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
