//! KMF top header and model table entries
//!
//! # Header layout (34 bytes)
//! ```text
//! 0x00: magic [u8; 4]         "KMF\0"
//! 0x04: version u8
//! 0x05: scale_factor u8       downscale exponent (0-8)
//! 0x06: model_count u32
//! 0x0A: table_size u32        bytes in the table region
//! 0x0E: block_size u32        bytes in the block region
//! 0x12: reserved (16 bytes, zero)
//! ```
//!
//! # Table entry layout (28 bytes)
//! ```text
//! 0x00: node_name [u8; 20]    null-padded
//! 0x14: block_offset u32      absolute offset from file start
//! 0x18: block_size u32        fixed block header + vertices + indices
//! ```

use super::constants::{HEADER_SIZE, KMF_MAGIC, KMF_VERSION, TABLE_ENTRY_SIZE, table_size};
use super::name::NodeName;

/// KMF top header (34 bytes)
///
/// Note: Not packed - we use explicit byte serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub scale_factor: u8,
    pub model_count: u32,
    /// Total bytes of the table region
    pub table_size: u32,
    /// Total bytes of the block region
    pub block_size: u32,
}

impl ModelHeader {
    pub const SIZE: usize = HEADER_SIZE;

    pub fn new(scale_factor: u8, model_count: u32, block_size: u32) -> Self {
        Self {
            magic: KMF_MAGIC,
            version: KMF_VERSION,
            scale_factor,
            model_count,
            table_size: table_size(model_count as usize) as u32,
            block_size,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes[5] = self.scale_factor;
        bytes[6..10].copy_from_slice(&self.model_count.to_le_bytes());
        bytes[10..14].copy_from_slice(&self.table_size.to_le_bytes());
        bytes[14..18].copy_from_slice(&self.block_size.to_le_bytes());
        // reserved bytes stay 0
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: bytes[4],
            scale_factor: bytes[5],
            model_count: u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]),
            table_size: u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]),
            block_size: u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]),
        })
    }

    /// Offset of the first block
    pub fn blocks_start(&self) -> usize {
        Self::SIZE + self.table_size as usize
    }

    /// Total file size declared by the header
    pub fn file_size(&self) -> usize {
        self.blocks_start() + self.block_size as usize
    }
}

/// Model table entry (28 bytes)
///
/// Mirrors the block's node name so a single model can be located
/// without reading any block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelTableEntry {
    pub node_name: NodeName,
    /// Absolute offset of the block from file start
    pub block_offset: u32,
    /// Size of the block in bytes
    pub block_size: u32,
}

impl ModelTableEntry {
    pub const SIZE: usize = TABLE_ENTRY_SIZE;

    pub fn new(node_name: NodeName, block_offset: u32, block_size: u32) -> Self {
        Self {
            node_name,
            block_offset,
            block_size,
        }
    }

    /// Write entry to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..20].copy_from_slice(self.node_name.as_bytes());
        bytes[20..24].copy_from_slice(&self.block_offset.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.block_size.to_le_bytes());
        bytes
    }

    /// Read entry from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let mut name = [0u8; 20];
        name.copy_from_slice(&bytes[0..20]);
        Some(Self {
            node_name: NodeName::from_bytes(&name),
            block_offset: u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
            block_size: u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
        })
    }

    /// First byte past the end of the block
    pub fn block_end(&self) -> usize {
        self.block_offset as usize + self.block_size as usize
    }
}
