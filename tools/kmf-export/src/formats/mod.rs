//! KMF output
//!
//! Re-exports the format definitions from kmf-common for writing files.

pub use kmf_common::formats::*;

use anyhow::Result;
use std::io::Write;

/// Write a complete KMF file, returning the number of bytes written
///
/// The whole file is encoded before the first write, so a rejected model
/// set leaves the writer untouched.
pub fn write_kmf<W: Write>(w: &mut W, scale_factor: u8, blocks: &[ModelBlock]) -> Result<usize> {
    let bytes = encode(scale_factor, blocks)?;
    w.write_all(&bytes)?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_kmf_round_trip() {
        let mut block = ModelBlock::new("Node".into(), "Mesh".into(), "".into());
        block.vertices = vec![Vertex::default(); 3];
        block.indices = vec![0, 1, 2];

        let mut out = Vec::new();
        let written = write_kmf(&mut out, 3, std::slice::from_ref(&block)).unwrap();
        assert_eq!(written, out.len());

        let file = decode(&out).unwrap();
        assert_eq!(file.header.scale_factor, 3);
        assert_eq!(file.blocks, vec![block]);
    }

    #[test]
    fn test_rejected_set_writes_nothing() {
        let mut out = Vec::new();
        assert!(write_kmf(&mut out, MAX_SCALE_FACTOR + 1, &[]).is_err());
        assert!(out.is_empty());
    }
}
