//! Vertex de-duplication

use hashbrown::HashMap;
use kmf_common::formats::Vertex;

/// Bit pattern of a vertex's position, normal and UV
type VertexKey = [u32; 8];

/// Collapses bit-identical vertices while building a triangle list
///
/// Vertices keep first-seen order, so output is stable for a given input.
#[derive(Debug, Default)]
pub struct VertexWelder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    lookup: HashMap<VertexKey, u32>,
}

impl VertexWelder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one corner of a triangle
    pub fn push(&mut self, position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) {
        let key = [
            position[0].to_bits(),
            position[1].to_bits(),
            position[2].to_bits(),
            normal[0].to_bits(),
            normal[1].to_bits(),
            normal[2].to_bits(),
            tex_coord[0].to_bits(),
            tex_coord[1].to_bits(),
        ];

        let vertices = &mut self.vertices;
        let index = *self.lookup.entry(key).or_insert_with(|| {
            vertices.push(Vertex::new(position, normal, tex_coord));
            (vertices.len() - 1) as u32
        });
        self.indices.push(index);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Unique vertices and the triangle list indexing them
    pub fn finish(self) -> (Vec<Vertex>, Vec<u32>) {
        (self.vertices, self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_corners_collapse() {
        let mut welder = VertexWelder::new();
        // Quad as two triangles sharing an edge
        for p in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]] {
            welder.push([p[0], p[1], 0.0], [0.0, 0.0, 1.0], p);
        }
        assert_eq!(welder.vertex_count(), 4);
        let (vertices, indices) = welder.finish();
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(vertices[3].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_differing_attributes_stay_split() {
        let mut welder = VertexWelder::new();
        welder.push([0.0; 3], [0.0, 0.0, 1.0], [0.0, 0.0]);
        welder.push([0.0; 3], [0.0, 1.0, 0.0], [0.0, 0.0]);
        welder.push([0.0; 3], [0.0, 0.0, 1.0], [0.5, 0.0]);
        assert_eq!(welder.vertex_count(), 3);
    }

    #[test]
    fn test_signed_zero_is_distinct() {
        let mut welder = VertexWelder::new();
        welder.push([0.0; 3], [0.0; 3], [0.0; 2]);
        welder.push([-0.0, 0.0, 0.0], [0.0; 3], [0.0; 2]);
        assert_eq!(welder.vertex_count(), 2);
        assert_eq!(welder.index_count(), 2);
    }
}
