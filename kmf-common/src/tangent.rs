//! Per-vertex tangent space generation
//!
//! Accumulates per-triangle tangent and bitangent directions from position
//! and UV deltas, then Gram-Schmidt orthogonalizes each vertex tangent
//! against its normal. Triangles are visited in index order, so the result
//! is reproducible for identical input.

use glam::{Vec2, Vec3};
use rayon::prelude::*;

use crate::formats::{DATA_TANGENT, ModelBlock};

/// Below this the UV determinant is treated as degenerate
const DEGENERATE_UV_EPSILON: f32 = 1e-6;

/// Below this the orthogonalized tangent falls back to +X
const DEGENERATE_TANGENT_EPSILON: f32 = 1e-6;

/// Fallback tangent for vertices with no usable UV gradient
const FALLBACK_TANGENT: Vec3 = Vec3::X;

/// Fill `tangent` for every vertex of `block` in place
///
/// `w` is 1.0 when the UV mapping is mirrored (bitangent opposite to
/// `cross(normal, tangent)`), else 0.0. Triangles referencing missing
/// vertices are skipped; a trailing partial triangle is ignored.
pub fn generate_tangents(block: &mut ModelBlock) {
    let vertex_count = block.vertices.len();
    let mut tan1 = vec![Vec3::ZERO; vertex_count];
    let mut tan2 = vec![Vec3::ZERO; vertex_count];

    for tri in block.indices.chunks_exact(3) {
        let (i1, i2, i3) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if i1 >= vertex_count || i2 >= vertex_count || i3 >= vertex_count {
            tracing::warn!(
                "Skipping triangle ({}, {}, {}) in '{}': only {} vertices",
                i1,
                i2,
                i3,
                block.node_name,
                vertex_count
            );
            continue;
        }

        let v1 = &block.vertices[i1];
        let v2 = &block.vertices[i2];
        let v3 = &block.vertices[i3];

        let p1 = Vec3::from(v1.position);
        let e1 = Vec3::from(v2.position) - p1;
        let e2 = Vec3::from(v3.position) - p1;

        let w1 = Vec2::from(v1.tex_coord);
        let d1 = Vec2::from(v2.tex_coord) - w1;
        let d2 = Vec2::from(v3.tex_coord) - w1;
        let (s1, t1) = (d1.x, d1.y);
        let (s2, t2) = (d2.x, d2.y);

        let det = s1 * t2 - s2 * t1;
        let r = if det.abs() < DEGENERATE_UV_EPSILON {
            1.0
        } else {
            1.0 / det
        };

        let sdir = (e1 * t2 - e2 * t1) * r;
        let tdir = (e2 * s1 - e1 * s2) * r;

        tan1[i1] += sdir;
        tan1[i2] += sdir;
        tan1[i3] += sdir;

        tan2[i1] += tdir;
        tan2[i2] += tdir;
        tan2[i3] += tdir;
    }

    for (i, vertex) in block.vertices.iter_mut().enumerate() {
        let n = Vec3::from(vertex.normal).normalize_or_zero();
        let t = tan1[i];

        // Gram-Schmidt orthogonalize
        let tangent = t - n * n.dot(t);
        let tangent = if tangent.length() < DEGENERATE_TANGENT_EPSILON || !tangent.is_finite() {
            FALLBACK_TANGENT
        } else {
            tangent.normalize()
        };

        let w = if n.cross(tangent).dot(tan2[i]) < 0.0 {
            1.0
        } else {
            0.0
        };

        vertex.tangent = [tangent.x, tangent.y, tangent.z, w];
    }

    block.data_type_flags |= DATA_TANGENT;
}

/// Generate tangents for every block, in parallel across blocks
///
/// Blocks share no state, so the output is identical to calling
/// [`generate_tangents`] on each block in turn.
pub fn generate_tangents_all(blocks: &mut [ModelBlock]) {
    blocks.par_iter_mut().for_each(generate_tangents);
}
