//! glTF/GLB scene flattening

use anyhow::{Context, Result, bail};
use glam::{Mat4, Vec3};
use gltf::mesh::Mode;
use hashbrown::HashSet;
use std::path::Path;

use kmf_common::formats::{DATA_NORMAL, DATA_UV, ModelBlock, SCALE_MULTIPLIER};

use super::types::fixed_name;
use super::weld::VertexWelder;

/// Load a glTF/GLB file and flatten every mesh-bearing node into blocks
pub fn load_gltf(input: &Path) -> Result<Vec<ModelBlock>> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;
    flatten_document(&document, &buffers)
}

/// Load a GLB (or self-contained glTF) from memory
pub fn load_gltf_slice(bytes: &[u8]) -> Result<Vec<ModelBlock>> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).context("Failed to load glTF from memory")?;
    flatten_document(&document, &buffers)
}

/// A node waiting to be visited, with everything inherited from its ancestors
struct PendingNode<'a> {
    node: gltf::Node<'a>,
    parent_world: Mat4,
    /// Ancestor names joined by '/'
    path: String,
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

/// Scene roots: the default scene, else the first scene, else every parentless node
fn scene_roots(document: &gltf::Document) -> Vec<gltf::Node<'_>> {
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        return scene.nodes().collect();
    }

    let children: HashSet<usize> = document
        .nodes()
        .flat_map(|n| n.children().map(|c| c.index()))
        .collect();
    document
        .nodes()
        .filter(|n| !children.contains(&n.index()))
        .collect()
}

fn flatten_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<Vec<ModelBlock>> {
    let mut blocks = Vec::new();

    // Depth-first, pre-order, children in document order
    let mut worklist: Vec<PendingNode> = scene_roots(document)
        .into_iter()
        .rev()
        .map(|node| PendingNode {
            node,
            parent_world: Mat4::IDENTITY,
            path: String::new(),
        })
        .collect();

    while let Some(PendingNode {
        node,
        parent_world,
        path,
    }) = worklist.pop()
    {
        let name = node_name(&node);
        let world = parent_world * Mat4::from_cols_array_2d(&node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            let (scale, rotation, translation) = world.to_scale_rotation_translation();

            let shared_mesh = mesh.primitives().count() > 1;
            for (i, primitive) in mesh.primitives().enumerate() {
                // Primitives of one named mesh each get their own block name
                let mesh_name = match mesh.name() {
                    Some(mesh_name) if shared_mesh => format!("{}_{}", mesh_name, i),
                    Some(mesh_name) => mesh_name.to_owned(),
                    None => format!("{}_mesh{}", name, i),
                };

                let Some(mut block) = convert_primitive(&primitive, buffers, &name, &mesh_name)?
                else {
                    continue;
                };
                block.node_path = fixed_name(&path, "node path");
                block.position = translation.to_array();
                block.rotation = [rotation.w, rotation.x, rotation.y, rotation.z];
                block.size = scale.to_array();
                blocks.push(block);
            }
        }

        let child_path = if path.is_empty() {
            name
        } else {
            format!("{}/{}", path, name)
        };
        let children: Vec<_> = node.children().collect();
        for child in children.into_iter().rev() {
            worklist.push(PendingNode {
                node: child,
                parent_world: world,
                path: child_path.clone(),
            });
        }
    }

    if blocks.is_empty() {
        bail!("glTF scene has no nodes with triangle meshes");
    }

    tracing::debug!("Flattened glTF scene into {} blocks", blocks.len());
    Ok(blocks)
}

/// Convert one primitive to a block with identity transform
///
/// Returns `None` for point and line primitives.
fn convert_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    node_name: &str,
    mesh_name: &str,
) -> Result<Option<ModelBlock>> {
    let mode = primitive.mode();
    if matches!(
        mode,
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip
    ) {
        tracing::warn!(
            "Skipping {:?} primitive of mesh '{}' on node '{}'",
            mode,
            mesh_name,
            node_name
        );
        return Ok(None);
    }

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .with_context(|| format!("Mesh '{}' has no positions", mesh_name))?
        .collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
    let uvs: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().collect());

    let raw_indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let indices = triangulate(mode, &raw_indices, mesh_name);

    let mut welder = VertexWelder::new();
    for &i in &indices {
        let i = i as usize;
        let Some(position) = positions.get(i) else {
            bail!(
                "Mesh '{}' references vertex {} but has {} positions",
                mesh_name,
                i,
                positions.len()
            );
        };
        let position = (Vec3::from(*position) * SCALE_MULTIPLIER).to_array();
        let normal = normals
            .as_ref()
            .and_then(|n| n.get(i))
            .map(|n| Vec3::from(*n).normalize_or_zero().to_array())
            .unwrap_or([0.0; 3]);
        let uv = uvs
            .as_ref()
            .and_then(|t| t.get(i))
            .copied()
            .unwrap_or([0.0; 2]);
        welder.push(position, normal, uv);
    }

    let mut block = ModelBlock::new(
        fixed_name(node_name, "node name"),
        fixed_name(mesh_name, "mesh name"),
        Default::default(),
    );
    if uvs.is_some() {
        block.data_type_flags |= DATA_UV;
    }
    if normals.is_some() {
        block.data_type_flags |= DATA_NORMAL;
    }

    tracing::debug!(
        "Mesh '{}' on '{}': {} source vertices, {} after welding, {} triangles",
        mesh_name,
        node_name,
        positions.len(),
        welder.vertex_count(),
        welder.index_count() / 3
    );

    let (vertices, indices) = welder.finish();
    block.vertices = vertices;
    block.indices = indices;
    Ok(Some(block))
}

/// Expand strips and fans into a plain triangle list
pub(crate) fn triangulate(mode: Mode, indices: &[u32], mesh_name: &str) -> Vec<u32> {
    match mode {
        Mode::TriangleStrip => {
            let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
            for (i, w) in indices.windows(3).enumerate() {
                // Odd triangles swap the first two corners to keep the winding
                if i % 2 == 0 {
                    out.extend_from_slice(&[w[0], w[1], w[2]]);
                } else {
                    out.extend_from_slice(&[w[1], w[0], w[2]]);
                }
            }
            out
        }
        Mode::TriangleFan => {
            let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
            if let Some((&center, rest)) = indices.split_first() {
                for pair in rest.windows(2) {
                    out.extend_from_slice(&[center, pair[0], pair[1]]);
                }
            }
            out
        }
        _ => {
            let whole = indices.len() - indices.len() % 3;
            if whole != indices.len() {
                tracing::warn!(
                    "Mesh '{}' has {} indices, dropping trailing partial triangle",
                    mesh_name,
                    indices.len()
                );
            }
            indices[..whole].to_vec()
        }
    }
}
