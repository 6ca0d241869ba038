//! Programmatic GLB generation for integration tests.
//!
//! Scenes are described with [`MeshSpec`] and [`NodeSpec`] and packed into a
//! single-buffer GLB by [`SceneBuilder::to_glb`].

#![allow(dead_code)]

mod glb_assembly;
mod packing;

pub use gltf_json::mesh::Mode;

/// One mesh with a single primitive
#[derive(Clone)]
pub struct MeshSpec {
    pub name: Option<String>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
    pub mode: Mode,
    /// Copies of the primitive emitted in the mesh
    pub primitives: usize,
}

impl MeshSpec {
    /// Unit quad in the XY plane (units of 100 so the scale multiplier gives 1.0)
    pub fn quad(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_owned),
            positions: vec![
                [0.0, 0.0, 0.0],
                [100.0, 0.0, 0.0],
                [100.0, 100.0, 0.0],
                [0.0, 100.0, 0.0],
            ],
            normals: Some(vec![[0.0, 0.0, 3.0]; 4]),
            uvs: Some(vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]),
            indices: Some(vec![0, 1, 2, 0, 2, 3]),
            mode: Mode::Triangles,
            primitives: 1,
        }
    }

    /// The same quad as six unindexed corners
    pub fn unindexed_quad(name: Option<&str>) -> Self {
        let quad = Self::quad(name);
        let pick = |i: &u32| *i as usize;
        let order: Vec<usize> = quad.indices.as_ref().unwrap().iter().map(pick).collect();
        Self {
            positions: order.iter().map(|&i| quad.positions[i]).collect(),
            normals: quad
                .normals
                .as_ref()
                .map(|n| order.iter().map(|&i| n[i]).collect()),
            uvs: quad
                .uvs
                .as_ref()
                .map(|t| order.iter().map(|&i| t[i]).collect()),
            indices: None,
            ..quad
        }
    }

    /// Single triangle without normals or UVs
    pub fn bare_triangle(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_owned),
            positions: vec![[0.0, 0.0, 0.0], [100.0, 0.0, 0.0], [0.0, 100.0, 0.0]],
            normals: None,
            uvs: None,
            indices: Some(vec![0, 1, 2]),
            mode: Mode::Triangles,
            primitives: 1,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_primitives(mut self, count: usize) -> Self {
        self.primitives = count;
        self
    }
}

/// One node; `rotation` is a glTF quaternion (x, y, z, w)
#[derive(Clone, Default)]
pub struct NodeSpec {
    pub name: Option<String>,
    pub mesh: Option<usize>,
    pub translation: Option<[f32; 3]>,
    pub rotation: Option<[f32; 4]>,
    pub scale: Option<[f32; 3]>,
    pub children: Vec<usize>,
}

impl NodeSpec {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }
}

/// Accumulates meshes, nodes and scene roots
#[derive(Default)]
pub struct SceneBuilder {
    pub meshes: Vec<MeshSpec>,
    pub nodes: Vec<NodeSpec>,
    pub roots: Vec<usize>,
    /// Emit a scene list; without one, loaders must discover roots themselves
    pub omit_scene: bool,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&mut self, mesh: MeshSpec) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn node(&mut self, node: NodeSpec) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn root(&mut self, node: usize) {
        self.roots.push(node);
    }

    /// Pack the scene into a GLB file
    pub fn to_glb(&self) -> Vec<u8> {
        let (buffer, root) = packing::build_document(self);
        glb_assembly::assemble_glb(&root, &buffer)
    }
}
