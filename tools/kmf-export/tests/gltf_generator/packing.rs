//! Buffer packing and glTF JSON construction.

use gltf_json as json;
use json::validation::Checked::Valid;

use super::SceneBuilder;

/// Accumulates the binary buffer with its views and accessors
#[derive(Default)]
struct BufferPacker {
    data: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferPacker {
    fn push(
        &mut self,
        bytes: &[u8],
        count: usize,
        type_: json::accessor::Type,
        component: json::accessor::ComponentType,
        target: json::buffer::Target,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> json::Index<json::Accessor> {
        while !self.data.len().is_multiple_of(4) {
            self.data.push(0);
        }
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(target)),
        });

        let (min, max) = match bounds {
            Some((min, max)) => (
                Some(json::Value::Array(min.into_iter().map(json::Value::from).collect())),
                Some(json::Value::Array(max.into_iter().map(json::Value::from).collect())),
            ),
            None => (None, None),
        };

        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: count.into(),
            component_type: Valid(json::accessor::GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });
        json::Index::new(self.accessors.len() as u32 - 1)
    }
}

fn compute_bounds(positions: &[[f32; 3]]) -> (Vec<f32>, Vec<f32>) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for pos in positions {
        for i in 0..3 {
            min[i] = min[i].min(pos[i]);
            max[i] = max[i].max(pos[i]);
        }
    }
    (min.to_vec(), max.to_vec())
}

/// Build the binary buffer and the document referencing it
pub(crate) fn build_document(scene: &SceneBuilder) -> (Vec<u8>, json::Root) {
    use json::accessor::{ComponentType, Type};
    use json::buffer::Target;

    let mut packer = BufferPacker::default();
    let mut meshes = Vec::new();

    for spec in &scene.meshes {
        let mut attributes = std::collections::BTreeMap::new();

        let positions = packer.push(
            bytemuck::cast_slice(&spec.positions),
            spec.positions.len(),
            Type::Vec3,
            ComponentType::F32,
            Target::ArrayBuffer,
            Some(compute_bounds(&spec.positions)),
        );
        attributes.insert(Valid(json::mesh::Semantic::Positions), positions);

        if let Some(normals) = &spec.normals {
            let index = packer.push(
                bytemuck::cast_slice(normals),
                normals.len(),
                Type::Vec3,
                ComponentType::F32,
                Target::ArrayBuffer,
                None,
            );
            attributes.insert(Valid(json::mesh::Semantic::Normals), index);
        }

        if let Some(uvs) = &spec.uvs {
            let index = packer.push(
                bytemuck::cast_slice(uvs),
                uvs.len(),
                Type::Vec2,
                ComponentType::F32,
                Target::ArrayBuffer,
                None,
            );
            attributes.insert(Valid(json::mesh::Semantic::TexCoords(0)), index);
        }

        let indices = spec.indices.as_ref().map(|indices| {
            packer.push(
                bytemuck::cast_slice(indices),
                indices.len(),
                Type::Scalar,
                ComponentType::U32,
                Target::ElementArrayBuffer,
                None,
            )
        });

        meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: spec.name.clone(),
            primitives: vec![
                json::mesh::Primitive {
                    attributes,
                    extensions: Default::default(),
                    extras: Default::default(),
                    indices,
                    material: None,
                    mode: Valid(spec.mode),
                    targets: None,
                };
                spec.primitives
            ],
            weights: None,
        });
    }

    let nodes = scene
        .nodes
        .iter()
        .map(|spec| json::Node {
            camera: None,
            children: if spec.children.is_empty() {
                None
            } else {
                Some(
                    spec.children
                        .iter()
                        .map(|&c| json::Index::new(c as u32))
                        .collect(),
                )
            },
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: spec.mesh.map(|m| json::Index::new(m as u32)),
            name: spec.name.clone(),
            rotation: spec.rotation.map(json::scene::UnitQuaternion),
            scale: spec.scale,
            translation: spec.translation,
            skin: None,
            weights: None,
        })
        .collect();

    let scenes = if scene.omit_scene {
        Vec::new()
    } else {
        vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some("TestScene".to_string()),
            nodes: scene
                .roots
                .iter()
                .map(|&r| json::Index::new(r as u32))
                .collect(),
        }]
    };

    let buffers = vec![json::Buffer {
        byte_length: 0u64.into(), // set by assemble_glb
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri: None,
    }];

    let root = json::Root {
        accessors: packer.accessors,
        animations: Vec::new(),
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some("kmf-export-test".to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers,
        buffer_views: packer.views,
        cameras: Vec::new(),
        extensions: Default::default(),
        extras: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        images: Vec::new(),
        materials: Vec::new(),
        meshes,
        nodes,
        samplers: Vec::new(),
        scene: if scene.omit_scene {
            None
        } else {
            Some(json::Index::new(0))
        },
        scenes,
        skins: Vec::new(),
        textures: Vec::new(),
    };

    (packer.data, root)
}
