//! Integration tests for the glTF/GLB import pipeline.
//!
//! Tests the complete flow:
//! 1. Generate GLB programmatically
//! 2. Flatten it through kmf-export
//! 3. Validate blocks and the written .kmf file

mod gltf_generator;

use glam::{Quat, Vec3};
use gltf_generator::{MeshSpec, Mode, NodeSpec, SceneBuilder};
use tempfile::tempdir;

use kmf_common::formats::{DATA_NORMAL, DATA_TANGENT, DATA_UV, ModelBlock};
use kmf_common::import_kmf;
use kmf_export::{load_gltf, load_gltf_slice, parse_model};

fn assert_vec_close(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(&expected) {
        assert!((a - e).abs() < 1e-4, "{:?} != {:?}", actual, expected);
    }
}

/// Root (rotated, translated) -> Body (quad, scaled) -> Wheel (triangle), plus an unnamed root
fn hierarchy_scene() -> SceneBuilder {
    let mut scene = SceneBuilder::new();
    let quad = scene.mesh(MeshSpec::quad(Some("BodyMesh")));
    let tri = scene.mesh(MeshSpec::bare_triangle(None));

    let half = std::f32::consts::FRAC_1_SQRT_2;
    let wheel = scene.node(NodeSpec {
        mesh: Some(tri),
        translation: Some([0.0, 1.0, 0.0]),
        ..NodeSpec::named("Wheel")
    });
    let body = scene.node(NodeSpec {
        mesh: Some(quad),
        translation: Some([1.0, 0.0, 0.0]),
        scale: Some([2.0, 2.0, 2.0]),
        children: vec![wheel],
        ..NodeSpec::named("Body")
    });
    let root = scene.node(NodeSpec {
        // 90 degrees about +Y
        rotation: Some([0.0, half, 0.0, half]),
        translation: Some([0.0, 0.0, 10.0]),
        children: vec![body],
        ..NodeSpec::named("Root")
    });
    let loose = scene.node(NodeSpec {
        mesh: Some(quad),
        ..Default::default()
    });
    scene.root(root);
    scene.root(loose);
    scene
}

fn find<'a>(blocks: &'a [ModelBlock], name: &str) -> &'a ModelBlock {
    blocks
        .iter()
        .find(|b| b.node_name.as_str() == name)
        .unwrap_or_else(|| panic!("no block named {}", name))
}

#[test]
fn test_hierarchy_names_and_paths() {
    let blocks = load_gltf_slice(&hierarchy_scene().to_glb()).expect("Failed to load GLB");

    let names: Vec<_> = blocks.iter().map(|b| b.node_name.to_string()).collect();
    assert_eq!(names, vec!["Body", "Wheel", "node_3"]);

    let paths: Vec<_> = blocks.iter().map(|b| b.node_path.to_string()).collect();
    assert_eq!(paths, vec!["Root", "Root/Body", ""]);

    assert_eq!(blocks[0].mesh_name.as_str(), "BodyMesh");
    assert_eq!(blocks[1].mesh_name.as_str(), "Wheel_mesh0");
}

#[test]
fn test_world_transform_is_accumulated() {
    let blocks = load_gltf_slice(&hierarchy_scene().to_glb()).unwrap();
    let expected_rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);

    let body = find(&blocks, "Body");
    // Root rotation maps +X to -Z
    assert_vec_close(body.position, [0.0, 0.0, 9.0]);
    assert_vec_close(body.size, [2.0, 2.0, 2.0]);
    let [w, x, y, z] = body.rotation;
    assert!(Quat::from_xyzw(x, y, z, w).dot(expected_rotation).abs() > 0.9999);

    let wheel = find(&blocks, "Wheel");
    // Inherits Body's scale: one unit up becomes two
    assert_vec_close(wheel.position, [0.0, 2.0, 9.0]);
    assert_vec_close(wheel.size, [2.0, 2.0, 2.0]);

    let loose = find(&blocks, "node_3");
    assert_eq!(loose.position, [0.0; 3]);
    assert_eq!(loose.rotation, [1.0, 0.0, 0.0, 0.0]);
    assert_eq!(loose.size, [1.0; 3]);
}

#[test]
fn test_vertex_attributes() {
    let blocks = load_gltf_slice(&hierarchy_scene().to_glb()).unwrap();

    let body = find(&blocks, "Body");
    assert_eq!(body.data_type_flags, DATA_UV | DATA_NORMAL);
    assert_eq!(body.vertices.len(), 4);
    assert_eq!(body.indices, vec![0, 1, 2, 0, 2, 3]);
    // Positions are scaled by 0.01, normals renormalized
    assert_vec_close(body.vertices[2].position, [1.0, 1.0, 0.0]);
    assert_vec_close(body.vertices[2].normal, [0.0, 0.0, 1.0]);
    assert_eq!(body.vertices[2].tex_coord, [1.0, 0.0]);

    let wheel = find(&blocks, "Wheel");
    assert_eq!(wheel.data_type_flags, 0);
    assert!(wheel.vertices.iter().all(|v| v.normal == [0.0; 3]));
    assert!(wheel.vertices.iter().all(|v| v.tex_coord == [0.0; 2]));
}

#[test]
fn test_unindexed_corners_are_welded() {
    let mut scene = SceneBuilder::new();
    let mesh = scene.mesh(MeshSpec::unindexed_quad(Some("Quad")));
    let node = scene.node(NodeSpec {
        mesh: Some(mesh),
        ..NodeSpec::named("Quad")
    });
    scene.root(node);

    let blocks = load_gltf_slice(&scene.to_glb()).unwrap();
    assert_eq!(blocks[0].vertices.len(), 4);
    assert_eq!(blocks[0].indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn test_strip_converted_and_points_skipped() {
    let mut scene = SceneBuilder::new();
    let mut strip = MeshSpec::quad(Some("Strip")).with_mode(Mode::TriangleStrip);
    strip.indices = Some(vec![0, 1, 3, 2]);
    let strip = scene.mesh(strip);
    let points = scene.mesh(MeshSpec::quad(Some("Points")).with_mode(Mode::Points));

    let a = scene.node(NodeSpec {
        mesh: Some(strip),
        ..NodeSpec::named("A")
    });
    let b = scene.node(NodeSpec {
        mesh: Some(points),
        ..NodeSpec::named("B")
    });
    scene.root(a);
    scene.root(b);

    let blocks = load_gltf_slice(&scene.to_glb()).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].node_name.as_str(), "A");
    assert_eq!(blocks[0].triangle_count(), 2);
    // Second strip triangle (1, 3, 2) is rewound to (3, 1, 2)
    let corner = |i: usize| blocks[0].vertices[blocks[0].indices[i] as usize].position;
    assert_vec_close(corner(3), [0.0, 1.0, 0.0]);
    assert_vec_close(corner(4), [1.0, 0.0, 0.0]);
}

#[test]
fn test_primitives_of_named_mesh_get_distinct_names() {
    let mut scene = SceneBuilder::new();
    let shared = scene.mesh(MeshSpec::quad(Some("Hull")).with_primitives(2));
    let unnamed = scene.mesh(MeshSpec::bare_triangle(None).with_primitives(2));
    let a = scene.node(NodeSpec {
        mesh: Some(shared),
        ..NodeSpec::named("Ship")
    });
    let b = scene.node(NodeSpec {
        mesh: Some(unnamed),
        ..NodeSpec::named("Mast")
    });
    scene.root(a);
    scene.root(b);

    let blocks = load_gltf_slice(&scene.to_glb()).unwrap();
    let names: Vec<_> = blocks.iter().map(|b| b.mesh_name.to_string()).collect();
    assert_eq!(names, vec!["Hull_0", "Hull_1", "Mast_mesh0", "Mast_mesh1"]);
}

#[test]
fn test_scene_without_meshes_is_an_error() {
    let mut scene = SceneBuilder::new();
    let points = scene.mesh(MeshSpec::quad(None).with_mode(Mode::Points));
    let node = scene.node(NodeSpec {
        mesh: Some(points),
        ..NodeSpec::named("Dots")
    });
    scene.root(node);
    assert!(load_gltf_slice(&scene.to_glb()).is_err());
}

#[test]
fn test_roots_found_without_scene_list() {
    let mut scene = hierarchy_scene();
    scene.omit_scene = true;
    let blocks = load_gltf_slice(&scene.to_glb()).unwrap();
    let names: Vec<_> = blocks.iter().map(|b| b.node_name.to_string()).collect();
    assert_eq!(names, vec!["Body", "Wheel", "node_3"]);
}

#[test]
fn test_long_names_truncated() {
    let mut scene = SceneBuilder::new();
    let mesh = scene.mesh(MeshSpec::quad(Some("AMeshNameWellOverTwentyBytes")));
    let node = scene.node(NodeSpec {
        mesh: Some(mesh),
        ..NodeSpec::named("ANodeNameWellOverTwentyBytes")
    });
    scene.root(node);

    let blocks = load_gltf_slice(&scene.to_glb()).unwrap();
    assert_eq!(blocks[0].node_name.as_str(), "ANodeNameWellOverTwe");
    assert_eq!(blocks[0].mesh_name.as_str(), "AMeshNameWellOverTwe");
}

#[test]
fn test_glb_file_to_kmf() {
    let dir = tempdir().expect("Failed to create temp dir");
    let glb_path = dir.path().join("scene.glb");
    let kmf_path = dir.path().join("scene.kmf");
    std::fs::write(&glb_path, hierarchy_scene().to_glb()).expect("Failed to write GLB");

    let from_file = load_gltf(&glb_path).unwrap();
    assert_eq!(from_file.len(), 3);

    let summary = parse_model(3, &glb_path, &kmf_path).expect("Export failed");
    assert_eq!(summary.models, 3);
    assert_eq!(summary.triangles, 2 + 1 + 2);

    let file = import_kmf(&kmf_path).expect("Failed to import KMF");
    assert_eq!(file.header.scale_factor, 3);
    assert_eq!(file.blocks.len(), 3);
    for block in &file.blocks {
        assert_ne!(block.data_type_flags & DATA_TANGENT, 0);
        for v in &block.vertices {
            let t = Vec3::new(v.tangent[0], v.tangent[1], v.tangent[2]);
            assert!((t.length() - 1.0).abs() < 1e-4);
            assert!(v.tangent[3] == 0.0 || v.tangent[3] == 1.0);
        }
    }

    // Same blocks as the in-memory path, apart from the generated tangents
    let body = file.find_block("Body").unwrap();
    assert_eq!(body.vertices.len(), from_file[0].vertices.len());
    assert_eq!(body.node_path.as_str(), "Root");
}
