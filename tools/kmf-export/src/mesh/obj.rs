//! Wavefront OBJ scene loading
//!
//! Each `o`/`g` statement starts a new node. Faces before the first one
//! belong to a node named after the file stem.

use anyhow::{Context, Result, bail};
use glam::Vec3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use kmf_common::formats::{DATA_NORMAL, DATA_UV, ModelBlock, SCALE_MULTIPLIER};

use super::types::fixed_name;
use super::weld::VertexWelder;

/// Load an OBJ file, one block per object/group with faces
pub fn load_obj(input: &Path) -> Result<Vec<ModelBlock>> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    let default_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    parse_obj(BufReader::new(file), default_name)
        .with_context(|| format!("Failed to parse OBJ: {:?}", input))
}

/// Face corner: position, optional UV and optional normal, all 0-based
type Corner = (usize, Option<usize>, Option<usize>);

/// Faces collected for one node
struct Group {
    name: String,
    welder: VertexWelder,
    all_uvs: bool,
    all_normals: bool,
}

impl Group {
    fn new(name: String) -> Self {
        Self {
            name,
            welder: VertexWelder::new(),
            all_uvs: true,
            all_normals: true,
        }
    }

    fn into_block(self) -> ModelBlock {
        let mesh_name = format!("{}_mesh0", self.name);
        let mut block = ModelBlock::new(
            fixed_name(&self.name, "node name"),
            fixed_name(&mesh_name, "mesh name"),
            Default::default(),
        );
        if self.all_uvs {
            block.data_type_flags |= DATA_UV;
        }
        if self.all_normals {
            block.data_type_flags |= DATA_NORMAL;
        }
        let (vertices, indices) = self.welder.finish();
        block.vertices = vertices;
        block.indices = indices;
        block
    }
}

/// Parse OBJ text; `default_name` names faces outside any object or group
pub fn parse_obj<R: BufRead>(reader: R, default_name: &str) -> Result<Vec<ModelBlock>> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();

    let mut blocks = Vec::new();
    let mut group = Group::new(default_name.to_string());

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" => positions.push(parse_floats(&parts[1..], line_no)?),
            "vt" => {
                let [u, v] = parse_tex_coord(&parts[1..], line_no)?;
                // OBJ has V up, glTF has V down
                tex_coords.push([u, 1.0 - v]);
            }
            "vn" => normals.push(parse_floats(&parts[1..], line_no)?),
            "o" | "g" => {
                let name = parts[1..].join(" ");
                let name = if name.is_empty() {
                    default_name.to_string()
                } else {
                    name
                };
                let finished = std::mem::replace(&mut group, Group::new(name));
                if finished.welder.index_count() > 0 {
                    blocks.push(finished.into_block());
                }
            }
            "f" => {
                let corners = parts[1..]
                    .iter()
                    .map(|c| {
                        parse_corner(c, positions.len(), tex_coords.len(), normals.len(), line_no)
                    })
                    .collect::<Result<Vec<Corner>>>()?;
                if corners.len() < 3 {
                    bail!("line {}: face needs at least 3 vertices", line_no);
                }

                // Fan triangulation, fine for the convex polygons exporters write
                for i in 1..corners.len() - 1 {
                    for &(vi, ti, ni) in &[corners[0], corners[i], corners[i + 1]] {
                        let position = (Vec3::from(positions[vi]) * SCALE_MULTIPLIER).to_array();
                        let uv = ti.map(|t| tex_coords[t]).unwrap_or([0.0; 2]);
                        let normal = ni
                            .map(|n| Vec3::from(normals[n]).normalize_or_zero().to_array())
                            .unwrap_or([0.0; 3]);
                        group.all_uvs &= ti.is_some();
                        group.all_normals &= ni.is_some();
                        group.welder.push(position, normal, uv);
                    }
                }
            }
            // Materials, smoothing groups, lines and the like carry no geometry we keep
            _ => {}
        }
    }

    if group.welder.index_count() > 0 {
        blocks.push(group.into_block());
    }

    if blocks.is_empty() {
        bail!("No faces found in OBJ file");
    }

    tracing::debug!(
        "Parsed OBJ: {} positions, {} UVs, {} normals, {} blocks",
        positions.len(),
        tex_coords.len(),
        normals.len(),
        blocks.len()
    );
    Ok(blocks)
}

fn parse_floats<const N: usize>(parts: &[&str], line_no: usize) -> Result<[f32; N]> {
    if parts.len() < N {
        bail!(
            "line {}: expected {} numbers, found {}",
            line_no,
            N,
            parts.len()
        );
    }
    let mut out = [0.0f32; N];
    for (slot, s) in out.iter_mut().zip(parts) {
        *slot = s
            .parse()
            .with_context(|| format!("line {}: invalid number '{}'", line_no, s))?;
    }
    Ok(out)
}

/// `vt u [v [w]]`; a missing V reads as 0 and W is ignored
fn parse_tex_coord(parts: &[&str], line_no: usize) -> Result<[f32; 2]> {
    match parts.len() {
        0 => bail!("line {}: expected 1 to 3 numbers, found 0", line_no),
        1 => {
            let [u] = parse_floats(parts, line_no)?;
            Ok([u, 0.0])
        }
        _ => parse_floats(parts, line_no),
    }
}

/// Resolve a 1-based or negative (relative) OBJ index against `count` elements
fn resolve_index(s: &str, count: usize, what: &str, line_no: usize) -> Result<usize> {
    let raw: i64 = s
        .parse()
        .with_context(|| format!("line {}: invalid {} index '{}'", line_no, what, s))?;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => count.checked_sub(r.unsigned_abs() as usize),
    };
    match resolved {
        Some(i) if i < count => Ok(i),
        _ => bail!(
            "line {}: {} index {} out of range ({} defined)",
            line_no,
            what,
            raw,
            count
        ),
    }
}

/// Parse a face corner: "v", "v/vt", "v/vt/vn" or "v//vn"
fn parse_corner(
    s: &str,
    positions: usize,
    tex_coords: usize,
    normals: usize,
    line_no: usize,
) -> Result<Corner> {
    let mut parts = s.split('/');
    let vi = resolve_index(parts.next().unwrap_or_default(), positions, "vertex", line_no)?;
    let ti = match parts.next().filter(|s| !s.is_empty()) {
        Some(t) => Some(resolve_index(t, tex_coords, "texture", line_no)?),
        None => None,
    };
    let ni = match parts.next().filter(|s| !s.is_empty()) {
        Some(n) => Some(resolve_index(n, normals, "normal", line_no)?),
        None => None,
    };
    Ok((vi, ti, ni))
}
