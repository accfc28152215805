// Mesh assembly: bucket sort, shared index buffer, visibility patterns, skinning.

mod pattern;
mod skin;

pub use pattern::apply_pattern;
pub use skin::{CpuSkin, PosedMesh, Skin};

use crate::model::{BucketTable, MeshAsset, MeshParts};
use log::debug;

/// Position of the hidden-polygon sentinel vertex.
pub const SENTINEL_VERTEX: [f32; 3] = [f32::INFINITY; 3];
/// Normal of the sentinel vertex.
pub const SENTINEL_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Sort decoded polygons into draw buckets and build the shared index buffer.
///
/// Textured polygons are ordered by blend mode, texture slot, then double-face
/// flag; colored polygons by blend mode then double-face flag. The sort is
/// stable, so ties keep decode order and repeated loads lay out identically.
pub fn assemble(parts: MeshParts) -> MeshAsset {
    let MeshParts {
        version,
        mut vertices,
        normals,
        bones,
        mut textured,
        mut colored,
        texture_count,
        pattern_count,
    } = parts;

    let vertex_count = vertices.len();
    vertices.push(SENTINEL_VERTEX);
    let normals = normals.map(|mut n| {
        n.push(SENTINEL_NORMAL);
        n
    });

    textured.sort_by_key(|p| (p.blend, p.texture, p.double_face));
    colored.sort_by_key(|p| (p.blend, p.double_face));

    let mut buckets = BucketTable::new(texture_count);
    let total: usize = textured
        .iter()
        .chain(colored.iter())
        .map(|p| p.indices.len())
        .sum();
    let mut indices = Vec::with_capacity(total);
    let mut materials = Vec::with_capacity(total * crate::model::MATERIAL_STRIDE);

    for polygon in textured.iter().chain(colored.iter()) {
        buckets.add(polygon);
        indices.extend_from_slice(&polygon.indices);
        for bytes in &polygon.materials {
            materials.extend_from_slice(bytes);
        }
    }

    debug!(
        "assembled {} indices into {} buckets",
        indices.len(),
        buckets.buckets().len()
    );

    MeshAsset {
        version,
        vertex_count,
        vertices,
        normals,
        bones,
        textured,
        colored,
        buckets,
        indices,
        materials,
        texture_count,
        pattern_count,
    }
}
