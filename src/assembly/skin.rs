use crate::model::{Affine, Bone, MeshAsset};

/// World-space buffers produced by skinning. Same layout as the bind pose,
/// sentinel included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosedMesh {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
}

/// Skinning primitive.
///
/// Every vertex is transformed by the world transform of the bone owning it,
/// where `world(bone) = world(parent) ∘ local(bone)` and `local` is the bind
/// pose, or the bone's entry in `matrices` when given. Implementations must
/// leave the trailing sentinel vertex untouched.
pub trait Skin {
    fn skin(&self, mesh: &MeshAsset, matrices: Option<&[Affine]>, out: &mut PosedMesh);
}

/// Reference skinning on the CPU.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuSkin;

impl Skin for CpuSkin {
    fn skin(&self, mesh: &MeshAsset, matrices: Option<&[Affine]>, out: &mut PosedMesh) {
        let locals: Vec<Affine> = match matrices {
            Some(m) => mesh
                .bones
                .iter()
                .enumerate()
                .map(|(i, bone)| m.get(i).copied().unwrap_or(bone.bind))
                .collect(),
            None => mesh.bones.iter().map(|bone| bone.bind).collect(),
        };
        let world = world_transforms(&mesh.bones, &locals);

        out.vertices.clear();
        out.vertices.extend_from_slice(&mesh.vertices);
        match &mesh.normals {
            Some(normals) => {
                let dst = out.normals.get_or_insert_with(Vec::new);
                dst.clear();
                dst.extend_from_slice(normals);
            }
            None => out.normals = None,
        }

        let mut start = 0;
        for (bone, transform) in mesh.bones.iter().zip(&world) {
            let end = (start + bone.vertex_count).min(mesh.vertex_count);
            for v in &mut out.vertices[start..end] {
                *v = transform.transform_point(*v);
            }
            if let Some(normals) = out.normals.as_mut() {
                for n in &mut normals[start..end] {
                    *n = normalize(transform.transform_vector(*n));
                }
            }
            start = end;
        }
    }
}

/// Accumulate each bone's parent chain.
pub fn world_transforms(bones: &[Bone], locals: &[Affine]) -> Vec<Affine> {
    let n = bones.len();
    let mut world: Vec<Option<Affine>> = vec![None; n];
    let mut chain = Vec::with_capacity(n);

    for i in 0..n {
        chain.clear();
        let mut cur = Some(i);
        while let Some(b) = cur {
            if world[b].is_some() || chain.len() > n {
                break;
            }
            chain.push(b);
            cur = bones[b].parent_index();
        }
        let mut acc = cur.and_then(|b| world[b]).unwrap_or(Affine::IDENTITY);
        for &b in chain.iter().rev() {
            acc = acc.compose(&locals[b]);
            world[b] = Some(acc);
        }
    }

    world
        .into_iter()
        .map(|w| w.unwrap_or(Affine::IDENTITY))
        .collect()
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}
