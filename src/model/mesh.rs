use super::Bone;
use crate::material::BlendMode;
use serde::{Deserialize, Serialize};

/// Upper bound on vertices a mesh may declare.
pub const MAX_VERTICES: usize = 21845;
/// Upper bound on texture slots.
pub const MAX_TEXTURES: usize = 16;
/// Upper bound on patterns, pattern 0 included.
pub const MAX_PATTERNS: usize = 33;
/// Upper bound on palette colors.
pub const MAX_COLORS: usize = 256;

/// Bytes per shared-index entry in the material buffer.
pub const MATERIAL_STRIDE: usize = 5;

/// Per-vertex material bytes.
/// Textured: `[u, v, light, specular, transparent]`; colored: `[r, g, b, light, specular]`.
pub type MaterialBytes = [u8; MATERIAL_STRIDE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolygonKind {
    Textured,
    Colored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub kind: PolygonKind,
    pub blend: BlendMode,
    pub double_face: bool,
    pub pattern: u32,              // visibility mask, 0 = always visible
    pub texture: usize,            // texture slot, textured polygons only
    pub indices: Vec<u32>,         // 3 for a triangle, 6 for a quad
    pub materials: Vec<MaterialBytes>, // aligned with `indices`
}

impl Polygon {
    pub fn is_quad(&self) -> bool {
        self.indices.len() == 6
    }

    /// Visible under `mask` when every pattern bit is selected.
    pub fn is_visible(&self, mask: u32) -> bool {
        self.pattern & mask == self.pattern
    }
}

/// Index counts per draw bucket.
///
/// Textured buckets are laid out `[blend][slot][double_face]`, colored buckets
/// `[blend][double_face]`. Textured buckets come first in the shared index
/// buffer, each table in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTable {
    pub slots: usize,
    pub textured: Vec<usize>,
    pub colored: [[usize; 2]; 4],
}

impl BucketTable {
    pub fn new(slots: usize) -> Self {
        Self {
            slots,
            textured: vec![0; 4 * slots * 2],
            colored: [[0; 2]; 4],
        }
    }

    fn textured_slot(&self, blend: BlendMode, slot: usize, double_face: bool) -> usize {
        (blend.index() * self.slots + slot) * 2 + double_face as usize
    }

    pub fn textured_len(&self, blend: BlendMode, slot: usize, double_face: bool) -> usize {
        self.textured[self.textured_slot(blend, slot, double_face)]
    }

    pub fn colored_len(&self, blend: BlendMode, double_face: bool) -> usize {
        self.colored[blend.index()][double_face as usize]
    }

    pub fn add(&mut self, polygon: &Polygon) {
        let n = polygon.indices.len();
        match polygon.kind {
            PolygonKind::Textured => {
                let i = self.textured_slot(polygon.blend, polygon.texture, polygon.double_face);
                self.textured[i] += n;
            }
            PolygonKind::Colored => {
                self.colored[polygon.blend.index()][polygon.double_face as usize] += n;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.textured.iter().sum::<usize>() + self.colored.iter().flatten().sum::<usize>()
    }

    /// Non-empty buckets in canonical order with their start offsets.
    pub fn buckets(&self) -> Vec<Bucket> {
        let mut out = Vec::new();
        let mut start = 0;
        for blend in BlendMode::ALL {
            for slot in 0..self.slots {
                for double_face in [false, true] {
                    let count = self.textured_len(blend, slot, double_face);
                    if count > 0 {
                        out.push(Bucket {
                            kind: PolygonKind::Textured,
                            blend,
                            slot,
                            double_face,
                            start,
                            count,
                        });
                    }
                    start += count;
                }
            }
        }
        for blend in BlendMode::ALL {
            for double_face in [false, true] {
                let count = self.colored_len(blend, double_face);
                if count > 0 {
                    out.push(Bucket {
                        kind: PolygonKind::Colored,
                        blend,
                        slot: 0,
                        double_face,
                        start,
                        count,
                    });
                }
                start += count;
            }
        }
        out
    }
}

/// Contiguous run of the shared index buffer drawn with one device call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub kind: PolygonKind,
    pub blend: BlendMode,
    pub slot: usize,
    pub double_face: bool,
    pub start: usize,
    pub count: usize,
}

/// Decoder output before assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshParts {
    pub version: u8,
    pub vertices: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub bones: Vec<Bone>,
    pub textured: Vec<Polygon>,
    pub colored: Vec<Polygon>,
    pub texture_count: usize,
    pub pattern_count: usize,
}

/// Decoded, draw-ready mesh. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshAsset {
    pub version: u8,
    pub vertex_count: usize,
    /// Bind-pose positions; `vertex_count + 1` entries, the last is the hidden-polygon sentinel.
    pub vertices: Vec<[f32; 3]>,
    /// Bind-pose normals with a trailing `(0, 0, 1)` sentinel.
    pub normals: Option<Vec<[f32; 3]>>,
    pub bones: Vec<Bone>,
    /// Textured polygons in bucket order.
    pub textured: Vec<Polygon>,
    /// Colored polygons in bucket order.
    pub colored: Vec<Polygon>,
    pub buckets: BucketTable,
    /// Shared index buffer with every polygon visible.
    pub indices: Vec<u32>,
    /// `MATERIAL_STRIDE` bytes per entry of `indices`.
    pub materials: Vec<u8>,
    pub texture_count: usize,
    pub pattern_count: usize,
}

impl MeshAsset {
    /// Index of the sentinel vertex used to hide polygons.
    pub fn sentinel_index(&self) -> u32 {
        self.vertex_count as u32
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// All polygons in shared index buffer order.
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        self.textured.iter().chain(self.colored.iter())
    }

    pub fn polygon_count(&self) -> usize {
        self.textured.len() + self.colored.len()
    }
}
