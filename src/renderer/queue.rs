use super::device::PrimitiveKind;
use super::effect::Effect;
use super::layout::Layout;
use crate::material::BlendMode;
use crate::model::MeshAsset;
use crate::texture::TextureHandle;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Free batches kept per figure once the queue hands them back.
pub const POOL_LIMIT: usize = 4;

/// Free-list of figure batches, owned by the figure.
pub type BatchPool = Arc<Mutex<Vec<FigureBatch>>>;

/// Posed copy of a figure, reused across frames through its pool.
#[derive(Debug, Default)]
pub struct FigureBatch {
    pub mesh: Option<Arc<MeshAsset>>,
    pub vertices: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Vec<u32>,
    pub textures: Vec<Option<TextureHandle>>, // one per mesh texture slot
}

/// Attribute byte of a primitive draw word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrimitiveAttributes {
    pub lighting: bool,
    pub sphere_map: bool,
    pub color_key: bool,
    pub blend: BlendMode,
}

impl PrimitiveAttributes {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            lighting: bits & 0x01 != 0,
            sphere_map: bits & 0x02 != 0,
            color_key: bits & 0x10 != 0,
            blend: BlendMode::from_u32((bits & 0x60) >> 5),
        }
    }
}

/// Inline geometry from a draw command or `post_primitives`.
/// Per-face streams are already expanded to one entry per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveBatch {
    pub kind: PrimitiveKind,
    pub count: usize,
    pub attributes: PrimitiveAttributes,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub texcoords: Option<Vec<[f32; 2]>>,
    pub colors: Option<Vec<u32>>,
    pub sprites: Option<Vec<[i32; 8]>>,
    pub texture: Option<TextureHandle>,
}

impl PrimitiveBatch {
    pub fn new(kind: PrimitiveKind, count: usize, attributes: PrimitiveAttributes) -> Self {
        Self {
            kind,
            count,
            attributes,
            positions: Vec::new(),
            normals: None,
            texcoords: None,
            colors: None,
            sprites: None,
            texture: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Debug)]
pub enum Geometry {
    Figure {
        batch: FigureBatch,
        pool: Weak<Mutex<Vec<FigureBatch>>>,
    },
    Primitives(PrimitiveBatch),
}

/// Snapshot of one deferred draw. Nothing in it refers back to live state.
#[derive(Debug)]
pub struct QueueEntry {
    pub layout: Layout,
    pub effect: Effect,
    pub geometry: Geometry,
}

impl QueueEntry {
    /// Hand a figure batch back to its pool. Dropped if the figure is gone or
    /// its pool is full.
    pub fn recycle(self) {
        if let Geometry::Figure { batch, pool } = self.geometry {
            if let Some(pool) = pool.upgrade() {
                let mut free = pool.lock();
                if free.len() < POOL_LIMIT {
                    free.push(batch);
                }
            }
        }
    }
}

/// Blend applied to geometry drawn under `effect`. Blending needs the
/// semi-transparent attribute; otherwise everything draws opaque.
pub fn effective_blend(effect: &Effect, blend: BlendMode) -> BlendMode {
    if effect.semi_transparent {
        blend
    } else {
        BlendMode::None
    }
}
