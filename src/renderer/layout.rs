use crate::model::Affine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Clip rectangle in target pixels, `x0..x1` by `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Overlap of both rectangles. Never larger than either; empty when disjoint.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1).max(x0);
        let y1 = self.y1.min(other.y1).max(y0);
        Rect { x0, y0, x1, y1 }
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }
}

/// Projection selected by the last projection command. Values are raw
/// fixed-point operands; the device maps them to clip space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    ParallelScale { x: i32, y: i32 },
    ParallelSize { width: i32, height: i32 },
    PerspectiveFov { near: i32, far: i32, angle: i32 },
    PerspectiveSize { near: i32, far: i32, width: i32, height: i32 },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::ParallelScale { x: 4096, y: 4096 }
    }
}

/// Camera settings captured into every queue entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub projection: Projection,
    pub affines: Arc<[Affine]>, // camera transform table
    pub affine_index: usize,
    pub center: [i32; 2],
    pub clip: Rect,
}

impl Layout {
    pub fn new(target: Rect) -> Self {
        Self {
            projection: Projection::default(),
            affines: Arc::from(vec![Affine::IDENTITY]),
            affine_index: 0,
            center: [target.width() / 2, target.height() / 2],
            clip: target,
        }
    }

    /// Active camera transform; identity when the table is empty.
    pub fn camera(&self) -> Affine {
        self.affines
            .get(self.affine_index)
            .copied()
            .unwrap_or(Affine::IDENTITY)
    }

    pub fn set_affines(&mut self, affines: Vec<Affine>) {
        self.affines = Arc::from(affines);
        if self.affine_index >= self.affines.len() {
            self.affine_index = 0;
        }
    }

    pub fn clip_to(&mut self, rect: &Rect) {
        self.clip = self.clip.intersect(rect);
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(Rect::from_size(0, 0))
    }
}
