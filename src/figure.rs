// Figure: a mesh plus the mutable state needed to pose and draw it

use crate::animation::PoseArena;
use crate::assembly::{apply_pattern, CpuSkin, PosedMesh, Skin};
use crate::error::PoseError;
use crate::model::{AnimationClip, MeshAsset};
use crate::renderer::{BatchPool, FigureBatch};
use crate::texture::TextureHandle;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Currently applied posture; the clip is held so the key can't be reused.
struct Posture {
    clip: Arc<AnimationClip>,
    action: usize,
    frame: i32,
}

/// Posable, drawable instance of a [`MeshAsset`].
///
/// Mutation goes through `&mut self`, so a figure has a single writer at a
/// time; wrap it in a mutex to share it across threads. Queue entries posted
/// from a figure are copies leased from its pool and come back after flush.
pub struct Figure {
    mesh: Arc<MeshAsset>,
    indices: Vec<u32>,
    pattern: u32,
    textures: Vec<TextureHandle>,
    selected: usize,
    posed: PosedMesh,
    arena: PoseArena,
    posture: Option<Posture>,
    skin: Box<dyn Skin + Send + Sync>,
    pool: Option<BatchPool>,
}

impl Figure {
    pub fn new(mesh: Arc<MeshAsset>) -> Self {
        Self::with_skin(mesh, Box::new(CpuSkin))
    }

    pub fn with_skin(mesh: Arc<MeshAsset>, skin: Box<dyn Skin + Send + Sync>) -> Self {
        let mut posed = PosedMesh::default();
        skin.skin(&mesh, None, &mut posed);
        let mut indices = mesh.indices.clone();
        let visible = apply_pattern(&mesh, 0, &mut indices);
        debug!(
            "figure: {} of {} polygons visible under pattern 0",
            visible,
            mesh.polygon_count()
        );
        Self {
            mesh,
            indices,
            pattern: 0,
            textures: Vec::new(),
            selected: 0,
            posed,
            arena: PoseArena::new(),
            posture: None,
            skin,
            pool: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    fn alive(&self) -> Result<&BatchPool, PoseError> {
        self.pool.as_ref().ok_or(PoseError::Disposed)
    }

    pub fn is_disposed(&self) -> bool {
        self.pool.is_none()
    }

    pub fn mesh(&self) -> &Arc<MeshAsset> {
        &self.mesh
    }

    pub fn pattern(&self) -> u32 {
        self.pattern
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn posed(&self) -> &PosedMesh {
        &self.posed
    }

    pub fn num_patterns(&self) -> usize {
        self.mesh.pattern_count
    }

    /// Current `(action, frame)`, if an animation is applied.
    pub fn posture(&self) -> Option<(usize, i32)> {
        self.posture.as_ref().map(|p| (p.action, p.frame))
    }

    pub fn set_pattern(&mut self, mask: u32) -> Result<(), PoseError> {
        self.alive()?;
        self.apply_mask(mask);
        Ok(())
    }

    fn apply_mask(&mut self, mask: u32) {
        if mask == self.pattern {
            return;
        }
        self.pattern = mask;
        apply_pattern(&self.mesh, mask, &mut self.indices);
    }

    /// Pose the figure with `action` of `clip` at fixed-point `frame`.
    ///
    /// Frames past the action's end clamp. On error the figure is unchanged.
    /// An action carrying pattern events also replaces the pattern mask.
    pub fn set_posture(
        &mut self,
        clip: &Arc<AnimationClip>,
        action: usize,
        frame: i32,
    ) -> Result<(), PoseError> {
        self.alive()?;
        if clip.bone_count != self.mesh.bones.len() {
            return Err(PoseError::BoneMismatch {
                clip: clip.bone_count,
                mesh: self.mesh.bones.len(),
            });
        }
        if let Some(p) = &self.posture {
            if Arc::ptr_eq(&p.clip, clip) && p.action == action && p.frame == frame {
                return Ok(());
            }
            if !Arc::ptr_eq(&p.clip, clip) {
                self.arena.reset();
            }
        }

        let slots = self.arena.evaluate_all(clip, action, frame)?;
        self.skin.skin(&self.mesh, Some(slots), &mut self.posed);
        self.posture = Some(Posture {
            clip: Arc::clone(clip),
            action,
            frame,
        });

        if let Some(mask) = PoseArena::pattern_at(clip, action, frame) {
            self.apply_mask(mask);
        }
        Ok(())
    }

    /// Back to the bind pose.
    pub fn clear_posture(&mut self) -> Result<(), PoseError> {
        self.alive()?;
        self.posture = None;
        self.arena.reset();
        self.skin.skin(&self.mesh, None, &mut self.posed);
        Ok(())
    }

    pub fn set_texture(&mut self, texture: TextureHandle) -> Result<(), PoseError> {
        self.set_textures(vec![texture])
    }

    pub fn set_textures(&mut self, textures: Vec<TextureHandle>) -> Result<(), PoseError> {
        self.alive()?;
        self.textures = textures;
        if self.selected >= self.textures.len() {
            self.selected = 0;
        }
        Ok(())
    }

    /// Choose which texture single-slot meshes draw with.
    pub fn select_texture(&mut self, index: usize) -> Result<(), PoseError> {
        self.alive()?;
        if index < self.textures.len() {
            self.selected = index;
        } else {
            warn!(
                "figure: texture {index} out of range ({} set), selection kept",
                self.textures.len()
            );
        }
        Ok(())
    }

    /// Texture bound for mesh texture `slot`. Meshes with one slot use the
    /// selected texture; others index the texture list by slot.
    pub fn texture_for_slot(&self, slot: usize) -> Option<&TextureHandle> {
        if self.mesh.texture_count <= 1 {
            self.textures.get(self.selected)
        } else {
            self.textures.get(slot)
        }
    }

    /// Release buffers and the entry pool. Entries still queued are dropped
    /// when flushed instead of being returned.
    pub fn dispose(&mut self) {
        if self.pool.take().is_some() {
            debug!("figure disposed");
        }
        self.posture = None;
        self.arena.reset();
        self.textures.clear();
        self.posed = PosedMesh::default();
        self.indices = Vec::new();
    }

    /// Free batches waiting in the pool.
    pub fn pooled(&self) -> usize {
        self.pool.as_ref().map_or(0, |p| p.lock().len())
    }

    /// Copy the current pose into a pooled batch for queueing.
    pub(crate) fn lease_batch(&self) -> Result<(FigureBatch, Weak<Mutex<Vec<FigureBatch>>>), PoseError> {
        let pool = self.alive()?;
        let mut batch = pool.lock().pop().unwrap_or_default();

        batch.mesh = Some(Arc::clone(&self.mesh));
        batch.vertices.clone_from(&self.posed.vertices);
        match (&self.posed.normals, &mut batch.normals) {
            (Some(src), Some(dst)) => dst.clone_from(src),
            (src, dst) => *dst = src.clone(),
        }
        batch.indices.clone_from(&self.indices);
        batch.textures.clear();
        batch
            .textures
            .extend((0..self.mesh.texture_count).map(|slot| self.texture_for_slot(slot).cloned()));

        Ok((batch, Arc::downgrade(pool)))
    }
}

impl std::fmt::Debug for Figure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Figure")
            .field("vertices", &self.mesh.vertex_count)
            .field("pattern", &self.pattern)
            .field("posture", &self.posture())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
