use super::command::{CommandReader, Instruction};
use super::device::{GraphicsDevice, PrimitiveKind, VertexData};
use super::effect::Effect;
use super::layout::{Layout, Rect};
use super::queue::{effective_blend, Geometry, PrimitiveBatch, QueueEntry};
use crate::error::{CommandListError, DeviceError, RenderError};
use crate::figure::Figure;
use crate::material::BlendMode;
use crate::model::PolygonKind;
use crate::texture::TextureHandle;
use log::{debug, warn};
use std::sync::Arc;

/// Highest texture slot a command list may select.
pub const MAX_COMMAND_TEXTURE: usize = 15;

/// Whether the renderer currently owns a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    Unbound,
    Bound { target: Rect },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Opaque,  // depth write on, unblended geometry only
    Blended, // depth write off, everything with its blend
}

impl Pass {
    fn accepts(self, blend: BlendMode) -> bool {
        match self {
            Pass::Opaque => !blend.is_blended(),
            Pass::Blended => true,
        }
    }
}

/// Deferred renderer: draws are snapshotted into a queue and replayed in two
/// passes on [`Renderer::flush`].
pub struct Renderer<D: GraphicsDevice> {
    device: D,
    bind: BindState,
    layout: Layout,
    effect: Effect,
    command_textures: Vec<TextureHandle>,
    texture: Option<TextureHandle>,
    queue: Vec<QueueEntry>,
}

impl<D: GraphicsDevice> Renderer<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            bind: BindState::Unbound,
            layout: Layout::default(),
            effect: Effect::default(),
            command_textures: Vec::new(),
            texture: None,
            queue: Vec::new(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn bind_state(&self) -> BindState {
        self.bind
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Changes apply to draws posted afterwards only.
    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    /// Changes apply to draws posted afterwards only.
    pub fn effect_mut(&mut self) -> &mut Effect {
        &mut self.effect
    }

    /// Texture table addressed by the texture command (slot `n` is entry `n - 1`).
    pub fn set_command_textures(&mut self, textures: Vec<TextureHandle>) {
        self.command_textures = textures;
        self.texture = None;
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn target(&self) -> Result<Rect, RenderError> {
        match self.bind {
            BindState::Bound { target } => Ok(target),
            BindState::Unbound => Err(RenderError::NotBound),
        }
    }

    /// Take exclusive ownership of a `width` x `height` target. Resets the
    /// clip rect, center, camera index and texture selection; the projection
    /// and camera table are kept.
    pub fn bind(&mut self, width: i32, height: i32) -> Result<(), RenderError> {
        if let BindState::Bound { .. } = self.bind {
            return Err(RenderError::AlreadyBound);
        }
        let target = Rect::from_size(width, height);
        let previous = std::mem::replace(&mut self.layout, Layout::new(target));
        self.layout.projection = previous.projection;
        self.layout.affines = previous.affines;
        self.texture = None;
        self.bind = BindState::Bound { target };
        debug!("renderer bound to {width}x{height}");
        Ok(())
    }

    /// Flush whatever is queued and give the target up. The renderer is
    /// unbound even when the flush fails.
    pub fn release(&mut self) -> Result<(), RenderError> {
        self.target()?;
        let result = self.flush();
        self.bind = BindState::Unbound;
        debug!("renderer released");
        result
    }

    fn enqueue(&mut self, geometry: Geometry) {
        self.queue.push(QueueEntry {
            layout: self.layout.clone(),
            effect: self.effect.clone(),
            geometry,
        });
    }

    /// Queue the figure's current pose, pattern and textures.
    pub fn post_figure(&mut self, figure: &Figure) -> Result<(), RenderError> {
        self.target()?;
        let (batch, pool) = figure.lease_batch()?;
        self.enqueue(Geometry::Figure { batch, pool });
        Ok(())
    }

    /// Queue one primitive batch. A batch without its own texture picks up
    /// the texture selected by the last command list.
    pub fn post_primitives(&mut self, mut batch: PrimitiveBatch) -> Result<(), RenderError> {
        self.target()?;
        if batch.texture.is_none() {
            batch.texture = self.texture.clone();
        }
        self.enqueue(Geometry::Primitives(batch));
        Ok(())
    }

    /// Post and flush in one step.
    pub fn render_figure(&mut self, figure: &Figure) -> Result<(), RenderError> {
        self.post_figure(figure)?;
        self.flush()
    }

    /// Run a command list. A malformed instruction stops execution before
    /// it is applied; earlier instructions stay in effect.
    pub fn execute_command_list(&mut self, words: &[u32]) -> Result<(), RenderError> {
        self.target()?;
        let mut reader = CommandReader::new(words)?;
        while let Some((index, instruction)) = reader.next_instruction()? {
            match instruction {
                Instruction::End => break,
                Instruction::Nop => {}
                Instruction::Flush => self.flush()?,
                Instruction::Attribute(bits) => self.effect.set_attributes(bits),
                Instruction::Clip(rect) => self.layout.clip_to(&rect),
                Instruction::Center(center) => self.layout.center = center,
                Instruction::Texture(slot) => self.select_command_texture(slot),
                Instruction::AffineIndex(affine) => {
                    let count = self.layout.affines.len();
                    if affine >= count {
                        return Err(CommandListError::AffineIndex {
                            index,
                            affine,
                            count,
                        }
                        .into());
                    }
                    self.layout.affine_index = affine;
                }
                Instruction::Projection(p) => self.layout.projection = p,
                Instruction::AmbientLight(ambient) => self.effect.light.ambient = ambient,
                Instruction::DirectionLight {
                    direction,
                    intensity,
                } => {
                    self.effect.light.direction = direction;
                    self.effect.light.intensity = intensity;
                }
                Instruction::Threshold(toon) => self.effect.toon_params = toon,
                Instruction::Draw(mut batch) => {
                    batch.texture = self.texture.clone();
                    self.enqueue(Geometry::Primitives(batch));
                }
            }
        }
        Ok(())
    }

    fn select_command_texture(&mut self, slot: usize) {
        match self.command_textures.get(slot.wrapping_sub(1)) {
            Some(texture) if (1..=MAX_COMMAND_TEXTURE).contains(&slot) => {
                self.texture = Some(Arc::clone(texture));
            }
            _ => debug!("texture slot {slot} ignored"),
        }
    }

    /// Replay the queue in two passes, then clear it and return pooled
    /// entries. On a device error the queue is still cleared and the error
    /// is returned; the frame should be dropped.
    pub fn flush(&mut self) -> Result<(), RenderError> {
        self.target()?;
        if self.queue.is_empty() {
            return Ok(());
        }
        let mut entries = std::mem::take(&mut self.queue);
        let result = replay(&mut self.device, &entries);
        debug!("flushed {} entries", entries.len());
        for entry in entries.drain(..) {
            entry.recycle();
        }
        self.queue = entries;
        if let Err(e) = &result {
            warn!("flush aborted: {e}");
        }
        result.map_err(RenderError::from)
    }
}

fn replay<D: GraphicsDevice>(device: &mut D, entries: &[QueueEntry]) -> Result<(), DeviceError> {
    device.set_depth_test(true)?;
    for pass in [Pass::Opaque, Pass::Blended] {
        device.set_depth_write(pass == Pass::Opaque)?;
        for entry in entries {
            draw_entry(device, entry, pass)?;
        }
    }
    device.set_depth_write(true)?;
    device.set_blend_mode(BlendMode::None)
}

fn set_environment<D: GraphicsDevice>(
    device: &mut D,
    entry: &QueueEntry,
    lit: bool,
    sphere: bool,
) -> Result<(), DeviceError> {
    let layout = &entry.layout;
    let effect = &entry.effect;
    device.set_camera(&layout.projection, &layout.camera(), layout.center)?;
    device.set_clip_rect(Some(layout.clip))?;
    device.set_lighting_uniforms(if lit { effect.light_uniforms() } else { None })?;
    device.set_toon_uniforms(effect.toon_uniforms())?;
    let sphere_texture = if sphere && effect.sphere_map {
        effect.sphere_texture.as_ref()
    } else {
        None
    };
    device.bind_texture(1, sphere_texture)
}

fn draw_entry<D: GraphicsDevice>(
    device: &mut D,
    entry: &QueueEntry,
    pass: Pass,
) -> Result<(), DeviceError> {
    let effect = &entry.effect;
    match &entry.geometry {
        Geometry::Figure { batch, .. } => {
            let Some(mesh) = &batch.mesh else {
                return Ok(());
            };
            let buckets: Vec<_> = mesh
                .buckets
                .buckets()
                .into_iter()
                .filter(|b| pass.accepts(effective_blend(effect, b.blend)))
                .collect();
            if buckets.is_empty() {
                return Ok(());
            }
            set_environment(device, entry, mesh.has_normals(), true)?;
            device.submit_vertex_data(&VertexData {
                positions: &batch.vertices,
                normals: batch.normals.as_deref(),
                texcoords: None,
                colors: None,
                sprites: None,
            })?;
            device.submit_index_range(&batch.indices, &mesh.materials)?;
            for bucket in buckets {
                let texture = match bucket.kind {
                    PolygonKind::Textured => batch.textures.get(bucket.slot).and_then(Option::as_ref),
                    PolygonKind::Colored => None,
                };
                device.bind_texture(0, texture)?;
                device.set_cull_face(!bucket.double_face)?;
                device.set_blend_mode(effective_blend(effect, bucket.blend))?;
                device.draw_range(PrimitiveKind::Triangle, bucket.start, bucket.count)?;
            }
        }
        Geometry::Primitives(batch) => {
            let blend = effective_blend(effect, batch.attributes.blend);
            if !pass.accepts(blend) || batch.positions.is_empty() {
                return Ok(());
            }
            let lit = batch.attributes.lighting && batch.normals.is_some();
            set_environment(device, entry, lit, batch.attributes.sphere_map)?;
            device.submit_vertex_data(&VertexData {
                positions: &batch.positions,
                normals: batch.normals.as_deref(),
                texcoords: batch.texcoords.as_deref(),
                colors: batch.colors.as_deref(),
                sprites: batch.sprites.as_deref(),
            })?;
            device.bind_texture(0, batch.texture.as_ref())?;
            device.set_cull_face(false)?;
            device.set_blend_mode(blend)?;
            device.draw_range(batch.kind, 0, batch.vertex_count())?;
        }
    }
    Ok(())
}
