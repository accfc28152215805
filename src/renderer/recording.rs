use super::device::{GraphicsDevice, PrimitiveKind, VertexData};
use super::effect::{Light, Toon};
use super::layout::{Projection, Rect};
use crate::error::DeviceError;
use crate::material::BlendMode;
use crate::model::Affine;
use crate::texture::TextureHandle;
use log::trace;

/// One call received by a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// Vertex count plus the `f32` length of each flattened upload stream.
    VertexData {
        vertices: usize,
        positions: usize,
        normals: Option<usize>,
        texcoords: Option<usize>,
    },
    IndexRange { indices: usize },
    Blend(BlendMode),
    DepthWrite(bool),
    DepthTest(bool),
    Clip(Option<Rect>),
    Texture { slot: usize, bound: bool },
    Lighting(Option<Light>),
    Toon(Option<Toon>),
    Camera { projection: Projection, camera: Affine, center: [i32; 2] },
    CullFace(bool),
    Draw(DrawCall),
}

/// A draw together with the depth and blend state it ran under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub kind: PrimitiveKind,
    pub start: usize,
    pub count: usize,
    pub depth_write: bool,
    pub blend: BlendMode,
}

/// Device that records calls instead of drawing. Used by the CLI replay and
/// in tests; `fail_on` makes the named call report an error.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub calls: Vec<DeviceCall>,
    pub fail_on: Option<&'static str>,
    depth_write: bool,
    blend: BlendMode,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: &'static str) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter_map(|c| match c {
            DeviceCall::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, name: &'static str, call: DeviceCall) -> Result<(), DeviceError> {
        if self.fail_on == Some(name) {
            return Err(DeviceError::new(name, "injected failure"));
        }
        trace!("device: {call:?}");
        self.calls.push(call);
        Ok(())
    }
}

impl GraphicsDevice for RecordingDevice {
    fn submit_vertex_data(&mut self, data: &VertexData<'_>) -> Result<(), DeviceError> {
        let call = DeviceCall::VertexData {
            vertices: data.vertex_count(),
            positions: data.positions_flat().len(),
            normals: data.normals_flat().map(<[f32]>::len),
            texcoords: data.texcoords_flat().map(<[f32]>::len),
        };
        self.record("submit_vertex_data", call)
    }

    fn submit_index_range(&mut self, indices: &[u32], _materials: &[u8]) -> Result<(), DeviceError> {
        self.record(
            "submit_index_range",
            DeviceCall::IndexRange {
                indices: indices.len(),
            },
        )
    }

    fn set_blend_mode(&mut self, blend: BlendMode) -> Result<(), DeviceError> {
        self.record("set_blend_mode", DeviceCall::Blend(blend))?;
        self.blend = blend;
        Ok(())
    }

    fn set_depth_write(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.record("set_depth_write", DeviceCall::DepthWrite(enabled))?;
        self.depth_write = enabled;
        Ok(())
    }

    fn set_depth_test(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.record("set_depth_test", DeviceCall::DepthTest(enabled))
    }

    fn set_clip_rect(&mut self, rect: Option<Rect>) -> Result<(), DeviceError> {
        self.record("set_clip_rect", DeviceCall::Clip(rect))
    }

    fn bind_texture(&mut self, slot: usize, texture: Option<&TextureHandle>) -> Result<(), DeviceError> {
        let call = DeviceCall::Texture {
            slot,
            bound: texture.is_some(),
        };
        self.record("bind_texture", call)
    }

    fn set_lighting_uniforms(&mut self, light: Option<&Light>) -> Result<(), DeviceError> {
        self.record("set_lighting_uniforms", DeviceCall::Lighting(light.copied()))
    }

    fn set_toon_uniforms(&mut self, toon: Option<&Toon>) -> Result<(), DeviceError> {
        self.record("set_toon_uniforms", DeviceCall::Toon(toon.copied()))
    }

    fn set_camera(
        &mut self,
        projection: &Projection,
        camera: &Affine,
        center: [i32; 2],
    ) -> Result<(), DeviceError> {
        let call = DeviceCall::Camera {
            projection: *projection,
            camera: *camera,
            center,
        };
        self.record("set_camera", call)
    }

    fn set_cull_face(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.record("set_cull_face", DeviceCall::CullFace(enabled))
    }

    fn draw_range(&mut self, kind: PrimitiveKind, start: usize, count: usize) -> Result<(), DeviceError> {
        let call = DeviceCall::Draw(DrawCall {
            kind,
            start,
            count,
            depth_write: self.depth_write,
            blend: self.blend,
        });
        self.record("draw_range", call)
    }
}
