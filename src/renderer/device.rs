use super::effect::{Light, Toon};
use super::layout::{Projection, Rect};
use crate::error::DeviceError;
use crate::material::BlendMode;
use crate::model::Affine;
use crate::texture::TextureHandle;

/// Primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Point,
    Line,
    Triangle,
    Quad,
    Sprite,
}

impl PrimitiveKind {
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(Self::Point),
            2 => Some(Self::Line),
            3 => Some(Self::Triangle),
            4 => Some(Self::Quad),
            5 => Some(Self::Sprite),
            _ => None,
        }
    }

    pub fn vertices_per_primitive(self) -> usize {
        match self {
            Self::Point | Self::Sprite => 1,
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quad => 4,
        }
    }
}

/// Vertex streams for the next draws. Positions and normals are flattened to
/// `f32` for upload.
#[derive(Debug, Clone, Copy)]
pub struct VertexData<'a> {
    pub positions: &'a [[f32; 3]],
    pub normals: Option<&'a [[f32; 3]]>,
    pub texcoords: Option<&'a [[f32; 2]]>,
    pub colors: Option<&'a [u32]>,
    pub sprites: Option<&'a [[i32; 8]]>,
}

impl<'a> VertexData<'a> {
    pub fn positions_flat(&self) -> &'a [f32] {
        bytemuck::cast_slice(self.positions)
    }

    pub fn normals_flat(&self) -> Option<&'a [f32]> {
        self.normals.map(bytemuck::cast_slice)
    }

    pub fn texcoords_flat(&self) -> Option<&'a [f32]> {
        self.texcoords.map(bytemuck::cast_slice)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// GPU-like backend the renderer drives. The renderer never owns the
/// device's lifetime; every call may fail and failures abort the frame.
pub trait GraphicsDevice {
    fn submit_vertex_data(&mut self, data: &VertexData<'_>) -> Result<(), DeviceError>;

    /// Index buffer plus its aligned material bytes (`MATERIAL_STRIDE` per index).
    fn submit_index_range(&mut self, indices: &[u32], materials: &[u8]) -> Result<(), DeviceError>;

    fn set_blend_mode(&mut self, blend: BlendMode) -> Result<(), DeviceError>;

    fn set_depth_write(&mut self, enabled: bool) -> Result<(), DeviceError>;

    fn set_depth_test(&mut self, enabled: bool) -> Result<(), DeviceError>;

    fn set_clip_rect(&mut self, rect: Option<Rect>) -> Result<(), DeviceError>;

    fn bind_texture(&mut self, slot: usize, texture: Option<&TextureHandle>) -> Result<(), DeviceError>;

    fn set_lighting_uniforms(&mut self, light: Option<&Light>) -> Result<(), DeviceError>;

    fn set_toon_uniforms(&mut self, toon: Option<&Toon>) -> Result<(), DeviceError>;

    fn set_camera(
        &mut self,
        projection: &Projection,
        camera: &Affine,
        center: [i32; 2],
    ) -> Result<(), DeviceError>;

    fn set_cull_face(&mut self, enabled: bool) -> Result<(), DeviceError>;

    /// Draw `count` vertices (or indices, after an index submit) from `start`.
    fn draw_range(&mut self, kind: PrimitiveKind, start: usize, count: usize) -> Result<(), DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattening_keeps_component_order() {
        let positions = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let data = VertexData {
            positions: &positions,
            normals: None,
            texcoords: None,
            colors: None,
            sprites: None,
        };
        assert_eq!(data.positions_flat(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(data.vertex_count(), 2);
        assert!(data.normals_flat().is_none());
    }

    #[test]
    fn primitive_tags() {
        assert_eq!(PrimitiveKind::from_tag(3), Some(PrimitiveKind::Triangle));
        assert_eq!(PrimitiveKind::from_tag(0), None);
        assert_eq!(PrimitiveKind::Quad.vertices_per_primitive(), 4);
        assert_eq!(PrimitiveKind::Sprite.vertices_per_primitive(), 1);
    }
}
