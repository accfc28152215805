use crate::texture::TextureHandle;

/// Ambient plus one directional light, raw fixed-point operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Light {
    pub ambient: i32,
    pub direction: [i32; 3],
    pub intensity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Toon {
    pub threshold: i32,
    pub high: i32,
    pub low: i32,
}

/// Shading settings captured into every queue entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Effect {
    pub lighting: bool,
    pub sphere_map: bool,
    pub toon: bool,
    pub semi_transparent: bool,
    pub light: Light,
    pub toon_params: Toon,
    pub sphere_texture: Option<TextureHandle>,
}

impl Effect {
    pub const LIGHTING: u32 = 0x01;
    pub const SPHERE_MAP: u32 = 0x02;
    pub const TOON: u32 = 0x04;
    pub const SEMI_TRANSPARENT: u32 = 0x08;

    /// Apply the four environment attribute bits.
    pub fn set_attributes(&mut self, bits: u32) {
        self.lighting = bits & Self::LIGHTING != 0;
        self.sphere_map = bits & Self::SPHERE_MAP != 0;
        self.toon = bits & Self::TOON != 0;
        self.semi_transparent = bits & Self::SEMI_TRANSPARENT != 0;
    }

    pub fn attributes(&self) -> u32 {
        let mut bits = 0;
        if self.lighting {
            bits |= Self::LIGHTING;
        }
        if self.sphere_map {
            bits |= Self::SPHERE_MAP;
        }
        if self.toon {
            bits |= Self::TOON;
        }
        if self.semi_transparent {
            bits |= Self::SEMI_TRANSPARENT;
        }
        bits
    }

    pub fn light_uniforms(&self) -> Option<&Light> {
        self.lighting.then_some(&self.light)
    }

    pub fn toon_uniforms(&self) -> Option<&Toon> {
        self.toon.then_some(&self.toon_params)
    }
}
