use super::BlendMode;
use serde::{Deserialize, Serialize};

/// Decoded material field of a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFlags {
    pub double_face: bool,
    pub blend: BlendMode,
    pub transparent: bool, // color key, textured polygons only
    pub lighting: bool,
    pub specular: bool,
}

impl MaterialFlags {
    pub const DOUBLE_FACE: u32 = 0x01;
    pub const BLEND_MASK: u32 = 0x06;
    pub const TRANSPARENT: u32 = 0x08;
    pub const LIGHTING: u32 = 0x10;
    pub const SPECULAR: u32 = 0x20;

    /// Bits a colored polygon may carry
    pub const COLORED_ALLOWED: u32 =
        Self::DOUBLE_FACE | Self::BLEND_MASK | Self::LIGHTING | Self::SPECULAR;
    /// Bits a textured polygon may carry
    pub const TEXTURED_ALLOWED: u32 = Self::COLORED_ALLOWED | Self::TRANSPARENT;

    /// Decode a material field, rejecting bits outside `allowed`
    pub fn from_bits(bits: u32, allowed: u32) -> Option<Self> {
        if bits & !allowed != 0 {
            return None;
        }
        Some(Self {
            double_face: bits & Self::DOUBLE_FACE != 0,
            blend: BlendMode::from_u32((bits & Self::BLEND_MASK) >> 1),
            transparent: bits & Self::TRANSPARENT != 0,
            lighting: bits & Self::LIGHTING != 0,
            specular: bits & Self::SPECULAR != 0,
        })
    }

    pub fn to_bits(&self) -> u32 {
        let mut bits = (self.blend.index() as u32) << 1;
        if self.double_face {
            bits |= Self::DOUBLE_FACE;
        }
        if self.transparent {
            bits |= Self::TRANSPARENT;
        }
        if self.lighting {
            bits |= Self::LIGHTING;
        }
        if self.specular {
            bits |= Self::SPECULAR;
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colored_rejects_transparency_bit() {
        assert!(MaterialFlags::from_bits(0x08, MaterialFlags::COLORED_ALLOWED).is_none());
        assert!(MaterialFlags::from_bits(0x40, MaterialFlags::TEXTURED_ALLOWED).is_none());
    }

    #[test]
    fn blend_bits_sit_above_double_face() {
        let f = MaterialFlags::from_bits(0x13, MaterialFlags::TEXTURED_ALLOWED).unwrap();
        assert!(f.double_face);
        assert!(f.lighting);
        assert_eq!(f.blend, BlendMode::Half);
        assert_eq!(f.to_bits(), 0x13);
    }
}
