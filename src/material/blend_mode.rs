use serde::{Deserialize, Serialize};

/// Blend mode of a polygon or primitive.
/// Mapping according to the two blend bits of the material field:
/// 0 = None
/// 1 = Half
/// 2 = Add
/// 3 = Sub
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BlendMode {
    #[default]
    None, // 0
    Half, // 1
    Add,  // 2
    Sub,  // 3
}

impl BlendMode {
    pub const ALL: [BlendMode; 4] = [Self::None, Self::Half, Self::Add, Self::Sub];

    /// Parse BlendMode from its two-bit value
    pub fn from_u32(value: u32) -> Self {
        match value & 3 {
            0 => Self::None,
            1 => Self::Half,
            2 => Self::Add,
            _ => Self::Sub,
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// True when drawing with this mode reads the framebuffer
    pub fn is_blended(&self) -> bool {
        *self != Self::None
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Half => "Half",
            Self::Add => "Add",
            Self::Sub => "Sub",
        }
    }
}
