mod blend_mode;
mod flags;

pub use blend_mode::*;
pub use flags::*;
