mod affine;
mod animation;
mod mesh;
mod skeleton;

pub use affine::*;
pub use animation::*;
pub use mesh::*;
pub use skeleton::*;
