// Skeletal keyframe evaluation: track sampling, bone construction, pose arena

mod interpolation;
mod skeleton;
mod system;

pub use interpolation::{kgf, lerp_f32, lerp_vec3};
pub use skeleton::{apply_roll, apply_scaling_to_matrix, direction_rotation, evaluate};
pub use system::PoseArena;
