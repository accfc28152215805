// micro3d: decoder, skeletal animator and deferred renderer for compact
// fixed-point mesh and animation assets

pub mod animation;
pub mod assembly;
pub mod error;
pub mod figure;
pub mod material;
pub mod model;
pub mod parser;
pub mod renderer;
pub mod settings;
pub mod texture;

pub const CONFY_APP_NAME: &str = "micro3d-rs";

pub use error::{CommandListError, DecodeError, DeviceError, PoseError, RenderError, TextureError};
pub use figure::Figure;
pub use model::{AnimationClip, MeshAsset};
pub use parser::{decode_animation, decode_mesh};
pub use renderer::{GraphicsDevice, Renderer};
