// Binary asset decoding: mesh ("MB") and animation ("MT") blobs.

mod action;
mod mesh;
mod polygon;
pub mod reader;

pub use action::decode_animation;
pub use mesh::decode_mesh;
pub use polygon::pattern_mask;
