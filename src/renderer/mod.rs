// Deferred renderer: command lists, figure posting, two-pass replay

pub mod command;
pub mod device;
pub mod effect;
pub mod layout;
pub mod queue;
pub mod recording;
#[allow(clippy::module_inception)]
pub mod renderer;

pub use command::{CommandReader, Instruction, VERSION_TAG};
pub use device::{GraphicsDevice, PrimitiveKind, VertexData};
pub use effect::{Effect, Light, Toon};
pub use layout::{Layout, Projection, Rect};
pub use queue::{BatchPool, FigureBatch, Geometry, PrimitiveAttributes, PrimitiveBatch, QueueEntry};
pub use recording::{DeviceCall, DrawCall, RecordingDevice};
pub use renderer::{BindState, Renderer};
