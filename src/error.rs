use std::{collections::BTreeMap, fmt, io};

use thiserror::Error;

/// Failure while decoding a mesh or animation blob.
///
/// `key` names the failed check (`"vertex-count"`, `"unknown-bone-type"`, ...),
/// `args` carries the offending values and `offset` is the byte position of the
/// reader when the check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub key: &'static str,
    pub args: BTreeMap<&'static str, String>,
    pub offset: usize,
}

impl DecodeError {
    pub fn new(key: &'static str, offset: usize) -> Self {
        Self {
            key,
            args: BTreeMap::new(),
            offset,
        }
    }

    pub fn with_arg(mut self, k: &'static str, v: impl ToString) -> Self {
        self.args.insert(k, v.to_string());
        self
    }

    pub fn arg(&self, k: &str) -> Option<&str> {
        self.args.get(k).map(String::as_str)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.key)?;
        let mut first = true;
        for (k, v) in &self.args {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        write!(f, ") at offset {}", self.offset)
    }
}

impl std::error::Error for DecodeError {}

/// Errors raised while posing a figure. The figure is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoseError {
    #[error("action {action} out of range (clip has {count} actions)")]
    InvalidAction { action: usize, count: usize },
    #[error("frame {frame} is negative")]
    InvalidFrame { frame: i32 },
    #[error("animation drives {clip} bones but mesh has {mesh}")]
    BoneMismatch { clip: usize, mesh: usize },
    #[error("figure used after dispose")]
    Disposed,
}

/// A malformed command list. Execution stops at the failing instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandListError {
    #[error("bad command list version tag {0:#010x}")]
    BadVersion(u32),
    #[error("command list is empty")]
    Empty,
    #[error("opcode {opcode:#010x} at word {index} needs {needed} operands, {remaining} remain")]
    Truncated {
        index: usize,
        opcode: u32,
        needed: usize,
        remaining: usize,
    },
    #[error("unknown opcode {opcode:#010x} at word {index}")]
    UnknownOpcode { index: usize, opcode: u32 },
    #[error("point sprite at word {index} carries no sprite parameters")]
    InvalidSpriteParams { index: usize },
    #[error("camera transform {affine} at word {index} out of range ({count} available)")]
    AffineIndex {
        index: usize,
        affine: usize,
        count: usize,
    },
}

/// The graphics device rejected a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("device call {call} failed: {message}")]
pub struct DeviceError {
    pub call: &'static str,
    pub message: String,
}

impl DeviceError {
    pub fn new(call: &'static str, message: impl Into<String>) -> Self {
        Self {
            call,
            message: message.into(),
        }
    }
}

/// Umbrella error for the renderer API surface.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer is not bound to a target")]
    NotBound,
    #[error("renderer is already bound; release it first")]
    AlreadyBound,
    #[error(transparent)]
    Command(#[from] CommandListError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Pose(#[from] PoseError),
}

/// Errors from the texture utility.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("not an indexed bitmap: {0}")]
    NotIndexed(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display_lists_args_in_order() {
        let err = DecodeError::new("vertex-count", 4)
            .with_arg("max", 21845)
            .with_arg("count", 21846);
        assert_eq!(
            err.to_string(),
            "vertex-count(count=21846, max=21845) at offset 4"
        );
        assert_eq!(err.arg("count"), Some("21846"));
    }
}
