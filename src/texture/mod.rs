// Texture handles shared between figures, command lists and the device

pub mod loader;

pub use loader::{decode_bmp, palette_key};

use crate::error::TextureError;
use std::sync::Arc;

/// Decoded RGBA8 texture. Immutable once built; share through [`TextureHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub color_key: Option<[u8; 3]>, // palette entry 0 of the source bitmap
}

pub type TextureHandle = Arc<Texture>;

impl Texture {
    /// Decode an indexed BMP, keying out palette entry 0.
    pub fn from_bmp(data: &[u8]) -> Result<TextureHandle, TextureError> {
        let (rgba, width, height, key) = decode_bmp(data)?;
        Ok(Arc::new(Self {
            width,
            height,
            rgba,
            color_key: Some(key),
        }))
    }

    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> TextureHandle {
        Arc::new(Self {
            width,
            height,
            rgba,
            color_key: None,
        })
    }
}
