use crate::error::TextureError;
use byteorder::{LittleEndian, ReadBytesExt};
use image::ImageFormat;
use std::io::{Cursor, Seek, SeekFrom};

/// Offset of the DIB header inside a BMP file.
const DIB_OFFSET: u64 = 14;

/// Color of palette entry 0 of an indexed BMP (the transparent color).
pub fn palette_key(data: &[u8]) -> Result<[u8; 3], TextureError> {
    let mut c = Cursor::new(data);
    let magic = c.read_u16::<LittleEndian>()?;
    if magic != u16::from_le_bytes(*b"BM") {
        return Err(TextureError::NotIndexed(format!("bad magic {magic:#06x}")));
    }
    c.seek(SeekFrom::Start(DIB_OFFSET))?;
    let header_size = c.read_u32::<LittleEndian>()? as u64;
    // bit count follows width and height (i32 each) and the plane count
    c.seek(SeekFrom::Start(DIB_OFFSET + 14))?;
    let bits = c.read_u16::<LittleEndian>()?;
    if bits > 8 {
        return Err(TextureError::NotIndexed(format!("{bits} bits per pixel")));
    }
    // palette entries are BGRx
    c.seek(SeekFrom::Start(DIB_OFFSET + header_size))?;
    let blue = c.read_u8()?;
    let green = c.read_u8()?;
    let red = c.read_u8()?;
    Ok([red, green, blue])
}

/// Decode an indexed BMP to RGBA8, zeroing alpha wherever the pixel matches
/// the palette-0 color. Returns `(rgba, width, height, key)`.
pub fn decode_bmp(data: &[u8]) -> Result<(Vec<u8>, u32, u32, [u8; 3]), TextureError> {
    let key = palette_key(data)?;
    let img = image::load_from_memory_with_format(data, ImageFormat::Bmp)?;
    let mut rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut keyed = 0usize;
    for pixel in rgba.pixels_mut() {
        if pixel.0[..3] == key {
            pixel.0[3] = 0;
            keyed += 1;
        }
    }
    log::debug!("bmp {width}x{height}: {keyed} pixels keyed by {key:?}");

    Ok((rgba.into_raw(), width, height, key))
}
