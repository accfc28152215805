use crate::error::DecodeError;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Widest field the bit cache hands out in one call.
pub const MAX_BIT_WIDTH: u32 = 25;

/// Byte cursor with an LSB-first bit cache on top.
///
/// Byte-aligned fields go through `byteorder`; bit fields pull whole bytes into
/// `cache` and take the requested width from its low end. Any pending bits are
/// dropped by [`Reader::clear_bits`] when the format returns to byte alignment.
pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    cache: u64,
    cached: u32,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
            cache: 0,
            cached: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.offset())
    }

    pub fn error(&self, key: &'static str) -> DecodeError {
        DecodeError::new(key, self.offset())
    }

    fn eof(&self, at: usize, want: usize) -> DecodeError {
        DecodeError::new("end-of-stream", at)
            .with_arg("want", want)
            .with_arg("remaining", self.cursor.get_ref().len().saturating_sub(at))
    }

    fn take<T>(
        &mut self,
        want: usize,
        read: impl FnOnce(&mut Cursor<&'a [u8]>) -> std::io::Result<T>,
    ) -> Result<T, DecodeError> {
        let at = self.offset();
        read(&mut self.cursor).map_err(|_| self.eof(at, want))
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.take(1, |c| c.read_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.take(2, |c| c.read_u16::<LittleEndian>())
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        self.take(2, |c| c.read_i16::<LittleEndian>())
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.take(4, |c| c.read_u32::<LittleEndian>())
    }

    /// Unsigned field of `n` bits (1..=25).
    pub fn read_bits(&mut self, n: u32) -> Result<u32, DecodeError> {
        if n == 0 || n > MAX_BIT_WIDTH {
            return Err(self.error("bit-width").with_arg("bits", n));
        }
        while self.cached < n {
            let byte = self.read_u8()?;
            self.cache |= (byte as u64) << self.cached;
            self.cached += 8;
        }
        let value = (self.cache & ((1u64 << n) - 1)) as u32;
        self.cache >>= n;
        self.cached -= n;
        Ok(value)
    }

    /// Signed field of `n` bits, sign-extended from bit `n - 1`.
    pub fn read_sbits(&mut self, n: u32) -> Result<i32, DecodeError> {
        let raw = self.read_bits(n)?;
        Ok(sign_extend(raw, n))
    }

    /// Drops pending bits, realigning to the next whole byte.
    pub fn clear_bits(&mut self) {
        self.cache = 0;
        self.cached = 0;
    }

    /// Reads a bit width from a header byte and checks it is usable.
    pub fn read_width(&mut self, what: &'static str) -> Result<u32, DecodeError> {
        let bits = self.read_u8()? as u32;
        if bits == 0 || bits > MAX_BIT_WIDTH {
            return Err(self
                .error("bit-width")
                .with_arg("field", what)
                .with_arg("bits", bits));
        }
        Ok(bits)
    }

    pub fn expect_magic(&mut self, a: u8, b: u8) -> Result<(), DecodeError> {
        let start = self.offset();
        let (x, y) = (self.read_u8()?, self.read_u8()?);
        if x != a || y != b {
            return Err(DecodeError::new("magic", start)
                .with_arg("expected", format!("{}{}", a as char, b as char))
                .with_arg("found", format!("{x:#04x} {y:#04x}")));
        }
        Ok(())
    }

    /// Version byte followed by the mandatory zero byte.
    pub fn read_version(&mut self) -> Result<u8, DecodeError> {
        let version = self.read_u8()?;
        let zero = self.read_u8()?;
        if !(2..=5).contains(&version) || zero != 0 {
            return Err(self
                .error("version")
                .with_arg("version", version)
                .with_arg("pad", zero));
        }
        Ok(version)
    }
}

pub fn sign_extend(raw: u32, n: u32) -> i32 {
    let shift = 32 - n;
    ((raw << shift) as i32) >> shift
}
