//! Low-level byte cursor over an in-memory stream.
//!
//! All multi-byte fields in the container are little-endian; counts inside
//! payloads are unsigned LEB128 varints (zigzag for signed ones). Those are
//! format constants, never inferred from the data.

use winnow::{
    Parser,
    binary::{le_f32, le_f64, le_i32, le_i64, le_u16, le_u32},
    combinator::repeat,
    token::take,
};

use crate::errors::{Result, SimtelError};

/// Total element count of a multi-dimensional table whose axis lengths
/// come from the stream. Overflowing counts make the block malformed
/// instead of panicking.
pub fn table_elements(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            SimtelError::MalformedBlock(format!("table dimensions {dims:?} overflow"))
        })
}

/// Reads primitive field encodings from a byte slice while tracking the
/// absolute stream position for diagnostics.
///
/// Sub-cursors created with [`Cursor::sub`] inherit the absolute base
/// offset, so a `TruncatedStream` raised deep inside a nested block still
/// points at the right byte of the enclosing stream.
pub struct Cursor<'a> {
    rest: &'a [u8],
    base: usize,
    len: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// Cursor whose reported positions start at `base` within the
    /// enclosing stream.
    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self {
            rest: data,
            base,
            len: data.len(),
        }
    }

    /// Absolute position in the enclosing stream.
    pub fn position(&self) -> usize {
        self.base + (self.len - self.rest.len())
    }

    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    pub fn at_end(&self) -> bool {
        self.rest.is_empty()
    }

    fn truncated(&self, needed: usize) -> SimtelError {
        SimtelError::TruncatedStream {
            position: self.position(),
            needed,
            remaining: self.remaining(),
        }
    }

    /// Take `n` raw bytes.
    pub fn take_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let r: winnow::ModalResult<&'a [u8]> = take(n).parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(n))
    }

    /// Skip `n` bytes, e.g. the payload of an unrecognised block.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take_bytes(n).map(|_| ())
    }

    /// Split off the next `n` bytes as a sub-cursor for a framed payload.
    pub fn sub(&mut self, n: usize) -> Result<Cursor<'a>> {
        let base = self.position();
        let payload = self.take_bytes(n)?;
        Ok(Cursor::with_base(payload, base))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let r: winnow::ModalResult<u16> = le_u16.parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(2))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let r: winnow::ModalResult<u32> = le_u32.parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(4))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let r: winnow::ModalResult<i32> = le_i32.parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(4))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let r: winnow::ModalResult<i64> = le_i64.parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(8))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let r: winnow::ModalResult<f32> = le_f32.parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(4))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let r: winnow::ModalResult<f64> = le_f64.parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(8))
    }

    /// Unsigned LEB128 varint.
    pub fn read_uvarint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(SimtelError::MalformedBlock(format!(
                    "varint at byte {} exceeds 64 bits",
                    self.position()
                )));
            }
        }
    }

    /// Zigzag-encoded signed varint.
    pub fn read_varint(&mut self) -> Result<i64> {
        let u = self.read_uvarint()?;
        Ok((u >> 1) as i64 ^ -((u & 1) as i64))
    }

    /// Varint read as a length/count; rejects values that cannot index
    /// memory on this platform.
    pub fn read_count(&mut self) -> Result<usize> {
        let v = self.read_uvarint()?;
        usize::try_from(v).map_err(|_| {
            SimtelError::MalformedBlock(format!("count {v} too large at byte {}", self.position()))
        })
    }

    pub fn read_u16_vec(&mut self, n: usize) -> Result<Vec<u16>> {
        let r: winnow::ModalResult<Vec<u16>> = repeat(n, le_u16).parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(n * 2))
    }

    pub fn read_u32_vec(&mut self, n: usize) -> Result<Vec<u32>> {
        let r: winnow::ModalResult<Vec<u32>> = repeat(n, le_u32).parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(n * 4))
    }

    pub fn read_f32_vec(&mut self, n: usize) -> Result<Vec<f32>> {
        let r: winnow::ModalResult<Vec<f32>> = repeat(n, le_f32).parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(n * 4))
    }

    pub fn read_f64_vec(&mut self, n: usize) -> Result<Vec<f64>> {
        let r: winnow::ModalResult<Vec<f64>> = repeat(n, le_f64).parse_next(&mut self.rest);
        r.map_err(|_| self.truncated(n * 8))
    }
}
