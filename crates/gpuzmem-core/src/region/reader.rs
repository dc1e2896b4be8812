use crate::source::{RegionSource, SourceError};

use super::error::DecodeError;
use super::layout;

/// Forward-only typed reads over a region source.
pub struct ByteCursor<'s, S: RegionSource> {
    source: &'s mut S,
    offset: usize,
}

impl<'s, S: RegionSource> ByteCursor<'s, S> {
    pub fn new(source: &'s mut S) -> Self {
        Self { source, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Read a fixed-width text slot of two-byte units.
    ///
    /// Only the low byte of each unit is kept and decoding stops at the first
    /// zero low byte. The cursor always moves past the whole slot.
    pub fn read_fixed_text(
        &mut self,
        field: &'static str,
        slot_size: usize,
    ) -> Result<String, DecodeError> {
        let bytes = self.take(field, slot_size)?;
        Ok(narrow_text(bytes))
    }

    pub fn read_u32_be(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        let bytes = self.take(field, 4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f64_le(&mut self, field: &'static str) -> Result<f64, DecodeError> {
        let bytes = self.take(field, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(raw))
    }

    /// Move past `n` bytes without interpreting them.
    pub fn skip(&mut self, field: &'static str, n: usize) -> Result<(), DecodeError> {
        self.take(field, n).map(|_| ())
    }

    fn take(&mut self, field: &'static str, n: usize) -> Result<&[u8], DecodeError> {
        let offset = self.offset;
        let bytes = self.source.read(n).map_err(|err| match err {
            SourceError::Exhausted { needed, remaining } => DecodeError::ShortRead {
                field,
                offset,
                needed,
                remaining,
            },
            other => DecodeError::SourceUnavailable(other),
        })?;
        self.offset += n;
        Ok(bytes)
    }
}

/// Decode narrow-byte text: low byte of each unit, up to the first zero.
///
/// Each kept byte maps to the character with the same code point, so bytes
/// above 0x7f come out as Latin-1 rather than being rejected.
pub fn narrow_text(bytes: &[u8]) -> String {
    bytes
        .chunks_exact(layout::TEXT_UNIT_SIZE)
        .map(|unit| unit[0])
        .take_while(|&low| low != 0)
        .map(char::from)
        .collect()
}
