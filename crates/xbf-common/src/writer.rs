//! Little-endian writing helpers.
//!
//! [`WriteExt`] extends any [`Write`] with the primitive encodings used by
//! XBF files, on top of `byteorder`.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use zerocopy::{Immutable, IntoBytes};

use crate::{utf16, Error, Result};

/// Trait for writing XBF primitives to streams.
pub trait WriteExt: Write {
    /// Write a little-endian u32.
    fn write_u32_le(&mut self, value: u32) -> Result<()> {
        self.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a little-endian i32.
    fn write_i32_le(&mut self, value: i32) -> Result<()> {
        self.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a little-endian i16.
    fn write_i16_le(&mut self, value: i16) -> Result<()> {
        self.write_i16::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a little-endian f32.
    fn write_f32_le(&mut self, value: f32) -> Result<()> {
        self.write_f32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a string as a `u32` code-unit count followed by UTF-16LE data.
    fn write_prefixed_utf16(&mut self, s: &str) -> Result<()> {
        let units = utf16::code_units(s);
        let length = u32::try_from(units).map_err(|_| Error::StringTooLong(units))?;
        self.write_u32_le(length)?;
        self.write_all(&utf16::encode_le(s))?;
        Ok(())
    }

    /// Write a struct as its raw bytes using zerocopy.
    fn write_struct<T: IntoBytes + Immutable>(&mut self, value: &T) -> Result<()> {
        self.write_all(value.as_bytes())?;
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteExt for W {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryReader;

    #[test]
    fn test_prefixed_utf16_layout() {
        let mut out = Vec::new();
        out.write_prefixed_utf16("Grid").unwrap();

        assert_eq!(&out[..4], &[4, 0, 0, 0]);
        assert_eq!(out.len(), 4 + 8);

        let mut reader = BinaryReader::new(&out);
        assert_eq!(reader.read_prefixed_utf16().unwrap(), "Grid");
    }

    #[test]
    fn test_primitives_are_little_endian() {
        let mut out = Vec::new();
        out.write_u32_le(0x04030201).unwrap();
        out.write_i16_le(-2).unwrap();

        assert_eq!(out, vec![0x01, 0x02, 0x03, 0x04, 0xFE, 0xFF]);
    }
}
