use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde};

/// Unsigned integer packed into 1, 2 or 4 bytes.
///
/// * `< 2^7`: one byte, high bit clear
/// * `< 2^14`: low 7 bits with the high bit set, then the next 7 bits
/// * otherwise: two 7-bit groups with high bits set, then the remaining
///   16 bits as a little-endian u16
///
/// Values of 2^30 and above cannot be represented.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct VarU32(u32);

impl VarU32 {
    pub const MAX: u32 = (1 << 30) - 1;

    /// Panics if `value` exceeds `VarU32::MAX`.
    pub fn new(value: u32) -> Self {
        match Self::try_new(value) {
            Ok(var) => var,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_new(value: u32) -> Result<Self, SerdeErr> {
        if value > Self::MAX {
            return Err(SerdeErr::VarIntOverflow {
                value,
                max: Self::MAX,
            });
        }
        Ok(Self(value))
    }

    /// Clamps `value` to `VarU32::MAX`.
    pub fn saturating(value: u32) -> Self {
        Self(value.min(Self::MAX))
    }

    /// Clamps a collection length to `VarU32::MAX`.
    pub fn from_len(length: usize) -> Self {
        Self::saturating(u32::try_from(length).unwrap_or(u32::MAX))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl From<VarU32> for u32 {
    fn from(value: VarU32) -> Self {
        value.0
    }
}

impl Serde for VarU32 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let value = self.0;
        if value < 1 << 7 {
            writer.write_byte(value as u8);
        } else if value < 1 << 14 {
            writer.write_byte((value & 0x7F) as u8 | 0x80);
            writer.write_byte((value >> 7) as u8);
        } else {
            writer.write_byte((value & 0x7F) as u8 | 0x80);
            writer.write_byte(((value >> 7) & 0x7F) as u8 | 0x80);
            writer.write_bytes(&((value >> 14) as u16).to_le_bytes());
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let first = reader.read_byte()?;
        if first & 0x80 == 0 {
            return Ok(Self(u32::from(first)));
        }
        let low = u32::from(first & 0x7F);
        let second = reader.read_byte()?;
        if second & 0x80 == 0 {
            return Ok(Self(low | (u32::from(second) << 7)));
        }
        let middle = u32::from(second & 0x7F) << 7;
        let high = u16::from_le_bytes([reader.read_byte()?, reader.read_byte()?]);
        Ok(Self(low | middle | (u32::from(high) << 14)))
    }

    fn bit_length(&self) -> u32 {
        if self.0 < 1 << 7 {
            8
        } else if self.0 < 1 << 14 {
            16
        } else {
            32
        }
    }
}
