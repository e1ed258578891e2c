use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, var_u32::VarU32};

/// A type that can be written to and read from a bit stream.
pub trait Serde: Sized + Clone + PartialEq {
    /// Serialize Self to a BitWrite
    fn ser(&self, writer: &mut dyn BitWrite);

    /// Parse Self from a BitReader
    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    /// Return length of value in bits
    fn bit_length(&self) -> u32;
}

/// Types whose encoded size never depends on the value.
pub trait ConstBitLength {
    fn const_bit_length() -> u32;
}

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }

    fn bit_length(&self) -> u32 {
        1
    }
}

impl ConstBitLength for bool {
    fn const_bit_length() -> u32 {
        1
    }
}

macro_rules! impl_serde_le_bytes {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn BitWrite) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    for byte in bytes.iter_mut() {
                        *byte = reader.read_byte()?;
                    }
                    Ok(<$ty>::from_le_bytes(bytes))
                }

                fn bit_length(&self) -> u32 {
                    <Self as ConstBitLength>::const_bit_length()
                }
            }

            impl ConstBitLength for $ty {
                fn const_bit_length() -> u32 {
                    (std::mem::size_of::<$ty>() * 8) as u32
                }
            }
        )*
    };
}

impl_serde_le_bytes!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Byte length of the longest prefix of `value` that fits a `VarU32` count
/// and ends on a char boundary.
fn encodable_str_len(value: &str) -> usize {
    let mut end = value.len().min(VarU32::MAX as usize);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Strings are a variable-length byte count followed by UTF-8 bytes.
/// Strings longer than `VarU32::MAX` bytes are truncated.
impl Serde for String {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let end = encodable_str_len(self);
        VarU32::from_len(end).ser(writer);
        writer.write_bytes(&self.as_bytes()[..end]);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length = VarU32::de(reader)?.get() as usize;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes).map_err(|_| SerdeErr::InvalidUtf8)
    }

    fn bit_length(&self) -> u32 {
        let end = encodable_str_len(self);
        VarU32::from_len(end)
            .bit_length()
            .saturating_add(u32::try_from(end).unwrap_or(u32::MAX).saturating_mul(8))
    }
}

/// Only the first `VarU32::MAX` elements are written.
impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let length = VarU32::from_len(self.len());
        length.ser(writer);
        for item in self.iter().take(length.get() as usize) {
            item.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length = VarU32::de(reader)?.get() as usize;
        // every element occupies at least one bit
        if length as u32 > reader.bits_left() {
            return Err(SerdeErr::UnexpectedEnd {
                needed: length as u32,
                remaining: reader.bits_left(),
            });
        }
        let mut output = Vec::with_capacity(length);
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }

    fn bit_length(&self) -> u32 {
        let length = VarU32::from_len(self.len());
        self.iter()
            .take(length.get() as usize)
            .map(Serde::bit_length)
            .fold(length.bit_length(), u32::saturating_add)
    }
}
