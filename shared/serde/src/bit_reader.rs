use crate::error::SerdeErr;

/// Reads bits back in the order `BitWriter` produced them.
pub struct BitReader<'b> {
    buffer: &'b [u8],
    position: u32,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn bits_left(&self) -> u32 {
        (self.buffer.len() as u32 * 8).saturating_sub(self.position)
    }

    pub fn bytes_left(&self) -> u32 {
        self.bits_left() / 8
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        if self.bits_left() == 0 {
            return Err(SerdeErr::UnexpectedEnd {
                needed: 1,
                remaining: 0,
            });
        }
        let byte = self.buffer[(self.position / 8) as usize];
        let bit = (byte >> (self.position % 8)) & 1 != 0;
        self.position += 1;
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        self.ensure(8)?;
        if self.position % 8 == 0 {
            let byte = self.buffer[(self.position / 8) as usize];
            self.position += 8;
            return Ok(byte);
        }
        let mut output: u8 = 0;
        for index in 0..8 {
            if self.read_bit()? {
                output |= 1 << index;
            }
        }
        Ok(output)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, SerdeErr> {
        let bits = u32::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(8))
            .unwrap_or(u32::MAX);
        self.ensure(bits)?;
        let mut output = Vec::with_capacity(count);
        for _ in 0..count {
            output.push(self.read_byte()?);
        }
        Ok(output)
    }

    fn ensure(&self, bits: u32) -> Result<(), SerdeErr> {
        let remaining = self.bits_left();
        if remaining < bits {
            return Err(SerdeErr::UnexpectedEnd {
                needed: bits,
                remaining,
            });
        }
        Ok(())
    }
}
