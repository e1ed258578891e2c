/// Sink for bit-level serialization. Bits are packed least significant
/// bit first, so byte-aligned writes produce the plain byte sequence.
pub trait BitWrite {
    fn write_bit(&mut self, bit: bool);
    fn write_byte(&mut self, byte: u8);
    fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write_byte(*byte);
        }
    }
    fn bits_written(&self) -> u32;
}

/// A growable BitWrite implementation. Messages are not bound by an MTU here,
/// fragmentation is left to the transport.
pub struct BitWriter {
    scratch: u8,
    scratch_index: u8,
    buffer: Vec<u8>,
    bits_written: u32,
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            scratch: 0,
            scratch_index: 0,
            buffer: Vec::with_capacity(bytes),
            bits_written: 0,
        }
    }

    fn flush_scratch(&mut self) {
        if self.scratch_index > 0 {
            let byte = (self.scratch << (8 - self.scratch_index)).reverse_bits();
            self.buffer.push(byte);
            self.scratch = 0;
            self.scratch_index = 0;
        }
    }

    /// Number of whole bytes the output will occupy, counting a partially
    /// filled trailing byte.
    pub fn byte_len(&self) -> usize {
        self.buffer.len() + usize::from(self.scratch_index > 0)
    }

    pub fn to_bytes(mut self) -> Vec<u8> {
        self.flush_scratch();
        self.buffer
    }
}

impl BitWrite for BitWriter {
    fn write_bit(&mut self, bit: bool) {
        self.scratch <<= 1;

        if bit {
            self.scratch |= 1;
        }

        self.scratch_index += 1;
        self.bits_written += 1;

        if self.scratch_index >= 8 {
            self.buffer.push(self.scratch.reverse_bits());
            self.scratch_index = 0;
            self.scratch = 0;
        }
    }

    fn write_byte(&mut self, byte: u8) {
        if self.scratch_index == 0 {
            self.buffer.push(byte);
            self.bits_written += 8;
            return;
        }
        let mut temp = byte;
        for _ in 0..8 {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    fn bits_written(&self) -> u32 {
        self.bits_written
    }
}
