//! MSB-first bitstream reader and writer used by the serial codec.

/// Reads big-endian bit groups from a byte slice
pub(crate) struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Reader positioned `pos` bits into `bytes`
    pub fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    /// Next `count` bits, most significant first.
    /// `None` leaves the position untouched when the stream is too short.
    pub fn read_bits(&mut self, count: usize) -> Option<u64> {
        if count > 64 || count > self.remaining_bits() {
            return None;
        }

        let value = (self.pos..self.pos + count).fold(0u64, |acc, pos| {
            let bit = (self.bytes[pos / 8] >> (7 - pos % 8)) & 1;
            (acc << 1) | u64::from(bit)
        });
        self.pos += count;

        Some(value)
    }

    /// Like [`read_bits`](Self::read_bits), but a short final group is
    /// zero-filled on the right. `None` once the stream is exhausted.
    pub fn read_bits_padded(&mut self, count: usize) -> Option<u64> {
        let available = self.remaining_bits().min(count);
        if available == 0 {
            return None;
        }
        let value = self.read_bits(available)?;
        Some(value << (count - available))
    }

    pub fn remaining_bits(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.pos)
    }
}

/// Packs bit groups into bytes, most significant first
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    acc: u16,
    pending: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            acc: 0,
            pending: 0,
        }
    }

    /// Append the low `count` bits of `value`
    pub fn write_bits(&mut self, value: u64, count: usize) {
        for i in (0..count).rev() {
            self.acc = (self.acc << 1) | ((value >> i) & 1) as u16;
            self.pending += 1;
            if self.pending == 8 {
                self.bytes.push(self.acc as u8);
                self.acc = 0;
                self.pending = 0;
            }
        }
    }

    /// Bytes written so far; a partial last byte is zero-padded
    pub fn finish(mut self) -> Vec<u8> {
        if self.pending > 0 {
            self.bytes.push((self.acc << (8 - self.pending)) as u8);
        }
        self.bytes
    }
}
