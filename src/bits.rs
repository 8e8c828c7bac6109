//! Forward-only, MSB-first bit reading over a byte buffer.
use crate::error::{Error, Result};

/// Sequential bit reader.
///
/// Bits are consumed most significant bit first, which is the bit order used for
/// all Sentinel-1 header fields and user data.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitCursor<'a> {
    pub const MAX_READ: usize = 64;

    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        BitCursor { data, pos: 0 }
    }

    /// Current bit position from the start of the buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bits left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::TruncatedInput {
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read a single bit.
    ///
    /// # Errors
    /// [Error::TruncatedInput] if no bits remain.
    pub fn read_bit(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let bit = (self.data[self.pos >> 3] >> (7 - (self.pos & 7))) & 1;
        self.pos += 1;
        Ok(bit)
    }

    /// Return the next `n` bits, right justified, without consuming them.
    ///
    /// # Errors
    /// [Error::TruncatedInput] if fewer than `n` bits remain.
    ///
    /// # Panics
    /// If `n` is greater than [BitCursor::MAX_READ].
    pub fn peek(&self, n: usize) -> Result<u64> {
        assert!(n <= Self::MAX_READ, "cannot read more than 64 bits at once");
        self.ensure(n)?;

        let mut value = 0u64;
        let mut pos = self.pos;
        let mut left = n;
        while left > 0 {
            let offset = pos & 7;
            let avail = 8 - offset;
            let take = left.min(avail);
            let byte = u64::from(self.data[pos >> 3]);
            let bits = (byte >> (avail - take)) & ((1u64 << take) - 1);
            value = (value << take) | bits;
            pos += take;
            left -= take;
        }
        Ok(value)
    }

    /// Read `n` bits, right justified.
    ///
    /// # Errors
    /// [Error::TruncatedInput] if fewer than `n` bits remain.
    pub fn read(&mut self, n: usize) -> Result<u64> {
        let value = self.peek(n)?;
        self.pos += n;
        Ok(value)
    }

    /// Skip `n` bits.
    ///
    /// # Errors
    /// [Error::TruncatedInput] if fewer than `n` bits remain.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Advance to the next multiple of `word_bits` relative to the start of the
    /// buffer. A no-op if already aligned. Padding past the end of the buffer is
    /// not an error; any later read will fail instead.
    pub fn align(&mut self, word_bits: usize) {
        let offset = self.pos % word_bits;
        if offset != 0 {
            self.pos += word_bits - offset;
        }
    }
}
