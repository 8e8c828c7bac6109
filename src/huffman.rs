//! FDBAQ Huffman codebooks.
//!
//! There is one prefix-free codebook per bit-rate code (BRC). [decode] walks the code
//! trees bit by bit; [decode_generic] searches the codebook tables by increasing code
//! length. Both return the decoded m-code and the number of bits consumed, and they
//! agree for every codeword.
use crate::bits::BitCursor;
use crate::error::{Error, Result};

/// Longest code in any codebook.
pub const MAX_CODE_LEN: usize = 10;

/// Bit-rate code, 0 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Brc(u8);

impl Brc {
    pub const MAX: u8 = 4;

    /// Returns `None` for codes greater than [Brc::MAX].
    #[must_use]
    pub fn new(code: u8) -> Option<Self> {
        if code > Self::MAX {
            None
        } else {
            Some(Brc(code))
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single codeword, right justified in `bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub bits: u16,
    pub len: u8,
    pub m_code: u8,
}

const fn code(bits: u16, len: u8, m_code: u8) -> Code {
    Code { bits, len, m_code }
}

#[derive(Debug)]
pub struct Codebook {
    pub brc: u8,
    pub min_len: usize,
    pub codes: &'static [Code],
}

impl Codebook {
    /// Decode one codeword by testing successively longer prefixes, starting at the
    /// shortest code length, for membership in the codebook.
    ///
    /// # Errors
    /// [Error::HuffmanOverflow] if no code matches within [MAX_CODE_LEN] bits, or
    /// [Error::TruncatedInput] if the input runs out first.
    pub fn decode_generic(&self, cursor: &mut BitCursor) -> Result<(u8, usize)> {
        for len in self.min_len..=MAX_CODE_LEN {
            let value = cursor.peek(len)?;
            let hit = self
                .codes
                .iter()
                .find(|c| c.len as usize == len && u64::from(c.bits) == value);
            if let Some(c) = hit {
                cursor.skip(len)?;
                return Ok((c.m_code, len));
            }
        }
        Err(Error::HuffmanOverflow { brc: self.brc })
    }
}

#[rustfmt::skip]
static BRC0_CODES: [Code; 4] = [
    code(0b0, 1, 0), code(0b10, 2, 1), code(0b110, 3, 2), code(0b111, 3, 3),
];

#[rustfmt::skip]
static BRC1_CODES: [Code; 5] = [
    code(0b0, 1, 0), code(0b10, 2, 1), code(0b110, 3, 2), code(0b1110, 4, 3),
    code(0b1111, 4, 4),
];

#[rustfmt::skip]
static BRC2_CODES: [Code; 7] = [
    code(0b0, 1, 0), code(0b10, 2, 1), code(0b110, 3, 2), code(0b1110, 4, 3),
    code(0b11110, 5, 4), code(0b111110, 6, 5), code(0b111111, 6, 6),
];

#[rustfmt::skip]
static BRC3_CODES: [Code; 10] = [
    code(0b00, 2, 0), code(0b01, 2, 1), code(0b10, 2, 2), code(0b110, 3, 3),
    code(0b1110, 4, 4), code(0b11110, 5, 5), code(0b111110, 6, 6),
    code(0b1111110, 7, 7), code(0b11111110, 8, 8), code(0b11111111, 8, 9),
];

#[rustfmt::skip]
static BRC4_CODES: [Code; 16] = [
    code(0b00, 2, 0), code(0b010, 3, 1), code(0b011, 3, 2), code(0b100, 3, 3),
    code(0b101, 3, 4), code(0b1100, 4, 5), code(0b1101, 4, 6), code(0b1110, 4, 7),
    code(0b11110, 5, 8), code(0b111110, 6, 9), code(0b11111100, 8, 10),
    code(0b11111101, 8, 11), code(0b111111100, 9, 12), code(0b111111101, 9, 13),
    code(0b111111110, 9, 14), code(0b111111111, 9, 15),
];

/// Codebooks indexed by BRC.
pub static CODEBOOKS: [Codebook; 5] = [
    Codebook { brc: 0, min_len: 1, codes: &BRC0_CODES },
    Codebook { brc: 1, min_len: 1, codes: &BRC1_CODES },
    Codebook { brc: 2, min_len: 1, codes: &BRC2_CODES },
    Codebook { brc: 3, min_len: 2, codes: &BRC3_CODES },
    Codebook { brc: 4, min_len: 2, codes: &BRC4_CODES },
];

/// Decode one codeword using the codebook table search.
///
/// # Errors
/// See [Codebook::decode_generic].
pub fn decode_generic(cursor: &mut BitCursor, brc: Brc) -> Result<(u8, usize)> {
    CODEBOOKS[brc.index()].decode_generic(cursor)
}

/// Count leading one bits, stopping after a zero bit or after `max` ones.
fn unary(cursor: &mut BitCursor, max: u8) -> Result<u8> {
    let mut m = 0;
    while m < max {
        if cursor.read_bit()? == 0 {
            break;
        }
        m += 1;
    }
    Ok(m)
}

/// Decode one codeword by walking the code tree for `brc`.
///
/// # Errors
/// [Error::TruncatedInput] if the input ends within a codeword.
pub fn decode(cursor: &mut BitCursor, brc: Brc) -> Result<(u8, usize)> {
    let start = cursor.position();
    let m_code = match brc.code() {
        0 => unary(cursor, 3)?,
        1 => unary(cursor, 4)?,
        2 => unary(cursor, 6)?,
        3 => {
            if cursor.read_bit()? == 0 {
                cursor.read_bit()?
            } else {
                2 + unary(cursor, 7)?
            }
        }
        _ => decode_brc4(cursor)?,
    };
    Ok((m_code, cursor.position() - start))
}

fn decode_brc4(cursor: &mut BitCursor) -> Result<u8> {
    if cursor.read_bit()? == 0 {
        // 00, 01x
        if cursor.read_bit()? == 0 {
            return Ok(0);
        }
        return Ok(1 + cursor.read_bit()?);
    }
    if cursor.read_bit()? == 0 {
        // 10x
        return Ok(3 + cursor.read_bit()?);
    }
    if cursor.read_bit()? == 0 {
        // 110x
        return Ok(5 + cursor.read_bit()?);
    }
    // 1110, 11110, 111110
    for m in 7..=9 {
        if cursor.read_bit()? == 0 {
            return Ok(m);
        }
    }
    // 1111110x, 1111111xx
    if cursor.read_bit()? == 0 {
        return Ok(10 + cursor.read_bit()?);
    }
    let hi = cursor.read_bit()?;
    let lo = cursor.read_bit()?;
    Ok(12 + 2 * hi + lo)
}
