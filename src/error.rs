#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Input ended before the requested number of bits or bytes were available.
    #[error("truncated input: needed {needed}, {available} available")]
    TruncatedInput {
        /// Number of bits (bit cursor) or bytes (stream) requested
        needed: usize,
        /// Number of bits or bytes that were actually available
        available: usize,
    },

    /// A field layout does not describe the buffer it is applied to.
    #[error("header length mismatch: {fields} fields totaling {field_bits} bits for a {buffer_bits} bit buffer")]
    HeaderLengthMismatch {
        fields: usize,
        field_bits: usize,
        buffer_bits: usize,
    },

    #[error("no field named {0} in layout")]
    UnknownField(&'static str),

    #[error("no data format for baq_mode={baq_mode} test_mode={test_mode}")]
    InvalidFormatCombination { baq_mode: u8, test_mode: u8 },

    /// Data format C (BAQ 3/4/5-bit) is recognized but not decoded.
    #[error("data format C (baq_mode={baq_mode}) is not supported")]
    UnsupportedFormatC { baq_mode: u8 },

    #[error("invalid BRC {brc} in block {block}")]
    InvalidBrc { brc: u8, block: usize },

    #[error("invalid m-code {m_code} for BRC {brc}")]
    InvalidMCode { brc: u8, m_code: u8 },

    #[error("huffman code for BRC {brc} exceeds the maximum code length")]
    HuffmanOverflow { brc: u8 },

    #[error("invalid ECC code {0}")]
    InvalidEccCode(u8),
    #[error("invalid polarization code {0}")]
    InvalidPolarizationCode(u8),
    #[error("invalid rx channel id {0}")]
    InvalidChannelId(u8),
    #[error("invalid SSB flag {0}")]
    InvalidSsbFlag(u8),

    #[error("sub-commutated word index {0} out of range")]
    InvalidWordIndex(u8),
}

impl Error {
    /// True for errors that make a packet's headers unusable, i.e., the whole
    /// packet must be dropped. All other errors only affect the user data.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::TruncatedInput { .. }
                | Error::HeaderLengthMismatch { .. }
                | Error::UnknownField(_)
                | Error::InvalidFormatCombination { .. }
                | Error::InvalidEccCode(_)
                | Error::InvalidPolarizationCode(_)
                | Error::InvalidChannelId(_)
                | Error::InvalidSsbFlag(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
