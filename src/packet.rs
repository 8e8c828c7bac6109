use num_complex::Complex64;
use serde::Serialize;
use tracing::trace;

use crate::bits::BitCursor;
use crate::error::{Error, Result};
use crate::header::{PrimaryHeader, SecondaryHeader};
use crate::huffman::{self, Brc};
use crate::reader::RawPacket;
use crate::reconstruct;

/// Number of quads per component in a full BAQ block.
pub const BLOCK_QUADS: usize = 128;

/// User data component streams are padded to this many bits.
pub const WORD_BITS: usize = 16;

/// User data encoding, selected by the BAQ and test modes.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataFormat {
    /// Bypass, test mode
    A,
    /// Bypass
    B,
    /// BAQ 3, 4 or 5 bit; not decoded
    C,
    /// FDBAQ
    D,
}

impl DataFormat {
    /// # Errors
    /// [Error::InvalidFormatCombination] if `baq_mode` is not a known mode.
    pub fn from_modes(baq_mode: u8, test_mode: u8) -> Result<Self> {
        match baq_mode {
            0 if test_mode % 3 == 0 => Ok(DataFormat::A),
            0 => Ok(DataFormat::B),
            3..=5 => Ok(DataFormat::C),
            12..=14 => Ok(DataFormat::D),
            _ => Err(Error::InvalidFormatCombination {
                baq_mode,
                test_mode,
            }),
        }
    }
}

/// User data component streams, in transmission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    IE = 0,
    IO = 1,
    QE = 2,
    QO = 3,
}

impl Component {
    pub const ORDER: [Component; 4] = [Component::IE, Component::IO, Component::QE, Component::QO];
}

/// Number of BAQ blocks needed for `num_quads`, i.e., `ceil(2 * num_quads / 256)`.
#[must_use]
pub fn num_baq_blocks(num_quads: usize) -> usize {
    (2 * num_quads).div_ceil(2 * BLOCK_QUADS)
}

/// Number of quads in `block`; the last block holds the remainder.
fn block_quads(num_quads: usize, num_blocks: usize, block: usize) -> usize {
    if block + 1 == num_blocks {
        num_quads - BLOCK_QUADS * (num_blocks - 1)
    } else {
        BLOCK_QUADS
    }
}

/// Sample values for all 4 components, stored component-major and sized up front.
struct Components {
    num_quads: usize,
    values: Vec<f64>,
}

impl Components {
    fn new(num_quads: usize) -> Self {
        Components {
            num_quads,
            values: vec![0.0; 4 * num_quads],
        }
    }

    fn set(&mut self, comp: Component, quad: usize, value: f64) {
        self.values[comp as usize * self.num_quads + quad] = value;
    }

    fn get(&self, comp: Component, quad: usize) -> f64 {
        self.values[comp as usize * self.num_quads + quad]
    }

    /// Interleave as `IE + jQE`, `IO + jQO` for each quad.
    fn into_samples(self) -> Vec<Complex64> {
        let mut samples = Vec::with_capacity(2 * self.num_quads);
        for q in 0..self.num_quads {
            samples.push(Complex64::new(
                self.get(Component::IE, q),
                self.get(Component::QE, q),
            ));
            samples.push(Complex64::new(
                self.get(Component::IO, q),
                self.get(Component::QO, q),
            ));
        }
        samples
    }
}

/// Decode format A or B user data: 10-bit sign-magnitude values per component.
///
/// # Errors
/// [Error::TruncatedInput] if `data` is too short for `num_quads`.
pub fn decode_bypass(data: &[u8], num_quads: usize) -> Result<Vec<Complex64>> {
    let mut cursor = BitCursor::new(data);
    let mut components = Components::new(num_quads);
    for comp in Component::ORDER {
        for q in 0..num_quads {
            let sign = cursor.read_bit()?;
            let magnitude = cursor.read(9)? as u16;
            components.set(comp, q, reconstruct::bypass(sign, magnitude));
        }
        cursor.align(WORD_BITS);
    }
    Ok(components.into_samples())
}

/// Decode format D (FDBAQ) user data.
///
/// Each IE block starts with its BRC and each QE block with its threshold index; both
/// apply to the same block of every component. Values are reconstructed once all four
/// streams are read because IE and IO blocks need the threshold index carried in QE.
///
/// # Errors
/// [Error::InvalidBrc], [Error::InvalidMCode] or [Error::TruncatedInput] for
/// malformed user data.
pub fn decode_fdbaq(data: &[u8], num_quads: usize) -> Result<Vec<Complex64>> {
    let num_blocks = num_baq_blocks(num_quads);
    let mut cursor = BitCursor::new(data);
    let mut brcs: Vec<Brc> = Vec::with_capacity(num_blocks);
    let mut thidxs: Vec<u8> = Vec::with_capacity(num_blocks);
    // (sign, m_code) for each component/quad
    let mut symbols = vec![(0u8, 0u8); 4 * num_quads];

    for comp in Component::ORDER {
        let mut quad = 0;
        for block in 0..num_blocks {
            match comp {
                Component::IE => {
                    let code = cursor.read(3)? as u8;
                    let brc = Brc::new(code).ok_or(Error::InvalidBrc { brc: code, block })?;
                    brcs.push(brc);
                }
                Component::QE => thidxs.push(cursor.read(8)? as u8),
                _ => {}
            }
            let brc = brcs[block];
            for _ in 0..block_quads(num_quads, num_blocks, block) {
                let sign = cursor.read_bit()?;
                let (m_code, _) = huffman::decode(&mut cursor, brc)?;
                symbols[comp as usize * num_quads + quad] = (sign, m_code);
                quad += 1;
            }
        }
        cursor.align(WORD_BITS);
    }

    let mut components = Components::new(num_quads);
    for comp in Component::ORDER {
        for q in 0..num_quads {
            let block = q / BLOCK_QUADS;
            let (sign, m_code) = symbols[comp as usize * num_quads + q];
            let value = reconstruct::reconstruct(brcs[block], thidxs[block], m_code, sign)?;
            components.set(comp, q, value);
        }
    }
    Ok(components.into_samples())
}

/// Decode user data according to `format`.
///
/// # Errors
/// [Error::UnsupportedFormatC] for format C, otherwise any error from
/// [decode_bypass] or [decode_fdbaq].
pub fn decode_user_data(
    data: &[u8],
    format: DataFormat,
    baq_mode: u8,
    num_quads: usize,
) -> Result<Vec<Complex64>> {
    match format {
        DataFormat::A | DataFormat::B => decode_bypass(data, num_quads),
        DataFormat::C => Err(Error::UnsupportedFormatC { baq_mode }),
        DataFormat::D => decode_fdbaq(data, num_quads),
    }
}

/// A Sentinel-1 packet with decoded headers.
///
/// User data is kept undecoded until [Packet::samples] is called.
#[derive(Serialize, Debug, Clone)]
pub struct Packet {
    /// Byte offset of the packet in the stream
    pub offset: usize,
    pub primary: PrimaryHeader,
    pub secondary: SecondaryHeader,
    pub format: DataFormat,
    #[serde(skip)]
    user_data: Option<Vec<u8>>,
}

impl Packet {
    /// Decode the headers of a raw packet.
    ///
    /// # Errors
    /// Any header-tier error, i.e., one where [Error::is_structural] is true.
    pub fn decode(raw: RawPacket) -> Result<Self> {
        let primary = PrimaryHeader::decode(&raw.primary)?;
        let secondary = SecondaryHeader::decode(&raw.secondary)?;
        let format = DataFormat::from_modes(secondary.baq_mode_code, secondary.test_mode_code)?;
        trace!(
            offset = raw.offset,
            sequence_count = primary.sequence_count,
            ?format,
            "decoded packet headers"
        );
        Ok(Packet {
            offset: raw.offset,
            primary,
            secondary,
            format,
            user_data: raw.user_data,
        })
    }

    #[must_use]
    pub fn num_quads(&self) -> usize {
        self.secondary.num_quads as usize
    }

    #[must_use]
    pub fn num_baq_blocks(&self) -> usize {
        num_baq_blocks(self.num_quads())
    }

    /// Length of the user data field declared by the headers.
    #[must_use]
    pub fn user_data_length(&self) -> usize {
        self.primary
            .packet_data_len()
            .saturating_sub(SecondaryHeader::LEN)
    }

    /// Undecoded user data, if still held.
    #[must_use]
    pub fn user_data(&self) -> Option<&[u8]> {
        self.user_data.as_deref()
    }

    /// Drop and return the user data buffer.
    pub fn take_user_data(&mut self) -> Option<Vec<u8>> {
        self.user_data.take()
    }

    /// Decode the user data into `2 * num_quads` complex samples.
    ///
    /// # Errors
    /// Any payload-tier error. A packet whose user data has been taken decodes as
    /// empty user data.
    pub fn samples(&self) -> Result<Vec<Complex64>> {
        decode_user_data(
            self.user_data().unwrap_or_default(),
            self.format,
            self.secondary.baq_mode_code,
            self.num_quads(),
        )
    }

    /// Decode the samples and release the user data buffer.
    #[must_use]
    pub fn into_decoded(mut self) -> DecodedPacket {
        let payload = match self.samples() {
            Ok(samples) => Payload::Samples(samples),
            Err(err) => Payload::Failed(err),
        };
        self.user_data = None;
        DecodedPacket {
            packet: self,
            payload,
        }
    }
}

/// Outcome of decoding a packet's user data.
#[derive(Debug)]
pub enum Payload {
    Samples(Vec<Complex64>),
    /// Headers are valid but the user data could not be decoded
    Failed(Error),
    /// Sample decoding was not requested
    Skipped,
}

/// Packet headers along with the outcome of decoding its user data.
#[derive(Debug)]
pub struct DecodedPacket {
    pub packet: Packet,
    pub payload: Payload,
}

impl DecodedPacket {
    #[must_use]
    pub fn samples(&self) -> Option<&[Complex64]> {
        match &self.payload {
            Payload::Samples(samples) => Some(samples),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match &self.payload {
            Payload::Failed(err) => Some(err),
            _ => None,
        }
    }
}
