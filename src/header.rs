//! Primary and secondary header decoding.
//!
//! Both headers are decoded from fixed bit-field layouts (see [decode_fields]) and then
//! converted to typed structs. The secondary header additionally carries the
//! enumerated and physical-unit interpretations of its raw fields.
//!
//! # References
//! 1. Sentinel-1 SAR Space Packet Protocol Data Unit (S1-IF-ASD-PL-0007), section 3.2
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::bits::BitCursor;
use crate::error::{Error, Result};

/// Reference frequency in MHz used to scale timing and chirp fields.
pub const F_REF: f64 = 37.534_722_24;

/// A named, fixed width bit-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub bits: usize,
}

pub const fn field(name: &'static str, bits: usize) -> Field {
    Field { name, bits }
}

pub static PRIMARY_LAYOUT: [Field; 8] = [
    field("packet_version_number", 3),
    field("packet_type", 1),
    field("secondary_header_flag", 1),
    field("process_id", 7),
    field("process_category", 4),
    field("sequence_flags", 2),
    field("packet_sequence_count", 14),
    field("packet_data_length", 16),
];

pub static SECONDARY_LAYOUT: [Field; 44] = [
    field("coarse_time", 32),
    field("fine_time", 16),
    field("sync_marker", 32),
    field("data_take_id", 32),
    field("ecc_number", 8),
    field("spare", 1),
    field("test_mode", 3),
    field("rx_channel_id", 4),
    field("instrument_configuration_id", 32),
    field("sc_data_word_index", 8),
    field("sc_data_word", 16),
    field("space_packet_count", 32),
    field("pri_count", 32),
    field("error_flag", 1),
    field("spare", 2),
    field("baq_mode", 5),
    field("baq_block_length", 8),
    field("spare", 8),
    field("range_decimation", 8),
    field("rx_gain", 8),
    field("tx_ramp_rate", 16),
    field("pulse_start_frequency", 16),
    field("pulse_length", 24),
    field("spare", 3),
    field("rank", 5),
    field("pri", 24),
    field("swst", 24),
    field("swl", 24),
    // SAS SSB message
    field("ssb_flag", 1),
    field("polarisation", 3),
    field("temperature_compensation", 2),
    field("spare", 2),
    field("elevation_beam_address_or_sas_test", 4),
    field("spare", 2),
    field("azimuth_beam_address_or_cal_beam_address", 10),
    // SES SSB message
    field("calibration_mode", 2),
    field("spare", 1),
    field("tx_pulse_number", 5),
    field("signal_type", 4),
    field("spare", 3),
    field("swap", 1),
    field("swath_number", 8),
    field("num_quadratures", 16),
    field("spare", 8),
];

/// Raw values decoded according to a field layout, in layout order.
#[derive(Debug, Clone)]
pub struct Fields {
    layout: &'static [Field],
    values: Vec<u64>,
}

impl Fields {
    /// Value of the first field named `name`.
    ///
    /// # Errors
    /// [Error::UnknownField] if the layout has no such field.
    pub fn get(&self, name: &'static str) -> Result<u64> {
        self.layout
            .iter()
            .position(|f| f.name == name)
            .map(|idx| self.values[idx])
            .ok_or(Error::UnknownField(name))
    }

    /// `(name, value)` pairs in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.layout
            .iter()
            .zip(self.values.iter())
            .map(|(f, v)| (f.name, *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Decode `buf` into the fields described by `layout`.
///
/// # Errors
/// [Error::HeaderLengthMismatch] if the layout widths do not sum to exactly the number of
/// bits in `buf`, or a field is wider than 64 bits.
pub fn decode_fields(buf: &[u8], layout: &'static [Field]) -> Result<Fields> {
    let field_bits: usize = layout.iter().map(|f| f.bits).sum();
    if field_bits != buf.len() * 8 || layout.iter().any(|f| f.bits > BitCursor::MAX_READ) {
        return Err(Error::HeaderLengthMismatch {
            fields: layout.len(),
            field_bits,
            buffer_bits: buf.len() * 8,
        });
    }

    let mut cur = BitCursor::new(buf);
    let mut values = Vec::with_capacity(layout.len());
    for f in layout {
        values.push(cur.read(f.bits)?);
    }
    Ok(Fields { layout, values })
}

/// Space packet primary header.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryHeader {
    pub version: u8,
    pub packet_type: u8,
    pub secondary_header_flag: bool,
    pub process_id: u8,
    pub process_category: u8,
    pub sequence_flags: u8,
    pub sequence_count: u16,
    /// Packet data field length minus 1, including the secondary header
    pub data_length: u16,
}

impl PrimaryHeader {
    /// Size of a ``PrimaryHeader``
    pub const LEN: usize = 6;
    pub const SEQ_MAX: u16 = 16383;

    /// Decode from exactly [PrimaryHeader::LEN] bytes.
    ///
    /// # Errors
    /// [Error::HeaderLengthMismatch] if `buf` is not the header length.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let f = decode_fields(buf, &PRIMARY_LAYOUT)?;
        Ok(PrimaryHeader {
            version: f.get("packet_version_number")? as u8,
            packet_type: f.get("packet_type")? as u8,
            secondary_header_flag: f.get("secondary_header_flag")? == 1,
            process_id: f.get("process_id")? as u8,
            process_category: f.get("process_category")? as u8,
            sequence_flags: f.get("sequence_flags")? as u8,
            sequence_count: f.get("packet_sequence_count")? as u16,
            data_length: f.get("packet_data_length")? as u16,
        })
    }

    /// The 11-bit application process identifier, i.e., process id and category.
    #[must_use]
    pub fn apid(&self) -> u16 {
        (u16::from(self.process_id) << 4) | u16::from(self.process_category)
    }

    /// Number of bytes following the primary header.
    #[must_use]
    pub fn packet_data_len(&self) -> usize {
        self.data_length as usize + 1
    }
}

/// Instrument mode from the ECC number.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SensorMode {
    Contingency,
    Stripmap1,
    Stripmap2,
    Stripmap3,
    Stripmap4,
    Stripmap5N,
    Stripmap5S,
    Stripmap6,
    InterferometricWideSwath,
    Wave,
    ExtraWideSwath,
    Stripmap1WithCal,
    Stripmap2WithCal,
    Stripmap3WithCal,
    Stripmap4WithCal,
    Stripmap5NWithoutCal,
    Stripmap5SWithoutCal,
    Stripmap6WithoutCal,
    RfCharacterization,
    TestMode,
    ElevationNotchS3,
    ElevationNotchS3WithoutCal,
    AzimuthNotchS1,
    AzimuthNotchS2,
    AzimuthNotchS3,
    AzimuthNotchS4,
    AzimuthNotchS5N,
    AzimuthNotchS5S,
    AzimuthNotchS6,
    AzimuthNotchS1WithoutCal,
    AzimuthNotchS2WithoutCal,
    AzimuthNotchS3WithoutCal,
    NoiseCharacterizationS1,
    NoiseCharacterizationS2,
    NoiseCharacterizationS3,
    NoiseCharacterizationS4,
    NoiseCharacterizationS5N,
    NoiseCharacterizationS5S,
    NoiseCharacterizationS6,
    NoiseCharacterizationEw,
    NoiseCharacterizationIw,
    NoiseCharacterizationWave,
}

// Indexed by ECC number
#[rustfmt::skip]
static ECC_SENSOR_MODES: [SensorMode; 48] = {
    use SensorMode::*;
    [
        Contingency, Stripmap1, Stripmap2, Stripmap3, Stripmap4, Stripmap5N, Stripmap6,
        Contingency, InterferometricWideSwath, Wave, Stripmap5S,
        Stripmap1WithCal, Stripmap2WithCal, Stripmap3WithCal, Stripmap4WithCal,
        RfCharacterization, TestMode, ElevationNotchS3,
        AzimuthNotchS1, AzimuthNotchS2, AzimuthNotchS3, AzimuthNotchS4,
        AzimuthNotchS5N, AzimuthNotchS5S, AzimuthNotchS6,
        Stripmap5NWithoutCal, Stripmap5SWithoutCal, Stripmap6WithoutCal,
        Contingency, Contingency, Contingency,
        ElevationNotchS3WithoutCal, ExtraWideSwath,
        AzimuthNotchS1WithoutCal, AzimuthNotchS2WithoutCal, AzimuthNotchS3WithoutCal,
        Contingency,
        NoiseCharacterizationS1, NoiseCharacterizationS2, NoiseCharacterizationS3,
        NoiseCharacterizationS4, NoiseCharacterizationS5N, NoiseCharacterizationS5S,
        NoiseCharacterizationS6, NoiseCharacterizationEw, NoiseCharacterizationIw,
        NoiseCharacterizationWave,
        Contingency,
    ]
};

impl SensorMode {
    /// # Errors
    /// [Error::InvalidEccCode] for codes greater than 47.
    pub fn from_ecc(code: u8) -> Result<Self> {
        ECC_SENSOR_MODES
            .get(code as usize)
            .copied()
            .ok_or(Error::InvalidEccCode(code))
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    Measurement,
    Contingency,
    TestModeBaq,
    TestModeBypass,
    NotApplicable,
}

impl TestMode {
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => TestMode::Measurement,
            4 | 5 => TestMode::Contingency,
            6 => TestMode::TestModeBaq,
            7 => TestMode::TestModeBypass,
            _ => TestMode::NotApplicable,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarization {
    H,
    V,
}

impl Polarization {
    /// # Errors
    /// [Error::InvalidPolarizationCode] for codes greater than 7.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0..=3 => Ok(Polarization::H),
            4..=7 => Ok(Polarization::V),
            _ => Err(Error::InvalidPolarizationCode(code)),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RxChannel {
    V,
    H,
}

impl RxChannel {
    /// # Errors
    /// [Error::InvalidChannelId] for anything other than 0 or 1.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(RxChannel::V),
            1 => Ok(RxChannel::H),
            _ => Err(Error::InvalidChannelId(code)),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BaqMode {
    Bypass,
    Baq3Bit,
    Baq4Bit,
    Baq5Bit,
    Fdbaq0,
    Fdbaq1,
    Fdbaq2,
    NotApplicable,
}

impl BaqMode {
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => BaqMode::Bypass,
            3 => BaqMode::Baq3Bit,
            4 => BaqMode::Baq4Bit,
            5 => BaqMode::Baq5Bit,
            12 => BaqMode::Fdbaq0,
            13 => BaqMode::Fdbaq1,
            14 => BaqMode::Fdbaq2,
            _ => BaqMode::NotApplicable,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Echo,
    Noise,
    TxCal,
    RxCal,
    EpdnCal,
    TaCal,
    ApdnCal,
    TxhCalIso,
    NotApplicable,
}

impl SignalType {
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => SignalType::Echo,
            1 => SignalType::Noise,
            8 => SignalType::TxCal,
            9 => SignalType::RxCal,
            10 => SignalType::EpdnCal,
            11 => SignalType::TaCal,
            12 => SignalType::ApdnCal,
            15 => SignalType::TxhCalIso,
            _ => SignalType::NotApplicable,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SasTest {
    TestMode,
    Normal,
}

/// SAS SSB message, interpreted according to the SSB flag.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "ssb_mode", rename_all = "snake_case")]
pub enum Ssb {
    /// SSB flag 0
    Imaging {
        polarization: Polarization,
        temperature_compensation: u8,
        elevation_beam_address: u8,
        azimuth_beam_address: u16,
    },
    /// SSB flag 1
    ///
    /// `sas_test` is the MSB of the 4-bit elevation beam address field, which in
    /// calibration mode carries the SAS test flag, not the packet test mode.
    /// `cal_type` is the remaining 3 bits.
    Calibration {
        polarization: Polarization,
        sas_test: SasTest,
        cal_type: u8,
        cal_beam_address: u16,
    },
}

impl Ssb {
    /// Decode the SSB message from its raw fields. In calibration mode the 4-bit
    /// elevation field holds the SAS test bit (MSB) followed by the 3-bit cal type.
    ///
    /// # Errors
    /// [Error::InvalidSsbFlag] if `flag` is not 0 or 1, or
    /// [Error::InvalidPolarizationCode].
    pub fn decode(
        flag: u8,
        polarisation: u8,
        temperature_compensation: u8,
        elevation_or_sas: u8,
        azimuth_or_cal: u16,
    ) -> Result<Self> {
        match flag {
            0 => Ok(Ssb::Imaging {
                polarization: Polarization::from_code(polarisation)?,
                temperature_compensation,
                elevation_beam_address: elevation_or_sas,
                azimuth_beam_address: azimuth_or_cal,
            }),
            1 => Ok(Ssb::Calibration {
                polarization: Polarization::from_code(polarisation)?,
                sas_test: if (elevation_or_sas >> 3) & 1 == 0 {
                    SasTest::TestMode
                } else {
                    SasTest::Normal
                },
                cal_type: elevation_or_sas & 0x7,
                cal_beam_address: azimuth_or_cal,
            }),
            _ => Err(Error::InvalidSsbFlag(flag)),
        }
    }

    #[must_use]
    pub fn polarization(&self) -> Polarization {
        match self {
            Ssb::Imaging { polarization, .. } | Ssb::Calibration { polarization, .. } => {
                *polarization
            }
        }
    }
}

/// Sentinel-1 packet secondary header.
///
/// Raw field values are kept as transmitted; codes with an enumerated meaning are
/// suffixed with `_code` and their interpretation is available in the field of the same
/// base name. Physical values are provided by methods.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SecondaryHeader {
    pub coarse_time: u32,
    pub fine_time: u16,
    pub sync_marker: u32,
    pub data_take_id: u32,
    pub ecc_code: u8,
    pub sensor_mode: SensorMode,
    pub test_mode_code: u8,
    pub test_mode: TestMode,
    pub rx_channel_code: u8,
    pub rx_channel: RxChannel,
    pub instrument_configuration_id: u32,
    pub sc_data_word_index: u8,
    pub sc_data_word: u16,
    pub space_packet_count: u32,
    pub pri_count: u32,
    pub error_flag: bool,
    pub baq_mode_code: u8,
    pub baq_mode: BaqMode,
    pub baq_block_length: u8,
    pub range_decimation: u8,
    pub rx_gain: u8,
    pub tx_ramp_rate: u16,
    pub pulse_start_frequency: u16,
    pub pulse_length: u32,
    pub rank: u8,
    pub pri: u32,
    pub swst: u32,
    pub swl: u32,
    pub ssb_flag: u8,
    pub polarisation_code: u8,
    pub temperature_compensation: u8,
    pub elevation_beam_address_or_sas_test: u8,
    pub azimuth_beam_address_or_cal_beam_address: u16,
    pub ssb: Ssb,
    pub calibration_mode: u8,
    pub tx_pulse_number: u8,
    pub signal_type_code: u8,
    pub signal_type: SignalType,
    pub swap: bool,
    pub swath_number: u8,
    pub num_quads: u16,
}

/// Seconds between the Unix epoch and the GPS epoch (1980-01-06T00:00:00).
const GPS_UNIX_DELTA: i64 = 315_964_800;

/// Split a sign-magnitude value: MSB 0 is negative.
fn sign_magnitude(raw: u16) -> f64 {
    let magnitude = f64::from(raw & 0x7fff);
    if raw >> 15 == 0 {
        -magnitude
    } else {
        magnitude
    }
}

impl SecondaryHeader {
    /// Size of a ``SecondaryHeader``
    pub const LEN: usize = 62;

    /// Decode from exactly [SecondaryHeader::LEN] bytes.
    ///
    /// # Errors
    /// [Error::HeaderLengthMismatch] if `buf` is not the header length, or one of the
    /// enumeration errors if a coded field is out of range.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let f = decode_fields(buf, &SECONDARY_LAYOUT)?;

        let ecc_code = f.get("ecc_number")? as u8;
        let test_mode_code = f.get("test_mode")? as u8;
        let rx_channel_code = f.get("rx_channel_id")? as u8;
        let baq_mode_code = f.get("baq_mode")? as u8;
        let signal_type_code = f.get("signal_type")? as u8;
        let ssb_flag = f.get("ssb_flag")? as u8;
        let polarisation_code = f.get("polarisation")? as u8;
        let temperature_compensation = f.get("temperature_compensation")? as u8;
        let elevation_or_sas = f.get("elevation_beam_address_or_sas_test")? as u8;
        let azimuth_or_cal = f.get("azimuth_beam_address_or_cal_beam_address")? as u16;

        Ok(SecondaryHeader {
            coarse_time: f.get("coarse_time")? as u32,
            fine_time: f.get("fine_time")? as u16,
            sync_marker: f.get("sync_marker")? as u32,
            data_take_id: f.get("data_take_id")? as u32,
            ecc_code,
            sensor_mode: SensorMode::from_ecc(ecc_code)?,
            test_mode_code,
            test_mode: TestMode::from_code(test_mode_code),
            rx_channel_code,
            rx_channel: RxChannel::from_code(rx_channel_code)?,
            instrument_configuration_id: f.get("instrument_configuration_id")? as u32,
            sc_data_word_index: f.get("sc_data_word_index")? as u8,
            sc_data_word: f.get("sc_data_word")? as u16,
            space_packet_count: f.get("space_packet_count")? as u32,
            pri_count: f.get("pri_count")? as u32,
            error_flag: f.get("error_flag")? == 1,
            baq_mode_code,
            baq_mode: BaqMode::from_code(baq_mode_code),
            baq_block_length: f.get("baq_block_length")? as u8,
            range_decimation: f.get("range_decimation")? as u8,
            rx_gain: f.get("rx_gain")? as u8,
            tx_ramp_rate: f.get("tx_ramp_rate")? as u16,
            pulse_start_frequency: f.get("pulse_start_frequency")? as u16,
            pulse_length: f.get("pulse_length")? as u32,
            rank: f.get("rank")? as u8,
            pri: f.get("pri")? as u32,
            swst: f.get("swst")? as u32,
            swl: f.get("swl")? as u32,
            ssb_flag,
            polarisation_code,
            temperature_compensation,
            elevation_beam_address_or_sas_test: elevation_or_sas,
            azimuth_beam_address_or_cal_beam_address: azimuth_or_cal,
            ssb: Ssb::decode(
                ssb_flag,
                polarisation_code,
                temperature_compensation,
                elevation_or_sas,
                azimuth_or_cal,
            )?,
            calibration_mode: f.get("calibration_mode")? as u8,
            tx_pulse_number: f.get("tx_pulse_number")? as u8,
            signal_type_code,
            signal_type: SignalType::from_code(signal_type_code),
            swap: f.get("swap")? == 1,
            swath_number: f.get("swath_number")? as u8,
            num_quads: f.get("num_quadratures")? as u16,
        })
    }

    /// Packet time on the GPS time scale (no leap second correction).
    ///
    /// Returns `None` if the time cannot be represented.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        let nanos = (u64::from(self.fine_time) * 1_000_000_000) >> 16;
        DateTime::from_timestamp(GPS_UNIX_DELTA + i64::from(self.coarse_time), nanos as u32)
    }

    /// TX pulse ramp rate in MHz/us.
    #[must_use]
    pub fn tx_ramp_rate_mhz_per_us(&self) -> f64 {
        sign_magnitude(self.tx_ramp_rate) * F_REF * F_REF / 2_097_152.0
    }

    /// TX pulse start frequency in MHz.
    #[must_use]
    pub fn tx_start_frequency_mhz(&self) -> f64 {
        self.tx_ramp_rate_mhz_per_us() / (4.0 * F_REF)
            + sign_magnitude(self.pulse_start_frequency) * F_REF / 16_384.0
    }

    /// TX pulse length in microseconds.
    #[must_use]
    pub fn pulse_length_us(&self) -> f64 {
        f64::from(self.pulse_length) / F_REF
    }

    /// Pulse repetition interval in microseconds.
    #[must_use]
    pub fn pri_us(&self) -> f64 {
        f64::from(self.pri) / F_REF
    }

    /// Sampling window start time in microseconds.
    #[must_use]
    pub fn swst_us(&self) -> f64 {
        f64::from(self.swst) / F_REF
    }

    /// Sampling window length in microseconds.
    #[must_use]
    pub fn swl_us(&self) -> f64 {
        f64::from(self.swl) / F_REF
    }

    #[must_use]
    pub fn rx_gain_db(&self) -> f64 {
        f64::from(self.rx_gain) * -0.5
    }

    /// BAQ block length in complex samples.
    #[must_use]
    pub fn baq_block_length_samples(&self) -> usize {
        8 * (self.baq_block_length as usize + 1)
    }
}
