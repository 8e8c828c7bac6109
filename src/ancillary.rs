//! Sub-commutated ancillary data.
//!
//! Each packet carries one 16-bit word of a 65 word ancillary record in its secondary
//! header. [AncillaryAssembler] collects the words of consecutive packets into
//! [AncillaryWordSet]s, detecting the end of a cycle when the word index returns to
//! the index the cycle started at.
use std::borrow::Borrow;
use std::ops::Range;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::header::SecondaryHeader;

/// Number of words in a sub-commutation cycle.
pub const NUM_WORDS: usize = 65;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AncillaryField {
    Dummy,
    XPosition,
    YPosition,
    ZPosition,
    XVelocity,
    YVelocity,
    ZVelocity,
    PodTimeStamp,
    Q0,
    Q1,
    Q2,
    Q3,
    OmegaX,
    OmegaY,
    OmegaZ,
    AttitudeTimeStamp,
    PointingStatus,
    TemperatureUpdateStatus,
    TileTemperatures,
    TguTemperature,
}

impl AncillaryField {
    /// Word indexes occupied by this field.
    #[must_use]
    pub fn slots(self) -> Range<usize> {
        use AncillaryField::*;
        match self {
            Dummy => 0..1,
            XPosition => 1..5,
            YPosition => 5..9,
            ZPosition => 9..13,
            XVelocity => 13..15,
            YVelocity => 15..17,
            ZVelocity => 17..19,
            PodTimeStamp => 19..23,
            Q0 => 23..25,
            Q1 => 25..27,
            Q2 => 27..29,
            Q3 => 29..31,
            OmegaX => 31..33,
            OmegaY => 33..35,
            OmegaZ => 35..37,
            AttitudeTimeStamp => 37..41,
            PointingStatus => 41..42,
            TemperatureUpdateStatus => 42..43,
            TileTemperatures => 43..64,
            TguTemperature => 64..65,
        }
    }

    /// Field occupying word `index` and the word's position within the field.
    ///
    /// # Errors
    /// [Error::InvalidWordIndex] if `index` is not a valid word index.
    pub fn for_index(index: u8) -> Result<(Self, usize)> {
        FIELDS
            .iter()
            .find(|f| f.slots().contains(&(index as usize)))
            .map(|f| (*f, index as usize - f.slots().start))
            .ok_or(Error::InvalidWordIndex(index))
    }
}

/// All fields in word order.
pub static FIELDS: [AncillaryField; 20] = {
    use AncillaryField::*;
    [
        Dummy,
        XPosition,
        YPosition,
        ZPosition,
        XVelocity,
        YVelocity,
        ZVelocity,
        PodTimeStamp,
        Q0,
        Q1,
        Q2,
        Q3,
        OmegaX,
        OmegaY,
        OmegaZ,
        AttitudeTimeStamp,
        PointingStatus,
        TemperatureUpdateStatus,
        TileTemperatures,
        TguTemperature,
    ]
};

/// One sub-commutation cycle worth of ancillary words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncillaryWordSet {
    pub words: [u16; NUM_WORDS],
    /// False for a partial set emitted at the end of a stream
    pub complete: bool,
}

impl AncillaryWordSet {
    /// Raw words of `field`, most significant first.
    #[must_use]
    pub fn field(&self, field: AncillaryField) -> &[u16] {
        &self.words[field.slots()]
    }

    fn u64(&self, field: AncillaryField) -> u64 {
        self.field(field)
            .iter()
            .fold(0u64, |acc, w| (acc << 16) | u64::from(*w))
    }

    fn f32(&self, field: AncillaryField) -> f32 {
        f32::from_bits(self.u64(field) as u32)
    }

    /// ECEF position in metres.
    #[must_use]
    pub fn position(&self) -> [f64; 3] {
        [
            f64::from_bits(self.u64(AncillaryField::XPosition)),
            f64::from_bits(self.u64(AncillaryField::YPosition)),
            f64::from_bits(self.u64(AncillaryField::ZPosition)),
        ]
    }

    /// ECEF velocity in metres per second.
    #[must_use]
    pub fn velocity(&self) -> [f32; 3] {
        [
            self.f32(AncillaryField::XVelocity),
            self.f32(AncillaryField::YVelocity),
            self.f32(AncillaryField::ZVelocity),
        ]
    }

    /// Attitude quaternion `[q0, q1, q2, q3]`.
    #[must_use]
    pub fn quaternion(&self) -> [f32; 4] {
        [
            self.f32(AncillaryField::Q0),
            self.f32(AncillaryField::Q1),
            self.f32(AncillaryField::Q2),
            self.f32(AncillaryField::Q3),
        ]
    }

    #[must_use]
    pub fn angular_rate(&self) -> [f32; 3] {
        [
            self.f32(AncillaryField::OmegaX),
            self.f32(AncillaryField::OmegaY),
            self.f32(AncillaryField::OmegaZ),
        ]
    }

    #[must_use]
    pub fn pod_time_stamp(&self) -> u64 {
        self.u64(AncillaryField::PodTimeStamp)
    }

    #[must_use]
    pub fn attitude_time_stamp(&self) -> u64 {
        self.u64(AncillaryField::AttitudeTimeStamp)
    }
}

impl Serialize for AncillaryWordSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("AncillaryWordSet", 11)?;
        s.serialize_field("complete", &self.complete)?;
        s.serialize_field("position", &self.position())?;
        s.serialize_field("velocity", &self.velocity())?;
        s.serialize_field("pod_time_stamp", &self.pod_time_stamp())?;
        s.serialize_field("quaternion", &self.quaternion())?;
        s.serialize_field("angular_rate", &self.angular_rate())?;
        s.serialize_field("attitude_time_stamp", &self.attitude_time_stamp())?;
        s.serialize_field(
            "pointing_status",
            &self.field(AncillaryField::PointingStatus)[0],
        )?;
        s.serialize_field(
            "temperature_update_status",
            &self.field(AncillaryField::TemperatureUpdateStatus)[0],
        )?;
        s.serialize_field(
            "tile_temperatures",
            self.field(AncillaryField::TileTemperatures),
        )?;
        s.serialize_field(
            "tgu_temperature",
            &self.field(AncillaryField::TguTemperature)[0],
        )?;
        s.end()
    }
}

/// Collects sub-commutated words into [AncillaryWordSet]s.
///
/// Words must be pushed in stream order.
#[derive(Debug, Clone)]
pub struct AncillaryAssembler {
    words: [u16; NUM_WORDS],
    start: Option<u8>,
    last: Option<u8>,
}

impl Default for AncillaryAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl AncillaryAssembler {
    #[must_use]
    pub fn new() -> Self {
        AncillaryAssembler {
            words: [0u16; NUM_WORDS],
            start: None,
            last: None,
        }
    }

    /// Add a word, returning the completed set if `index` closes the current cycle.
    ///
    /// # Errors
    /// [Error::InvalidWordIndex] if `index` is out of range, in which case the word is
    /// rejected and the assembler is unchanged.
    pub fn push_word(&mut self, index: u8, word: u16) -> Result<Option<AncillaryWordSet>> {
        let (field, position) = AncillaryField::for_index(index)?;
        trace!(index, ?field, position, "ancillary word");

        let mut emitted = None;
        match self.start {
            None => self.start = Some(index),
            Some(start) if start == index => {
                debug!(index, "ancillary cycle complete");
                emitted = Some(AncillaryWordSet {
                    words: self.words,
                    complete: true,
                });
                self.words = [0u16; NUM_WORDS];
            }
            Some(_) => {}
        }
        self.words[index as usize] = word;
        self.last = Some(index);
        Ok(emitted)
    }

    /// Add the ancillary word carried by `header`.
    ///
    /// # Errors
    /// See [AncillaryAssembler::push_word].
    pub fn push(&mut self, header: &SecondaryHeader) -> Result<Option<AncillaryWordSet>> {
        self.push_word(header.sc_data_word_index, header.sc_data_word)
    }

    /// Consume the assembler, returning the partially filled set for the current cycle,
    /// if any words beyond the first were added to it.
    #[must_use]
    pub fn finish(self) -> Option<AncillaryWordSet> {
        match (self.start, self.last) {
            (Some(start), Some(last)) if start != last => {
                debug!(start, last, "partial ancillary cycle at end of stream");
                Some(AncillaryWordSet {
                    words: self.words,
                    complete: false,
                })
            }
            _ => None,
        }
    }
}

/// Iterator adapter returned by [assemble_ancillary].
pub struct AncillaryIter<I> {
    headers: I,
    assembler: Option<AncillaryAssembler>,
}

impl<I, H> Iterator for AncillaryIter<I>
where
    I: Iterator<Item = H>,
    H: Borrow<SecondaryHeader>,
{
    type Item = Result<AncillaryWordSet>;

    fn next(&mut self) -> Option<Self::Item> {
        let assembler = self.assembler.as_mut()?;
        for header in self.headers.by_ref() {
            match assembler.push(header.borrow()) {
                Ok(Some(set)) => return Some(Ok(set)),
                Ok(None) => {}
                Err(err) => return Some(Err(err)),
            }
        }
        self.assembler.take()?.finish().map(Ok)
    }
}

/// Assemble [AncillaryWordSet]s from secondary headers in stream order. A partial
/// set is yielded last if the stream ends mid-cycle.
pub fn assemble_ancillary<I, H>(headers: I) -> AncillaryIter<I::IntoIter>
where
    I: IntoIterator<Item = H>,
    H: Borrow<SecondaryHeader>,
{
    AncillaryIter {
        headers: headers.into_iter(),
        assembler: Some(AncillaryAssembler::new()),
    }
}
