use std::io::Read;

use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

use crate::bytes::Bytes;
use crate::error::{Error, Result};
use crate::header::{PrimaryHeader, SecondaryHeader};
use crate::packet::{DecodedPacket, Packet, Payload};

/// Undecoded packet bytes as read from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// Byte offset of the packet in the stream
    pub offset: usize,
    pub primary: [u8; PrimaryHeader::LEN],
    pub secondary: [u8; SecondaryHeader::LEN],
    /// Present when the declared packet length extends past the secondary header
    pub user_data: Option<Vec<u8>>,
}

/// Iterates over [RawPacket]s using the primary header length field.
///
/// A clean end of stream between packets ends iteration. A stream ending part way
/// through a packet yields a single [Error::TruncatedInput], as does any read error,
/// after which iteration ends.
pub struct RawPacketIter<R>
where
    R: Read,
{
    bytes: Bytes<R>,
    done: bool,
}

impl<R> RawPacketIter<R>
where
    R: Read,
{
    fn new(reader: R) -> Self {
        RawPacketIter {
            bytes: Bytes::new(reader),
            done: false,
        }
    }

    /// Fill `buf` completely or fail. Returns `Ok(false)` only for a clean EOF, i.e.,
    /// when `eof_ok` and no bytes were available.
    fn fill(&mut self, buf: &mut [u8], eof_ok: bool) -> Result<bool> {
        let n = self.bytes.fill(buf)?;
        if n == 0 && eof_ok {
            return Ok(false);
        }
        if n < buf.len() {
            return Err(Error::TruncatedInput {
                needed: buf.len(),
                available: n,
            });
        }
        Ok(true)
    }

    fn read_packet(&mut self) -> Result<Option<RawPacket>> {
        let offset = self.bytes.offset();

        let mut primary = [0u8; PrimaryHeader::LEN];
        if !self.fill(&mut primary, true)? {
            trace!(offset, "end of stream");
            return Ok(None);
        }
        let ph = PrimaryHeader::decode(&primary)?;

        let mut secondary = [0u8; SecondaryHeader::LEN];
        self.fill(&mut secondary, false)?;

        let user_data = match ph.packet_data_len().checked_sub(SecondaryHeader::LEN) {
            Some(len) if len > 0 => {
                let mut buf = vec![0u8; len];
                self.fill(&mut buf, false)?;
                Some(buf)
            }
            _ => None,
        };

        trace!(
            offset,
            sequence_count = ph.sequence_count,
            data_length = ph.data_length,
            "read packet"
        );
        Ok(Some(RawPacket {
            offset,
            primary,
            secondary,
            user_data,
        }))
    }
}

impl<R> Iterator for RawPacketIter<R>
where
    R: Read,
{
    type Item = Result<RawPacket>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                debug!(offset = self.bytes.offset(), "packet stream ended: {err}");
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Return an iterator providing [RawPacket] data read from a byte synchronized stream.
#[must_use]
pub fn read_raw_packets<R>(reader: R) -> RawPacketIter<R>
where
    R: Read,
{
    RawPacketIter::new(reader)
}

/// Return an iterator providing [Packet]s with decoded headers read from a byte
/// synchronized stream. User data is left undecoded.
///
/// # Examples
/// ```no_run
/// use std::fs::File;
/// use s1l0::read_packets;
///
/// let file = File::open("s1a-iw-raw.dat").unwrap();
/// for packet in read_packets(file).filter_map(Result::ok) {
///     println!("{:?} {:?}", packet.format, packet.secondary.signal_type);
/// }
/// ```
pub fn read_packets<R>(reader: R) -> impl Iterator<Item = Result<Packet>>
where
    R: Read,
{
    read_raw_packets(reader).map(|raw| raw.and_then(Packet::decode))
}

/// Decodes packets and, optionally, their samples from a stream.
///
/// Header-tier errors are yielded as `Err` items; payload-tier errors are logged and
/// reported in [DecodedPacket::payload] with the packet's headers still available.
///
/// # Examples
/// ```no_run
/// use std::fs::File;
/// use s1l0::Decoder;
///
/// let file = File::open("s1a-iw-raw.dat").unwrap();
/// let decoder = Decoder::builder().max_packets(100).build();
/// for decoded in decoder.decode(file).filter_map(Result::ok) {
///     if let Some(samples) = decoded.samples() {
///         println!("{} samples", samples.len());
///     }
/// }
/// ```
#[derive(TypedBuilder, Debug, Clone)]
pub struct Decoder {
    /// Decode user data into samples. When false, user data is dropped as soon as the
    /// headers are decoded.
    #[builder(default = true)]
    samples: bool,
    /// Stop after this many packets.
    #[builder(default, setter(strip_option))]
    max_packets: Option<usize>,
    /// Log and skip packets with invalid headers rather than yielding the error.
    /// Truncation and I/O errors are always yielded.
    #[builder(default = false)]
    skip_structural: bool,
}

impl Decoder {
    pub fn decode<R>(&self, reader: R) -> impl Iterator<Item = Result<DecodedPacket>>
    where
        R: Read,
    {
        let samples = self.samples;
        let skip_structural = self.skip_structural;

        read_packets(reader)
            .filter_map(move |zult| match zult {
                Ok(packet) => Some(Ok(decode_payload(packet, samples))),
                Err(err @ (Error::Io(_) | Error::TruncatedInput { .. })) => Some(Err(err)),
                Err(err) if skip_structural => {
                    warn!("skipping packet with invalid header: {err}");
                    None
                }
                Err(err) => Some(Err(err)),
            })
            .take(self.max_packets.unwrap_or(usize::MAX))
    }
}

fn decode_payload(mut packet: Packet, samples: bool) -> DecodedPacket {
    if !samples {
        packet.take_user_data();
        return DecodedPacket {
            packet,
            payload: Payload::Skipped,
        };
    }
    let decoded = packet.into_decoded();
    if let Some(err) = decoded.error() {
        warn!(
            offset = decoded.packet.offset,
            sequence_count = decoded.packet.primary.sequence_count,
            "failed to decode user data: {err}"
        );
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_bytes(user_data_len: usize, baq_mode: u8) -> Vec<u8> {
        let data_length = (SecondaryHeader::LEN + user_data_len - 1) as u16;
        let mut dat = vec![0x0c, 0x1a, 0xc0, 0x01];
        dat.extend_from_slice(&data_length.to_be_bytes());
        let mut sh = vec![0u8; SecondaryHeader::LEN];
        sh[31] = baq_mode;
        dat.extend_from_slice(&sh);
        dat.extend(std::iter::repeat(0u8).take(user_data_len));
        dat
    }

    #[test]
    fn test_read_raw_packets() {
        let mut dat = packet_bytes(4, 0);
        dat.extend(packet_bytes(2, 0));

        let packets: Vec<RawPacket> = read_raw_packets(&dat[..])
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].offset, 0);
        assert_eq!(packets[0].user_data.as_deref(), Some(&[0u8; 4][..]));
        assert_eq!(packets[1].offset, 72);
        assert_eq!(packets[1].user_data.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn empty_stream() {
        let dat: &[u8] = &[];
        assert_eq!(read_raw_packets(dat).count(), 0);
    }

    #[test]
    fn truncated_secondary_header() {
        let mut dat = packet_bytes(4, 0);
        dat.extend_from_slice(&packet_bytes(4, 0)[..20]);

        let mut iter = read_raw_packets(&dat[..]);
        assert!(iter.next().unwrap().is_ok());
        match iter.next() {
            Some(Err(Error::TruncatedInput { needed, available })) => {
                assert_eq!(needed, SecondaryHeader::LEN);
                assert_eq!(available, 20 - PrimaryHeader::LEN);
            }
            other => panic!("expected truncated input, got {other:?}"),
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn truncated_user_data() {
        let full = packet_bytes(8, 0);
        let mut dat = full.clone();
        dat.extend_from_slice(&full[..full.len() - 3]);

        let mut iter = read_raw_packets(&dat[..]);
        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(
            iter.next(),
            Some(Err(Error::TruncatedInput {
                needed: 8,
                available: 5
            }))
        ));
        assert!(iter.next().is_none());

        let decoder = Decoder::builder().skip_structural(true).build();
        let yielded: Vec<Result<DecodedPacket>> = decoder.decode(&dat[..]).collect();
        assert_eq!(yielded.len(), 2);
        assert!(yielded[0].is_ok());
        assert!(matches!(
            yielded[1],
            Err(Error::TruncatedInput {
                needed: 8,
                available: 5
            })
        ));
    }

    #[test]
    fn truncated_primary_header() {
        let dat = [0x0c, 0x1a, 0xc0];
        let mut iter = read_raw_packets(&dat[..]);
        assert!(matches!(
            iter.next(),
            Some(Err(Error::TruncatedInput {
                needed: 6,
                available: 3
            }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn decoder_without_samples() {
        let dat = packet_bytes(8, 0);
        let decoder = Decoder::builder().samples(false).build();
        let decoded: Vec<DecodedPacket> = decoder
            .decode(&dat[..])
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(decoded.len(), 1);
        assert!(matches!(decoded[0].payload, Payload::Skipped));
        assert!(decoded[0].packet.user_data().is_none());
    }

    #[test]
    fn decoder_skips_invalid_headers() {
        let mut dat = packet_bytes(2, 7);
        dat.extend(packet_bytes(2, 0));

        let decoder = Decoder::builder().build();
        let yielded: Vec<Result<DecodedPacket>> = decoder.decode(&dat[..]).collect();
        assert_eq!(yielded.len(), 2);
        assert!(matches!(
            yielded[0],
            Err(Error::InvalidFormatCombination { baq_mode: 7, .. })
        ));

        let decoder = Decoder::builder().skip_structural(true).build();
        let yielded: Vec<Result<DecodedPacket>> = decoder.decode(&dat[..]).collect();
        assert_eq!(yielded.len(), 1);
        assert_eq!(yielded[0].as_ref().unwrap().packet.offset, 70);
    }

    #[test]
    fn decoder_max_packets() {
        let mut dat = Vec::new();
        for _ in 0..5 {
            dat.extend(packet_bytes(2, 0));
        }
        let decoder = Decoder::builder().max_packets(3).build();
        assert_eq!(decoder.decode(&dat[..]).count(), 3);
    }
}
