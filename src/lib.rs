//! Sentinel-1 SAR Level-0 space packet decoding.
//!
//! Packets are read from a byte stream with [read_packets] or [Decoder], which decode
//! the primary and secondary headers and, for [Decoder], the user data into complex
//! samples. Ancillary data sub-commutated across packets is reassembled by
//! [ancillary::AncillaryAssembler].
//!
//! References:
//! * Sentinel-1 SAR Space Packet Protocol Data Unit, S1-IF-ASD-PL-0007
//! * CCSDS Space Packet Protocol 133.0-B-1
//!     - https://public.ccsds.org/Pubs/133x0b1c2.pdf
mod bytes;
mod error;

pub mod ancillary;
pub mod bits;
pub mod echo;
pub mod header;
pub mod huffman;
pub mod index;
pub mod packet;
pub mod reader;
pub mod reconstruct;

pub use ancillary::{assemble_ancillary, AncillaryAssembler, AncillaryWordSet};
pub use error::{Error, Result};
pub use header::{PrimaryHeader, SecondaryHeader};
pub use packet::{DataFormat, DecodedPacket, Packet, Payload};
pub use reader::{read_packets, read_raw_packets, Decoder, RawPacket};
