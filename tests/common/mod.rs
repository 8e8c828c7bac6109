#![allow(dead_code)]

use s1l0::header::SECONDARY_LAYOUT;
use s1l0::huffman::CODEBOOKS;
use s1l0::packet::BLOCK_QUADS;

/// MSB first bit writer, the inverse of the library's bit cursor.
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    nbits: usize,
}

impl BitWriter {
    pub fn push(&mut self, value: u64, bits: usize) {
        for i in (0..bits).rev() {
            let bit = (value >> i) & 1;
            if self.nbits % 8 == 0 {
                self.bytes.push(0);
            }
            if bit == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 1 << (7 - self.nbits % 8);
            }
            self.nbits += 1;
        }
    }

    pub fn align(&mut self, bits: usize) {
        let rem = self.nbits % bits;
        if rem != 0 {
            self.push(0, bits - rem);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Header values for a synthetic packet. Anything not listed is zero.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    pub sequence_count: u16,
    pub coarse_time: u32,
    pub fine_time: u16,
    pub ecc: u8,
    pub test_mode: u8,
    pub rx_channel: u8,
    pub word_index: u8,
    pub word: u16,
    pub baq_mode: u8,
    pub polarisation: u8,
    pub signal_type: u8,
    pub num_quads: u16,
}

impl Default for PacketBuilder {
    fn default() -> Self {
        PacketBuilder {
            sequence_count: 0,
            coarse_time: 1_300_000_000,
            fine_time: 0,
            ecc: 8,
            test_mode: 0,
            rx_channel: 0,
            word_index: 0,
            word: 0,
            baq_mode: 12,
            polarisation: 1,
            signal_type: 0,
            num_quads: 0,
        }
    }
}

impl PacketBuilder {
    pub fn secondary_header(&self) -> Vec<u8> {
        let mut w = BitWriter::default();
        for field in &SECONDARY_LAYOUT {
            let value = match field.name {
                "coarse_time" => u64::from(self.coarse_time),
                "fine_time" => u64::from(self.fine_time),
                "sync_marker" => 0x352E_F853,
                "ecc_number" => u64::from(self.ecc),
                "test_mode" => u64::from(self.test_mode),
                "rx_channel_id" => u64::from(self.rx_channel),
                "sc_data_word_index" => u64::from(self.word_index),
                "sc_data_word" => u64::from(self.word),
                "baq_mode" => u64::from(self.baq_mode),
                "polarisation" => u64::from(self.polarisation),
                "signal_type" => u64::from(self.signal_type),
                "num_quadratures" => u64::from(self.num_quads),
                _ => 0,
            };
            w.push(value, field.bits);
        }
        w.into_bytes()
    }

    /// Complete packet bytes with `user_data`.
    pub fn encode(&self, user_data: &[u8]) -> Vec<u8> {
        let secondary = self.secondary_header();
        let data_length = (secondary.len() + user_data.len() - 1) as u64;

        let mut w = BitWriter::default();
        w.push(0, 3);
        w.push(0, 1);
        w.push(1, 1);
        w.push(65, 7);
        w.push(12, 4);
        w.push(3, 2);
        w.push(u64::from(self.sequence_count), 14);
        w.push(data_length, 16);

        let mut dat = w.into_bytes();
        dat.extend(secondary);
        dat.extend_from_slice(user_data);
        dat
    }
}

/// Encode FDBAQ user data. `components` holds (sign, m_code) pairs for IE, IO, QE
/// and QO, each of the same length.
pub fn encode_fdbaq(brcs: &[u8], thidxs: &[u8], components: &[Vec<(u8, u8)>; 4]) -> Vec<u8> {
    let mut w = BitWriter::default();
    for (ci, pairs) in components.iter().enumerate() {
        for (block, chunk) in pairs.chunks(BLOCK_QUADS).enumerate() {
            let brc = brcs[block];
            if ci == 0 {
                w.push(u64::from(brc), 3);
            }
            if ci == 2 {
                w.push(u64::from(thidxs[block]), 8);
            }
            for (sign, m_code) in chunk {
                w.push(u64::from(*sign), 1);
                let code = CODEBOOKS[brc as usize]
                    .codes
                    .iter()
                    .find(|c| c.m_code == *m_code)
                    .expect("m_code in codebook");
                w.push(u64::from(code.bits), code.len as usize);
            }
        }
        w.align(16);
    }
    w.into_bytes()
}

/// Encode bypass (format A/B) user data from (sign, magnitude) pairs.
pub fn encode_bypass(components: &[Vec<(u8, u16)>; 4]) -> Vec<u8> {
    let mut w = BitWriter::default();
    for pairs in components {
        for (sign, magnitude) in pairs {
            w.push(u64::from(*sign), 1);
            w.push(u64::from(*magnitude), 9);
        }
        w.align(16);
    }
    w.into_bytes()
}
