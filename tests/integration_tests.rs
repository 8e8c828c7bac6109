mod common;

use std::fs::File;
use std::io::Write;

use md5::{Digest, Md5};
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};

use s1l0::ancillary::AncillaryField;
use s1l0::bits::BitCursor;
use s1l0::echo::{geolocate, stack};
use s1l0::huffman::{self, Brc};
use s1l0::reconstruct::{reconstruct, M_CODE_CUTOFF, THIDX_CUTOFF};
use s1l0::{
    assemble_ancillary, read_packets, DataFormat, DecodedPacket, Decoder, Error, Payload,
    Result,
};

use common::{encode_bypass, encode_fdbaq, PacketBuilder};

/// Random FDBAQ user data for `num_quads` quads along with the expected samples.
fn random_fdbaq(rng: &mut StdRng, num_quads: usize) -> (Vec<u8>, Vec<Complex64>) {
    let num_blocks = num_quads.div_ceil(128);
    let brcs: Vec<u8> = (0..num_blocks).map(|_| rng.gen_range(0..=4)).collect();
    // alternate between the simple and normalized regimes
    let thidxs: Vec<u8> = brcs
        .iter()
        .enumerate()
        .map(|(i, brc)| {
            if i % 2 == 0 {
                rng.gen_range(0..=THIDX_CUTOFF[*brc as usize])
            } else {
                rng.gen_range(THIDX_CUTOFF[*brc as usize] + 1..=255)
            }
        })
        .collect();
    let components: [Vec<(u8, u8)>; 4] = std::array::from_fn(|_| {
        (0..num_quads)
            .map(|q| {
                let brc = brcs[q / 128] as usize;
                (rng.gen_range(0..=1), rng.gen_range(0..=M_CODE_CUTOFF[brc]))
            })
            .collect()
    });

    let value = |comp: usize, q: usize| {
        let block = q / 128;
        let (sign, m_code) = components[comp][q];
        reconstruct(Brc::new(brcs[block]).unwrap(), thidxs[block], m_code, sign).unwrap()
    };
    let mut expected = Vec::new();
    for q in 0..num_quads {
        expected.push(Complex64::new(value(0, q), value(2, q)));
        expected.push(Complex64::new(value(1, q), value(3, q)));
    }

    (encode_fdbaq(&brcs, &thidxs, &components), expected)
}

fn decode_all(dat: &[u8]) -> Vec<DecodedPacket> {
    Decoder::builder()
        .build()
        .decode(dat)
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn decode_fdbaq_packets() {
    let mut rng = StdRng::seed_from_u64(0x51);
    let mut dat = Vec::new();
    let mut expected = Vec::new();
    for (seq, num_quads) in [1usize, 128, 129, 257, 600].into_iter().enumerate() {
        let (user_data, samples) = random_fdbaq(&mut rng, num_quads);
        let builder = PacketBuilder {
            sequence_count: seq as u16,
            num_quads: num_quads as u16,
            ..Default::default()
        };
        dat.extend(builder.encode(&user_data));
        expected.push(samples);
    }

    let decoded = decode_all(&dat);
    assert_eq!(decoded.len(), expected.len());
    for (idx, (decoded, expected)) in decoded.iter().zip(&expected).enumerate() {
        let packet = &decoded.packet;
        assert_eq!(packet.format, DataFormat::D);
        assert_eq!(packet.primary.sequence_count, idx as u16);
        assert_eq!(packet.num_baq_blocks(), packet.num_quads().div_ceil(128));
        let samples = decoded.samples().expect("samples should decode");
        assert_eq!(samples.len(), 2 * packet.num_quads());
        assert_eq!(samples, &expected[..], "packet {idx}");
    }
}

#[test]
fn decode_bypass_packet() {
    let components: [Vec<(u8, u16)>; 4] = [
        vec![(0, 1), (1, 2), (0, 511)],
        vec![(1, 3), (0, 4), (0, 0)],
        vec![(0, 5), (0, 6), (1, 100)],
        vec![(1, 7), (1, 8), (0, 9)],
    ];
    let builder = PacketBuilder {
        baq_mode: 0,
        test_mode: 4,
        num_quads: 3,
        ..Default::default()
    };
    let dat = builder.encode(&encode_bypass(&components));

    let decoded = decode_all(&dat);
    assert_eq!(decoded[0].packet.format, DataFormat::B);
    assert_eq!(
        decoded[0].samples().unwrap(),
        &[
            Complex64::new(1.0, 5.0),
            Complex64::new(-3.0, -7.0),
            Complex64::new(-2.0, 6.0),
            Complex64::new(4.0, -8.0),
            Complex64::new(511.0, -100.0),
            Complex64::new(0.0, 9.0),
        ]
    );
}

#[test]
fn payload_failures_keep_headers_and_stream() {
    let mut rng = StdRng::seed_from_u64(7);
    let (good, expected) = random_fdbaq(&mut rng, 10);

    let mut dat = Vec::new();
    // format C is recognized but not decoded
    let format_c = PacketBuilder {
        baq_mode: 4,
        num_quads: 10,
        ..Default::default()
    };
    dat.extend(format_c.encode(&[0u8; 32]));
    // brc 7 in the first block
    let bad_brc = PacketBuilder {
        sequence_count: 1,
        num_quads: 10,
        ..Default::default()
    };
    dat.extend(bad_brc.encode(&[0xe0, 0, 0, 0]));
    let ok = PacketBuilder {
        sequence_count: 2,
        num_quads: 10,
        ..Default::default()
    };
    dat.extend(ok.encode(&good));

    let decoded = decode_all(&dat);
    assert_eq!(decoded.len(), 3);

    assert_eq!(decoded[0].packet.format, DataFormat::C);
    assert!(matches!(
        decoded[0].payload,
        Payload::Failed(Error::UnsupportedFormatC { baq_mode: 4 })
    ));
    assert!(matches!(
        decoded[1].error(),
        Some(Error::InvalidBrc { brc: 7, block: 0 })
    ));
    assert_eq!(decoded[1].packet.primary.sequence_count, 1);
    assert_eq!(decoded[2].samples().unwrap(), &expected[..]);
}

#[test]
fn truncated_file() {
    let packet = PacketBuilder::default().encode(&[]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&packet).unwrap();
    file.write_all(&packet).unwrap();
    // primary header and part of the secondary header
    file.write_all(&packet[..30]).unwrap();
    file.flush().unwrap();

    let reader = File::open(file.path()).unwrap();
    let zults: Vec<Result<_>> = read_packets(reader).collect();

    assert_eq!(zults.len(), 3);
    assert!(zults[0].is_ok());
    assert!(zults[1].is_ok());
    match &zults[2] {
        Err(err @ Error::TruncatedInput { needed, available }) => {
            assert_eq!(*needed, 62);
            assert_eq!(*available, 24);
            assert!(err.is_structural());
        }
        other => panic!("expected truncated input, got {other:?}"),
    }
}

#[test]
fn decoding_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut dat = Vec::new();
    for seq in 0..20u16 {
        let (user_data, _) = random_fdbaq(&mut rng, 200);
        let builder = PacketBuilder {
            sequence_count: seq,
            word_index: seq as u8,
            word: seq * 3,
            num_quads: 200,
            ..Default::default()
        };
        dat.extend(builder.encode(&user_data));
    }

    let checksum = |dat: &[u8]| {
        let mut hasher = Md5::new();
        for decoded in decode_all(dat) {
            hasher.update(serde_json::to_vec(&decoded.packet).unwrap());
            for sample in decoded.samples().unwrap() {
                hasher.update(sample.re.to_be_bytes());
                hasher.update(sample.im.to_be_bytes());
            }
        }
        hex::encode(hasher.finalize())
    };

    assert_eq!(checksum(&dat), checksum(&dat));
}

/// Packets carrying a full ancillary cycle, 0 through 64, then index 0 again.
fn ancillary_packets(x_position: f64, extra: usize) -> Vec<u8> {
    let x = x_position.to_bits();
    let mut dat = Vec::new();
    for (seq, index) in (0..65u8).chain(0..extra as u8).enumerate() {
        let word = match index {
            1..=4 => (x >> (16 * (4 - u64::from(index)))) as u16,
            _ => 0xa000 | u16::from(index),
        };
        let builder = PacketBuilder {
            sequence_count: seq as u16,
            word_index: index,
            word,
            baq_mode: 0,
            test_mode: 0,
            num_quads: 1,
            ..Default::default()
        };
        dat.extend(builder.encode(&[0u8; 8]));
    }
    dat
}

#[test]
fn ancillary_cycle() {
    let dat = ancillary_packets(-1_234_567.25, 1);
    let headers = read_packets(&dat[..]).map(|p| p.unwrap().secondary);
    let sets: Vec<_> = assemble_ancillary(headers)
        .collect::<Result<Vec<_>>>()
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert!(sets[0].complete);
    assert_eq!(sets[0].position()[0], -1_234_567.25);
    assert_eq!(sets[0].field(AncillaryField::PointingStatus), &[0xa000 | 41]);
    assert_eq!(sets[0].field(AncillaryField::TileTemperatures).len(), 21);
}

#[test]
fn ancillary_partial_cycle() {
    let dat = ancillary_packets(1.0, 10);
    let headers = read_packets(&dat[..]).map(|p| p.unwrap().secondary);
    let sets: Vec<_> = assemble_ancillary(headers)
        .collect::<Result<Vec<_>>>()
        .unwrap();

    assert_eq!(sets.len(), 2);
    assert!(!sets[1].complete);
    assert_eq!(sets[1].words[9], 0xa000 | 9);
    assert_eq!(sets[1].words[10], 0);
}

#[test]
fn geolocated_echoes() {
    let dat = ancillary_packets(7_000_000.0, 5);
    let echoes: Vec<_> = geolocate(decode_all(&dat)).collect();

    // echoes start at the packet that completes the first cycle
    assert_eq!(echoes.len(), 5);
    assert!(echoes.iter().all(|e| e.position[0] == 7_000_000.0));
    assert!(echoes.iter().all(|e| e.samples.len() == 2));

    let matrix = stack(&echoes);
    assert_eq!(matrix.dim(), (5, 2));
}

#[test]
fn huffman_random_streams_agree() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..200 {
        let brc = Brc::new(rng.gen_range(0..=4)).unwrap();
        let dat: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
        let mut fast = BitCursor::new(&dat);
        let mut generic = BitCursor::new(&dat);

        while fast.remaining() >= huffman::MAX_CODE_LEN {
            let a = huffman::decode(&mut fast, brc).unwrap();
            let b = huffman::decode_generic(&mut generic, brc).unwrap();
            assert_eq!(a, b);
            assert_eq!(fast.position(), generic.position());
        }
    }
}

#[test]
fn headers_serialize() {
    let builder = PacketBuilder {
        fine_time: 0x4000,
        ..Default::default()
    };
    let dat = builder.encode(&[]);
    let packet = read_packets(&dat[..]).next().unwrap().unwrap();

    assert_eq!(packet.user_data_length(), 0);
    assert!(packet.user_data().is_none());
    let json = serde_json::to_value(&packet).unwrap();
    assert_eq!(json["format"], "D");
    assert_eq!(json["secondary"]["sensor_mode"], "interferometric_wide_swath");
    assert_eq!(json["secondary"]["ssb"]["ssb_mode"], "imaging");
    assert_eq!(json["primary"]["process_id"], 65);

    let time = packet.secondary.time().unwrap();
    assert_eq!(time.timestamp(), 315_964_800 + 1_300_000_000);
    assert_eq!(time.timestamp_subsec_millis(), 250);
}
