//! Round-trip properties and cross-checks against the reference zlib
//! implementation (`flate2`).

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use proptest::prelude::*;
use rfb_flate::deflate::BlockKind;
use rfb_flate::prefix::{PrefixDecoder, PrefixEncoder};
use rfb_flate::{adler32, huffman, zlib, BitReader, BitWriter};
use std::io::{Read, Write};

fn reference_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn reference_decompress(data: &[u8]) -> Vec<u8> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).unwrap();
    out
}

#[test]
fn reference_decoder_accepts_our_streams() {
    let data = b"interoperability check against the reference implementation";
    for kind in [BlockKind::Stored, BlockKind::Fixed, BlockKind::Dynamic] {
        let ours = zlib::compress(data, kind).unwrap();
        assert_eq!(reference_decompress(&ours), data, "{kind:?}");
    }
}

#[test]
fn our_decoder_accepts_reference_streams() {
    let data: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
    let reference = reference_compress(&data);
    assert_eq!(zlib::decompress(&reference).unwrap(), data);
}

proptest! {
    #[test]
    fn deflate_roundtrip_identity(data in prop::collection::vec(any::<u8>(), 0..512)) {
        for kind in [BlockKind::Stored, BlockKind::Fixed, BlockKind::Dynamic] {
            let mut writer = BitWriter::new();
            rfb_flate::deflate::compress(&data, &mut writer, kind).unwrap();
            let bytes = writer.into_bytes();

            let mut reader = BitReader::new(&bytes);
            let mut output = Vec::new();
            rfb_flate::inflate::decompress(&mut reader, &mut output).unwrap();
            prop_assert_eq!(&output, &data);
        }
    }

    #[test]
    fn zlib_roundtrip_identity(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let compressed = zlib::compress(&data, BlockKind::Dynamic).unwrap();
        prop_assert_eq!(zlib::decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn reference_accepts_arbitrary_streams(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let compressed = zlib::compress(&data, BlockKind::Dynamic).unwrap();
        prop_assert_eq!(reference_decompress(&compressed), data);
    }

    #[test]
    fn adler_matches_update_split(
        data in prop::collection::vec(any::<u8>(), 0..256),
        split in 0usize..256,
    ) {
        let split = split.min(data.len());
        let (left, right) = data.split_at(split);
        prop_assert_eq!(
            adler32::adler32(&data),
            adler32::adler32_update(adler32::adler32(left), right)
        );
    }

    #[test]
    fn generated_lengths_build_inverse_tables(
        freqs in prop::collection::vec(0usize..1000, 2..64),
    ) {
        let lengths = huffman::code_lengths(&freqs, 15).unwrap();
        prop_assert!(lengths.iter().all(|&len| len <= 15));

        // Kraft equality: the code space is exactly filled.
        let kraft: u64 = lengths
            .iter()
            .filter(|&&len| len > 0)
            .map(|&len| 1u64 << (15 - len))
            .sum();
        prop_assert_eq!(kraft, 1u64 << 15);

        let encoder = PrefixEncoder::new(&lengths).unwrap();
        let decoder = PrefixDecoder::new(&lengths).unwrap();

        // Every live symbol survives an encode/decode trip.
        let mut writer = BitWriter::new();
        let live: Vec<usize> = (0..lengths.len()).filter(|&s| lengths[s] > 0).collect();
        for &symbol in &live {
            encoder.push_symbol(&mut writer, symbol);
        }
        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        for &symbol in &live {
            prop_assert_eq!(decoder.decode_symbol(&mut reader).unwrap() as usize, symbol);
        }
    }
}
