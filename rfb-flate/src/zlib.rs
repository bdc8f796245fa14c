//! zlib framing (RFC 1950): a 2-byte header around DEFLATE plus a trailing
//! big-endian Adler-32 of the uncompressed data.

use crate::adler32::adler32;
use crate::bitstream::{BitReader, BitWriter};
use crate::deflate::{self, BlockKind};
use crate::error::{FlateError, Result};
use crate::inflate;

/// Check the CMF/FLG header pair.
///
/// Only compression method 8 (DEFLATE) is accepted and preset dictionaries
/// are rejected. FCHECK is not verified; it guards against transposed
/// bytes, not corruption, and the Adler-32 trailer subsumes it.
pub fn validate_header(cmf: u8, flg: u8) -> Result<()> {
    let method = cmf & 0x0F;
    if method != 8 {
        return Err(FlateError::UnsupportedCompressionMethod(method));
    }
    if flg & 0x20 != 0 {
        return Err(FlateError::PresetDictionaryUnsupported);
    }
    Ok(())
}

/// Decompress a complete zlib stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = BitReader::new(data);

    let cmf = reader.read_num(8)? as u8;
    let flg = reader.read_num(8)? as u8;
    validate_header(cmf, flg)?;

    let mut output = Vec::new();
    inflate::decompress(&mut reader, &mut output)?;

    reader.flush_bits();
    let mut expected = 0u32;
    for _ in 0..4 {
        expected = expected << 8 | reader.read_num(8)?;
    }

    let computed = adler32(&output);
    if expected != computed {
        return Err(FlateError::ChecksumMismatch { expected, computed });
    }

    Ok(output)
}

/// Compress `data` into a complete zlib stream.
pub fn compress(data: &[u8], kind: BlockKind) -> Result<Vec<u8>> {
    let mut output = BitWriter::new();

    // CINFO=7 advertises the full 32K window.
    let cmf: u32 = 7 << 4 | 8;
    output.push_num(cmf, 8);

    let flevel: u32 = 2;
    let fdict: u32 = 0;
    let partial = (cmf << 8 | flevel << 6 | fdict << 5) % 31;
    let fcheck = if partial == 0 { 0 } else { 31 - partial };
    output.push_num(flevel << 6 | fdict << 5 | fcheck, 8);

    deflate::compress(data, &mut output, kind)?;

    output.flush_bits();
    let adler = adler32(data);
    for shift in [24, 16, 8, 0] {
        output.push_num(adler >> shift & 0xFF, 8);
    }

    Ok(output.into_bytes())
}
