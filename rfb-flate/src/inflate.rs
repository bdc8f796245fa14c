//! DEFLATE decompression, one block at a time.
//!
//! Block header: BFINAL (1 bit), BTYPE (2 bits; 0 stored, 1 fixed Huffman,
//! 2 dynamic Huffman, 3 reserved). Decoded bytes are appended to a
//! caller-owned buffer; the caller is responsible for keeping enough prior
//! output alive (at least the 32 KiB window) for back-references to resolve,
//! which is what makes cross-chunk continuation possible.

use crate::bitstream::BitReader;
use crate::consts::{
    BASE_DISTANCES, BASE_LENGTHS, CODE_LENGTH_ORDER, EXTRA_DISTANCE_BITS, EXTRA_LENGTH_BITS,
    NUM_DISTANCE_SYMBOLS, NUM_LENGTH_SYMBOLS,
};
use crate::error::{FlateError, Result};
use crate::prefix::{fixed_distance_decoder, fixed_literal_decoder, PrefixDecoder};

/// Decode a single DEFLATE block from `reader`, appending its output.
///
/// Returns the block's BFINAL flag.
pub fn decompress_block(reader: &mut BitReader<'_>, output: &mut Vec<u8>) -> Result<bool> {
    let bfinal = reader.read_bit()? == 1;
    let btype = reader.read_num(2)?;

    match btype {
        0 => inflate_stored(reader, output)?,
        1 => {
            let literals = fixed_literal_decoder()?;
            let distances = fixed_distance_decoder()?;
            inflate_codes(reader, output, &literals, &distances)?;
        }
        2 => {
            let (literals, distances) = read_code_tables(reader)?;
            inflate_codes(reader, output, &literals, &distances)?;
        }
        _ => return Err(FlateError::InvalidBlockType),
    }

    Ok(bfinal)
}

/// Decode blocks until one carries BFINAL.
pub fn decompress(reader: &mut BitReader<'_>, output: &mut Vec<u8>) -> Result<()> {
    while !decompress_block(reader, output)? {}
    Ok(())
}

/// Stored block: byte-aligned LEN, ~LEN, then LEN raw bytes.
fn inflate_stored(reader: &mut BitReader<'_>, output: &mut Vec<u8>) -> Result<()> {
    reader.flush_bits();

    let len = reader.read_num(16)?;
    let nlen = reader.read_num(16)?;
    if len != !nlen & 0xFFFF {
        return Err(FlateError::CorruptStoredBlock);
    }

    output.reserve(len as usize);
    for _ in 0..len {
        output.push(reader.read_num(8)? as u8);
    }
    Ok(())
}

/// Read the serialized dynamic code tables of a BTYPE=2 block.
///
/// The literal/length and distance code lengths are themselves compressed
/// with a third, 19-symbol "code length" alphabet whose own lengths are
/// stored as 3-bit values in a fixed permutation order. Symbols 16/17/18
/// are repeats (previous length 3-6 times, zeros 3-10 times, zeros 11-138
/// times).
fn read_code_tables(reader: &mut BitReader<'_>) -> Result<(PrefixDecoder, PrefixDecoder)> {
    let num_literals = reader.read_num(5)? as usize + 257;
    let num_distances = reader.read_num(5)? as usize + 1;
    let num_stored = reader.read_num(4)? as usize + 4;

    let mut cl_lengths = [0usize; 19];
    for &position in CODE_LENGTH_ORDER.iter().take(num_stored) {
        cl_lengths[position] = reader.read_num(3)? as usize;
    }
    let cl_decoder = PrefixDecoder::new(&cl_lengths)?;

    let total = num_literals + num_distances;
    let mut lengths = vec![0usize; total];
    let mut i = 0;
    while i < total {
        let symbol = cl_decoder.decode_symbol(reader)? as usize;

        if symbol <= 15 {
            lengths[i] = symbol;
            i += 1;
            continue;
        }

        let (value, repeats) = match symbol {
            16 => {
                if i == 0 {
                    return Err(FlateError::InvalidRepeat);
                }
                (lengths[i - 1], 3 + reader.read_num(2)? as usize)
            }
            17 => (0, 3 + reader.read_num(3)? as usize),
            18 => (0, 11 + reader.read_num(7)? as usize),
            _ => return Err(FlateError::InvalidCode),
        };

        if i + repeats > total {
            return Err(FlateError::InvalidRepeat);
        }
        for _ in 0..repeats {
            lengths[i] = value;
            i += 1;
        }
    }

    if lengths[256] == 0 {
        return Err(FlateError::MissingEndOfBlock);
    }

    let literals = PrefixDecoder::new(&lengths[..num_literals])?;
    let distances = PrefixDecoder::new(&lengths[num_literals..])?;
    Ok((literals, distances))
}

/// Decode the literal/length/distance symbol stream until end-of-block.
fn inflate_codes(
    reader: &mut BitReader<'_>,
    output: &mut Vec<u8>,
    literals: &PrefixDecoder,
    distances: &PrefixDecoder,
) -> Result<()> {
    loop {
        let symbol = literals.decode_symbol(reader)? as usize;

        if symbol < 256 {
            output.push(symbol as u8);
        } else if symbol == 256 {
            return Ok(());
        } else {
            let length_symbol = symbol - 257;
            if length_symbol >= NUM_LENGTH_SYMBOLS {
                return Err(FlateError::InvalidCode);
            }
            let length = BASE_LENGTHS[length_symbol] as usize
                + reader.read_num(EXTRA_LENGTH_BITS[length_symbol])? as usize;

            let distance_symbol = distances.decode_symbol(reader)? as usize;
            if distance_symbol >= NUM_DISTANCE_SYMBOLS {
                return Err(FlateError::InvalidCode);
            }
            let distance = BASE_DISTANCES[distance_symbol] as usize
                + reader.read_num(EXTRA_DISTANCE_BITS[distance_symbol])? as usize;

            if distance > output.len() {
                return Err(FlateError::DistanceTooFar { distance });
            }

            // Byte-by-byte so a run can overlap its own output
            // (distance < length duplicates the run).
            for _ in 0..length {
                output.push(output[output.len() - distance]);
            }
        }
    }
}
