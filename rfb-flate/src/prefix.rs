//! Canonical prefix (Huffman) code tables.
//!
//! A canonical code is fully determined by the per-symbol code lengths:
//! codes of a given length are lexicographically consecutive in symbol
//! order, and shorter codes precede longer ones. Both directions here are
//! built from a plain length vector and validated against the Kraft sum.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{FlateError, Result};

/// Longest prefix code DEFLATE permits.
pub const MAX_CODE_LENGTH: usize = 15;

/// Decoding table: code lengths to symbols.
///
/// Stores only the per-length code counts plus the symbols sorted by
/// (length, symbol index); decoding walks the lengths accumulating bits
/// MSB-first without materialising a full code table.
#[derive(Debug, Clone)]
pub struct PrefixDecoder {
    length_count: [u16; MAX_CODE_LENGTH + 1],
    symbols: Vec<u16>,
}

impl PrefixDecoder {
    /// Build a decoder from per-symbol code lengths (0 = symbol absent).
    ///
    /// The set must exactly fill the code space: an over-subscribed set
    /// fails with [`FlateError::OverSubscribed`], an incomplete one with
    /// [`FlateError::Incomplete`]. An all-zero set is accepted and yields a
    /// table with no codes (the legal "no distance codes" case); any decode
    /// attempt against it fails with [`FlateError::InvalidCode`].
    pub fn new(code_lengths: &[usize]) -> Result<Self> {
        let mut length_count = [0u16; MAX_CODE_LENGTH + 1];
        for &len in code_lengths {
            debug_assert!(len <= MAX_CODE_LENGTH);
            length_count[len] += 1;
        }

        if length_count[0] as usize == code_lengths.len() {
            return Ok(Self {
                length_count,
                symbols: Vec::new(),
            });
        }

        validate_kraft(&length_count, false)?;

        // First index into the symbol table for each length.
        let mut next_index = [0u16; MAX_CODE_LENGTH + 2];
        for len in 1..=MAX_CODE_LENGTH {
            next_index[len + 1] = next_index[len] + length_count[len];
        }

        let mut symbols = vec![0u16; code_lengths.len()];
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len != 0 {
                symbols[next_index[len] as usize] = symbol as u16;
                next_index[len] += 1;
            }
        }

        Ok(Self {
            length_count,
            symbols,
        })
    }

    /// Decode one symbol, consuming code bits MSB-first from `reader`.
    pub fn decode_symbol(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        let mut code = 0u32; // bits accumulated so far
        let mut first = 0u32; // first canonical code of the current length
        let mut index = 0u32; // symbol-table offset for the current length

        for len in 1..=MAX_CODE_LENGTH {
            code |= u32::from(reader.read_bit()?);
            let count = u32::from(self.length_count[len]);
            if code - first < count {
                return Ok(self.symbols[(index + (code - first)) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }

        Err(FlateError::InvalidCode)
    }
}

/// Encoding table: symbols to canonical code values.
#[derive(Debug, Clone, Default)]
pub struct PrefixEncoder {
    code_lengths: Vec<usize>,
    codes: Vec<u32>,
}

impl PrefixEncoder {
    /// Build an encoder from per-symbol code lengths.
    ///
    /// Unlike the decoder, an under-subscribed set is tolerated only in the
    /// trivial case where every length is zero (an encoder that will never
    /// be asked to emit anything).
    pub fn new(code_lengths: &[usize]) -> Result<Self> {
        let mut length_count = [0u16; MAX_CODE_LENGTH + 1];
        for &len in code_lengths {
            debug_assert!(len <= MAX_CODE_LENGTH);
            length_count[len] += 1;
        }

        let no_codes = length_count[0] as usize == code_lengths.len();
        validate_kraft(&length_count, no_codes)?;

        // First canonical code value for each length.
        let mut next_code = [0u32; MAX_CODE_LENGTH + 2];
        for len in 1..=MAX_CODE_LENGTH {
            next_code[len + 1] = (next_code[len] + u32::from(length_count[len])) << 1;
        }

        let mut codes = vec![0u32; code_lengths.len()];
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len != 0 {
                codes[symbol] = next_code[len];
                next_code[len] += 1;
            }
        }

        Ok(Self {
            code_lengths: code_lengths.to_vec(),
            codes,
        })
    }

    /// Number of symbols in the alphabet, including absent ones.
    pub fn symbol_count(&self) -> usize {
        self.code_lengths.len()
    }

    /// Canonical code value of `symbol`.
    pub fn code(&self, symbol: usize) -> u32 {
        self.codes[symbol]
    }

    /// Code length of `symbol` in bits (0 if absent).
    pub fn code_length(&self, symbol: usize) -> usize {
        self.code_lengths[symbol]
    }

    /// The length vector this table was built from.
    pub fn lengths(&self) -> &[usize] {
        &self.code_lengths
    }

    /// Emit the code for `symbol`, MSB-first.
    pub fn push_symbol(&self, writer: &mut BitWriter, symbol: usize) {
        writer.push_code(self.codes[symbol], self.code_lengths[symbol] as u32);
    }
}

/// Kraft sum check shared by both table directions.
///
/// Walks lengths from 1 to 15 doubling the remaining code space and
/// subtracting the codes claimed at each length.
fn validate_kraft(length_count: &[u16; MAX_CODE_LENGTH + 1], allow_incomplete: bool) -> Result<()> {
    let mut left: i32 = 1;
    for len in 1..=MAX_CODE_LENGTH {
        left <<= 1;
        left -= i32::from(length_count[len]);
        if left < 0 {
            return Err(FlateError::OverSubscribed);
        }
    }
    if left > 0 && !allow_incomplete {
        return Err(FlateError::Incomplete);
    }
    Ok(())
}

/// Code lengths of the fixed literal/length alphabet (RFC 1951, 3.2.6).
fn fixed_literal_lengths() -> Vec<usize> {
    let mut lengths = vec![0usize; 288];
    lengths[0..=143].fill(8);
    lengths[144..=255].fill(9);
    lengths[256..=279].fill(7);
    lengths[280..=287].fill(8);
    lengths
}

/// Decoder for the fixed literal/length alphabet.
pub fn fixed_literal_decoder() -> Result<PrefixDecoder> {
    PrefixDecoder::new(&fixed_literal_lengths())
}

/// Decoder for the fixed distance alphabet: all 32 symbols at 5 bits.
pub fn fixed_distance_decoder() -> Result<PrefixDecoder> {
    PrefixDecoder::new(&[5usize; 32])
}

/// Encoder for the fixed literal/length alphabet.
pub fn fixed_literal_encoder() -> Result<PrefixEncoder> {
    PrefixEncoder::new(&fixed_literal_lengths())
}

/// Encoder for the fixed distance alphabet.
pub fn fixed_distance_encoder() -> Result<PrefixEncoder> {
    PrefixEncoder::new(&[5usize; 32])
}
