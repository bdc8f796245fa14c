//! Error type shared by the whole compression engine.

use thiserror::Error;

/// Failures raised while encoding or decoding DEFLATE/zlib data.
///
/// Every variant is terminal for the stream it occurred on; there is no
/// recovery or resynchronisation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FlateError {
    /// The bit source ran out before the requested bits were available.
    #[error("bit stream exhausted")]
    EndOfStream,

    /// A block header carried the reserved block type 3.
    #[error("reserved DEFLATE block type 3")]
    InvalidBlockType,

    /// A stored block's LEN and one's-complement NLEN fields disagree.
    #[error("stored block length check failed (LEN != !NLEN)")]
    CorruptStoredBlock,

    /// The code-length set claims more codes than the bit space allows.
    #[error("prefix code set is over-subscribed")]
    OverSubscribed,

    /// The code-length set leaves part of the bit space unused.
    #[error("prefix code set is incomplete")]
    Incomplete,

    /// No symbol matched within the maximum code length of 15 bits.
    #[error("invalid prefix code")]
    InvalidCode,

    /// A code-length repeat had nothing to repeat or overran the table.
    #[error("invalid code-length repeat")]
    InvalidRepeat,

    /// A dynamic block defines no code for the end-of-block symbol 256.
    #[error("dynamic block has no end-of-block code")]
    MissingEndOfBlock,

    /// An LZ77 back-reference points before the start of the output.
    #[error("back-reference distance {distance} exceeds produced output")]
    DistanceTooFar { distance: usize },

    /// The zlib CMF byte named a compression method other than DEFLATE.
    #[error("unsupported zlib compression method {0}")]
    UnsupportedCompressionMethod(u8),

    /// The zlib FLG byte requested a preset dictionary.
    #[error("zlib preset dictionaries are not supported")]
    PresetDictionaryUnsupported,

    /// The Adler-32 trailer did not match the decompressed output.
    #[error("adler-32 mismatch (expected {expected:#010x}, computed {computed:#010x})")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// The code-length restriction loop could not find a donor symbol.
    /// Indicates a bug in length generation, not bad input.
    #[error("huffman code length restriction failed")]
    HuffmanReductionFailed,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlateError>;
