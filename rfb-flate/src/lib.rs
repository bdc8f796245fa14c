//! DEFLATE (RFC 1951) and zlib (RFC 1950) implemented from scratch.
//!
//! This crate is the compression engine behind the ZRLE framebuffer encoding.
//! A VNC server spreads one continuous zlib stream across every ZRLE
//! rectangle of a session, so the decoder here is built around two layers:
//!
//! - stateless block decoding ([`inflate`]) that appends into a caller-owned
//!   output buffer, and
//! - [`ZlibStream`], a per-session continuation that keeps the 32 KiB LZ77
//!   sliding window alive between independently delivered compressed chunks.
//!
//! The compressor ([`deflate`], [`zlib::compress`]) exists for round-trip
//! testing and table generation; the client never sends compressed data.
//!
//! # Bit order
//!
//! Per RFC 1951: data elements are packed LSB-first into bytes, plain
//! integers are read LSB-first, and Huffman codes are read MSB-first.
//! [`BitReader`] and [`BitWriter`] expose both orders.

pub mod adler32;
pub mod bitstream;
pub mod consts;
pub mod deflate;
pub mod error;
pub mod huffman;
pub mod inflate;
pub mod prefix;
pub mod stream;
pub mod zlib;

pub use adler32::{adler32, adler32_update};
pub use bitstream::{BitReader, BitWriter};
pub use deflate::BlockKind;
pub use error::{FlateError, Result};
pub use prefix::{PrefixDecoder, PrefixEncoder};
pub use stream::ZlibStream;
