//! Session-continuous inflate.
//!
//! ZRLE spreads a single zlib stream across every rectangle of a VNC
//! session: the 2-byte zlib header arrives exactly once, in front of the
//! first rectangle's payload, and later rectangles carry raw DEFLATE
//! continuation whose back-references may reach into output produced for
//! earlier rectangles. [`ZlibStream`] is that continuation state: it owns
//! the 32 KiB sliding window and decodes one delivered chunk at a time.
//!
//! The stream never ends from the decoder's point of view (the server
//! simply stops sending), so no Adler-32 trailer is ever seen here; whole
//! streams with trailers go through [`crate::zlib::decompress`] instead.

use crate::bitstream::BitReader;
use crate::consts::WINDOW_SIZE;
use crate::error::{FlateError, Result};
use crate::inflate;
use crate::zlib::validate_header;

/// Per-session zlib decompression context.
///
/// Created when a session reaches its running state and dropped with it.
/// Every ZRLE payload of the session must pass through the same instance,
/// in arrival order.
#[derive(Debug)]
pub struct ZlibStream {
    /// Whether the leading CMF/FLG pair has been consumed yet.
    saw_header: bool,
    /// Most recent `WINDOW_SIZE` bytes of decoded output, zero-primed.
    window: Vec<u8>,
}

impl Default for ZlibStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ZlibStream {
    /// Fresh stream: header not yet seen, window primed with zeros.
    pub fn new() -> Self {
        Self {
            saw_header: false,
            window: vec![0u8; WINDOW_SIZE],
        }
    }

    /// Decode one delivered chunk, returning the newly produced bytes.
    ///
    /// On the first call the chunk's leading two bytes are parsed and
    /// validated as the zlib header. Each chunk must contain a whole number
    /// of DEFLATE blocks ending on a byte boundary; blocks are decoded
    /// until the chunk is exhausted, ignoring BFINAL.
    pub fn feed(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let body = if self.saw_header {
            payload
        } else {
            let (&cmf, rest) = payload.split_first().ok_or(FlateError::EndOfStream)?;
            let (&flg, rest) = rest.split_first().ok_or(FlateError::EndOfStream)?;
            validate_header(cmf, flg)?;
            self.saw_header = true;
            rest
        };

        // Prefix the window so back-references into earlier chunks resolve.
        let mut output = self.window.clone();
        let mut reader = BitReader::new(body);
        while !reader.is_empty() {
            inflate::decompress_block(&mut reader, &mut output)?;
        }

        let produced = output[WINDOW_SIZE..].to_vec();

        let keep_from = output.len() - WINDOW_SIZE;
        self.window.clear();
        self.window.extend_from_slice(&output[keep_from..]);

        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::BitWriter;
    use crate::deflate::{self, BlockKind};
    use crate::prefix::{fixed_distance_encoder, fixed_literal_encoder};

    /// Deflate `data` as one block plus the byte-aligning sync flush a
    /// server would emit after each rectangle. No zlib framing.
    fn deflate_chunk(data: &[u8], kind: BlockKind) -> Vec<u8> {
        let mut writer = BitWriter::new();
        deflate::compress(data, &mut writer, kind).unwrap();
        deflate::sync_flush(&mut writer);
        writer.into_bytes()
    }

    fn with_header(mut chunk: Vec<u8>) -> Vec<u8> {
        let mut payload = vec![0x78, 0x9C];
        payload.append(&mut chunk);
        payload
    }

    #[test]
    fn first_chunk_consumes_header() {
        let mut stream = ZlibStream::new();
        let payload = with_header(deflate_chunk(b"first rectangle", BlockKind::Fixed));
        assert_eq!(stream.feed(&payload).unwrap(), b"first rectangle");
    }

    #[test]
    fn header_appears_only_once() {
        let mut stream = ZlibStream::new();
        stream
            .feed(&with_header(deflate_chunk(b"one", BlockKind::Fixed)))
            .unwrap();
        // Second chunk is raw continuation; 0x78 0x9C here would be data.
        let out = stream
            .feed(&deflate_chunk(b"two", BlockKind::Stored))
            .unwrap();
        assert_eq!(out, b"two");
    }

    #[test]
    fn bad_header_rejected() {
        let mut stream = ZlibStream::new();
        assert_eq!(
            stream.feed(&[0x71, 0x00, 0x00]),
            Err(FlateError::UnsupportedCompressionMethod(1))
        );
        assert_eq!(
            stream.feed(&[0x78, 0x20, 0x00]),
            Err(FlateError::PresetDictionaryUnsupported)
        );
    }

    #[test]
    fn back_reference_spans_chunks() {
        let mut stream = ZlibStream::new();
        stream
            .feed(&with_header(deflate_chunk(b"ABCD", BlockKind::Fixed)))
            .unwrap();

        // Hand-built continuation: one fixed block that copies the four
        // bytes the previous chunk produced (length 4, distance 4).
        let lit = fixed_literal_encoder().unwrap();
        let dist = fixed_distance_encoder().unwrap();
        let mut w = BitWriter::new();
        w.push_bit(1);
        w.push_num(1, 2);
        lit.push_symbol(&mut w, 257 + 1); // length 4
        dist.push_symbol(&mut w, 3); // distance 4
        lit.push_symbol(&mut w, 256);
        deflate::sync_flush(&mut w);

        let out = stream.feed(&w.into_bytes()).unwrap();
        assert_eq!(out, b"ABCD");
    }

    #[test]
    fn zero_primed_window_serves_early_references() {
        // A reference reaching behind all produced output reads the
        // zero-primed window rather than failing.
        let mut stream = ZlibStream::new();
        let lit = fixed_literal_encoder().unwrap();
        let dist = fixed_distance_encoder().unwrap();
        let mut w = BitWriter::new();
        w.push_bit(1);
        w.push_num(1, 2);
        lit.push_symbol(&mut w, 257); // length 3
        dist.push_symbol(&mut w, 9); // base 25, 3 extra bits
        w.push_num(0, 3); // distance 25
        lit.push_symbol(&mut w, 256);
        deflate::sync_flush(&mut w);

        let payload = with_header(w.into_bytes());
        assert_eq!(stream.feed(&payload).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn window_slides_past_large_output() {
        let mut stream = ZlibStream::new();
        let big: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();
        let out = stream
            .feed(&with_header(deflate_chunk(&big, BlockKind::Stored)))
            .unwrap();
        assert_eq!(out, big);

        // A follow-up reference to the last byte of the previous chunk.
        let lit = fixed_literal_encoder().unwrap();
        let dist = fixed_distance_encoder().unwrap();
        let mut w = BitWriter::new();
        w.push_bit(1);
        w.push_num(1, 2);
        lit.push_symbol(&mut w, 257); // length 3
        dist.push_symbol(&mut w, 0); // distance 1
        lit.push_symbol(&mut w, 256);
        deflate::sync_flush(&mut w);

        let tail = big[big.len() - 1];
        assert_eq!(stream.feed(&w.into_bytes()).unwrap(), vec![tail; 3]);
    }

    #[test]
    fn multiple_blocks_in_one_chunk() {
        let mut chunk = deflate_chunk(b"alpha ", BlockKind::Stored);
        chunk.extend_from_slice(&deflate_chunk(b"beta", BlockKind::Stored));
        let mut stream = ZlibStream::new();
        let out = stream.feed(&with_header(chunk)).unwrap();
        assert_eq!(out, b"alpha beta");
    }
}
