//! Shared protocol structures and constants.

use crate::io::{RfbInStream, RfbOutStream};
use tokio::io::{AsyncRead, AsyncWrite};

// Encoding identifiers, in this client's preference order.

/// Raw encoding: uncompressed 4-byte pixels.
pub const ENCODING_RAW: i32 = 0;
/// CopyRect: copy a region already on screen.
pub const ENCODING_COPYRECT: i32 = 1;
/// ZRLE: zlib-compressed run-length tiles.
pub const ENCODING_ZRLE: i32 = 16;
/// Cursor pseudo-encoding: cursor shape delivery.
pub const ENCODING_CURSOR: i32 = -239;

// Security types.

/// No authentication.
pub const SECURITY_TYPE_NONE: u8 = 1;
/// DES challenge-response ("VNC Authentication").
pub const SECURITY_TYPE_VNC_AUTH: u8 = 2;

// Server-to-client message types.

/// FramebufferUpdate.
pub const SERVER_MSG_FRAMEBUFFER_UPDATE: u8 = 0;
/// SetColorMapEntries (unsupported: this client is true-color only).
pub const SERVER_MSG_SET_COLOR_MAP: u8 = 1;
/// Bell.
pub const SERVER_MSG_BELL: u8 = 2;
/// ServerCutText (server clipboard).
pub const SERVER_MSG_CUT_TEXT: u8 = 3;

// Pointer button bits.

/// Left mouse button.
pub const BUTTON_LEFT: u8 = 1 << 0;
/// Middle mouse button.
pub const BUTTON_MIDDLE: u8 = 1 << 1;
/// Right mouse button.
pub const BUTTON_RIGHT: u8 = 1 << 2;

/// Server pixel format, 16 bytes on the wire.
///
/// Layout: bits-per-pixel, depth, big-endian flag, true-color flag,
/// red/green/blue max (u16 each), red/green/blue shift, 3 bytes padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub depth: u8,
    pub big_endian: bool,
    pub true_color: bool,
    pub red_max: u16,
    pub green_max: u16,
    pub blue_max: u16,
    pub red_shift: u8,
    pub green_shift: u8,
    pub blue_shift: u8,
}

impl PixelFormat {
    /// Bytes each pixel occupies on the wire.
    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.bits_per_pixel).div_ceil(8)
    }

    /// Parse from the wire. Padding bytes are discarded.
    pub async fn read_from<R: AsyncRead + Unpin>(
        stream: &mut RfbInStream<R>,
    ) -> std::io::Result<Self> {
        let bits_per_pixel = stream.read_u8().await?;
        let depth = stream.read_u8().await?;
        let big_endian = stream.read_u8().await? != 0;
        let true_color = stream.read_u8().await? != 0;
        let red_max = stream.read_u16().await?;
        let green_max = stream.read_u16().await?;
        let blue_max = stream.read_u16().await?;
        let red_shift = stream.read_u8().await?;
        let green_shift = stream.read_u8().await?;
        let blue_shift = stream.read_u8().await?;
        stream.skip(3).await?;

        Ok(Self {
            bits_per_pixel,
            depth,
            big_endian,
            true_color,
            red_max,
            green_max,
            blue_max,
            red_shift,
            green_shift,
            blue_shift,
        })
    }

    /// Serialize to the wire.
    pub fn write_to<W: AsyncWrite + Unpin>(&self, stream: &mut RfbOutStream<W>) {
        stream.write_u8(self.bits_per_pixel);
        stream.write_u8(self.depth);
        stream.write_u8(self.big_endian.into());
        stream.write_u8(self.true_color.into());
        stream.write_u16(self.red_max);
        stream.write_u16(self.green_max);
        stream.write_u16(self.blue_max);
        stream.write_u8(self.red_shift);
        stream.write_u8(self.green_shift);
        stream.write_u8(self.blue_shift);
        stream.write_bytes(&[0, 0, 0]);
    }
}

/// Rectangle header of a framebuffer update, 12 bytes on the wire.
///
/// Only the header; the payload that follows is owned by the decoder for
/// `encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub encoding: i32,
}

impl Rectangle {
    /// Parse a rectangle header.
    pub async fn read_from<R: AsyncRead + Unpin>(
        stream: &mut RfbInStream<R>,
    ) -> std::io::Result<Self> {
        Ok(Self {
            x: stream.read_u16().await?,
            y: stream.read_u16().await?,
            width: stream.read_u16().await?,
            height: stream.read_u16().await?,
            encoding: stream.read_i32().await?,
        })
    }

    /// Serialize a rectangle header.
    pub fn write_to<W: AsyncWrite + Unpin>(&self, stream: &mut RfbOutStream<W>) {
        stream.write_u16(self.x);
        stream.write_u16(self.y);
        stream.write_u16(self.width);
        stream.write_u16(self.height);
        stream.write_i32(self.encoding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn rgb888() -> PixelFormat {
        PixelFormat {
            bits_per_pixel: 32,
            depth: 24,
            big_endian: false,
            true_color: true,
            red_max: 255,
            green_max: 255,
            blue_max: 255,
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
        }
    }

    #[tokio::test]
    async fn pixel_format_roundtrip() {
        let original = rgb888();

        let mut buffer = Vec::new();
        let mut out = RfbOutStream::new(&mut buffer);
        original.write_to(&mut out);
        out.flush().await.unwrap();
        assert_eq!(buffer.len(), 16);

        let mut input = RfbInStream::new(Cursor::new(buffer));
        let parsed = PixelFormat::read_from(&mut input).await.unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.bytes_per_pixel(), 4);
    }

    #[tokio::test]
    async fn rectangle_roundtrip() {
        let original = Rectangle {
            x: 64,
            y: 128,
            width: 800,
            height: 600,
            encoding: ENCODING_ZRLE,
        };

        let mut buffer = Vec::new();
        let mut out = RfbOutStream::new(&mut buffer);
        original.write_to(&mut out);
        out.flush().await.unwrap();
        assert_eq!(buffer.len(), 12);

        let mut input = RfbInStream::new(Cursor::new(buffer));
        assert_eq!(Rectangle::read_from(&mut input).await.unwrap(), original);
    }

    #[tokio::test]
    async fn negative_encoding_survives_roundtrip() {
        let original = Rectangle {
            x: 0,
            y: 0,
            width: 16,
            height: 16,
            encoding: ENCODING_CURSOR,
        };

        let mut buffer = Vec::new();
        let mut out = RfbOutStream::new(&mut buffer);
        original.write_to(&mut out);
        out.flush().await.unwrap();

        let mut input = RfbInStream::new(Cursor::new(buffer));
        let parsed = Rectangle::read_from(&mut input).await.unwrap();
        assert_eq!(parsed.encoding, -239);
    }
}
