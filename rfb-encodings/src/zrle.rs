//! ZRLE encoding (type 16): zlib-compressed run-length tiles.
//!
//! # Wire format
//!
//! A rectangle carries a `u32` payload length and that many compressed
//! bytes. All rectangles of a session share ONE zlib stream: the 2-byte
//! zlib header appears in front of the first rectangle's payload only, and
//! LZ77 back-references may reach into output produced for earlier
//! rectangles. The decoder therefore owns a [`ZlibStream`] for the whole
//! session.
//!
//! # Tile format
//!
//! The decompressed data is a sequence of tiles, up to 64x64 pixels,
//! row-major across the rectangle with edge tiles clipped. Each tile
//! starts with a sub-encoding byte:
//!
//! | byte | meaning |
//! |---|---|
//! | 0 | raw CPIXELs, row-major |
//! | 1 | solid: a single CPIXEL fills the tile |
//! | 2..=16 | packed palette of that size (1/2/4-bit indices) |
//! | 128 | plain RLE |
//! | 130..=255 | palette RLE, palette size = byte - 128 |
//!
//! 17..=127 and 129 are TRLE's palette-reuse modes and invalid in ZRLE.
//!
//! A CPIXEL is 3 bytes, channel order (B, G, R), and becomes the packed
//! framebuffer value `0x00RRGGBB`. Packed-palette indices are MSB-first
//! with every tile row padded to a whole byte. An RLE run length is the
//! sum of its 255-valued continuation bytes plus the final byte, plus one:
//! `[255, 255, 0]` encodes 511.

use crate::{Decoder, Framebuffer, Rectangle, RfbInStream, ENCODING_ZRLE};
use anyhow::{bail, Context, Result};
use rfb_common::Rect;
use rfb_flate::ZlibStream;
use tokio::io::AsyncRead;
use tracing::{debug, trace};

/// Tile edge length; the last row/column of tiles may be smaller.
const TILE_SIZE: u16 = 64;

/// Decoder for ZRLE rectangles.
///
/// Holds the session's zlib continuation; create exactly one per
/// connection and feed every ZRLE rectangle through it in arrival order.
pub struct ZrleDecoder {
    stream: ZlibStream,
}

impl Default for ZrleDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZrleDecoder {
    /// Fresh decoder with an unopened zlib stream.
    pub fn new() -> Self {
        Self {
            stream: ZlibStream::new(),
        }
    }
}

impl Decoder for ZrleDecoder {
    fn encoding_type(&self) -> i32 {
        ENCODING_ZRLE
    }

    async fn decode<R: AsyncRead + Unpin>(
        &mut self,
        stream: &mut RfbInStream<R>,
        rect: &Rectangle,
        framebuffer: &mut Framebuffer,
    ) -> Result<()> {
        let payload_len = stream
            .read_u32()
            .await
            .context("zrle: reading payload length")? as usize;
        let payload = stream
            .read_vec(payload_len)
            .await
            .context("zrle: reading payload")?;

        let data = self
            .stream
            .feed(&payload)
            .context("zrle: inflating payload")?;
        trace!(
            compressed = payload_len,
            decompressed = data.len(),
            "zrle payload inflated"
        );

        let mut cursor = TileCursor::new(&data);
        decode_tiles(&mut cursor, rect, framebuffer)?;

        if cursor.remaining() > 0 {
            debug!(trailing = cursor.remaining(), "zrle rectangle over-long");
            bail!(
                "zrle: {} trailing bytes after the last tile",
                cursor.remaining()
            );
        }
        Ok(())
    }
}

/// Byte cursor over one rectangle's decompressed tile data.
struct TileCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TileCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            bail!("zrle: tile data exhausted");
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    fn read_exact(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            bail!(
                "zrle: tile data exhausted (need {count} bytes, have {})",
                self.remaining()
            );
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// One compact pixel: wire bytes (B, G, R) packed as `0x00RRGGBB`.
    fn read_cpixel(&mut self) -> Result<u32> {
        let bytes = self.read_exact(3)?;
        Ok(u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16)
    }

    /// RLE run length: continuation bytes sum plus one.
    fn read_run_length(&mut self) -> Result<usize> {
        let mut length = 1usize;
        loop {
            let byte = self.read_u8()?;
            length += byte as usize;
            if byte != 255 {
                return Ok(length);
            }
        }
    }

    fn read_palette(&mut self, size: usize) -> Result<Vec<u32>> {
        (0..size).map(|_| self.read_cpixel()).collect()
    }
}

/// Walk the rectangle's 64x64 tile grid in row-major order.
fn decode_tiles(cursor: &mut TileCursor<'_>, rect: &Rectangle, fb: &mut Framebuffer) -> Result<()> {
    let mut tile_y = 0u16;
    while tile_y < rect.height {
        let tile_h = TILE_SIZE.min(rect.height - tile_y);
        let mut tile_x = 0u16;
        while tile_x < rect.width {
            let tile_w = TILE_SIZE.min(rect.width - tile_x);
            decode_tile(
                cursor,
                rect.x + tile_x,
                rect.y + tile_y,
                tile_w,
                tile_h,
                fb,
            )
            .with_context(|| {
                format!("zrle: tile at +{tile_x}+{tile_y} ({tile_w}x{tile_h})")
            })?;
            tile_x += TILE_SIZE;
        }
        tile_y += TILE_SIZE;
    }
    Ok(())
}

fn decode_tile(
    cursor: &mut TileCursor<'_>,
    abs_x: u16,
    abs_y: u16,
    width: u16,
    height: u16,
    fb: &mut Framebuffer,
) -> Result<()> {
    let sub_encoding = cursor.read_u8()?;
    match sub_encoding {
        0 => decode_raw_tile(cursor, abs_x, abs_y, width, height, fb),
        1 => {
            let rgb = cursor.read_cpixel()?;
            fb.fill_rect(
                Rect::new(abs_x as i32, abs_y as i32, u32::from(width), u32::from(height)),
                rgb,
            )
        }
        2..=16 => decode_packed_palette_tile(
            cursor,
            abs_x,
            abs_y,
            width,
            height,
            sub_encoding as usize,
            fb,
        ),
        128 => decode_plain_rle_tile(cursor, abs_x, abs_y, width, height, fb),
        130..=255 => decode_palette_rle_tile(
            cursor,
            abs_x,
            abs_y,
            width,
            height,
            (sub_encoding - 128) as usize,
            fb,
        ),
        // 17..=127 reuse a previous palette and 129 reuses it under RLE;
        // both exist only in TRLE.
        _ => bail!("invalid zrle sub-encoding {sub_encoding}"),
    }
}

fn decode_raw_tile(
    cursor: &mut TileCursor<'_>,
    abs_x: u16,
    abs_y: u16,
    width: u16,
    height: u16,
    fb: &mut Framebuffer,
) -> Result<()> {
    for y in 0..height {
        for x in 0..width {
            let rgb = cursor.read_cpixel()?;
            fb.put_pixel(abs_x + x, abs_y + y, rgb)?;
        }
    }
    Ok(())
}

fn decode_packed_palette_tile(
    cursor: &mut TileCursor<'_>,
    abs_x: u16,
    abs_y: u16,
    width: u16,
    height: u16,
    palette_size: usize,
    fb: &mut Framebuffer,
) -> Result<()> {
    let palette = cursor.read_palette(palette_size)?;

    let bits = match palette_size {
        2 => 1,
        3 | 4 => 2,
        _ => 4,
    };
    let mask = (1u8 << bits) - 1;
    let row_bytes = (width as usize * bits).div_ceil(8);

    for y in 0..height {
        let packed = cursor.read_exact(row_bytes)?;
        let mut bit_offset = 0usize;
        for x in 0..width {
            let byte = packed[bit_offset / 8];
            let shift = 8 - bits - bit_offset % 8;
            let index = usize::from(byte >> shift & mask);
            let rgb = *palette
                .get(index)
                .with_context(|| format!("palette index {index} out of {palette_size}"))?;
            fb.put_pixel(abs_x + x, abs_y + y, rgb)?;
            bit_offset += bits;
        }
    }
    Ok(())
}

fn decode_plain_rle_tile(
    cursor: &mut TileCursor<'_>,
    abs_x: u16,
    abs_y: u16,
    width: u16,
    height: u16,
    fb: &mut Framebuffer,
) -> Result<()> {
    let total = width as usize * height as usize;
    let mut filled = 0usize;

    while filled < total {
        let rgb = cursor.read_cpixel()?;
        let run = cursor.read_run_length()?;
        if filled + run > total {
            bail!("rle run of {run} overruns tile ({} pixels left)", total - filled);
        }
        for _ in 0..run {
            let x = (filled % width as usize) as u16;
            let y = (filled / width as usize) as u16;
            fb.put_pixel(abs_x + x, abs_y + y, rgb)?;
            filled += 1;
        }
    }
    Ok(())
}

fn decode_palette_rle_tile(
    cursor: &mut TileCursor<'_>,
    abs_x: u16,
    abs_y: u16,
    width: u16,
    height: u16,
    palette_size: usize,
    fb: &mut Framebuffer,
) -> Result<()> {
    let palette = cursor.read_palette(palette_size)?;
    let total = width as usize * height as usize;
    let mut filled = 0usize;

    while filled < total {
        let code = cursor.read_u8()?;
        // Top bit set marks the start of a run; clear means one pixel.
        let (index, run) = if code & 0x80 == 0 {
            (usize::from(code), 1)
        } else {
            (usize::from(code & 0x7F), cursor.read_run_length()?)
        };

        let rgb = *palette
            .get(index)
            .with_context(|| format!("palette index {index} out of {palette_size}"))?;
        if filled + run > total {
            bail!("rle run of {run} overruns tile ({} pixels left)", total - filled);
        }
        for _ in 0..run {
            let x = (filled % width as usize) as u16;
            let y = (filled / width as usize) as u16;
            fb.put_pixel(abs_x + x, abs_y + y, rgb)?;
            filled += 1;
        }
    }
    Ok(())
}
