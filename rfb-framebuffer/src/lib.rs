//! The client-side framebuffer.
//!
//! One contiguous row-major raster, 4 bytes per pixel. After negotiation
//! the client renders everything as packed `0x00RRGGBB` stored as
//! little-endian 32-bit words, so the byte order in memory is B, G, R, 0.
//! Decoders mutate the buffer in place; the host reads it between polls
//! through [`Framebuffer::data`].

use anyhow::{anyhow, Result};
use rfb_common::Rect;

/// Bytes per framebuffer pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// An owned `width x height` pixel raster.
///
/// The buffer lives from ServerInit to session close and is only ever
/// mutated by the session's update loop.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl Framebuffer {
    /// Allocate a zeroed (black) framebuffer.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; usize::from(width) * usize::from(height) * BYTES_PER_PIXEL],
        }
    }

    /// Framebuffer width in pixels.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Framebuffer height in pixels.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Read-only view of the raster, row-major, 4 bytes per pixel,
    /// low-byte-first words encoding `0x00RRGGBB`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Store one pixel given as a packed `0x00RRGGBB` value.
    pub fn put_pixel(&mut self, x: u16, y: u16, rgb: u32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(anyhow!(
                "pixel ({x}, {y}) outside {}x{} framebuffer",
                self.width,
                self.height
            ));
        }
        let offset = self.pixel_offset(x, y);
        self.data[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&rgb.to_le_bytes());
        Ok(())
    }

    /// Packed `0x00RRGGBB` value of one pixel.
    pub fn pixel(&self, x: u16, y: u16) -> Result<u32> {
        if x >= self.width || y >= self.height {
            return Err(anyhow!(
                "pixel ({x}, {y}) outside {}x{} framebuffer",
                self.width,
                self.height
            ));
        }
        let offset = self.pixel_offset(x, y);
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[offset..offset + BYTES_PER_PIXEL]);
        Ok(u32::from_le_bytes(word))
    }

    /// Fill a rectangle with one packed pixel value.
    pub fn fill_rect(&mut self, rect: Rect, rgb: u32) -> Result<()> {
        self.validate_rect(rect)?;
        let word = rgb.to_le_bytes();
        for y in 0..rect.height as usize {
            let mut offset = self.pixel_offset(rect.x as u16, rect.y as u16 + y as u16);
            for _ in 0..rect.width {
                self.data[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&word);
                offset += BYTES_PER_PIXEL;
            }
        }
        Ok(())
    }

    /// Blit raw wire pixels (tightly packed rows of 4-byte pixels) into a
    /// rectangle.
    pub fn image_rect(&mut self, rect: Rect, pixels: &[u8]) -> Result<()> {
        self.validate_rect(rect)?;
        let row_bytes = rect.width as usize * BYTES_PER_PIXEL;
        let needed = row_bytes * rect.height as usize;
        if pixels.len() < needed {
            return Err(anyhow!(
                "image data too short: {} bytes for {} required",
                pixels.len(),
                needed
            ));
        }

        for y in 0..rect.height as usize {
            let dst = self.pixel_offset(rect.x as u16, rect.y as u16 + y as u16);
            let src = y * row_bytes;
            self.data[dst..dst + row_bytes].copy_from_slice(&pixels[src..src + row_bytes]);
        }
        Ok(())
    }

    /// Copy a `dest`-sized region whose top-left source corner is
    /// `(src_x, src_y)` to `dest`.
    ///
    /// The source region is snapshotted before any write, so overlapping
    /// copies always read the pre-copy pixels.
    pub fn copy_rect(&mut self, dest: Rect, src_x: u16, src_y: u16) -> Result<()> {
        self.validate_rect(dest)?;
        let src = Rect::new(src_x as i32, src_y as i32, dest.width, dest.height);
        self.validate_rect(src)?;

        let row_bytes = dest.width as usize * BYTES_PER_PIXEL;
        let mut snapshot = vec![0u8; row_bytes * dest.height as usize];
        for y in 0..dest.height as usize {
            let from = self.pixel_offset(src_x, src_y + y as u16);
            snapshot[y * row_bytes..(y + 1) * row_bytes]
                .copy_from_slice(&self.data[from..from + row_bytes]);
        }

        for y in 0..dest.height as usize {
            let to = self.pixel_offset(dest.x as u16, dest.y as u16 + y as u16);
            self.data[to..to + row_bytes]
                .copy_from_slice(&snapshot[y * row_bytes..(y + 1) * row_bytes]);
        }
        Ok(())
    }

    fn pixel_offset(&self, x: u16, y: u16) -> usize {
        (usize::from(y) * usize::from(self.width) + usize::from(x)) * BYTES_PER_PIXEL
    }

    fn validate_rect(&self, rect: Rect) -> Result<()> {
        let fits = rect.x >= 0
            && rect.y >= 0
            && rect.x as u32 + rect.width <= u32::from(self.width)
            && rect.y as u32 + rect.height <= u32::from(self.height);
        if !fits {
            return Err(anyhow!(
                "rectangle {rect:?} outside {}x{} framebuffer",
                self.width,
                self.height
            ));
        }
        Ok(())
    }
}
