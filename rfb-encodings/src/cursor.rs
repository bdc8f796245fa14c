//! Cursor pseudo-encoding (type -239): cursor shape delivery.
//!
//! The rectangle's position is the hotspot and its size the cursor
//! dimensions. The payload is `width * height` pixels followed by a 1-bit
//! transparency mask, each mask row padded to a whole byte. Nothing is
//! drawn into the framebuffer; the shape is kept for the host, which may
//! ignore it.

use crate::{Decoder, Framebuffer, Rectangle, RfbInStream, ENCODING_CURSOR};
use anyhow::{Context, Result};
use rfb_framebuffer::BYTES_PER_PIXEL;
use tokio::io::AsyncRead;

/// A cursor shape as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorShape {
    pub width: u16,
    pub height: u16,
    pub hotspot_x: u16,
    pub hotspot_y: u16,
    /// Cursor pixels, 4 bytes each, row-major.
    pub pixels: Vec<u8>,
    /// Transparency bitmask, one bit per pixel, rows byte-padded.
    pub mask: Vec<u8>,
}

/// Decoder for the cursor pseudo-rectangle. Keeps the most recent shape.
#[derive(Default)]
pub struct CursorDecoder {
    shape: Option<CursorShape>,
}

impl CursorDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently delivered cursor shape, if any.
    pub fn shape(&self) -> Option<&CursorShape> {
        self.shape.as_ref()
    }
}

impl Decoder for CursorDecoder {
    fn encoding_type(&self) -> i32 {
        ENCODING_CURSOR
    }

    async fn decode<R: AsyncRead + Unpin>(
        &mut self,
        stream: &mut RfbInStream<R>,
        rect: &Rectangle,
        _framebuffer: &mut Framebuffer,
    ) -> Result<()> {
        let pixel_bytes = rect.width as usize * rect.height as usize * BYTES_PER_PIXEL;
        let mask_bytes = (rect.width as usize).div_ceil(8) * rect.height as usize;

        let pixels = stream
            .read_vec(pixel_bytes)
            .await
            .context("cursor: reading pixels")?;
        let mask = stream
            .read_vec(mask_bytes)
            .await
            .context("cursor: reading mask")?;

        self.shape = Some(CursorShape {
            width: rect.width,
            height: rect.height,
            hotspot_x: rect.x,
            hotspot_y: rect.y,
            pixels,
            mask,
        });
        Ok(())
    }
}
