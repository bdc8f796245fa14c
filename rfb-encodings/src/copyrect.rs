//! CopyRect encoding (type 1): move a region already on screen.
//!
//! Only four bytes travel on the wire: the source coordinates. The
//! rectangle header names the destination. Source and destination may
//! overlap; the framebuffer snapshots the source before writing, so the
//! copy always reads pre-update pixels.

use crate::{Decoder, Framebuffer, Rectangle, RfbInStream, ENCODING_COPYRECT};
use anyhow::{Context, Result};
use rfb_common::Rect;
use tokio::io::AsyncRead;

/// Decoder for CopyRect rectangles.
pub struct CopyRectDecoder;

impl Decoder for CopyRectDecoder {
    fn encoding_type(&self) -> i32 {
        ENCODING_COPYRECT
    }

    async fn decode<R: AsyncRead + Unpin>(
        &mut self,
        stream: &mut RfbInStream<R>,
        rect: &Rectangle,
        framebuffer: &mut Framebuffer,
    ) -> Result<()> {
        let src_x = stream
            .read_u16()
            .await
            .context("copyrect: reading source x")?;
        let src_y = stream
            .read_u16()
            .await
            .context("copyrect: reading source y")?;

        if rect.width == 0 || rect.height == 0 {
            return Ok(());
        }

        framebuffer.copy_rect(
            Rect::new(
                rect.x as i32,
                rect.y as i32,
                u32::from(rect.width),
                u32::from(rect.height),
            ),
            src_x,
            src_y,
        )
    }
}
