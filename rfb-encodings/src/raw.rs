//! Raw encoding (type 0): uncompressed pixels.
//!
//! The simplest and most expensive encoding: `width * height` pixels of
//! 4 bytes each, row-major, copied straight into the framebuffer.

use crate::{Decoder, Framebuffer, Rectangle, RfbInStream, ENCODING_RAW};
use anyhow::{Context, Result};
use rfb_common::Rect;
use rfb_framebuffer::BYTES_PER_PIXEL;
use tokio::io::AsyncRead;

/// Decoder for Raw rectangles.
pub struct RawDecoder;

impl Decoder for RawDecoder {
    fn encoding_type(&self) -> i32 {
        ENCODING_RAW
    }

    async fn decode<R: AsyncRead + Unpin>(
        &mut self,
        stream: &mut RfbInStream<R>,
        rect: &Rectangle,
        framebuffer: &mut Framebuffer,
    ) -> Result<()> {
        if rect.width == 0 || rect.height == 0 {
            return Ok(());
        }

        let byte_count = rect.width as usize * rect.height as usize * BYTES_PER_PIXEL;
        let pixels = stream
            .read_vec(byte_count)
            .await
            .context("raw rectangle: reading pixel data")?;

        framebuffer.image_rect(
            Rect::new(
                rect.x as i32,
                rect.y as i32,
                u32::from(rect.width),
                u32::from(rect.height),
            ),
            &pixels,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn copies_pixels_row_major() {
        let mut decoder = RawDecoder;
        let mut fb = Framebuffer::new(3, 3);

        // 2x2 rectangle at (1, 1).
        let rect = Rectangle {
            x: 1,
            y: 1,
            width: 2,
            height: 2,
            encoding: ENCODING_RAW,
        };
        let data: Vec<u8> = vec![
            1, 0, 0, 0, // (1,1)
            2, 0, 0, 0, // (2,1)
            3, 0, 0, 0, // (1,2)
            4, 0, 0, 0, // (2,2)
        ];
        let mut stream = RfbInStream::new(Cursor::new(data));

        decoder.decode(&mut stream, &rect, &mut fb).await.unwrap();

        assert_eq!(fb.pixel(1, 1).unwrap(), 1);
        assert_eq!(fb.pixel(2, 1).unwrap(), 2);
        assert_eq!(fb.pixel(1, 2).unwrap(), 3);
        assert_eq!(fb.pixel(2, 2).unwrap(), 4);
        assert_eq!(fb.pixel(0, 0).unwrap(), 0);
    }

    #[tokio::test]
    async fn truncated_stream_errors() {
        let mut decoder = RawDecoder;
        let mut fb = Framebuffer::new(4, 4);
        let rect = Rectangle {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
            encoding: ENCODING_RAW,
        };
        let mut stream = RfbInStream::new(Cursor::new(vec![0u8; 7]));
        assert!(decoder.decode(&mut stream, &rect, &mut fb).await.is_err());
    }

    #[tokio::test]
    async fn empty_rectangle_reads_nothing() {
        let mut decoder = RawDecoder;
        let mut fb = Framebuffer::new(2, 2);
        let rect = Rectangle {
            x: 0,
            y: 0,
            width: 0,
            height: 2,
            encoding: ENCODING_RAW,
        };
        let mut stream = RfbInStream::new(Cursor::new(Vec::new()));
        decoder.decode(&mut stream, &rect, &mut fb).await.unwrap();
    }
}
