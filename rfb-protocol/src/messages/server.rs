//! Server-to-client messages.

use crate::error::ProtocolError;
use crate::io::RfbInStream;
use crate::messages::types::PixelFormat;
use tokio::io::AsyncRead;

/// ServerInit: framebuffer geometry, the server's pixel format, and the
/// desktop name. Ends the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInit {
    pub width: u16,
    pub height: u16,
    pub pixel_format: PixelFormat,
    pub name: String,
}

impl ServerInit {
    /// Parse ServerInit from the wire.
    ///
    /// Color-mapped servers are rejected here: every decoder downstream
    /// assumes a true-color format.
    pub async fn read_from<R: AsyncRead + Unpin>(
        stream: &mut RfbInStream<R>,
    ) -> Result<Self, ProtocolError> {
        let width = stream.read_u16().await?;
        let height = stream.read_u16().await?;
        let pixel_format = PixelFormat::read_from(stream).await?;
        let name_length = stream.read_u32().await? as usize;
        let name = stream.read_string(name_length).await?;

        if !pixel_format.true_color {
            return Err(ProtocolError::NonTrueColorUnsupported);
        }

        Ok(Self {
            width,
            height,
            pixel_format,
            name,
        })
    }
}

/// ServerCutText: the server's clipboard changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCutText {
    pub text: String,
}

impl ServerCutText {
    /// Parse the message body (after the type byte): 3 bytes padding,
    /// length, then that many text bytes.
    pub async fn read_from<R: AsyncRead + Unpin>(
        stream: &mut RfbInStream<R>,
    ) -> std::io::Result<Self> {
        stream.skip(3).await?;
        let length = stream.read_u32().await? as usize;
        let text = stream.read_string(length).await?;
        Ok(Self { text })
    }
}

/// Parse a FramebufferUpdate header (after the type byte): one byte of
/// padding, then the number of rectangles that follow.
pub async fn read_update_rect_count<R: AsyncRead + Unpin>(
    stream: &mut RfbInStream<R>,
) -> std::io::Result<u16> {
    stream.skip(1).await?;
    stream.read_u16().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RfbOutStream;
    use std::io::Cursor;

    fn server_init_bytes(true_color: bool, name: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1920u16.to_be_bytes());
        bytes.extend_from_slice(&1080u16.to_be_bytes());
        bytes.extend_from_slice(&[
            32,
            24,
            0,
            true_color as u8,
            0,
            255,
            0,
            255,
            0,
            255,
            16,
            8,
            0,
            0,
            0,
            0,
        ]);
        bytes.extend_from_slice(&(name.len() as u32).to_be_bytes());
        bytes.extend_from_slice(name.as_bytes());
        bytes
    }

    #[tokio::test]
    async fn server_init_parses() {
        let bytes = server_init_bytes(true, "Test Desktop");
        let mut stream = RfbInStream::new(Cursor::new(bytes));
        let init = ServerInit::read_from(&mut stream).await.unwrap();
        assert_eq!(init.width, 1920);
        assert_eq!(init.height, 1080);
        assert_eq!(init.name, "Test Desktop");
        assert!(init.pixel_format.true_color);
        assert_eq!(init.pixel_format.red_shift, 16);
    }

    #[tokio::test]
    async fn server_init_rejects_color_map() {
        let bytes = server_init_bytes(false, "Palette Desktop");
        let mut stream = RfbInStream::new(Cursor::new(bytes));
        assert!(matches!(
            ServerInit::read_from(&mut stream).await,
            Err(ProtocolError::NonTrueColorUnsupported)
        ));
    }

    #[tokio::test]
    async fn cut_text_parses() {
        let mut buffer = Vec::new();
        let mut out = RfbOutStream::new(&mut buffer);
        out.write_bytes(&[0, 0, 0]);
        out.write_u32(9);
        out.write_bytes(b"clipboard");
        out.flush().await.unwrap();

        let mut stream = RfbInStream::new(Cursor::new(buffer));
        let msg = ServerCutText::read_from(&mut stream).await.unwrap();
        assert_eq!(msg.text, "clipboard");
    }

    #[tokio::test]
    async fn update_header_parses() {
        let bytes = vec![0xAB, 0x00, 0x03]; // padding, count=3
        let mut stream = RfbInStream::new(Cursor::new(bytes));
        assert_eq!(read_update_rect_count(&mut stream).await.unwrap(), 3);
    }
}
