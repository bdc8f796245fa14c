//! Client-to-server messages.
//!
//! Each type knows how to queue itself on an [`RfbOutStream`]; the caller
//! decides when to flush. Message type bytes: SetEncodings 2,
//! FramebufferUpdateRequest 3, KeyEvent 4, PointerEvent 5.

use crate::io::RfbOutStream;
use tokio::io::AsyncWrite;

/// ClientInit: one byte, non-zero to share the session with other clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInit {
    pub shared: bool,
}

impl ClientInit {
    /// Queue the message.
    pub fn write_to<W: AsyncWrite + Unpin>(&self, stream: &mut RfbOutStream<W>) {
        stream.write_u8(self.shared.into());
    }
}

/// SetEncodings: the encodings this client accepts, most preferred first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetEncodings {
    pub encodings: Vec<i32>,
}

impl SetEncodings {
    /// Queue the message: type, padding, count, then signed encoding ids.
    pub fn write_to<W: AsyncWrite + Unpin>(&self, stream: &mut RfbOutStream<W>) {
        stream.write_u8(2);
        stream.write_u8(0);
        stream.write_u16(self.encodings.len() as u16);
        for &encoding in &self.encodings {
            stream.write_i32(encoding);
        }
    }
}

/// FramebufferUpdateRequest for a region of the screen.
///
/// `incremental` asks only for changes since the last update; a
/// non-incremental request forces the full region to be resent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferUpdateRequest {
    pub incremental: bool,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl FramebufferUpdateRequest {
    /// Queue the message.
    pub fn write_to<W: AsyncWrite + Unpin>(&self, stream: &mut RfbOutStream<W>) {
        stream.write_u8(3);
        stream.write_u8(self.incremental.into());
        stream.write_u16(self.x);
        stream.write_u16(self.y);
        stream.write_u16(self.width);
        stream.write_u16(self.height);
    }
}

/// KeyEvent: press or release of an X11 keysym.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub down: bool,
    pub keysym: u32,
}

impl KeyEvent {
    /// Queue the message: type, down flag, 2 bytes padding, keysym.
    pub fn write_to<W: AsyncWrite + Unpin>(&self, stream: &mut RfbOutStream<W>) {
        stream.write_u8(4);
        stream.write_u8(self.down.into());
        stream.write_u16(0);
        stream.write_u32(self.keysym);
    }
}

/// PointerEvent: pointer position plus the pressed-button mask
/// (bit 0 left, bit 1 middle, bit 2 right).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub button_mask: u8,
    pub x: u16,
    pub y: u16,
}

impl PointerEvent {
    /// Queue the message.
    pub fn write_to<W: AsyncWrite + Unpin>(&self, stream: &mut RfbOutStream<W>) {
        stream.write_u8(5);
        stream.write_u8(self.button_mask);
        stream.write_u16(self.x);
        stream.write_u16(self.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_init_wire_format() {
        let mut buffer = Vec::new();
        let mut stream = RfbOutStream::new(&mut buffer);
        ClientInit { shared: true }.write_to(&mut stream);
        ClientInit { shared: false }.write_to(&mut stream);
        stream.flush().await.unwrap();
        assert_eq!(buffer, vec![1, 0]);
    }

    #[tokio::test]
    async fn set_encodings_wire_format() {
        let mut buffer = Vec::new();
        let mut stream = RfbOutStream::new(&mut buffer);
        SetEncodings {
            encodings: vec![0, 1, 16, -239],
        }
        .write_to(&mut stream);
        stream.flush().await.unwrap();

        assert_eq!(
            buffer,
            vec![
                2, 0, // type, padding
                0, 4, // count
                0, 0, 0, 0, // Raw
                0, 0, 0, 1, // CopyRect
                0, 0, 0, 16, // ZRLE
                0xFF, 0xFF, 0xFF, 0x11, // Cursor (-239)
            ]
        );
    }

    #[tokio::test]
    async fn update_request_wire_format() {
        let mut buffer = Vec::new();
        let mut stream = RfbOutStream::new(&mut buffer);
        FramebufferUpdateRequest {
            incremental: true,
            x: 0,
            y: 0,
            width: 1024,
            height: 768,
        }
        .write_to(&mut stream);
        stream.flush().await.unwrap();

        assert_eq!(buffer, vec![3, 1, 0, 0, 0, 0, 4, 0, 3, 0]);
    }

    #[tokio::test]
    async fn key_event_wire_format() {
        let mut buffer = Vec::new();
        let mut stream = RfbOutStream::new(&mut buffer);
        KeyEvent {
            down: true,
            keysym: 0xFF0D, // Return
        }
        .write_to(&mut stream);
        stream.flush().await.unwrap();

        assert_eq!(buffer, vec![4, 1, 0, 0, 0, 0, 0xFF, 0x0D]);
    }

    #[tokio::test]
    async fn pointer_event_wire_format() {
        let mut buffer = Vec::new();
        let mut stream = RfbOutStream::new(&mut buffer);
        PointerEvent {
            button_mask: 0b101, // left + right
            x: 500,
            y: 300,
        }
        .write_to(&mut stream);
        stream.flush().await.unwrap();

        assert_eq!(buffer, vec![5, 5, 0x01, 0xF4, 0x01, 0x2C]);
    }
}
