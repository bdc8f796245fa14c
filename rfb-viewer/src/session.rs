//! The VNC session: state machine, update loop and input events.

use crate::config::Config;
use crate::errors::ClientError;
use crate::events::ServerEvent;
use rfb_common::Rect;
use rfb_encodings::{
    CopyRectDecoder, CursorDecoder, CursorShape, Decoder, RawDecoder, ZrleDecoder,
};
use rfb_framebuffer::Framebuffer;
use rfb_protocol::handshake;
use rfb_protocol::io::{RfbInStream, RfbOutStream};
use rfb_protocol::messages::client::{
    FramebufferUpdateRequest, KeyEvent, PointerEvent, SetEncodings,
};
use rfb_protocol::messages::server::{read_update_rect_count, ServerCutText};
use rfb_protocol::messages::types::{
    PixelFormat, Rectangle, ENCODING_COPYRECT, ENCODING_CURSOR, ENCODING_RAW, ENCODING_ZRLE,
    SERVER_MSG_BELL, SERVER_MSG_CUT_TEXT, SERVER_MSG_FRAMEBUFFER_UPDATE,
    SERVER_MSG_SET_COLOR_MAP,
};
use rfb_protocol::{TcpSocket, VncSocket};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tracing::{debug, info, trace};

/// A connected VNC session.
///
/// Owns the socket halves, the framebuffer, the decoder set (including the
/// ZRLE zlib continuation) and the set of keys currently held down. All
/// state is per-instance; two sessions never share anything.
pub struct Session<S> {
    instream: RfbInStream<ReadHalf<S>>,
    outstream: RfbOutStream<WriteHalf<S>>,
    framebuffer: Framebuffer,
    pixel_format: PixelFormat,
    desktop_name: String,
    raw: RawDecoder,
    copyrect: CopyRectDecoder,
    cursor: CursorDecoder,
    zrle: ZrleDecoder,
    pressed_keys: Vec<u32>,
}

impl Session<TcpSocket> {
    /// Connect over TCP and complete the handshake.
    pub async fn connect(config: &Config) -> Result<Self, ClientError> {
        config.validate()?;
        let socket = TcpSocket::connect(&config.host, config.port).await?;
        info!(peer = %socket.peer_endpoint(), "connected");
        Self::establish(socket, config).await
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    /// Run the handshake over an already-open transport and advertise our
    /// encodings. Generic so tests can drive a session over an in-memory
    /// pipe.
    pub async fn establish(transport: S, config: &Config) -> Result<Self, ClientError> {
        config.validate()?;
        let (read_half, write_half) = tokio::io::split(transport);
        let mut instream = RfbInStream::new(read_half);
        let mut outstream = RfbOutStream::new(write_half);

        let server_init =
            handshake::perform(&mut instream, &mut outstream, config.password.as_deref()).await?;

        info!(
            width = server_init.width,
            height = server_init.height,
            name = %server_init.name,
            "session established"
        );

        SetEncodings {
            encodings: config.encodings.clone(),
        }
        .write_to(&mut outstream);
        outstream.flush().await.map_err(ClientError::from)?;

        Ok(Self {
            framebuffer: Framebuffer::new(server_init.width, server_init.height),
            pixel_format: server_init.pixel_format,
            desktop_name: server_init.name,
            instream,
            outstream,
            raw: RawDecoder,
            copyrect: CopyRectDecoder,
            cursor: CursorDecoder::new(),
            zrle: ZrleDecoder::new(),
            pressed_keys: Vec::new(),
        })
    }

    /// Framebuffer width in pixels.
    pub fn width(&self) -> u16 {
        self.framebuffer.width()
    }

    /// Framebuffer height in pixels.
    pub fn height(&self) -> u16 {
        self.framebuffer.height()
    }

    /// Read-only view of the framebuffer: row-major, 4 bytes per pixel,
    /// little-endian words encoding `0x00RRGGBB`.
    pub fn pixel_data(&self) -> &[u8] {
        self.framebuffer.data()
    }

    /// The desktop name from ServerInit.
    pub fn desktop_name(&self) -> &str {
        &self.desktop_name
    }

    /// The server's advertised pixel format.
    pub fn pixel_format(&self) -> &PixelFormat {
        &self.pixel_format
    }

    /// The most recent cursor shape, when the server sent one.
    pub fn cursor(&self) -> Option<&CursorShape> {
        self.cursor.shape()
    }

    /// Keysyms currently held down through this session.
    pub fn pressed_keys(&self) -> &[u32] {
        &self.pressed_keys
    }

    /// Ask the server for the whole framebuffer.
    ///
    /// With `incremental` set, only regions changed since the last update
    /// are sent; the host calls this on a timer of its choosing.
    pub async fn request_update(&mut self, incremental: bool) -> Result<(), ClientError> {
        FramebufferUpdateRequest {
            incremental,
            x: 0,
            y: 0,
            width: self.framebuffer.width(),
            height: self.framebuffer.height(),
        }
        .write_to(&mut self.outstream);
        self.outstream.flush().await.map_err(ClientError::from)
    }

    /// Consume at most one pending server message.
    ///
    /// Returns `None` without blocking when nothing is queued. Once a
    /// message has begun it is read to completion, blocking as needed, so
    /// buffered data can never stall the socket.
    pub async fn poll(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        if !self.instream.data_available().await? {
            return Ok(None);
        }

        let message_type = self.instream.read_u8().await?;
        match message_type {
            SERVER_MSG_FRAMEBUFFER_UPDATE => {
                let count = read_update_rect_count(&mut self.instream).await?;
                trace!(rectangles = count, "framebuffer update");

                let mut rectangles = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let rect = Rectangle::read_from(&mut self.instream).await?;
                    self.decode_rect(&rect).await?;
                    rectangles.push(Rect::new(
                        i32::from(rect.x),
                        i32::from(rect.y),
                        u32::from(rect.width),
                        u32::from(rect.height),
                    ));
                }
                Ok(Some(ServerEvent::FramebufferUpdated { rectangles }))
            }
            SERVER_MSG_SET_COLOR_MAP => {
                Err(ClientError::UnsupportedServerMessage(message_type))
            }
            SERVER_MSG_BELL => Ok(Some(ServerEvent::Bell)),
            SERVER_MSG_CUT_TEXT => {
                let cut = ServerCutText::read_from(&mut self.instream).await?;
                debug!(bytes = cut.text.len(), "server clipboard");
                Ok(Some(ServerEvent::Clipboard(cut.text)))
            }
            other => Err(ClientError::UnknownServerMessage(other)),
        }
    }

    async fn decode_rect(&mut self, rect: &Rectangle) -> Result<(), ClientError> {
        trace!(
            x = rect.x,
            y = rect.y,
            w = rect.width,
            h = rect.height,
            encoding = rect.encoding,
            "rectangle"
        );
        match rect.encoding {
            ENCODING_RAW => {
                self.raw
                    .decode(&mut self.instream, rect, &mut self.framebuffer)
                    .await?
            }
            ENCODING_COPYRECT => {
                self.copyrect
                    .decode(&mut self.instream, rect, &mut self.framebuffer)
                    .await?
            }
            ENCODING_ZRLE => {
                self.zrle
                    .decode(&mut self.instream, rect, &mut self.framebuffer)
                    .await?
            }
            ENCODING_CURSOR => {
                self.cursor
                    .decode(&mut self.instream, rect, &mut self.framebuffer)
                    .await?
            }
            other => return Err(ClientError::UnsupportedEncoding(other)),
        }
        Ok(())
    }

    /// Press or release a key. The session tracks what is held down and
    /// releases it at close.
    pub async fn send_key_event(&mut self, down: bool, keysym: u32) -> Result<(), ClientError> {
        KeyEvent { down, keysym }.write_to(&mut self.outstream);
        self.outstream.flush().await?;

        if down {
            if !self.pressed_keys.contains(&keysym) {
                self.pressed_keys.push(keysym);
            }
        } else {
            self.pressed_keys.retain(|&k| k != keysym);
        }
        Ok(())
    }

    /// Report pointer position and button state (bit 0 left, bit 1 middle,
    /// bit 2 right).
    pub async fn send_pointer_event(
        &mut self,
        x: u16,
        y: u16,
        button_mask: u8,
    ) -> Result<(), ClientError> {
        PointerEvent { button_mask, x, y }.write_to(&mut self.outstream);
        self.outstream.flush().await.map_err(ClientError::from)
    }

    /// End the session: release held keys, flush, and shut the socket.
    pub async fn close(mut self) -> Result<(), ClientError> {
        for keysym in std::mem::take(&mut self.pressed_keys) {
            KeyEvent {
                down: false,
                keysym,
            }
            .write_to(&mut self.outstream);
        }
        self.outstream.shutdown().await.map_err(ClientError::from)
    }
}
