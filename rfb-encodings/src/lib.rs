//! Rectangle decoders for framebuffer updates.
//!
//! A [`Decoder`] reads exactly one rectangle's payload (as announced by the
//! rectangle header's encoding id) from the network stream and applies it
//! to the [`Framebuffer`]. Decoders are stateful where the protocol is:
//! the ZRLE decoder owns the session's zlib continuation, so one instance
//! must serve all rectangles of a connection.
//!
//! Failures are fatal to the session. A decoder that errors mid-rectangle
//! leaves the framebuffer partially updated but in-bounds; the caller is
//! expected to tear the session down.

use anyhow::Result;
use tokio::io::AsyncRead;

pub use rfb_framebuffer::Framebuffer;
pub use rfb_protocol::io::RfbInStream;
pub use rfb_protocol::messages::types::{
    Rectangle, ENCODING_COPYRECT, ENCODING_CURSOR, ENCODING_RAW, ENCODING_ZRLE,
};

pub mod copyrect;
pub mod cursor;
pub mod raw;
pub mod zrle;

pub use copyrect::CopyRectDecoder;
pub use cursor::{CursorDecoder, CursorShape};
pub use raw::RawDecoder;
pub use zrle::ZrleDecoder;

/// One encoding's rectangle decoder.
#[allow(async_fn_in_trait)]
pub trait Decoder {
    /// The encoding id this decoder handles (signed; pseudo-encodings are
    /// negative).
    fn encoding_type(&self) -> i32;

    /// Consume one rectangle's payload from `stream` and apply it.
    ///
    /// Must read exactly the bytes belonging to the rectangle, even when
    /// the result is discarded, so the stream stays framed for the next
    /// rectangle.
    async fn decode<R: AsyncRead + Unpin>(
        &mut self,
        stream: &mut RfbInStream<R>,
        rect: &Rectangle,
        framebuffer: &mut Framebuffer,
    ) -> Result<()>;
}
