//! RFB message serialization.
//!
//! Split by direction: [`client`] for client-to-server messages, [`server`]
//! for server-to-client, [`types`] for structures both sides share.

pub mod client;
pub mod server;
pub mod types;

pub use client::{ClientInit, FramebufferUpdateRequest, KeyEvent, PointerEvent, SetEncodings};
pub use server::{ServerCutText, ServerInit};
pub use types::{PixelFormat, Rectangle};
