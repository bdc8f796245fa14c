//! RFB (Remote Framebuffer) protocol layer.
//!
//! Everything between the TCP socket and the framebuffer decoders lives
//! here: the transport ([`socket`]), buffered big-endian wire streams
//! ([`io`]), message serialization ([`messages`]), the connection handshake
//! ([`handshake`]) and the VNC challenge-response authentication ([`auth`]).
//!
//! All multi-byte integers on the RFB wire are big-endian.

pub mod auth;
pub mod error;
pub mod handshake;
pub mod io;
pub mod messages;
pub mod socket;

pub use error::ProtocolError;
pub use io::{RfbInStream, RfbOutStream};
pub use socket::{TcpSocket, VncSocket};
