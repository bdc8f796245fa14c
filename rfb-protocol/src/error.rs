//! Protocol-level error type.

use std::io;
use thiserror::Error;

/// Failures while negotiating or speaking the RFB protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Transport failure, short read/write, or peer close.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The server's 12-byte greeting was not `RFB xxx.yyy\n`.
    #[error("malformed RFB version string {0:?}")]
    InvalidVersion(String),

    /// The server refused the connection during security negotiation and
    /// supplied a reason.
    #[error("handshake rejected by server: {0}")]
    HandshakeRejected(String),

    /// The server offered only security types this client does not speak.
    #[error("no acceptable security type offered (server offered {0:?})")]
    NoAcceptableSecurityType(Vec<u8>),

    /// The server wants VNC authentication but no password was configured.
    #[error("server requires a password")]
    PasswordRequired,

    /// VNC authentication cannot run with an empty password.
    #[error("password must not be empty")]
    EmptyPassword,

    /// SecurityResult was non-zero; the attached reason comes from the
    /// RFB 3.8 failure message.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server does not run a true-color framebuffer.
    #[error("server is not true-color; color maps are unsupported")]
    NonTrueColorUnsupported,
}
