//! Session-level error type.

use rfb_protocol::ProtocolError;
use std::io;
use thiserror::Error;

/// Errors surfaced to the host. Every one of them ends the session; the
/// engine never retries on its own.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure.
    #[error("i/o error: {0}")]
    Io(io::Error),

    /// The server closed the connection (or `close` interrupted a read).
    #[error("connection closed")]
    ConnectionClosed,

    /// Handshake, authentication or negotiation failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A server message type outside the protocol.
    #[error("unknown server message type {0}")]
    UnknownServerMessage(u8),

    /// A legal server message this true-color-only client does not accept.
    #[error("unsupported server message type {0}")]
    UnsupportedServerMessage(u8),

    /// The server used an encoding we never advertised.
    #[error("unsupported encoding {0}")]
    UnsupportedEncoding(i32),

    /// A rectangle payload failed to decode.
    #[error("decode error: {0}")]
    Decode(#[from] anyhow::Error),

    /// The supplied configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        // EOF during a read means the peer went away.
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ClientError::ConnectionClosed
        } else {
            ClientError::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_maps_to_connection_closed() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "closed");
        assert!(matches!(ClientError::from(eof), ClientError::ConnectionClosed));

        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "nope");
        assert!(matches!(ClientError::from(refused), ClientError::Io(_)));
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            ClientError::UnknownServerMessage(9).to_string(),
            "unknown server message type 9"
        );
        assert_eq!(
            ClientError::UnsupportedEncoding(7).to_string(),
            "unsupported encoding 7"
        );
    }
}
