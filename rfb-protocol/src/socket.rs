//! TCP transport for VNC connections.

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

/// Connection-identification surface shared by VNC transports.
pub trait VncSocket: AsyncRead + AsyncWrite + Send + Unpin {
    /// Peer address without port, for display purposes.
    fn peer_address(&self) -> String;

    /// Peer endpoint including the port.
    fn peer_endpoint(&self) -> String;
}

/// TCP socket configured for interactive use.
///
/// `TCP_NODELAY` is set on connect: input events are a handful of bytes
/// and must not sit in Nagle's buffer.
pub struct TcpSocket {
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl TcpSocket {
    /// Connect to `host:port`.
    pub async fn connect(host: &str, port: u16) -> std::io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        let peer_addr = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        Ok(Self { stream, peer_addr })
    }
}

impl VncSocket for TcpSocket {
    fn peer_address(&self) -> String {
        self.peer_addr.ip().to_string()
    }

    fn peer_endpoint(&self) -> String {
        self.peer_addr.to_string()
    }
}

impl AsyncRead for TcpSocket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpSocket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connect_and_identify_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let socket = TcpSocket::connect("127.0.0.1", addr.port()).await.unwrap();
        assert_eq!(socket.peer_address(), "127.0.0.1");
        assert_eq!(socket.peer_endpoint(), format!("127.0.0.1:{}", addr.port()));
        assert!(socket.stream.nodelay().unwrap());
    }

    #[tokio::test]
    async fn connect_refused() {
        // Port 1 is essentially never listening.
        assert!(TcpSocket::connect("127.0.0.1", 1).await.is_err());
    }
}
