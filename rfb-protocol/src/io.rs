//! Buffered streams for RFB wire traffic.
//!
//! [`RfbInStream`] buffers reads and exposes typed accessors for the
//! big-endian integers the protocol is made of. [`RfbOutStream`] buffers
//! writes until an explicit [`flush`](RfbOutStream::flush), so a multi-field
//! message leaves the socket as one segment.
//!
//! [`RfbInStream::data_available`] is the poll gate of the update loop: a
//! non-blocking probe of the underlying reader that never consumes from a
//! message, only into the buffer.

use bytes::{Buf, BufMut, BytesMut};
use std::future::poll_fn;
use std::pin::Pin;
use std::task::Poll;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};

const BUFFER_CAPACITY: usize = 8192;

/// Buffered input stream over any async byte source.
pub struct RfbInStream<R> {
    reader: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> RfbInStream<R> {
    /// Wrap `reader` with an empty buffer.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(BUFFER_CAPACITY),
        }
    }

    /// Block until at least `n` bytes are buffered.
    async fn ensure_bytes(&mut self, n: usize) -> std::io::Result<()> {
        while self.buffer.len() < n {
            let read = self.reader.read_buf(&mut self.buffer).await?;
            if read == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("connection closed ({} of {} bytes buffered)", self.buffer.len(), n),
                ));
            }
        }
        Ok(())
    }

    /// Read one byte.
    pub async fn read_u8(&mut self) -> std::io::Result<u8> {
        self.ensure_bytes(1).await?;
        Ok(self.buffer.get_u8())
    }

    /// Read a big-endian u16.
    pub async fn read_u16(&mut self) -> std::io::Result<u16> {
        self.ensure_bytes(2).await?;
        Ok(self.buffer.get_u16())
    }

    /// Read a big-endian u32.
    pub async fn read_u32(&mut self) -> std::io::Result<u32> {
        self.ensure_bytes(4).await?;
        Ok(self.buffer.get_u32())
    }

    /// Read a big-endian i32.
    pub async fn read_i32(&mut self) -> std::io::Result<i32> {
        self.ensure_bytes(4).await?;
        Ok(self.buffer.get_i32())
    }

    /// Fill `buf` exactly.
    pub async fn read_bytes(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.ensure_bytes(buf.len()).await?;
        self.buffer.copy_to_slice(buf);
        Ok(())
    }

    /// Read exactly `n` bytes into a fresh vector.
    pub async fn read_vec(&mut self, n: usize) -> std::io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_bytes(&mut buf).await?;
        Ok(buf)
    }

    /// Read `n` bytes as text, replacing invalid UTF-8.
    pub async fn read_string(&mut self, n: usize) -> std::io::Result<String> {
        let bytes = self.read_vec(n).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Discard `n` bytes (padding).
    pub async fn skip(&mut self, n: usize) -> std::io::Result<()> {
        self.ensure_bytes(n).await?;
        self.buffer.advance(n);
        Ok(())
    }

    /// Bytes readable without touching the socket.
    pub fn available(&self) -> usize {
        self.buffer.len()
    }

    /// Non-blocking data probe.
    ///
    /// Returns `true` if a read can begin without waiting: bytes are
    /// already buffered, the socket just delivered some (they are pulled
    /// into the buffer), or the peer closed the connection (so the next
    /// read will report it). Returns `false` when the socket has nothing
    /// right now.
    pub async fn data_available(&mut self) -> std::io::Result<bool> {
        if !self.buffer.is_empty() {
            return Ok(true);
        }

        let Self { reader, buffer } = self;
        poll_fn(|cx| {
            let mut chunk = [0u8; 4096];
            let mut read_buf = ReadBuf::new(&mut chunk);
            match Pin::new(&mut *reader).poll_read(cx, &mut read_buf) {
                Poll::Ready(Ok(())) => {
                    // Zero bytes here means EOF; report available so the
                    // consuming read surfaces the close.
                    buffer.put_slice(read_buf.filled());
                    Poll::Ready(Ok(true))
                }
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
                Poll::Pending => Poll::Ready(Ok(false)),
            }
        })
        .await
    }

    /// Consume the stream and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Buffered output stream; nothing is sent until `flush`.
pub struct RfbOutStream<W> {
    writer: W,
    buffer: BytesMut,
}

impl<W: AsyncWrite + Unpin> RfbOutStream<W> {
    /// Wrap `writer` with an empty buffer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: BytesMut::with_capacity(BUFFER_CAPACITY),
        }
    }

    /// Queue one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    /// Queue a big-endian u16.
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.put_u16(value);
    }

    /// Queue a big-endian u32.
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.put_u32(value);
    }

    /// Queue a big-endian i32.
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.put_i32(value);
    }

    /// Queue raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Send everything queued and flush the writer.
    pub async fn flush(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer).await?;
            self.buffer.clear();
        }
        self.writer.flush().await
    }

    /// Shut down the write side after flushing.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.flush().await?;
        self.writer.shutdown().await
    }

    /// Bytes queued but not yet sent.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
