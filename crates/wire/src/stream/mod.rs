//! Byte stream abstraction consumed by both protocol engines
//!
//! The HTTP parser and the WebSocket frame codec never touch a socket directly. They
//! pull CRLF-terminated lines and bounded byte runs from a [`ByteStream`] and push
//! encoded bytes back into it. Reading the next line, reading N bytes and flushing
//! are the only suspension points of either engine.
//!
//! [`IoStream`] adapts any tokio `AsyncRead` + `AsyncWrite` pair.

mod io_stream;

pub use io_stream::IoStream;
pub use io_stream::LineTooLong;

use async_trait::async_trait;
use bytes::Bytes;
use std::io;

/// Line-oriented byte source and sink.
///
/// Implementations own any read-ahead buffering. A stream is closed once the peer has
/// finished sending and every buffered byte has been handed out.
#[async_trait]
pub trait ByteStream: Send {
    /// Reads one line and returns it without the trailing CRLF (or bare LF).
    ///
    /// Returns `Ok(None)` if the stream ended before any byte of the line arrived. If it
    /// ends in the middle of a line, the partial line is returned.
    async fn read_line(&mut self) -> io::Result<Option<Bytes>>;

    /// Reads up to `len` bytes. Fewer bytes are returned only when the stream ended.
    async fn read_bytes(&mut self, len: usize) -> io::Result<Bytes>;

    /// Queues bytes for sending. Bytes may be held back until [`flush`](Self::flush).
    async fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    async fn flush(&mut self) -> io::Result<()>;

    /// Returns true once the peer closed the stream and no buffered input remains.
    fn is_closed(&self) -> bool;
}
