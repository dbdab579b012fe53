use std::cmp;
use std::io;
use std::io::ErrorKind;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::config::DEFAULT_MAX_LINE_BYTES;
use crate::stream::ByteStream;

/// Default capacity for the read and the write buffer
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Pending output beyond this size is written out without waiting for `flush`
const WRITE_HIGH_WATER: usize = 64 * 1024;

/// Carried inside an [`io::Error`] of kind `InvalidData` when a line exceeds the limit.
#[derive(Debug, Error)]
#[error("line exceeds the limit of {max_size} bytes")]
pub struct LineTooLong {
    pub max_size: usize,
}

/// A buffered [`ByteStream`] over a tokio reader and writer.
///
/// Reads go through an internal `BytesMut`, so bytes pulled from the reader but not yet
/// consumed survive between calls. Writes are collected in a second buffer and handed
/// to the writer on [`flush`](ByteStream::flush).
#[derive(Debug)]
pub struct IoStream<R, W> {
    reader: R,
    writer: W,
    read_buf: BytesMut,
    write_buf: BytesMut,
    max_line_bytes: usize,
    eof: bool,
}

impl<R, W> IoStream<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_capacity(reader, writer, DEFAULT_BUFFER_SIZE, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(reader: R, writer: W, reader_buffer_size: usize, writer_buffer_size: usize) -> Self {
        Self {
            reader,
            writer,
            read_buf: BytesMut::with_capacity(reader_buffer_size),
            write_buf: BytesMut::with_capacity(writer_buffer_size),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            eof: false,
        }
    }

    /// Sets the longest line [`read_line`](ByteStream::read_line) will buffer.
    #[must_use]
    pub fn max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    #[inline]
    pub fn get_mut(&mut self) -> (&mut R, &mut W) {
        (&mut self.reader, &mut self.writer)
    }

    /// Returns the reader, the writer and any input that was read but not consumed.
    pub fn into_parts(self) -> (R, W, BytesMut) {
        (self.reader, self.writer, self.read_buf)
    }
}

impl<R, W> IoStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn fill_buf(&mut self) -> io::Result<usize> {
        if self.eof {
            return Ok(0);
        }

        self.read_buf.reserve(DEFAULT_BUFFER_SIZE);
        let n = self.reader.read_buf(&mut self.read_buf).await?;
        if n == 0 {
            debug!(buffered = self.read_buf.len(), "peer closed the stream");
            self.eof = true;
        } else {
            trace!(bytes = n, "filled read buffer");
        }
        Ok(n)
    }

    /// Fails if the first `end` buffered bytes, minus a trailing CR, exceed the line limit.
    fn check_line_length(&self, end: usize) -> io::Result<()> {
        let len = if end > 0 && self.read_buf[end - 1] == b'\r' { end - 1 } else { end };
        if len > self.max_line_bytes {
            return Err(io::Error::new(ErrorKind::InvalidData, LineTooLong { max_size: self.max_line_bytes }));
        }
        Ok(())
    }

    /// Flushes pending output and shuts the writer down.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.flush().await?;
        self.writer.shutdown().await
    }
}

#[async_trait]
impl<R, W> ByteStream for IoStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_line(&mut self) -> io::Result<Option<Bytes>> {
        let mut searched = 0;
        loop {
            if let Some(pos) = self.read_buf[searched..].iter().position(|b| *b == b'\n') {
                let end = searched + pos;
                self.check_line_length(end)?;
                let mut line = self.read_buf.split_to(end + 1);
                line.truncate(end);
                if line.last() == Some(&b'\r') {
                    line.truncate(end - 1);
                }
                return Ok(Some(line.freeze()));
            }

            searched = self.read_buf.len();
            self.check_line_length(searched)?;

            if self.fill_buf().await? == 0 {
                if self.read_buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.read_buf.split().freeze()));
            }
        }
    }

    async fn read_bytes(&mut self, len: usize) -> io::Result<Bytes> {
        // the buffer grows per fill, never by the requested length up front
        while self.read_buf.len() < len {
            if self.fill_buf().await? == 0 {
                break;
            }
        }

        let n = cmp::min(len, self.read_buf.len());
        Ok(self.read_buf.split_to(n).freeze())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_buf.extend_from_slice(bytes);
        if self.write_buf.len() >= WRITE_HIGH_WATER {
            self.writer.write_all(&self.write_buf).await?;
            self.write_buf.clear();
        }
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        if !self.write_buf.is_empty() {
            trace!(bytes = self.write_buf.len(), "flushing write buffer");
            self.writer.write_all(&self.write_buf).await?;
            self.write_buf.clear();
        }
        self.writer.flush().await
    }

    fn is_closed(&self) -> bool {
        self.eof && self.read_buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_lines_with_crlf_and_lf() {
        let mut stream = IoStream::new(&b"first\r\nsecond\nlast"[..], Vec::new());

        assert_eq!(stream.read_line().await.unwrap().unwrap(), &b"first"[..]);
        assert_eq!(stream.read_line().await.unwrap().unwrap(), &b"second"[..]);
        assert_eq!(stream.read_line().await.unwrap().unwrap(), &b"last"[..]);
        assert_eq!(stream.read_line().await.unwrap(), None);
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn empty_line_is_not_eof() {
        let mut stream = IoStream::new(&b"\r\nx"[..], Vec::new());

        assert_eq!(stream.read_line().await.unwrap().unwrap(), &b""[..]);
        assert!(!stream.is_closed());
    }

    #[tokio::test]
    async fn read_bytes_stops_at_eof() {
        let mut stream = IoStream::new(&b"0123456789"[..], Vec::new());

        assert_eq!(stream.read_bytes(4).await.unwrap(), &b"0123"[..]);
        assert_eq!(stream.read_bytes(100).await.unwrap(), &b"456789"[..]);
        assert_eq!(stream.read_bytes(1).await.unwrap(), &b""[..]);
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn large_request_does_not_preallocate() {
        let mut stream = IoStream::new(&b"0123"[..], Vec::new());

        assert_eq!(stream.read_bytes(16_000_000).await.unwrap(), &b"0123"[..]);
        assert!(stream.read_buf.capacity() <= 2 * DEFAULT_BUFFER_SIZE);
    }

    #[tokio::test]
    async fn line_limit() {
        let mut stream = IoStream::new(&b"aaaaaaaaaaaaaaaaaaaaaaaa\r\n"[..], Vec::new()).max_line_bytes(8);

        let e = stream.read_line().await.unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidData);
        assert!(e.get_ref().and_then(|inner| inner.downcast_ref::<LineTooLong>()).is_some());
    }

    #[tokio::test]
    async fn line_limit_ignores_terminator() {
        let mut stream = IoStream::new(&b"12345678\r\nabcdefgh\n123456789\n"[..], Vec::new()).max_line_bytes(8);

        assert_eq!(stream.read_line().await.unwrap().unwrap(), &b"12345678"[..]);
        assert_eq!(stream.read_line().await.unwrap().unwrap(), &b"abcdefgh"[..]);
        assert_eq!(stream.read_line().await.unwrap_err().kind(), ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn writes_are_held_until_flush() {
        let mut stream = IoStream::new(&b""[..], Vec::new());

        stream.write_bytes(b"hello ").await.unwrap();
        stream.write_bytes(b"world").await.unwrap();
        assert!(stream.writer().is_empty());

        stream.flush().await.unwrap();
        assert_eq!(stream.writer().as_slice(), b"hello world");
    }
}
