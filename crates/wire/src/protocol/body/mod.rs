//! Message bodies.
//!
//! A [`Body`] is either a fixed buffer, whose length is known before the head is written,
//! or a [`BodyProducer`] that streams its content through a [`BodySender`] once the
//! head has been sent. Streaming bodies are announced with `Transfer-Encoding: chunked`;
//! the producer owns the chunk framing and can use [`BodySender::send_chunk`] and
//! [`BodySender::finish`] for it.

use std::fmt;
use std::fmt::Display;
use std::io::Write;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use http_body_util::BodyExt;
use tracing::trace;

use crate::protocol::SendError;
use crate::stream::ByteStream;

pub enum Body {
    /// Body with a length known up front
    Fixed(Bytes),
    /// Body written by a producer after the head
    Streaming(Box<dyn BodyProducer>),
}

impl Body {
    pub fn empty() -> Self {
        Self::Fixed(Bytes::new())
    }

    pub fn fixed(bytes: impl Into<Bytes>) -> Self {
        Self::Fixed(bytes.into())
    }

    pub fn streaming(producer: impl BodyProducer + 'static) -> Self {
        Self::Streaming(Box::new(producer))
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming(_))
    }

    /// Returns the buffered content of a fixed body.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Fixed(bytes) => Some(bytes),
            Self::Streaming(_) => None,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(bytes) => f.debug_tuple("Fixed").field(bytes).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// Fixed bodies compare by content. A streaming body is never equal to anything.
impl PartialEq for Body {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Fixed(bytes)
    }
}

impl From<&'static str> for Body {
    fn from(str: &'static str) -> Self {
        Self::Fixed(Bytes::from_static(str.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(string: String) -> Self {
        Self::Fixed(Bytes::from(string))
    }
}

impl From<Vec<u8>> for Body {
    fn from(vec: Vec<u8>) -> Self {
        Self::Fixed(Bytes::from(vec))
    }
}

/// Writes a streaming body once the message head is on the wire.
#[async_trait]
pub trait BodyProducer: Send {
    async fn produce(self: Box<Self>, sender: &mut BodySender<'_>) -> Result<(), SendError>;
}

/// Sink handed to a [`BodyProducer`], bound to the stream the message is written to.
pub struct BodySender<'a> {
    stream: &'a mut dyn ByteStream,
    bytes_sent: u64,
    finished: bool,
}

impl<'a> BodySender<'a> {
    pub(crate) fn new(stream: &'a mut dyn ByteStream) -> Self {
        Self { stream, bytes_sent: 0, finished: false }
    }

    /// Sends raw bytes. No framing is applied.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        self.stream.write_bytes(bytes).await?;
        self.bytes_sent += bytes.len() as u64;
        Ok(())
    }

    /// Sends `bytes` as one chunk of a chunked body. Empty input is skipped because
    /// a zero-sized chunk terminates the body.
    pub async fn send_chunk(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        if self.finished {
            return Err(SendError::invalid_body("chunk sent after the last chunk"));
        }
        if bytes.is_empty() {
            return Ok(());
        }

        let mut chunk = BytesMut::with_capacity(bytes.len() + 12);
        write!(helper::Writer(&mut chunk), "{:X}\r\n", bytes.len())?;
        chunk.put_slice(bytes);
        chunk.put_slice(b"\r\n");
        trace!(len = bytes.len(), "sending chunk");
        self.send(&chunk).await
    }

    /// Sends the last chunk with an empty trailer section.
    pub async fn finish(&mut self) -> Result<(), SendError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.send(b"0\r\n\r\n").await
    }

    pub async fn flush(&mut self) -> Result<(), SendError> {
        Ok(self.stream.flush().await?)
    }

    /// Number of raw bytes written so far, framing included.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }
}

impl fmt::Debug for BodySender<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySender").field("bytes_sent", &self.bytes_sent).field("finished", &self.finished).finish()
    }
}

/// Streams any `http_body::Body` as a chunked body. Trailer frames are dropped.
#[derive(Debug)]
pub struct HttpBodyProducer<B> {
    body: B,
}

impl<B> HttpBodyProducer<B> {
    pub fn new(body: B) -> Self {
        Self { body }
    }
}

#[async_trait]
impl<B> BodyProducer for HttpBodyProducer<B>
where
    B: http_body::Body<Data = Bytes> + Send + Unpin + 'static,
    B::Error: Display + Send,
{
    async fn produce(mut self: Box<Self>, sender: &mut BodySender<'_>) -> Result<(), SendError> {
        loop {
            let frame = match self.body.frame().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(SendError::invalid_body(format!("resolve body error: {e}"))),
                None => return sender.finish().await,
            };

            if let Ok(data) = frame.into_data() {
                sender.send_chunk(&data).await?;
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
