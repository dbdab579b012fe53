//! Writes a message body after the head.
//!
//! Fixed bodies are written as they are, the framing was already announced through
//! `Content-Length`. Streaming bodies hand the stream to their producer, which owns
//! all chunk framing.

use tracing::trace;

use crate::protocol::{Body, BodySender, SendError};
use crate::stream::ByteStream;

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEncoder;

impl PayloadEncoder {
    /// Returns the number of body bytes written, framing included.
    pub async fn encode(&self, body: Body, stream: &mut dyn ByteStream) -> Result<u64, SendError> {
        match body {
            Body::Fixed(bytes) if bytes.is_empty() => Ok(0),
            Body::Fixed(bytes) => {
                stream.write_bytes(&bytes).await?;
                Ok(bytes.len() as u64)
            }
            Body::Streaming(producer) => {
                let mut sender = BodySender::new(stream);
                producer.produce(&mut sender).await?;
                trace!(bytes_sent = sender.bytes_sent(), "streaming body produced");
                Ok(sender.bytes_sent())
            }
        }
    }
}
