//! Writes one HTTP message onto a [`ByteStream`].

use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::body::PayloadEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, SendError};
use crate::stream::ByteStream;

/// Serializer for any [`Message`].
///
/// The message head is assembled in a reused buffer and handed to the stream in one
/// write. The stream is flushed once the body has been written.
#[derive(Debug, Default)]
pub struct MessageEncoder {
    header_encoder: HeaderEncoder,
    payload_encoder: PayloadEncoder,
    head_buf: BytesMut,
}

impl MessageEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn serialize<M: Message>(&mut self, message: M, stream: &mut dyn ByteStream) -> Result<(), SendError> {
        let start_line = message.start_line();
        let headers = message.prepare_headers();

        self.head_buf.clear();
        self.header_encoder.encode((start_line.as_str(), &headers), &mut self.head_buf)?;
        stream.write_bytes(&self.head_buf).await?;

        let body_bytes = self.payload_encoder.encode(message.into_body(), stream).await?;
        stream.flush().await?;

        trace!(head_bytes = self.head_buf.len(), body_bytes, start_line = %start_line, "serialized message");
        Ok(())
    }
}
