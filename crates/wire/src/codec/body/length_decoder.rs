//! Decoder for bodies framed by `Content-Length`.

use bytes::Bytes;
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;
use crate::stream::ByteStream;

/// Reads exactly `length` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    length: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }

    pub async fn decode(&self, stream: &mut dyn ByteStream, max_body_bytes: u64) -> Result<Bytes, ParseError> {
        ensure!(self.length <= max_body_bytes, ParseError::too_large_body(self.length, max_body_bytes));
        let len = usize::try_from(self.length).map_err(|_| ParseError::too_large_body(self.length, max_body_bytes))?;

        let bytes = stream.read_bytes(len).await?;
        ensure!(
            bytes.len() == len,
            ParseError::invalid_body(format!("expected {len} body bytes, stream ended after {}", bytes.len()))
        );

        trace!(len, "read fixed length body");
        Ok(bytes)
    }
}
