//! Parses one HTTP message from a [`ByteStream`].
//!
//! Parsing runs in three steps that can each fail on their own: the start-line, the
//! header section, then the body. The concrete [`Message`] is built last, from the
//! start-line tokens, the headers and the decoded body.

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::config::ParseConfig;
use crate::protocol::{Message, ParseError, StartLine};
use crate::stream::ByteStream;

/// Parser for [`Request`](crate::protocol::Request)s or
/// [`Response`](crate::protocol::Response)s, chosen by `M`.
///
/// The decoder holds no per-message state, one instance can parse every message of a
/// keep-alive connection.
pub struct MessageDecoder<M> {
    config: ParseConfig,
    _message: PhantomData<fn() -> M>,
}

impl<M: Message> MessageDecoder<M> {
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    pub fn with_config(config: ParseConfig) -> Self {
        Self { config, _message: PhantomData }
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Reads the next message.
    ///
    /// Fails with [`ParseError::StreamEmpty`] when the stream ended, or delivered an
    /// empty line, where a start-line was expected.
    pub async fn parse(&self, stream: &mut dyn ByteStream) -> Result<M, ParseError> {
        let start_line = match stream.read_line().await? {
            Some(line) if !line.is_empty() => StartLine::split(line)?,
            _ => {
                debug!("no start line, stream is empty");
                return Err(ParseError::StreamEmpty);
            }
        };
        trace!(start_line = ?start_line, "read start line");

        let headers = HeaderDecoder::new(self.config.max_headers, self.config.max_header_bytes).decode(stream).await?;

        let payload_decoder = PayloadDecoder::from_headers(&headers, &self.config)?;
        let body = payload_decoder.decode(stream, &self.config).await?;

        M::from_parts(start_line, headers, body, &self.config)
    }
}

impl<M: Message> Default for MessageDecoder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for MessageDecoder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDecoder").field("config", &self.config).finish()
    }
}
