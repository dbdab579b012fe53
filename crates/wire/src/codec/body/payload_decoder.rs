//! Selects how a message body is framed and decodes it.
//!
//! `Content-Length` is looked at first, then `Transfer-Encoding`. A message with
//! neither has an empty body.

use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use tracing::trace;

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::config::ParseConfig;
use crate::ensure;
use crate::protocol::{Body, Headers, ParseError};
use crate::stream::ByteStream;
use crate::utils::trim_ows;

/// Decoder for one message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Handle messages with no body
    NoBody,
}

impl PayloadDecoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked(max_trailers: usize, max_trailer_bytes: usize) -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new(max_trailers, max_trailer_bytes)) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Picks the framing announced by `headers`.
    ///
    /// Repeated `Content-Length` values (separate lines or a comma list) are accepted
    /// only if they are all the same number.
    pub fn from_headers(headers: &Headers, config: &ParseConfig) -> Result<Self, ParseError> {
        if let Some(length) = content_length(headers)? {
            return Ok(Self::fix_length(length));
        }

        if is_chunked(headers) {
            return Ok(Self::chunked(config.max_headers, config.max_header_bytes));
        }

        Ok(Self::empty())
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }

    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }

    pub async fn decode(&self, stream: &mut dyn ByteStream, config: &ParseConfig) -> Result<Body, ParseError> {
        let bytes = match &self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(stream, config.max_body_bytes).await?,
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(stream, config.max_body_bytes).await?,
            Kind::NoBody => return Ok(Body::empty()),
        };

        trace!(len = bytes.len(), chunked = self.is_chunked(), "decoded body");
        Ok(Body::Fixed(bytes))
    }
}

fn content_length(headers: &Headers) -> Result<Option<u64>, ParseError> {
    let mut length = None;

    for value in headers.get_all(CONTENT_LENGTH.as_str()) {
        for item in value.as_bytes().split(|b| *b == b',') {
            let item = trim_ows(item);
            let parsed = std::str::from_utf8(item)
                .ok()
                .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| ParseError::invalid_content_length(format!("{:?} is not a length", String::from_utf8_lossy(item))))?;

            if let Some(previous) = length {
                ensure!(
                    previous == parsed,
                    ParseError::invalid_content_length(format!("conflicting values {previous} and {parsed}"))
                );
            }
            length = Some(parsed);
        }
    }

    Ok(length)
}

/// True if chunked is the final transfer coding.
fn is_chunked(headers: &Headers) -> bool {
    headers
        .get_all(TRANSFER_ENCODING.as_str())
        .last()
        .and_then(|value| value.as_bytes().rsplit(|b| *b == b',').next())
        .is_some_and(|coding| trim_ows(coding).eq_ignore_ascii_case(b"chunked"))
}
