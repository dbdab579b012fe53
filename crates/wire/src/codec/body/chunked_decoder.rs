//! Decoder for the chunked transfer coding.
//!
//! Each chunk is a line holding the size in hex, optionally followed by `;extensions`
//! which are ignored, then `size` bytes of data and a CRLF. A `0` size line ends the
//! body, after which the trailer section is read and discarded up to its blank line.
//! A missing, empty or unparseable size line also ends the body.
//!
//! See [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::header::HeaderDecoder;
use crate::ensure;
use crate::protocol::ParseError;
use crate::stream::ByteStream;
use crate::utils::trim_ows;

/// At most 16 hex digits fit in a `u64`
const MAX_SIZE_DIGITS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    max_trailers: usize,
    max_trailer_bytes: usize,
}

impl ChunkedDecoder {
    pub fn new(max_trailers: usize, max_trailer_bytes: usize) -> Self {
        Self { max_trailers, max_trailer_bytes }
    }

    /// Accumulates every chunk into one buffer.
    pub async fn decode(&self, stream: &mut dyn ByteStream, max_body_bytes: u64) -> Result<Bytes, ParseError> {
        let mut body = BytesMut::new();

        loop {
            let Some(line) = stream.read_line().await? else {
                debug!(len = body.len(), "stream ended before the last chunk");
                break;
            };

            let size = match parse_chunk_size(&line) {
                Some(0) => {
                    self.skip_trailers(stream).await?;
                    break;
                }
                Some(size) => size,
                None => {
                    debug!(line = ?line, "chunk size line is empty or invalid, body ends here");
                    break;
                }
            };

            let current_size = (body.len() as u64).saturating_add(size);
            ensure!(current_size <= max_body_bytes, ParseError::too_large_body(current_size, max_body_bytes));

            let size = usize::try_from(size).map_err(|_| ParseError::too_large_body(current_size, max_body_bytes))?;
            let framed_size =
                size.checked_add(2).ok_or_else(|| ParseError::too_large_body(current_size, max_body_bytes))?;
            let chunk = stream.read_bytes(framed_size).await?;
            ensure!(
                chunk.len() == framed_size && chunk.ends_with(b"\r\n"),
                ParseError::invalid_body("chunk data is not followed by CRLF")
            );

            trace!(size, "read chunk");
            body.extend_from_slice(&chunk[..size]);
        }

        Ok(body.freeze())
    }

    /// Reads the trailer section after the last chunk. Trailer fields are validated
    /// like header fields but not kept.
    async fn skip_trailers(&self, stream: &mut dyn ByteStream) -> Result<(), ParseError> {
        let mut trailers = HeaderDecoder::new(self.max_trailers, self.max_trailer_bytes);
        while let Some(line) = stream.read_line().await? {
            if trailers.decode_line(&line)? {
                break;
            }
        }

        let trailers = trailers.into_headers();
        if !trailers.is_empty() {
            trace!(fields = trailers.len(), "discarded chunked trailers");
        }
        Ok(())
    }
}

/// Parses the hex size of a chunk size line, ignoring chunk extensions.
pub(crate) fn parse_chunk_size(line: &[u8]) -> Option<u64> {
    let size = line.split(|b| *b == b';').next().map(trim_ows)?;
    if size.is_empty() || size.len() > MAX_SIZE_DIGITS || !size.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }

    // hex digits are ASCII
    let size = std::str::from_utf8(size).ok()?;
    u64::from_str_radix(size, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::IoStream;

    async fn decode(input: &'static [u8]) -> (Result<Bytes, ParseError>, IoStream<&'static [u8], Vec<u8>>) {
        let mut stream = IoStream::new(input, Vec::new());
        let result = ChunkedDecoder::new(8, 1024).decode(&mut stream, 1024).await;
        (result, stream)
    }

    #[test]
    fn chunk_sizes() {
        assert_eq!(parse_chunk_size(b"0"), Some(0));
        assert_eq!(parse_chunk_size(b"1a"), Some(26));
        assert_eq!(parse_chunk_size(b"FF"), Some(255));
        assert_eq!(parse_chunk_size(b"5;name=value"), Some(5));
        assert_eq!(parse_chunk_size(b"5 ; ext"), Some(5));
        assert_eq!(parse_chunk_size(b""), None);
        assert_eq!(parse_chunk_size(b"xyz"), None);
        assert_eq!(parse_chunk_size(b"-1"), None);
        assert_eq!(parse_chunk_size(b"10000000000000000"), None);
    }

    #[tokio::test]
    async fn wikipedia() {
        let (result, stream) = decode(b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n").await;

        assert_eq!(result.unwrap(), &b"Wikipedia"[..]);
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn trailers_are_consumed() {
        let (result, mut stream) = decode(b"4\r\nWiki\r\n0\r\nExpires: never\r\nX-Checksum: 1\r\n\r\nGET").await;

        assert_eq!(result.unwrap(), &b"Wiki"[..]);
        assert_eq!(stream.read_line().await.unwrap().unwrap(), &b"GET"[..]);
    }

    #[tokio::test]
    async fn invalid_size_line_ends_body() {
        let (result, _) = decode(b"4\r\nWiki\r\nzz\r\npedia\r\n").await;
        assert_eq!(result.unwrap(), &b"Wiki"[..]);

        let (result, _) = decode(b"4\r\nWiki\r\n").await;
        assert_eq!(result.unwrap(), &b"Wiki"[..]);
    }

    #[tokio::test]
    async fn chunk_without_crlf() {
        let (result, _) = decode(b"4\r\nWikiXX5\r\npedia\r\n0\r\n\r\n").await;
        assert!(matches!(result, Err(ParseError::InvalidBody { .. })));

        let (result, _) = decode(b"4\r\nWi").await;
        assert!(matches!(result, Err(ParseError::InvalidBody { .. })));
    }

    #[tokio::test]
    async fn body_limit() {
        let mut stream = IoStream::new(&b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n"[..], Vec::new());
        let result = ChunkedDecoder::new(8, 1024).decode(&mut stream, 8).await;

        assert!(matches!(result, Err(ParseError::TooLargeBody { current_size: 9, max_size: 8 })));
    }

    #[tokio::test]
    async fn largest_chunk_size_does_not_overflow() {
        let mut stream = IoStream::new(&b"FFFFFFFFFFFFFFFF\r\nWiki\r\n0\r\n\r\n"[..], Vec::new());
        let result = ChunkedDecoder::new(8, 1024).decode(&mut stream, u64::MAX).await;

        assert!(matches!(result, Err(ParseError::TooLargeBody { current_size: u64::MAX, max_size: u64::MAX })));
    }

    #[tokio::test]
    async fn trailer_section_is_bounded() {
        let mut input = b"4\r\nWiki\r\n0\r\nX-Trailer: a\r\n".to_vec();
        for _ in 0..8 {
            input.extend_from_slice(b" ");
            input.extend_from_slice(&[b'x'; 200]);
            input.extend_from_slice(b"\r\n");
        }
        input.extend_from_slice(b"\r\n");
        let mut stream = IoStream::new(&input[..], Vec::new());

        let result = ChunkedDecoder::new(8, 1024).decode(&mut stream, 1024).await;

        assert!(matches!(result, Err(ParseError::TooLargeHeader { max_size: 1024, .. })));
    }
}
