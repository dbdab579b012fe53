//! Line-oriented header section decoder.
//!
//! Each line is one of:
//!
//! - a field line `name ":" OWS value OWS`, combined with earlier lines of the same
//!   name through [`Headers::append`]
//! - an obs-fold continuation (leading space or tab), concatenated onto the value of
//!   the field written last
//! - the empty line that ends the section
//!
//! Whitespace between a field name and its colon is rejected instead of being
//! stripped, so two intermediaries can never disagree about the field's name.

use http::{HeaderName, HeaderValue};
use tracing::trace;

use crate::ensure;
use crate::protocol::{Headers, ParseError};
use crate::stream::ByteStream;
use crate::utils::{is_ows, trim_ows};

/// Decoder for one header (or trailer) section.
#[derive(Debug)]
pub struct HeaderDecoder {
    max_headers: usize,
    max_header_bytes: usize,
    field_lines: usize,
    section_bytes: usize,
    headers: Headers,
}

impl HeaderDecoder {
    pub fn new(max_headers: usize, max_header_bytes: usize) -> Self {
        Self { max_headers, max_header_bytes, field_lines: 0, section_bytes: 0, headers: Headers::new() }
    }

    /// Feeds one line without its line terminator.
    ///
    /// Returns `Ok(true)` once the empty line closing the section was fed.
    pub fn decode_line(&mut self, line: &[u8]) -> Result<bool, ParseError> {
        let Some(first) = line.first() else {
            return Ok(true);
        };

        // every line counts with its CRLF, folded ones too
        self.section_bytes = self.section_bytes.saturating_add(line.len() + 2);
        ensure!(
            self.section_bytes <= self.max_header_bytes,
            ParseError::too_large_header(self.section_bytes, self.max_header_bytes)
        );

        if is_ows(*first) {
            let continuation = trim_ows(line);
            let extended = self.headers.append_to_last(continuation).map_err(ParseError::invalid_header)?;
            ensure!(extended, ParseError::InvalidRequest);
            trace!(name = ?self.headers.last_name(), "folded continuation line");
            return Ok(false);
        }

        ensure!(self.field_lines < self.max_headers, ParseError::too_many_headers(self.max_headers));

        let colon = line.iter().position(|b| *b == b':').ok_or_else(|| ParseError::invalid_header("missing colon"))?;
        let raw_name = &line[..colon];
        ensure!(!raw_name.last().is_some_and(|b| is_ows(*b)), ParseError::InvalidKeyWhitespace);

        let name = HeaderName::from_bytes(raw_name).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_bytes(trim_ows(&line[colon + 1..])).map_err(ParseError::invalid_header)?;

        self.headers.append(name, value);
        self.field_lines += 1;
        Ok(false)
    }

    pub fn into_headers(self) -> Headers {
        self.headers
    }

    /// Reads lines from `stream` until the section ends.
    pub async fn decode(mut self, stream: &mut dyn ByteStream) -> Result<Headers, ParseError> {
        loop {
            let Some(line) = stream.read_line().await? else {
                return Err(ParseError::invalid_header("stream ended inside the header section"));
            };
            if self.decode_line(&line)? {
                trace!(fields = self.headers.len(), "decoded header section");
                return Ok(self.headers);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::IoStream;
    use indoc::indoc;

    fn decode_lines(lines: &[&[u8]]) -> Result<Headers, ParseError> {
        let mut decoder = HeaderDecoder::new(8, 1024);
        for line in lines {
            if decoder.decode_line(line)? {
                break;
            }
        }
        Ok(decoder.into_headers())
    }

    #[test]
    fn field_values_are_trimmed() {
        let headers = decode_lines(&[b"Host:\t example.com  ", b"Accept:*/*", b""]).unwrap();

        assert_eq!(headers.get_str("host"), Some("example.com"));
        assert_eq!(headers.get_str("accept"), Some("*/*"));
    }

    #[test]
    fn obs_fold_joins_onto_last_field() {
        let headers = decode_lines(&[b"X-Foo: a", b" b", b""]).unwrap();
        assert_eq!(headers.get_str("x-foo"), Some("ab"));

        let headers = decode_lines(&[b"X-First: 1", b"X-Second: 2", b"\t  3  ", b""]).unwrap();
        assert_eq!(headers.get_str("x-first"), Some("1"));
        assert_eq!(headers.get_str("x-second"), Some("23"));
    }

    #[test]
    fn leading_whitespace_without_field_is_rejected() {
        assert!(matches!(decode_lines(&[b" orphan", b""]), Err(ParseError::InvalidRequest)));
    }

    #[test]
    fn whitespace_before_colon_is_rejected() {
        assert!(matches!(decode_lines(&[b"X-Foo : bar", b""]), Err(ParseError::InvalidKeyWhitespace)));
        assert!(matches!(decode_lines(&[b"X-Foo\t: bar", b""]), Err(ParseError::InvalidKeyWhitespace)));
    }

    #[test]
    fn malformed_lines() {
        assert!(matches!(decode_lines(&[b"no colon here", b""]), Err(ParseError::InvalidHeader { .. })));
        assert!(matches!(decode_lines(&[b": empty name", b""]), Err(ParseError::InvalidHeader { .. })));
        assert!(matches!(decode_lines(&[b"Bad\x01Name: x", b""]), Err(ParseError::InvalidHeader { .. })));
        assert!(matches!(decode_lines(&[b"X-Foo: a\x7fb", b""]), Err(ParseError::InvalidHeader { .. })));
    }

    #[test]
    fn duplicates_are_combined() {
        let headers = decode_lines(&[b"Accept: text/html", b"accept: application/json", b""]).unwrap();

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get_str("accept"), Some("text/html, application/json"));
    }

    #[test]
    fn header_limit() {
        let mut decoder = HeaderDecoder::new(2, 1024);
        decoder.decode_line(b"A: 1").unwrap();
        decoder.decode_line(b"B: 2").unwrap();
        decoder.decode_line(b" folded").unwrap();

        assert!(matches!(decoder.decode_line(b"C: 3"), Err(ParseError::TooManyHeaders { max_num: 2 })));
    }

    #[test]
    fn section_size_limit_counts_folded_lines() {
        let mut decoder = HeaderDecoder::new(64, 64);
        decoder.decode_line(b"X-Big: a").unwrap();

        let mut fold = b" ".to_vec();
        fold.extend_from_slice(&[b'x'; 40]);
        decoder.decode_line(&fold).unwrap();
        assert!(matches!(
            decoder.decode_line(&fold),
            Err(ParseError::TooLargeHeader { current_size: 96, max_size: 64 })
        ));
    }

    #[tokio::test]
    async fn endless_folding_is_cut_off() {
        let mut input = b"X-Big: a\r\n".to_vec();
        for _ in 0..64 {
            input.push(b' ');
            input.extend_from_slice(&[b'x'; 1000]);
            input.extend_from_slice(b"\r\n");
        }
        input.extend_from_slice(b"\r\n");
        let mut stream = IoStream::new(&input[..], Vec::new());

        let result = HeaderDecoder::new(64, 8 * 1024).decode(&mut stream).await;

        let e = result.unwrap_err();
        assert!(matches!(e, ParseError::TooLargeHeader { max_size: 8192, .. }));
        assert_eq!(e.status_hint(), Some(http::StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE));
    }

    #[tokio::test]
    async fn decode_from_stream_stops_at_blank_line() {
        let input = indoc! {"
            Host: 127.0.0.1:8080\r
            User-Agent: curl/7.79.1\r
            \r
            body"};
        let mut stream = IoStream::new(input.as_bytes(), Vec::new());

        let headers = HeaderDecoder::new(64, 1024).decode(&mut stream).await.unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get_str("user-agent"), Some("curl/7.79.1"));
        assert_eq!(stream.read_line().await.unwrap().unwrap(), &b"body"[..]);
    }

    #[tokio::test]
    async fn stream_ending_inside_section() {
        let mut stream = IoStream::new(&b"Host: a\r\n"[..], Vec::new());
        let result = HeaderDecoder::new(64, 1024).decode(&mut stream).await;

        assert!(matches!(result, Err(ParseError::InvalidHeader { .. })));
    }
}
