//! Serializes a start-line and a prepared header section.
//!
//! Headers are written exactly as given, in insertion order. Body framing headers and
//! connection defaults are expected to be filled in already by
//! [`Message::prepare_headers`](crate::protocol::Message::prepare_headers).

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::{Headers, SendError};

/// Initial buffer size reserved for the message head
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for `(start-line, headers)` pairs implementing the [`Encoder`] trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl<'a> Encoder<(&'a str, &'a Headers)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (&'a str, &'a Headers), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (start_line, headers) = item;

        if start_line.bytes().any(|b| b == b'\r' || b == b'\n') {
            error!(start_line, "refusing to write a start line containing a line break");
            return Err(SendError::invalid_start_line("line break inside the start line"));
        }

        dst.reserve(INIT_HEADER_SIZE);
        dst.put_slice(start_line.as_bytes());
        dst.put_slice(b"\r\n");

        for (name, value) in headers.iter() {
            dst.put_slice(name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(value.as_ref());
            dst.put_slice(b"\r\n");
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}
