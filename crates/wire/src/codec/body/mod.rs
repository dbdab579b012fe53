//! Message body decoding and encoding.
//!
//! ## Decoders
//! - [`PayloadDecoder`]: picks the framing from the headers and delegates to
//! - `LengthDecoder`: bodies framed by `Content-Length`
//! - `ChunkedDecoder`: chunked transfer coding, including trailer skipping
//!
//! ## Encoders
//! - [`PayloadEncoder`]: writes a [`Body`](crate::protocol::Body) after the head

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
