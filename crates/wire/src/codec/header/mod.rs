//! Header section processing.
//!
//! - [`HeaderDecoder`]: turns header lines into [`Headers`](crate::protocol::Headers),
//!   handling obs-fold continuations, duplicate fields and the field count limit
//! - [`HeaderEncoder`]: writes a start-line and a prepared header section

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
