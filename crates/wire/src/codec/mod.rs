//! HTTP/1.1 message parsing and serialization over a [`ByteStream`](crate::stream::ByteStream).
//!
//! # Architecture
//!
//! - Parsing:
//!   - [`MessageDecoder`]: start-line, header section and body into a
//!     [`Message`](crate::protocol::Message)
//!   - header lines via [`HeaderDecoder`]
//!   - body framing via [`PayloadDecoder`]
//!
//! - Serialization:
//!   - [`MessageEncoder`]: start-line, prepared headers and body onto the stream
//!   - message head via [`HeaderEncoder`], a tokio-util [`Encoder`](tokio_util::codec::Encoder)
//!   - body via [`PayloadEncoder`]
//!
//! # Example
//!
//! ```no_run
//! use micro_wire::codec::{MessageDecoder, MessageEncoder};
//! use micro_wire::protocol::{Request, Response};
//! use micro_wire::stream::IoStream;
//! use http::StatusCode;
//! use tokio::net::TcpStream;
//!
//! # async fn run(tcp: TcpStream) -> Result<(), Box<dyn std::error::Error>> {
//! let (reader, writer) = tcp.into_split();
//! let mut stream = IoStream::new(reader, writer);
//!
//! let request: Request = MessageDecoder::new().parse(&mut stream).await?;
//! let response = Response::new(StatusCode::OK).with_body(format!("you asked for {}", request.uri().path()));
//! MessageEncoder::new().serialize(response, &mut stream).await?;
//! # Ok(())
//! # }
//! ```

mod body;
mod header;
mod message_decoder;
mod message_encoder;

pub use body::{PayloadDecoder, PayloadEncoder};
pub use header::{HeaderDecoder, HeaderEncoder};
pub use message_decoder::MessageDecoder;
pub use message_encoder::MessageEncoder;
