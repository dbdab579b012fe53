//! Wire-protocol engines for HTTP/1.1 and WebSocket
//!
//! This crate turns a raw, untrusted byte stream into structured messages and back. It
//! has two engines that share one stream abstraction:
//!
//! - an HTTP/1.1 message parser and serializer: start-line, header section with
//!   obs-fold continuations, `Content-Length` and chunked body framing
//! - a WebSocket frame codec and connection state machine: RFC 6455 framing, masking,
//!   fragmentation and the close handshake
//!
//! Neither engine opens sockets, spawns tasks or applies timeouts. They read lines and
//! byte runs from a [`stream::ByteStream`] and write bytes back to it, so the stream is
//! their only suspension point.
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use micro_wire::codec::{MessageDecoder, MessageEncoder};
//! use micro_wire::protocol::{Request, Response};
//! use micro_wire::stream::IoStream;
//! use micro_wire::ws::{handshake, make_sink, Outbox, WebSocket, WebSocketEvent};
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = listener.accept().await?;
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let mut stream = IoStream::new(reader, writer);
//!
//!             let request: Request = match MessageDecoder::new().parse(&mut stream).await {
//!                 Ok(request) => request,
//!                 Err(e) => {
//!                     warn!(cause = %e, "bad request");
//!                     return;
//!                 }
//!             };
//!
//!             let response = match handshake::upgrade_response(&request) {
//!                 Ok(response) => response,
//!                 Err(e) => Response::new(e.status_hint()),
//!             };
//!             let upgraded = response.status() == StatusCode::SWITCHING_PROTOCOLS;
//!             if let Err(e) = MessageEncoder::new().serialize(response, &mut stream).await {
//!                 error!(cause = %e, "failed to send response");
//!                 return;
//!             }
//!
//!             if upgraded {
//!                 let mut ws = WebSocket::server(stream);
//!                 let mut echo = make_sink(|event, outbox: &mut Outbox| {
//!                     if let WebSocketEvent::Text(text) = event {
//!                         outbox.send_text(text);
//!                     }
//!                 });
//!                 let status = ws.listen(&mut echo).await;
//!                 info!(code = status.code, cleanly = status.cleanly, "websocket closed");
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`stream`]: the byte stream capability and a tokio adapter
//! - [`protocol`]: HTTP message model and error types
//! - [`codec`]: HTTP message parsing and serialization
//! - [`ws`]: WebSocket frames, codec, connection and upgrade handshake
//! - [`config`]: limits and defaults
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: malformed or oversized input, with
//!   [`status_hint`](protocol::ParseError::status_hint) for a 400-class rejection
//! - [`protocol::SendError`]: serialization failures
//! - [`protocol::HttpError`]: either of the above
//! - [`ws::WsError`]: WebSocket decoding and protocol errors
//!
//! # Limitations
//!
//! - HTTP/1.x only, no HTTP/2
//! - No WebSocket extensions, so any reserved bit is a protocol error
//! - No TLS, wrap the transport before handing it to [`stream::IoStream`]

pub mod codec;
pub mod config;
pub mod protocol;
pub mod stream;
pub mod ws;

mod utils;
pub(crate) use utils::ensure;
