//! WebSocket framing and connection handling (RFC 6455).
//!
//! # Components
//!
//! - [`Frame`], [`FrameHeader`], [`OpCode`], [`MaskingKey`]: the frame model
//! - [`FrameDecoder`], [`FrameEncoder`]: tokio-util codecs for single frames
//! - [`FrameCodec`]: reads and writes frames over a [`ByteStream`](crate::stream::ByteStream),
//!   keeping read-ahead bytes between frames
//! - [`WebSocket`]: the connection state machine, receive loop and close handshake
//! - [`EventSink`], [`WebSocketEvent`], [`Outbox`]: how a connection reports to and
//!   takes replies from the application
//! - [`handshake`]: HTTP upgrade helpers
//!
//! # Example
//!
//! ```no_run
//! use micro_wire::stream::IoStream;
//! use micro_wire::ws::{make_sink, Outbox, WebSocket, WebSocketEvent};
//! use tokio::net::TcpStream;
//!
//! # async fn run(tcp: TcpStream) {
//! let (reader, writer) = tcp.into_split();
//! let mut ws = WebSocket::server(IoStream::new(reader, writer));
//!
//! let mut echo = make_sink(|event, outbox: &mut Outbox| match event {
//!     WebSocketEvent::Text(text) => outbox.send_text(text),
//!     WebSocketEvent::Binary(data) => outbox.send_binary(data),
//!     _ => {}
//! });
//! let status = ws.listen(&mut echo).await;
//! println!("closed with {} (clean: {})", status.code, status.cleanly);
//! # }
//! ```

mod close;
mod codec;
mod connection;
mod error;
mod event;
mod fragment;
mod frame;
pub mod handshake;

pub use close::{close_code, CloseFrame, CloseStatus};
pub use codec::{FrameCodec, FrameDecoder, FrameEncoder};
pub use connection::{ConnectionState, WebSocket};
pub use error::WsError;
pub use event::{make_sink, EventSink, Outbox, SinkFn, WebSocketEvent};
pub use fragment::FragmentAccumulator;
pub use frame::{Frame, FrameHeader, MaskingKey, OpCode, MAX_INLINE_LENGTH, MAX_MEDIUM_LENGTH};
