//! HTTP message model.
//!
//! # Components
//!
//! - [`Headers`]: insertion-ordered header table with case-insensitive lookup and
//!   obs-fold continuation support
//! - [`Version`] and [`Method`]: start-line tokens
//! - [`Body`]: fixed buffer or streaming producer
//! - [`Message`]: the capability shared by [`Request`] and [`Response`], used by the
//!   parser and serializer in [`codec`](crate::codec)
//! - [`ParseError`], [`SendError`], [`HttpError`]: error types

mod message;
pub use message::Message;
pub use message::StartLine;

mod headers;
pub use headers::Headers;

mod version;
pub use version::Version;

mod method;
pub use method::Method;

mod request;
pub use request::Request;

mod response;
pub use response::Response;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
pub use error::VersionError;

pub mod body;
pub use body::Body;
pub use body::BodyProducer;
pub use body::BodySender;
pub use body::HttpBodyProducer;
