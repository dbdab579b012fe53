//! Limits and defaults for the HTTP parser and the WebSocket connection.
//!
//! Every field has a conservative default so `Default::default()` is a sensible
//! starting point for servers.

use http::uri::Scheme;

/// Default maximum number of header fields in a message
pub const DEFAULT_MAX_HEADERS: usize = 64;

/// Default maximum size of a header or trailer section, line terminators included
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Default maximum length of a single start-line or header line
pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024;

/// Default maximum size of a decoded HTTP body
pub const DEFAULT_MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// Default maximum payload of a single WebSocket frame
pub const DEFAULT_MAX_FRAME_PAYLOAD: u64 = 16 * 1024 * 1024;

/// Default maximum size of a reassembled WebSocket message
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// Configuration for [`MessageDecoder`](crate::codec::MessageDecoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum number of header field lines (continuation lines excluded)
    pub max_headers: usize,
    /// Maximum size of the whole header section, continuation lines included
    pub max_header_bytes: usize,
    /// Maximum decoded body size, for both fixed-length and chunked bodies
    pub max_body_bytes: u64,
    /// Scheme used when resolving an origin-form request-target against `Host`
    pub default_scheme: Scheme,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            max_headers: DEFAULT_MAX_HEADERS,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            default_scheme: Scheme::HTTP,
        }
    }
}

/// Which end of a WebSocket connection this instance plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Outbound frames are masked with a fresh random key
    Client,
    /// Outbound frames are sent unmasked
    Server,
}

/// Configuration for [`WebSocket`](crate::ws::WebSocket).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketConfig {
    pub role: Role,
    /// Frames declaring a larger payload are rejected before it is read
    pub max_frame_payload: u64,
    /// Upper bound for a message reassembled from fragments
    pub max_message_bytes: usize,
}

impl WebSocketConfig {
    pub fn client() -> Self {
        Self { role: Role::Client, ..Self::default() }
    }

    pub fn server() -> Self {
        Self::default()
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            role: Role::Server,
            max_frame_payload: DEFAULT_MAX_FRAME_PAYLOAD,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}
