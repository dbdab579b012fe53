use std::io;

use thiserror::Error;

use crate::ws::close_code;

/// Errors raised while decoding, encoding or dispatching WebSocket frames.
#[derive(Debug, Error)]
pub enum WsError {
    #[error("reserved opcode {0:#x}")]
    ReservedOpCode(u8),

    #[error("invalid opcode {0:#x}")]
    InvalidOpCode(u8),

    #[error("reserved bits are set but no extension was negotiated")]
    ReservedBits,

    #[error("stream ended after {actual} of {expected} frame bytes")]
    TruncatedFrame { expected: u64, actual: u64 },

    #[error("declared payload length {declared} does not match the payload of {actual} bytes")]
    PayloadLengthMismatch { declared: u64, actual: u64 },

    #[error("expected a close frame")]
    UnexpectedCloseOpCode,

    #[error("control frame is fragmented")]
    FragmentedControlFrame,

    #[error("control frame payload of {len} bytes exceeds 125")]
    ControlFrameTooLarge { len: u64 },

    #[error("continuation frame without a fragmented message")]
    UnexpectedContinuation,

    #[error("new data frame while a fragmented message is incomplete")]
    IncompleteFragment,

    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid close payload")]
    InvalidClosePayload,

    #[error("payload size {size} exceed the limit {max_size}")]
    PayloadTooLarge { size: u64, max_size: u64 },

    #[error("connection is closed")]
    ConnectionClosed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl WsError {
    pub fn payload_too_large(size: u64, max_size: u64) -> Self {
        Self::PayloadTooLarge { size, max_size }
    }

    pub fn truncated(expected: usize, actual: usize) -> Self {
        Self::TruncatedFrame { expected: expected as u64, actual: actual as u64 }
    }

    /// The status code to announce in a close frame before dropping the connection.
    ///
    /// Returns `None` when the peer can no longer be reached.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::InvalidUtf8 => Some(close_code::INVALID_PAYLOAD),
            Self::PayloadTooLarge { .. } => Some(close_code::MESSAGE_TOO_BIG),
            Self::TruncatedFrame { .. } | Self::ConnectionClosed | Self::Io { .. } => None,
            _ => Some(close_code::PROTOCOL_ERROR),
        }
    }
}
