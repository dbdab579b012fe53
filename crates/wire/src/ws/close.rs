//! Close frame payloads and close status codes (RFC 6455 Section 5.5.1, 7.4).

use crate::ws::{Frame, OpCode, WsError};

/// Well-known close status codes.
pub mod close_code {
    pub const NORMAL: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const PROTOCOL_ERROR: u16 = 1002;
    pub const UNSUPPORTED_DATA: u16 = 1003;
    /// Reported when a close frame carried no status code, never sent
    pub const NO_STATUS: u16 = 1005;
    /// Reported when the connection dropped without a close handshake, never sent
    pub const ABNORMAL: u16 = 1006;
    pub const INVALID_PAYLOAD: u16 = 1007;
    pub const POLICY_VIOLATION: u16 = 1008;
    pub const MESSAGE_TOO_BIG: u16 = 1009;
    pub const INTERNAL_ERROR: u16 = 1011;
}

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseStatus {
    pub code: u16,
    pub reason: String,
    /// True only if the close handshake completed
    pub cleanly: bool,
}

impl CloseStatus {
    pub fn clean(code: u16, reason: impl Into<String>) -> Self {
        Self { code, reason: reason.into(), cleanly: true }
    }

    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self { code: close_code::ABNORMAL, reason: reason.into(), cleanly: false }
    }
}

/// Decoded payload of a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    pub code: Option<u16>,
    pub reason: String,
}

impl CloseFrame {
    /// Parses a close payload: empty, or a big-endian code followed by UTF-8 text.
    pub fn parse(payload: &[u8]) -> Result<Self, WsError> {
        match payload {
            [] => Ok(Self { code: None, reason: String::new() }),
            [_] => Err(WsError::InvalidClosePayload),
            [hi, lo, reason @ ..] => {
                let reason = std::str::from_utf8(reason).map_err(|_| WsError::InvalidClosePayload)?;
                Ok(Self { code: Some(u16::from_be_bytes([*hi, *lo])), reason: reason.to_owned() })
            }
        }
    }

    /// The code to report, `1005` if the frame had none.
    pub fn status_code(&self) -> u16 {
        self.code.unwrap_or(close_code::NO_STATUS)
    }
}

impl TryFrom<&Frame> for CloseFrame {
    type Error = WsError;

    fn try_from(frame: &Frame) -> Result<Self, Self::Error> {
        if frame.opcode() != OpCode::Close {
            return Err(WsError::UnexpectedCloseOpCode);
        }
        Self::parse(&frame.payload)
    }
}
