//! WebSocket frame types (RFC 6455 Section 5.2).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::ws::WsError;

/// Longest payload that fits in the 7-bit length field
pub const MAX_INLINE_LENGTH: u64 = 125;

/// Longest payload that fits in the 16-bit extended length
pub const MAX_MEDIUM_LENGTH: u64 = 0xFFFF;

/// Longest reason that keeps a close payload within a control frame
const MAX_CLOSE_REASON: usize = 123;

const FIN_BIT: u8 = 0x80;
const RSV1_BIT: u8 = 0x40;
const RSV2_BIT: u8 = 0x20;
const RSV3_BIT: u8 = 0x10;
const OPCODE_MASK: u8 = 0x0F;
const MASK_BIT: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl OpCode {
    /// Close, ping and pong. Control frames are never fragmented.
    #[inline]
    pub fn is_control(self) -> bool {
        (self as u8) & 0x8 != 0
    }

    #[inline]
    pub fn is_data(self) -> bool {
        !self.is_control()
    }
}

impl TryFrom<u8> for OpCode {
    type Error = WsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            0x3..=0x7 | 0xB..=0xF => Err(WsError::ReservedOpCode(value)),
            _ => Err(WsError::InvalidOpCode(value)),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(opcode: OpCode) -> Self {
        opcode as u8
    }
}

/// Four byte key XOR-ed cyclically over a payload. Applying it twice restores the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskingKey([u8; 4]);

impl MaskingKey {
    pub const fn new(key: [u8; 4]) -> Self {
        Self(key)
    }

    pub fn random() -> Self {
        Self(fastrand::u32(..).to_be_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Masks (or unmasks) `buf`, whose first byte is payload byte number `offset`.
    pub fn apply(&self, buf: &mut [u8], offset: usize) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte ^= self.0[(offset + i) % 4];
        }
    }
}

impl From<[u8; 4]> for MaskingKey {
    fn from(key: [u8; 4]) -> Self {
        Self(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub fin: bool,
    pub rsv1: bool,
    pub rsv2: bool,
    pub rsv3: bool,
    pub opcode: OpCode,
    /// Present exactly when the mask bit is set
    pub masking_key: Option<MaskingKey>,
    pub payload_length: u64,
}

impl FrameHeader {
    pub fn new(opcode: OpCode, fin: bool, payload_length: u64) -> Self {
        Self { fin, rsv1: false, rsv2: false, rsv3: false, opcode, masking_key: None, payload_length }
    }

    #[inline]
    pub fn is_masked(&self) -> bool {
        self.masking_key.is_some()
    }

    #[inline]
    pub fn has_reserved_bits(&self) -> bool {
        self.rsv1 || self.rsv2 || self.rsv3
    }

    /// Size of the encoded header, using the shortest length encoding.
    pub fn encoded_len(&self) -> usize {
        let length_bytes = match self.payload_length {
            0..=MAX_INLINE_LENGTH => 0,
            ..=MAX_MEDIUM_LENGTH => 2,
            _ => 8,
        };
        let mask_bytes = if self.is_masked() { 4 } else { 0 };
        2 + length_bytes + mask_bytes
    }

    pub(crate) fn first_byte(&self) -> u8 {
        let mut b0 = u8::from(self.opcode);
        if self.fin {
            b0 |= FIN_BIT;
        }
        if self.rsv1 {
            b0 |= RSV1_BIT;
        }
        if self.rsv2 {
            b0 |= RSV2_BIT;
        }
        if self.rsv3 {
            b0 |= RSV3_BIT;
        }
        b0
    }

    /// Reads fin, the reserved bits and the opcode from the first header byte.
    pub(crate) fn from_first_byte(b0: u8) -> Result<Self, WsError> {
        let opcode = OpCode::try_from(b0 & OPCODE_MASK)?;
        Ok(Self {
            fin: b0 & FIN_BIT != 0,
            rsv1: b0 & RSV1_BIT != 0,
            rsv2: b0 & RSV2_BIT != 0,
            rsv3: b0 & RSV3_BIT != 0,
            opcode,
            masking_key: None,
            payload_length: 0,
        })
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.first_byte());

        let mask_bit = if self.is_masked() { MASK_BIT } else { 0 };
        match self.payload_length {
            #[allow(clippy::cast_possible_truncation, reason = "the arm bounds len to 125")]
            len @ 0..=MAX_INLINE_LENGTH => dst.put_u8(mask_bit | len as u8),
            #[allow(clippy::cast_possible_truncation, reason = "the arm bounds len to 0xFFFF")]
            len @ ..=MAX_MEDIUM_LENGTH => {
                dst.put_u8(mask_bit | 126);
                dst.put_u16(len as u16);
            }
            len => {
                dst.put_u8(mask_bit | 127);
                dst.put_u64(len);
            }
        }

        if let Some(key) = self.masking_key {
            dst.put_slice(key.as_bytes());
        }
    }
}

/// One frame with its payload already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(opcode: OpCode, payload: impl Into<Bytes>, fin: bool) -> Self {
        let payload = payload.into();
        Self { header: FrameHeader::new(opcode, fin, payload.len() as u64), payload }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(OpCode::Text, text.into(), true)
    }

    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(OpCode::Binary, data, true)
    }

    pub fn ping(data: impl Into<Bytes>) -> Self {
        Self::new(OpCode::Ping, data, true)
    }

    pub fn pong(data: impl Into<Bytes>) -> Self {
        Self::new(OpCode::Pong, data, true)
    }

    pub fn continuation(data: impl Into<Bytes>, fin: bool) -> Self {
        Self::new(OpCode::Continuation, data, fin)
    }

    /// A close frame carrying `code` and `reason`. The reason is cut to 123 bytes, at a
    /// character boundary, so the payload fits in a control frame.
    pub fn close(code: u16, reason: &str) -> Self {
        let mut end = reason.len().min(MAX_CLOSE_REASON);
        while !reason.is_char_boundary(end) {
            end -= 1;
        }

        let mut payload = BytesMut::with_capacity(2 + end);
        payload.put_u16(code);
        payload.put_slice(&reason.as_bytes()[..end]);
        Self::new(OpCode::Close, payload.freeze(), true)
    }

    /// A close frame without status code.
    pub fn close_empty() -> Self {
        Self::new(OpCode::Close, Bytes::new(), true)
    }

    #[must_use]
    pub fn with_masking_key(mut self, key: MaskingKey) -> Self {
        self.header.masking_key = Some(key);
        self
    }

    #[inline]
    pub fn opcode(&self) -> OpCode {
        self.header.opcode
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.header.fin
    }

    pub fn into_parts(self) -> (FrameHeader, Bytes) {
        (self.header, self.payload)
    }
}
