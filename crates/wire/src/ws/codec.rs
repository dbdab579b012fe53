//! Frame decoding and encoding.
//!
//! [`FrameDecoder`] and [`FrameEncoder`] are tokio-util codecs over `BytesMut`, usable
//! with `FramedRead`/`FramedWrite` on any `AsyncRead`/`AsyncWrite`. [`FrameCodec`]
//! drives them over a [`ByteStream`] and owns the read-ahead buffer, so bytes pulled
//! from the stream but not yet part of a complete frame survive between reads. A
//! connection creates one `FrameCodec` and keeps it for its whole lifetime.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::ensure;
use crate::stream::ByteStream;
use crate::ws::frame::MAX_INLINE_LENGTH;
use crate::ws::{Frame, FrameHeader, MaskingKey, WsError};

/// Largest read requested from the stream at once, so buffers grow only as payload
/// bytes actually arrive
const MAX_READ_SIZE: usize = 8 * 1024;

/// Where the decoder is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// The two base header bytes
    Head,
    /// 2 or 8 bytes of extended payload length
    ExtendedLength { header: FrameHeader, width: usize, masked: bool },
    /// The 4 byte masking key
    Mask { header: FrameHeader },
    Payload { header: FrameHeader },
}

/// Incremental frame decoder.
///
/// Each call consumes whatever header parts are complete and keeps its progress, so
/// input can arrive in pieces of any size.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecodeState,
    max_payload: u64,
}

impl FrameDecoder {
    pub fn new(max_payload: u64) -> Self {
        Self { state: DecodeState::Head, max_payload }
    }

    /// True between frames.
    pub fn is_idle(&self) -> bool {
        self.state == DecodeState::Head
    }

    /// How many more bytes the current step needs, given `buffered` bytes already
    /// waiting in the input buffer.
    pub fn bytes_needed(&self, buffered: usize) -> usize {
        let step = match self.state {
            DecodeState::Head => 2,
            DecodeState::ExtendedLength { width, .. } => width,
            DecodeState::Mask { .. } => 4,
            DecodeState::Payload { header } => usize::try_from(header.payload_length).unwrap_or(usize::MAX),
        };
        step.saturating_sub(buffered).max(1)
    }

    fn after_length(&self, header: FrameHeader, masked: bool) -> Result<DecodeState, WsError> {
        ensure!(header.payload_length <= self.max_payload, WsError::payload_too_large(header.payload_length, self.max_payload));
        Ok(if masked { DecodeState::Mask { header } } else { DecodeState::Payload { header } })
    }
}

impl Decoder for FrameDecoder {
    type Item = Frame;
    type Error = WsError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            self.state = match self.state {
                DecodeState::Head => {
                    if src.len() < 2 {
                        return Ok(None);
                    }

                    let mut header = FrameHeader::from_first_byte(src[0])?;
                    ensure!(!header.has_reserved_bits(), WsError::ReservedBits);

                    let masked = src[1] & 0x80 != 0;
                    let length = u64::from(src[1] & 0x7F);
                    if header.opcode.is_control() {
                        ensure!(header.fin, WsError::FragmentedControlFrame);
                        ensure!(length <= MAX_INLINE_LENGTH, WsError::ControlFrameTooLarge { len: length });
                    }
                    src.advance(2);

                    match length {
                        126 => DecodeState::ExtendedLength { header, width: 2, masked },
                        127 => DecodeState::ExtendedLength { header, width: 8, masked },
                        _ => {
                            header.payload_length = length;
                            self.after_length(header, masked)?
                        }
                    }
                }

                DecodeState::ExtendedLength { mut header, width, masked } => {
                    if src.len() < width {
                        return Ok(None);
                    }

                    let length = if width == 2 { u64::from(src.get_u16()) } else { src.get_u64() };
                    // the most significant bit of a 64-bit length must be 0
                    ensure!(length >> 63 == 0, WsError::payload_too_large(length, self.max_payload));
                    header.payload_length = length;
                    self.after_length(header, masked)?
                }

                DecodeState::Mask { mut header } => {
                    if src.len() < 4 {
                        return Ok(None);
                    }

                    let mut key = [0u8; 4];
                    src.copy_to_slice(&mut key);
                    header.masking_key = Some(MaskingKey::new(key));
                    DecodeState::Payload { header }
                }

                DecodeState::Payload { header } => {
                    let len = usize::try_from(header.payload_length)
                        .map_err(|_| WsError::payload_too_large(header.payload_length, self.max_payload))?;
                    if src.len() < len {
                        return Ok(None);
                    }

                    let mut payload = src.split_to(len);
                    if let Some(key) = header.masking_key {
                        key.apply(&mut payload, 0);
                    }

                    self.state = DecodeState::Head;
                    trace!(opcode = ?header.opcode, fin = header.fin, len, "decoded frame");
                    return Ok(Some(Frame { header, payload: payload.freeze() }));
                }
            };
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None if buf.is_empty() && self.is_idle() => Ok(None),
            None => Err(WsError::truncated(buf.len() + self.bytes_needed(buf.len()), buf.len())),
        }
    }
}

/// Frame encoder. The payload is masked when the header carries a masking key.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameEncoder;

impl Encoder<Frame> for FrameEncoder {
    type Error = WsError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let Frame { header, payload } = frame;

        let actual = payload.len() as u64;
        ensure!(
            header.payload_length == actual,
            WsError::PayloadLengthMismatch { declared: header.payload_length, actual }
        );
        ensure!(!header.has_reserved_bits(), WsError::ReservedBits);
        if header.opcode.is_control() {
            ensure!(header.fin, WsError::FragmentedControlFrame);
            ensure!(actual <= MAX_INLINE_LENGTH, WsError::ControlFrameTooLarge { len: actual });
        }

        dst.reserve(header.encoded_len() + payload.len());
        header.encode(dst);

        let start = dst.len();
        dst.extend_from_slice(&payload);
        if let Some(key) = header.masking_key {
            key.apply(&mut dst[start..], 0);
        }
        Ok(())
    }
}

/// Reads and writes whole frames over a [`ByteStream`].
#[derive(Debug)]
pub struct FrameCodec {
    decoder: FrameDecoder,
    encoder: FrameEncoder,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl FrameCodec {
    pub fn new(max_payload: u64) -> Self {
        Self { decoder: FrameDecoder::new(max_payload), encoder: FrameEncoder, read_buf: BytesMut::new(), write_buf: BytesMut::new() }
    }

    /// Bytes read from the stream that are not part of a returned frame yet.
    pub fn buffered(&self) -> usize {
        self.read_buf.len()
    }

    /// Reads the next frame.
    ///
    /// Only the bytes the current decoding step needs are requested from the stream.
    /// Returns `Ok(None)` if the stream ended cleanly between two frames, and
    /// [`WsError::TruncatedFrame`] if it ended inside one.
    pub async fn read_frame(&mut self, stream: &mut dyn ByteStream) -> Result<Option<Frame>, WsError> {
        loop {
            if let Some(frame) = self.decoder.decode(&mut self.read_buf)? {
                return Ok(Some(frame));
            }

            let wanted = self.decoder.bytes_needed(self.read_buf.len()).min(MAX_READ_SIZE);
            let bytes = stream.read_bytes(wanted).await?;
            self.read_buf.extend_from_slice(&bytes);

            if bytes.len() < wanted {
                if bytes.is_empty() && self.read_buf.is_empty() && self.decoder.is_idle() {
                    trace!("stream ended between frames");
                    return Ok(None);
                }
                let missing = self.decoder.bytes_needed(self.read_buf.len());
                return Err(WsError::truncated(self.read_buf.len() + missing, self.read_buf.len()));
            }
        }
    }

    /// Encodes `frame` and hands it to the stream. The stream is not flushed.
    pub async fn write_frame(&mut self, frame: Frame, stream: &mut dyn ByteStream) -> Result<(), WsError> {
        self.write_buf.clear();
        self.encoder.encode(frame, &mut self.write_buf)?;
        stream.write_bytes(&self.write_buf).await?;
        Ok(())
    }
}
