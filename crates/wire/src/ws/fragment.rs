//! Reassembly of fragmented data messages.
//!
//! A fragmented message is a non-final text or binary frame, zero or more non-final
//! continuation frames and a final continuation frame. Control frames may arrive in
//! between and are never passed here.

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::ensure;
use crate::ws::{OpCode, WsError};

#[derive(Debug)]
pub struct FragmentAccumulator {
    max_message_bytes: usize,
    message: Option<(OpCode, BytesMut)>,
}

impl FragmentAccumulator {
    pub fn new(max_message_bytes: usize) -> Self {
        Self { max_message_bytes, message: None }
    }

    /// True while a fragmented message has started but not finished.
    pub fn is_in_progress(&self) -> bool {
        self.message.is_some()
    }

    /// Feeds one data frame.
    ///
    /// Returns the message opcode and its complete payload once the final fragment
    /// arrived, `None` while more fragments are expected.
    pub fn push(&mut self, opcode: OpCode, fin: bool, payload: Bytes) -> Result<Option<(OpCode, Bytes)>, WsError> {
        match (opcode, self.message.as_mut()) {
            (OpCode::Continuation, None) => Err(WsError::UnexpectedContinuation),
            (OpCode::Continuation, Some((_, buf))) => {
                let size = buf.len().saturating_add(payload.len());
                ensure!(size <= self.max_message_bytes, WsError::payload_too_large(size as u64, self.max_message_bytes as u64));
                buf.extend_from_slice(&payload);
                trace!(size, fin, "appended fragment");

                if !fin {
                    return Ok(None);
                }
                Ok(self.message.take().map(|(opcode, buf)| (opcode, buf.freeze())))
            }
            (_, Some(_)) => Err(WsError::IncompleteFragment),
            (opcode, None) if fin => Ok(Some((opcode, payload))),
            (opcode, None) => {
                ensure!(
                    payload.len() <= self.max_message_bytes,
                    WsError::payload_too_large(payload.len() as u64, self.max_message_bytes as u64)
                );
                trace!(?opcode, size = payload.len(), "started fragmented message");
                self.message = Some((opcode, BytesMut::from(&payload[..])));
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame_passes_through() {
        let mut fragments = FragmentAccumulator::new(1024);
        let message = fragments.push(OpCode::Text, true, Bytes::from_static(b"whole")).unwrap();

        assert_eq!(message, Some((OpCode::Text, Bytes::from_static(b"whole"))));
        assert!(!fragments.is_in_progress());
    }

    #[test]
    fn fragments_are_joined() {
        let mut fragments = FragmentAccumulator::new(1024);

        assert_eq!(fragments.push(OpCode::Binary, false, Bytes::from_static(b"Wi")).unwrap(), None);
        assert!(fragments.is_in_progress());
        assert_eq!(fragments.push(OpCode::Continuation, false, Bytes::from_static(b"ki")).unwrap(), None);
        let message = fragments.push(OpCode::Continuation, true, Bytes::from_static(b"pedia")).unwrap();

        assert_eq!(message, Some((OpCode::Binary, Bytes::from_static(b"Wikipedia"))));
        assert!(!fragments.is_in_progress());
    }

    #[test]
    fn sequencing_errors() {
        let mut fragments = FragmentAccumulator::new(1024);
        assert!(matches!(
            fragments.push(OpCode::Continuation, true, Bytes::new()),
            Err(WsError::UnexpectedContinuation)
        ));

        fragments.push(OpCode::Text, false, Bytes::from_static(b"a")).unwrap();
        assert!(matches!(fragments.push(OpCode::Text, true, Bytes::new()), Err(WsError::IncompleteFragment)));
    }

    #[test]
    fn message_limit() {
        let mut fragments = FragmentAccumulator::new(4);
        fragments.push(OpCode::Binary, false, Bytes::from_static(b"abc")).unwrap();

        let result = fragments.push(OpCode::Continuation, true, Bytes::from_static(b"de"));
        assert!(matches!(result, Err(WsError::PayloadTooLarge { size: 5, max_size: 4 })));
    }
}
