//! WebSocket connection state machine.
//!
//! | state   | event                    | action                        | next             |
//! |---------|--------------------------|-------------------------------|------------------|
//! | open    | local [`WebSocket::close`] | send close frame            | closing          |
//! | open    | close frame received     | echo it, report clean close   | closing → closed |
//! | closing | close frame received     | report clean close            | closed           |
//! | closed  | any close                | nothing                       | closed           |
//!
//! A stream that ends, a frame that fails to decode and a protocol violation all end
//! the connection uncleanly with status `1006`.

use tracing::{debug, trace, warn};

use crate::config::{Role, WebSocketConfig};
use crate::ensure;
use crate::stream::ByteStream;
use crate::ws::{
    CloseFrame, CloseStatus, EventSink, FragmentAccumulator, Frame, FrameCodec, MaskingKey, OpCode, Outbox,
    WebSocketEvent, WsError,
};

/// Connection state. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionState {
    Open,
    Closing,
    Closed,
}

/// One WebSocket connection over an already upgraded stream.
#[derive(Debug)]
pub struct WebSocket<S> {
    stream: S,
    codec: FrameCodec,
    config: WebSocketConfig,
    state: ConnectionState,
    fragments: FragmentAccumulator,
    close_status: Option<CloseStatus>,
}

impl<S: ByteStream> WebSocket<S> {
    pub fn new(stream: S, config: WebSocketConfig) -> Self {
        Self {
            stream,
            codec: FrameCodec::new(config.max_frame_payload),
            fragments: FragmentAccumulator::new(config.max_message_bytes),
            config,
            state: ConnectionState::Open,
            close_status: None,
        }
    }

    pub fn server(stream: S) -> Self {
        Self::new(stream, WebSocketConfig::server())
    }

    pub fn client(stream: S) -> Self {
        Self::new(stream, WebSocketConfig::client())
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// How the connection ended, once it is closed.
    pub fn close_status(&self) -> Option<&CloseStatus> {
        self.close_status.as_ref()
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Sends one frame and flushes the stream.
    pub async fn send(&mut self, frame: Frame) -> Result<(), WsError> {
        ensure!(self.state == ConnectionState::Open, WsError::ConnectionClosed);
        self.write_frame(frame).await
    }

    /// Starts the close handshake. Does nothing if it already started.
    pub async fn close(&mut self, code: Option<u16>, reason: Option<&str>) -> Result<(), WsError> {
        if self.state != ConnectionState::Open {
            debug!(state = ?self.state, "close already in progress");
            return Ok(());
        }

        let frame = match code {
            Some(code) => Frame::close(code, reason.unwrap_or_default()),
            None => Frame::close_empty(),
        };
        self.state = ConnectionState::Closing;
        debug!(?code, "sent close frame, waiting for the peer");
        self.write_frame(frame).await
    }

    /// Receives frames and reports them to `sink` until the connection is closed.
    ///
    /// The final [`CloseStatus`] is reported to the sink and returned.
    pub async fn listen<E: EventSink + ?Sized>(&mut self, sink: &mut E) -> CloseStatus {
        while self.state != ConnectionState::Closed {
            if self.stream.is_closed() && self.codec.buffered() == 0 {
                self.finalize(CloseStatus::abnormal("stream closed"), sink);
                break;
            }

            let frame = match self.codec.read_frame(&mut self.stream).await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.finalize(CloseStatus::abnormal("stream closed"), sink);
                    break;
                }
                Err(e) => {
                    self.fail(e, sink).await;
                    break;
                }
            };

            if let Err(e) = self.dispatch(frame, sink).await {
                self.fail(e, sink).await;
            }
        }

        self.close_status.clone().unwrap_or_else(|| CloseStatus::abnormal("connection closed"))
    }

    async fn dispatch<E: EventSink + ?Sized>(&mut self, frame: Frame, sink: &mut E) -> Result<(), WsError> {
        let mut outbox = Outbox::new();
        sink.on_event(WebSocketEvent::Frame(frame.clone()), &mut outbox);

        let (header, payload) = frame.into_parts();
        match header.opcode {
            OpCode::Text | OpCode::Binary | OpCode::Continuation => {
                if let Some((opcode, payload)) = self.fragments.push(header.opcode, header.fin, payload)? {
                    let event = if opcode == OpCode::Text {
                        let text = std::str::from_utf8(&payload).map_err(|_| WsError::InvalidUtf8)?;
                        WebSocketEvent::Text(text.to_owned())
                    } else {
                        WebSocketEvent::Binary(payload)
                    };
                    sink.on_event(event, &mut outbox);
                }
            }
            OpCode::Ping => {
                sink.on_event(WebSocketEvent::Ping(payload.clone()), &mut outbox);
                if self.state == ConnectionState::Open {
                    trace!(len = payload.len(), "answering ping");
                    self.write_frame(Frame::pong(payload)).await?;
                }
            }
            OpCode::Pong => sink.on_event(WebSocketEvent::Pong(payload), &mut outbox),
            OpCode::Close => {
                self.flush_outbox(outbox).await?;
                return self.on_close_frame(Frame { header, payload }, sink).await;
            }
        }

        self.flush_outbox(outbox).await
    }

    async fn on_close_frame<E: EventSink + ?Sized>(&mut self, frame: Frame, sink: &mut E) -> Result<(), WsError> {
        let close = CloseFrame::try_from(&frame)?;

        match self.state {
            ConnectionState::Open => {
                debug!(code = close.status_code(), reason = %close.reason, "peer started close handshake");
                self.state = ConnectionState::Closing;
                if let Err(e) = self.write_frame(Frame::new(OpCode::Close, frame.payload, true)).await {
                    debug!(cause = %e, "could not echo close frame");
                }
                self.finalize(CloseStatus::clean(close.status_code(), close.reason), sink);
            }
            ConnectionState::Closing => {
                debug!(code = close.status_code(), "peer acknowledged close");
                self.finalize(CloseStatus::clean(close.status_code(), close.reason), sink);
            }
            ConnectionState::Closed => debug!("close frame after the connection closed"),
        }
        Ok(())
    }

    async fn flush_outbox(&mut self, outbox: Outbox) -> Result<(), WsError> {
        if outbox.is_empty() {
            return Ok(());
        }

        let (frames, close) = outbox.into_parts();
        for frame in frames {
            if self.state != ConnectionState::Open {
                debug!(opcode = ?frame.opcode(), "dropping queued frame, connection is closing");
                continue;
            }
            self.write_frame(frame).await?;
        }

        if let Some((code, reason)) = close {
            self.close(code, reason.as_deref()).await?;
        }
        Ok(())
    }

    /// Ends the connection after a decode or protocol error. The peer is told why if
    /// the error has a close code and no close frame was sent yet.
    async fn fail<E: EventSink + ?Sized>(&mut self, e: WsError, sink: &mut E) {
        warn!(cause = %e, state = ?self.state, "closing connection uncleanly");

        if let (Some(code), ConnectionState::Open) = (e.close_code(), self.state) {
            self.state = ConnectionState::Closing;
            if let Err(send_error) = self.write_frame(Frame::close(code, "")).await {
                debug!(cause = %send_error, "could not send close frame");
            }
        }

        self.finalize(CloseStatus::abnormal(e.to_string()), sink);
    }

    fn finalize<E: EventSink + ?Sized>(&mut self, status: CloseStatus, sink: &mut E) {
        if self.state == ConnectionState::Closed {
            return;
        }

        if !status.cleanly {
            warn!(code = status.code, reason = %status.reason, "connection closed uncleanly");
        } else {
            debug!(code = status.code, "connection closed");
        }

        self.state = ConnectionState::Closed;
        self.close_status = Some(status.clone());
        sink.on_event(WebSocketEvent::Close(status), &mut Outbox::new());
    }

    async fn write_frame(&mut self, mut frame: Frame) -> Result<(), WsError> {
        if self.config.role == Role::Client && frame.header.masking_key.is_none() {
            frame.header.masking_key = Some(MaskingKey::random());
        }

        self.codec.write_frame(frame, &mut self.stream).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
