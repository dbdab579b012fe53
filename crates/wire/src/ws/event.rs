//! Events delivered by a [`WebSocket`](crate::ws::WebSocket) receive loop.
//!
//! Every received frame is reported as [`WebSocketEvent::Frame`] first. Complete data
//! messages, pings, pongs and the final close status follow as their own variants.
//! Sinks reply through the [`Outbox`] they are handed; the connection writes queued
//! frames after each dispatched frame.

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use crate::ws::{CloseStatus, Frame};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebSocketEvent {
    Frame(Frame),
    Text(String),
    Binary(Bytes),
    Ping(Bytes),
    Pong(Bytes),
    Close(CloseStatus),
}

/// Frames and a close request queued by an [`EventSink`].
#[derive(Debug, Default)]
pub struct Outbox {
    frames: Vec<Frame>,
    close: Option<(Option<u16>, Option<String>)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.send(Frame::text(text));
    }

    pub fn send_binary(&mut self, data: impl Into<Bytes>) {
        self.send(Frame::binary(data));
    }

    /// Asks the connection to start the close handshake once queued frames are sent.
    pub fn close(&mut self, code: Option<u16>, reason: Option<&str>) {
        self.close = Some((code, reason.map(str::to_owned)));
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.close.is_none()
    }

    pub(crate) fn into_parts(self) -> (Vec<Frame>, Option<(Option<u16>, Option<String>)>) {
        (self.frames, self.close)
    }
}

/// Receiver of connection events.
pub trait EventSink: Send {
    fn on_event(&mut self, event: WebSocketEvent, outbox: &mut Outbox);
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn on_event(&mut self, event: WebSocketEvent, outbox: &mut Outbox) {
        (**self).on_event(event, outbox);
    }
}

/// Forwards events to a channel. Events are dropped once the receiver is gone.
impl EventSink for UnboundedSender<WebSocketEvent> {
    fn on_event(&mut self, event: WebSocketEvent, _outbox: &mut Outbox) {
        if self.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }
}

#[derive(Debug)]
pub struct SinkFn<F> {
    f: F,
}

impl<F> EventSink for SinkFn<F>
where
    F: FnMut(WebSocketEvent, &mut Outbox) + Send,
{
    fn on_event(&mut self, event: WebSocketEvent, outbox: &mut Outbox) {
        (self.f)(event, outbox);
    }
}

/// Creates an [`EventSink`] from a closure.
pub fn make_sink<F>(f: F) -> SinkFn<F>
where
    F: FnMut(WebSocketEvent, &mut Outbox) + Send,
{
    SinkFn { f }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_sink_fills_outbox() {
        let mut sink = make_sink(|event, outbox: &mut Outbox| {
            if let WebSocketEvent::Text(text) = event {
                outbox.send_text(text.to_uppercase());
                outbox.close(Some(1000), Some("done"));
            }
        });

        let mut outbox = Outbox::new();
        sink.on_event(WebSocketEvent::Text("hi".into()), &mut outbox);

        let (frames, close) = outbox.into_parts();
        assert_eq!(frames, vec![Frame::text("HI")]);
        assert_eq!(close, Some((Some(1000), Some("done".to_owned()))));
    }

    #[tokio::test]
    async fn channel_sink() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut outbox = Outbox::new();

        tx.on_event(WebSocketEvent::Pong(Bytes::from_static(b"p")), &mut outbox);
        drop(tx);

        assert_eq!(rx.recv().await, Some(WebSocketEvent::Pong(Bytes::from_static(b"p"))));
        assert_eq!(rx.recv().await, None);
        assert!(outbox.is_empty());
    }
}
