//! Serves plain HTTP on `/` and a WebSocket echo endpoint on any upgrade request.
//!
//! ```text
//! cargo run --example echo_server
//! curl -v http://127.0.0.1:8080/
//! websocat ws://127.0.0.1:8080/echo
//! ```

use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use micro_wire::codec::{MessageDecoder, MessageEncoder};
use micro_wire::protocol::{Request, Response};
use micro_wire::stream::{ByteStream, IoStream};
use micro_wire::ws::{handshake, make_sink, Outbox, WebSocket, WebSocketEvent};
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(listener) => listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    loop {
        let (tcp_stream, remote_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let stream = IoStream::new(reader, writer);
            serve(stream).await;
            info!(%remote_addr, "connection finished");
        });
    }
}

async fn serve<S: ByteStream>(mut stream: S) {
    let decoder = MessageDecoder::<Request>::new();
    let mut encoder = MessageEncoder::new();

    loop {
        let request = match decoder.parse(&mut stream).await {
            Ok(request) => request,
            Err(e) => {
                if let Some(status) = e.status_hint() {
                    warn!(cause = %e, %status, "rejecting request");
                    let _ = encoder.serialize(Response::new(status), &mut stream).await;
                }
                return;
            }
        };

        if handshake::is_upgrade_request(&request) {
            let response = match handshake::upgrade_response(&request) {
                Ok(response) => response,
                Err(e) => {
                    warn!(cause = %e, "upgrade refused");
                    let _ = encoder.serialize(Response::new(e.status_hint()), &mut stream).await;
                    return;
                }
            };
            if let Err(e) = encoder.serialize(response, &mut stream).await {
                error!(cause = %e, "failed to send upgrade response");
                return;
            }
            echo(stream).await;
            return;
        }

        let response = Response::new(StatusCode::OK)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_body(format!("{} {}\n", request.method(), request.request_target()));
        if let Err(e) = encoder.serialize(response, &mut stream).await {
            error!(cause = %e, "failed to send response");
            return;
        }
    }
}

async fn echo<S: ByteStream>(stream: S) {
    let mut ws = WebSocket::server(stream);
    let mut sink = make_sink(|event, outbox: &mut Outbox| match event {
        WebSocketEvent::Text(text) => outbox.send_text(text),
        WebSocketEvent::Binary(data) => outbox.send_binary(data),
        _ => {}
    });

    let status = ws.listen(&mut sink).await;
    info!(code = status.code, reason = %status.reason, cleanly = status.cleanly, "websocket closed");
}
