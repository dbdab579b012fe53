//! HTTP request and response exchanges over an in-memory duplex pipe.

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use http::{HeaderValue, StatusCode};
use http_body_util::Full;
use micro_wire::codec::{MessageDecoder, MessageEncoder};
use micro_wire::config::ParseConfig;
use micro_wire::protocol::body::{Body, HttpBodyProducer};
use micro_wire::protocol::{Message, Method, ParseError, Request, Response, Version};
use micro_wire::stream::{ByteStream, IoStream};
use tokio::io::{duplex, split, AsyncWriteExt};

#[tokio::test]
async fn keep_alive_requests_share_one_stream() {
    let (client, server) = duplex(64 * 1024);
    let (server_reader, server_writer) = split(server);
    let mut server_stream = IoStream::new(server_reader, server_writer);

    let writer = tokio::spawn(async move {
        let (client_reader, client_writer) = split(client);
        let mut client_stream = IoStream::new(client_reader, client_writer);
        let mut encoder = MessageEncoder::new();

        let first = Request::new(Method::Get, "http://example.com/first".parse().unwrap());
        encoder.serialize(first, &mut client_stream).await.unwrap();

        let second = Request::new(Method::Post, "http://example.com/second?x=1".parse().unwrap())
            .with_body(Body::streaming(HttpBodyProducer::new(Full::new(Bytes::from_static(b"streamed payload")))));
        encoder.serialize(second, &mut client_stream).await.unwrap();

        client_stream.shutdown().await.unwrap();
    });

    let decoder = MessageDecoder::<Request>::new();

    let first = decoder.parse(&mut server_stream).await.unwrap();
    assert_eq!(first.method(), &Method::Get);
    assert_eq!(first.uri().to_string(), "http://example.com/first");
    assert_eq!(first.headers().get_str(HOST), Some("example.com"));

    let second = decoder.parse(&mut server_stream).await.unwrap();
    assert_eq!(second.method(), &Method::Post);
    assert_eq!(second.request_target(), "/second?x=1");
    assert_eq!(second.headers().get_str(TRANSFER_ENCODING), Some("chunked"));
    assert_eq!(second.body().as_bytes().map(|b| &b[..]), Some(&b"streamed payload"[..]));

    assert!(matches!(decoder.parse(&mut server_stream).await, Err(ParseError::StreamEmpty)));
    writer.await.unwrap();
}

#[tokio::test]
async fn response_with_cookies_over_the_wire() {
    let (client, server) = duplex(64 * 1024);
    let (server_reader, server_writer) = split(server);
    let (client_reader, client_writer) = split(client);
    let mut server_stream = IoStream::new(server_reader, server_writer);
    let mut client_stream = IoStream::new(client_reader, client_writer);

    let response = Response::new(StatusCode::OK)
        .with_cookie(HeaderValue::from_static("session=abc; Path=/"))
        .with_cookie(HeaderValue::from_static("theme=dark"))
        .with_body("hello");
    MessageEncoder::new().serialize(response, &mut server_stream).await.unwrap();

    let received: Response = MessageDecoder::new().parse(&mut client_stream).await.unwrap();
    assert_eq!(received.version(), Version::HTTP_11);
    assert_eq!(received.status(), StatusCode::OK);
    assert_eq!(received.reason(), "OK");
    assert_eq!(received.cookies(), [HeaderValue::from_static("session=abc; Path=/"), HeaderValue::from_static("theme=dark")]);
    assert!(received.headers().get("set-cookie").is_none());
    assert_eq!(received.headers().get_str(CONTENT_LENGTH), Some("5"));
    assert_eq!(received.body(), &Body::from("hello"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (mut client, server) = duplex(64 * 1024);
    let (server_reader, server_writer) = split(server);
    let mut server_stream = IoStream::new(server_reader, server_writer);

    client.write_all(b"POST /upload HTTP/1.1\r\nHost: example.com\r\nContent-Length: 64\r\n\r\n").await.unwrap();
    client.write_all(&[b'x'; 64]).await.unwrap();

    let config = ParseConfig { max_body_bytes: 16, ..ParseConfig::default() };
    let result = MessageDecoder::<Request>::with_config(config).parse(&mut server_stream).await;

    let e = result.unwrap_err();
    assert_eq!(e.status_hint(), Some(StatusCode::PAYLOAD_TOO_LARGE));
    assert!(!server_stream.is_closed());
}
