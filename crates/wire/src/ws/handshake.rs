//! HTTP upgrade handshake (RFC 6455 Section 4).
//!
//! - [`is_upgrade_request`]: does a parsed request ask for a WebSocket upgrade
//! - [`upgrade_response`]: validates the request and builds `101 Switching Protocols`
//! - [`upgrade_request`] and [`verify_upgrade_response`]: the client side
//! - [`accept_key`]: SHA-1 + base64 of the client key and [`WEBSOCKET_GUID`]

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::header::{CONNECTION, SEC_WEBSOCKET_ACCEPT, SEC_WEBSOCKET_KEY, SEC_WEBSOCKET_VERSION, UPGRADE};
use http::{HeaderValue, StatusCode, Uri};
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::debug;

use crate::ensure;
use crate::protocol::{Headers, Message, Method, Request, Response};

/// Appended to the client key before hashing.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// The only protocol version defined by RFC 6455.
pub const WEBSOCKET_VERSION: &str = "13";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    #[error("upgrade request must use GET")]
    InvalidMethod,

    #[error("missing or invalid Upgrade header")]
    MissingUpgrade,

    #[error("missing or invalid Connection header")]
    MissingConnectionUpgrade,

    #[error("unsupported Sec-WebSocket-Version, only 13 is supported")]
    UnsupportedVersion,

    #[error("missing or malformed Sec-WebSocket-Key")]
    InvalidKey,

    #[error("server did not switch protocols, status {0}")]
    UnexpectedStatus(StatusCode),

    #[error("Sec-WebSocket-Accept does not match the key")]
    AcceptMismatch,
}

impl HandshakeError {
    /// Status for rejecting the upgrade request.
    pub fn status_hint(&self) -> StatusCode {
        match self {
            Self::UnsupportedVersion => StatusCode::UPGRADE_REQUIRED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Computes `Sec-WebSocket-Accept` for a `Sec-WebSocket-Key`.
pub fn accept_key(key: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key);
    hasher.update(WEBSOCKET_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// A fresh random `Sec-WebSocket-Key`: 16 random bytes, base64 encoded.
pub fn client_key() -> String {
    BASE64.encode(fastrand::u128(..).to_be_bytes())
}

pub fn is_upgrade_request(request: &Request) -> bool {
    has_token(request.headers(), UPGRADE.as_str(), "websocket") && has_token(request.headers(), CONNECTION.as_str(), "upgrade")
}

/// Validates an upgrade request and builds the `101 Switching Protocols` response.
pub fn upgrade_response(request: &Request) -> Result<Response, HandshakeError> {
    let headers = request.headers();

    ensure!(request.method() == &Method::Get, HandshakeError::InvalidMethod);
    ensure!(has_token(headers, UPGRADE.as_str(), "websocket"), HandshakeError::MissingUpgrade);
    ensure!(has_token(headers, CONNECTION.as_str(), "upgrade"), HandshakeError::MissingConnectionUpgrade);
    ensure!(
        headers.get(SEC_WEBSOCKET_VERSION).is_some_and(|v| v.as_bytes() == WEBSOCKET_VERSION.as_bytes()),
        HandshakeError::UnsupportedVersion
    );

    let key = headers.get(SEC_WEBSOCKET_KEY).ok_or(HandshakeError::InvalidKey)?;
    let decoded = BASE64.decode(key.as_bytes()).map_err(|_| HandshakeError::InvalidKey)?;
    ensure!(decoded.len() == 16, HandshakeError::InvalidKey);

    let accept = HeaderValue::try_from(accept_key(key.as_bytes())).map_err(|_| HandshakeError::InvalidKey)?;
    debug!(uri = %request.uri(), "accepting websocket upgrade");

    Ok(Response::new(StatusCode::SWITCHING_PROTOCOLS)
        .with_header(UPGRADE, HeaderValue::from_static("websocket"))
        .with_header(CONNECTION, HeaderValue::from_static("Upgrade"))
        .with_header(SEC_WEBSOCKET_ACCEPT, accept))
}

/// Builds a client upgrade request for `uri`, returning it with the key it carries.
pub fn upgrade_request(uri: Uri) -> (Request, String) {
    let key = client_key();
    let request = Request::new(Method::Get, uri)
        .with_header(UPGRADE, HeaderValue::from_static("websocket"))
        .with_header(CONNECTION, HeaderValue::from_static("Upgrade"))
        .with_header(SEC_WEBSOCKET_VERSION, HeaderValue::from_static(WEBSOCKET_VERSION));

    // base64 output is always a valid header value
    let request = match HeaderValue::try_from(key.as_str()) {
        Ok(value) => request.with_header(SEC_WEBSOCKET_KEY, value),
        Err(_) => request,
    };
    (request, key)
}

/// Checks the server's answer to an upgrade request sent with `key`.
pub fn verify_upgrade_response(response: &Response, key: &str) -> Result<(), HandshakeError> {
    ensure!(
        response.status() == StatusCode::SWITCHING_PROTOCOLS,
        HandshakeError::UnexpectedStatus(response.status())
    );
    ensure!(has_token(response.headers(), UPGRADE.as_str(), "websocket"), HandshakeError::MissingUpgrade);
    ensure!(has_token(response.headers(), CONNECTION.as_str(), "upgrade"), HandshakeError::MissingConnectionUpgrade);

    let expected = accept_key(key.as_bytes());
    ensure!(
        response.headers().get(SEC_WEBSOCKET_ACCEPT).is_some_and(|v| v.as_bytes() == expected.as_bytes()),
        HandshakeError::AcceptMismatch
    );
    Ok(())
}

/// True if any comma-separated element of `name` equals `token`, ignoring case.
fn has_token(headers: &Headers, name: &str, token: &str) -> bool {
    headers.get_all(name).any(|value| {
        value
            .as_bytes()
            .split(|b| *b == b',')
            .any(|item| crate::utils::trim_ows(item).eq_ignore_ascii_case(token.as_bytes()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MessageDecoder;
    use crate::stream::IoStream;
    use indoc::indoc;

    async fn parse(input: &str) -> Request {
        let mut stream = IoStream::new(input.as_bytes(), Vec::new());
        MessageDecoder::<Request>::new().parse(&mut stream).await.unwrap()
    }

    const UPGRADE_REQUEST: &str = indoc! {r##"
        GET /chat HTTP/1.1
        Host: server.example.com
        Upgrade: websocket
        Connection: keep-alive, Upgrade
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==
        Origin: http://example.com
        Sec-WebSocket-Version: 13

        "##};

    #[test]
    fn rfc_accept_key() {
        assert_eq!(accept_key(b"dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn client_keys_are_sixteen_bytes() {
        let key = client_key();
        assert_eq!(BASE64.decode(key).unwrap().len(), 16);
    }

    #[tokio::test]
    async fn accepts_rfc_example() {
        let request = parse(UPGRADE_REQUEST).await;
        assert!(is_upgrade_request(&request));

        let response = upgrade_response(&request).unwrap();
        assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
        assert_eq!(response.headers().get_str("sec-websocket-accept"), Some("s3pPLMBiTxaQ9kYGzzhZRbK+xOo="));
        assert!(!response.prepare_headers().contains("content-length"));

        verify_upgrade_response(&response, "dGhlIHNhbXBsZSBub25jZQ==").unwrap();
        assert_eq!(verify_upgrade_response(&response, "AAAAAAAAAAAAAAAAAAAAAA=="), Err(HandshakeError::AcceptMismatch));
    }

    #[tokio::test]
    async fn rejects_bad_requests() {
        let request = parse(&UPGRADE_REQUEST.replace("GET", "POST")).await;
        assert_eq!(upgrade_response(&request).unwrap_err(), HandshakeError::InvalidMethod);

        let request = parse(&UPGRADE_REQUEST.replace("Version: 13", "Version: 8")).await;
        let error = upgrade_response(&request).unwrap_err();
        assert_eq!(error, HandshakeError::UnsupportedVersion);
        assert_eq!(error.status_hint(), StatusCode::UPGRADE_REQUIRED);

        let request = parse(&UPGRADE_REQUEST.replace("dGhlIHNhbXBsZSBub25jZQ==", "c2hvcnQ=")).await;
        assert_eq!(upgrade_response(&request).unwrap_err(), HandshakeError::InvalidKey);

        let request = parse("GET / HTTP/1.1\r\nHost: a\r\n\r\n").await;
        assert!(!is_upgrade_request(&request));
        assert_eq!(upgrade_response(&request).unwrap_err(), HandshakeError::MissingUpgrade);
    }

    #[test]
    fn client_request() {
        let (request, key) = upgrade_request("ws://example.com/chat".parse().unwrap());

        assert!(is_upgrade_request(&request));
        assert_eq!(request.headers().get_str("sec-websocket-key"), Some(key.as_str()));
        assert_eq!(request.request_target(), "/chat");
    }
}
