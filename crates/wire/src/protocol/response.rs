//! HTTP response message.
//!
//! `Set-Cookie` lines are kept apart from the other headers in [`Response::cookies`]
//! because they must never be comma-combined.

use http::header::SET_COOKIE;
use http::{HeaderName, HeaderValue, StatusCode};

use crate::config::ParseConfig;
use crate::protocol::{Body, Headers, Message, ParseError, StartLine, Version};

#[derive(Debug, PartialEq)]
pub struct Response {
    version: Version,
    status: StatusCode,
    reason: String,
    headers: Headers,
    body: Body,
    cookies: Vec<HeaderValue>,
}

impl Response {
    /// Creates an HTTP/1.1 response using the canonical reason phrase of `status`.
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: Version::HTTP_11,
            status,
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            headers: Headers::new(),
            body: Body::empty(),
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: HeaderValue) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn cookies(&self) -> &[HeaderValue] {
        &self.cookies
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// 1xx and 204 responses never carry a body or body framing headers.
    fn forbids_body(&self) -> bool {
        self.status.is_informational() || self.status == StatusCode::NO_CONTENT
    }
}

impl Message for Response {
    fn from_parts(start_line: StartLine, mut headers: Headers, body: Body, _config: &ParseConfig) -> Result<Self, ParseError> {
        let version = Version::parse(&start_line.first).map_err(ParseError::InvalidVersion)?;
        let status = std::str::from_utf8(&start_line.second)
            .ok()
            .and_then(|code| code.parse::<u16>().ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or(ParseError::InvalidStatus)?;
        let reason = String::from_utf8_lossy(&start_line.third).into_owned();
        let cookies = headers.take_all(SET_COOKIE.as_str());

        Ok(Self { version, status, reason, headers, body, cookies })
    }

    fn start_line(&self) -> String {
        format!("{} {} {}", self.version, self.status.as_str(), self.reason)
    }

    fn version(&self) -> Version {
        self.version
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn prepare_headers(&self) -> Headers {
        let mut headers = self.headers.clone();
        for cookie in &self.cookies {
            headers.append(SET_COOKIE, cookie.clone());
        }
        if !self.forbids_body() {
            headers.inject_body_metadata(&self.body);
        }
        headers.ensure_connection();
        headers
    }

    fn into_body(self) -> Body {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::CONTENT_TYPE;

    fn parts(line: &'static [u8], headers: Headers) -> Result<Response, ParseError> {
        let start_line = StartLine::split(Bytes::from_static(line))?;
        Response::from_parts(start_line, headers, Body::empty(), &ParseConfig::default())
    }

    #[test]
    fn status_line_tokens() {
        let response = parts(b"HTTP/1.1 404 Not Found", Headers::new()).unwrap();

        assert_eq!(response.version(), Version::HTTP_11);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.reason(), "Not Found");
        assert_eq!(response.start_line(), "HTTP/1.1 404 Not Found");
    }

    #[test]
    fn non_numeric_status_fails() {
        assert!(matches!(parts(b"HTTP/1.1 abc OK", Headers::new()), Err(ParseError::InvalidStatus)));
        assert!(matches!(parts(b"HTTP/1.1 20 OK", Headers::new()), Err(ParseError::InvalidStatus)));
        assert!(matches!(parts(b"HTTP/1.1 1000 OK", Headers::new()), Err(ParseError::InvalidStatus)));
    }

    #[test]
    fn cookies_are_lifted_out_of_headers() {
        let mut headers = Headers::new();
        headers.append(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let response = parts(b"HTTP/1.1 200 OK", headers).unwrap();

        assert_eq!(response.cookies(), [HeaderValue::from_static("a=1"), HeaderValue::from_static("b=2")]);
        assert_eq!(response.headers().len(), 1);

        let prepared = response.prepare_headers();
        assert_eq!(prepared.get_all("set-cookie").count(), 2);
    }

    #[test]
    fn switching_protocols_has_no_body_framing() {
        let response = Response::new(StatusCode::SWITCHING_PROTOCOLS);
        let prepared = response.prepare_headers();

        assert!(!prepared.contains("content-length"));
        assert!(!prepared.contains("transfer-encoding"));
        assert_eq!(response.start_line(), "HTTP/1.1 101 Switching Protocols");
    }
}
