//! HTTP request message.
//!
//! The request-target is resolved into an [`http::Uri`] while parsing: origin-form
//! targets are combined with the `Host` header and the configured default scheme,
//! absolute-form, authority-form (`CONNECT`) and asterisk-form (`OPTIONS *`) targets
//! are parsed as they are.

use http::header::HOST;
use http::uri::Scheme;
use http::{HeaderName, HeaderValue, Uri};

use crate::config::ParseConfig;
use crate::ensure;
use crate::protocol::{Body, Headers, Message, Method, ParseError, StartLine, Version};

#[derive(Debug, PartialEq)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: Headers,
    body: Body,
}

impl Request {
    /// Creates an HTTP/1.1 request with no headers and an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self { method, uri, version: Version::HTTP_11, headers: Headers::new(), body: Body::empty() }
    }

    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
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

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// The request-target as it appears on the request-line.
    pub fn request_target(&self) -> String {
        if self.method == Method::Connect {
            if let Some(authority) = self.uri.authority() {
                return authority.as_str().to_owned();
            }
        }
        self.uri.path_and_query().map_or_else(|| "/".to_owned(), |pq| pq.as_str().to_owned())
    }
}

impl Message for Request {
    fn from_parts(start_line: StartLine, headers: Headers, body: Body, config: &ParseConfig) -> Result<Self, ParseError> {
        let method = Method::from_token(&start_line.first)?;
        let version = Version::parse(&start_line.third).map_err(ParseError::InvalidVersion)?;
        let target = std::str::from_utf8(&start_line.second).map_err(|_| ParseError::InvalidUri)?;
        let uri = resolve_target(target, &method, headers.get(HOST), &config.default_scheme)?;

        Ok(Self { method, uri, version, headers, body })
    }

    fn start_line(&self) -> String {
        format!("{} {} {}", self.method, self.request_target(), self.version)
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
        headers.inject_host(&self.uri);
        headers.inject_body_metadata(&self.body);
        headers.ensure_connection();
        headers
    }

    fn into_body(self) -> Body {
        self.body
    }
}

fn resolve_target(target: &str, method: &Method, host: Option<&HeaderValue>, scheme: &Scheme) -> Result<Uri, ParseError> {
    if target.starts_with('/') {
        let host = host.and_then(|value| value.to_str().ok()).filter(|value| !value.is_empty());
        return match host {
            Some(host) => Uri::builder()
                .scheme(scheme.clone())
                .authority(host)
                .path_and_query(target)
                .build()
                .map_err(|_| ParseError::InvalidUri),
            None => target.parse().map_err(|_| ParseError::InvalidUri),
        };
    }

    let uri: Uri = target.parse().map_err(|_| ParseError::InvalidUri)?;
    let valid = match method {
        Method::Connect => uri.scheme().is_none() && uri.authority().is_some(),
        Method::Options if target == "*" => true,
        _ => uri.scheme().is_some() && uri.authority().is_some(),
    };
    ensure!(valid, ParseError::InvalidUri);
    Ok(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::CONNECTION;

    fn parts(line: &'static [u8], host: Option<&'static str>) -> Result<Request, ParseError> {
        let mut headers = Headers::new();
        if let Some(host) = host {
            headers.set(HOST, HeaderValue::from_static(host));
        }
        let start_line = StartLine::split(Bytes::from_static(line))?;
        Request::from_parts(start_line, headers, Body::empty(), &ParseConfig::default())
    }

    #[test]
    fn origin_form_is_resolved_against_host() {
        let request = parts(b"GET /index/?a=1&b=2 HTTP/1.1", Some("127.0.0.1:8080")).unwrap();

        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.uri().scheme_str(), Some("http"));
        assert_eq!(request.uri().host(), Some("127.0.0.1"));
        assert_eq!(request.uri().port_u16(), Some(8080));
        assert_eq!(request.uri().path(), "/index/");
        assert_eq!(request.uri().query(), Some("a=1&b=2"));
        assert_eq!(request.request_target(), "/index/?a=1&b=2");
    }

    #[test]
    fn origin_form_without_host() {
        let request = parts(b"GET /index.html HTTP/1.0", None).unwrap();

        assert_eq!(request.uri().host(), None);
        assert_eq!(request.uri().path(), "/index.html");
        assert_eq!(request.version(), Version::HTTP_10);
    }

    #[test]
    fn absolute_and_special_forms() {
        let request = parts(b"GET http://example.com/a HTTP/1.1", Some("ignored.example")).unwrap();
        assert_eq!(request.uri().host(), Some("example.com"));

        let request = parts(b"CONNECT example.com:443 HTTP/1.1", None).unwrap();
        assert_eq!(request.request_target(), "example.com:443");
        assert_eq!(request.start_line(), "CONNECT example.com:443 HTTP/1.1");

        let request = parts(b"OPTIONS * HTTP/1.1", None).unwrap();
        assert_eq!(request.request_target(), "*");
    }

    #[test]
    fn invalid_targets() {
        assert!(matches!(parts(b"GET example.com HTTP/1.1", None), Err(ParseError::InvalidUri)));
        assert!(matches!(parts(b"GET * HTTP/1.1", None), Err(ParseError::InvalidUri)));
        assert!(matches!(parts(b"GET /a HTTP/1.1", Some("bad host")), Err(ParseError::InvalidUri)));
    }

    #[test]
    fn invalid_version() {
        assert!(matches!(parts(b"GET / HTTP/1", None), Err(ParseError::InvalidVersion(_))));
    }

    #[test]
    fn extension_method() {
        let request = parts(b"PURGE /cache HTTP/1.1", None).unwrap();
        assert_eq!(request.method(), &Method::Other("PURGE".into()));
        assert_eq!(request.start_line(), "PURGE /cache HTTP/1.1");
    }

    #[test]
    fn prepared_headers_do_not_touch_the_request() {
        let request = Request::new(Method::Post, "http://example.com/submit".parse().unwrap())
            .with_header(CONNECTION, HeaderValue::from_static("close"))
            .with_body("payload");

        let prepared = request.prepare_headers();
        assert_eq!(prepared.get_str("host"), Some("example.com"));
        assert_eq!(prepared.get_str("content-length"), Some("7"));
        assert_eq!(prepared.get_str("connection"), Some("close"));

        assert_eq!(request.headers().len(), 1);
    }
}
