use std::fmt;

use crate::protocol::ParseError;
use crate::utils::is_tchar;

/// Request method. Verbs outside the standard set are kept verbatim in [`Method::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    Connect,
    Trace,
    Other(String),
}

impl Method {
    /// Parses a method token. Method names are case-sensitive, so `get` is an extension
    /// method, not `GET`.
    pub fn from_token(token: &[u8]) -> Result<Self, ParseError> {
        let method = match token {
            b"GET" => Self::Get,
            b"POST" => Self::Post,
            b"PUT" => Self::Put,
            b"PATCH" => Self::Patch,
            b"DELETE" => Self::Delete,
            b"OPTIONS" => Self::Options,
            b"HEAD" => Self::Head,
            b"CONNECT" => Self::Connect,
            b"TRACE" => Self::Trace,
            _ => {
                if token.is_empty() || !token.iter().all(|b| is_tchar(*b)) {
                    return Err(ParseError::InvalidMethod);
                }
                // tchar is a subset of ascii
                Self::Other(String::from_utf8_lossy(token).into_owned())
            }
        };
        Ok(method)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&Method> for http::Method {
    type Error = http::method::InvalidMethod;

    fn try_from(value: &Method) -> Result<Self, Self::Error> {
        http::Method::from_bytes(value.as_str().as_bytes())
    }
}
