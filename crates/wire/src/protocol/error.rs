use std::io;

use http::StatusCode;
use thiserror::Error;

use crate::stream::LineTooLong;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Which part of an `HTTP/<major>.<minor>` token was malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionError {
    MissingPrefix,
    InvalidMajor,
    InvalidMinor,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("stream is empty, no message to parse")]
    StreamEmpty,

    #[error("invalid start line")]
    InvalidStartLine,

    #[error("whitespace before the first header field")]
    InvalidRequest,

    #[error("whitespace between header field name and colon")]
    InvalidKeyWhitespace,

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("header line exceeds the limit {max_size}")]
    TooLargeLine { max_size: usize },

    #[error("header section size {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(VersionError),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid status code")]
    InvalidStatus,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("body size {current_size} exceed the limit {max_size}")]
    TooLargeBody { current_size: u64, max_size: u64 },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io { source: io::Error },
}

impl ParseError {
    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_large_body(current_size: u64, max_size: u64) -> Self {
        Self::TooLargeBody { current_size, max_size }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::from(e.into())
    }

    /// The response status a server should reject the message with, if any.
    ///
    /// Returns `None` when there is nobody left to answer: the stream was empty or failed.
    pub fn status_hint(&self) -> Option<StatusCode> {
        match self {
            Self::StreamEmpty | Self::Io { .. } => None,
            Self::TooLargeLine { .. } | Self::TooLargeHeader { .. } | Self::TooManyHeaders { .. } => Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE),
            Self::TooLargeBody { .. } => Some(StatusCode::PAYLOAD_TOO_LARGE),
            _ => Some(StatusCode::BAD_REQUEST),
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        if let Some(too_long) = e.get_ref().and_then(|inner| inner.downcast_ref::<LineTooLong>()) {
            return Self::TooLargeLine { max_size: too_long.max_size };
        }
        Self::Io { source: e }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid start line: {reason}")]
    InvalidStartLine { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_start_line<S: ToString>(str: S) -> Self {
        Self::InvalidStartLine { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
