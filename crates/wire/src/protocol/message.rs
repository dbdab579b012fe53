use bytes::Bytes;

use crate::config::ParseConfig;
use crate::protocol::{Body, Headers, ParseError, Version};

/// The three space-separated tokens of a request-line or status-line.
///
/// The third token keeps any further spaces, so multi-word reason phrases survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartLine {
    pub first: Bytes,
    pub second: Bytes,
    pub third: Bytes,
}

impl StartLine {
    pub fn split(line: Bytes) -> Result<Self, ParseError> {
        let first_sp = line.iter().position(|b| *b == b' ').ok_or(ParseError::InvalidStartLine)?;
        let rest = line.slice(first_sp + 1..);
        let second_sp = rest.iter().position(|b| *b == b' ').ok_or(ParseError::InvalidStartLine)?;

        Ok(Self { first: line.slice(..first_sp), second: rest.slice(..second_sp), third: rest.slice(second_sp + 1..) })
    }
}

/// An HTTP message that can be parsed from and serialized to a byte stream.
///
/// [`Request`](crate::protocol::Request) and [`Response`](crate::protocol::Response)
/// differ only in how they interpret the start-line and which headers they add
/// before being written.
pub trait Message: Sized + Send {
    /// Builds the message from start-line tokens, the header section and the decoded body.
    fn from_parts(start_line: StartLine, headers: Headers, body: Body, config: &ParseConfig) -> Result<Self, ParseError>;

    /// The start-line without its trailing CRLF.
    fn start_line(&self) -> String;

    fn version(&self) -> Version;

    fn headers(&self) -> &Headers;

    fn body(&self) -> &Body;

    /// A working copy of the headers with framing and defaults filled in, ready to be
    /// written. The message's own headers are left untouched.
    fn prepare_headers(&self) -> Headers;

    fn into_body(self) -> Body;
}
