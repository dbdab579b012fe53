//! Ordered header table with case-insensitive lookup.
//!
//! Field names are stored as [`HeaderName`] (lowercase on the wire) and values as
//! [`HeaderValue`], which accepts `obs-text` bytes. Unlike `http::HeaderMap`, the table
//! keeps strict insertion order and remembers the most recently written field so
//! obs-fold continuation lines can be attached to it.

use std::fmt;

use bytes::BytesMut;
use http::header::{CONNECTION, CONTENT_LENGTH, HOST, SET_COOKIE, TRANSFER_ENCODING};
use http::header::InvalidHeaderValue;
use http::{HeaderName, HeaderValue, Uri};

use crate::protocol::Body;

const KEEP_ALIVE: HeaderValue = HeaderValue::from_static("keep-alive");
const CHUNKED: HeaderValue = HeaderValue::from_static("chunked");

#[derive(Clone, Default)]
pub struct Headers {
    entries: Vec<(HeaderName, HeaderValue)>,
    /// index of the field the next continuation line belongs to
    last: Option<usize>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity), last: None }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the first value stored under `name`, compared case-insensitively.
    pub fn get<K: AsRef<str>>(&self, name: K) -> Option<&HeaderValue> {
        self.position(name.as_ref()).map(|i| &self.entries[i].1)
    }

    /// Like [`get`](Self::get) but only for values that are visible ASCII.
    pub fn get_str<K: AsRef<str>>(&self, name: K) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.entries.iter().filter(move |(n, _)| n.as_str().eq_ignore_ascii_case(name)).map(|(_, v)| v)
    }

    pub fn contains<K: AsRef<str>>(&self, name: K) -> bool {
        self.position(name.as_ref()).is_some()
    }

    /// Sets `name` to `value`, overwriting any previous value in place.
    ///
    /// Later duplicates of the same name are dropped so exactly one entry remains.
    pub fn set(&mut self, name: HeaderName, value: HeaderValue) {
        match self.position(name.as_str()) {
            Some(i) => {
                self.entries[i].1 = value;
                let mut index = 0;
                self.entries.retain(|(n, _)| {
                    let keep = index <= i || *n != name;
                    index += 1;
                    keep
                });
                self.last = Some(i);
            }
            None => self.push(name, value),
        }
    }

    /// Adds a field line, combining it with an existing field of the same name as
    /// `existing, value`.
    ///
    /// `Set-Cookie` is never combined because its values may contain commas; every
    /// line gets its own entry.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        if name == SET_COOKIE {
            self.push(name, value);
            return;
        }

        match self.position(name.as_str()) {
            Some(i) => {
                let existing = &self.entries[i].1;
                let mut combined = BytesMut::with_capacity(existing.len() + 2 + value.len());
                combined.extend_from_slice(existing.as_bytes());
                combined.extend_from_slice(b", ");
                combined.extend_from_slice(value.as_bytes());
                // both halves were valid values and ", " is valid, so the result is too
                if let Ok(combined) = HeaderValue::from_maybe_shared(combined.freeze()) {
                    self.entries[i].1 = combined;
                }
                self.last = Some(i);
            }
            None => self.push(name, value),
        }
    }

    /// Concatenates `continuation` onto the value of the most recently written field.
    ///
    /// Returns `Ok(false)` when no field has been written yet.
    pub fn append_to_last(&mut self, continuation: &[u8]) -> Result<bool, InvalidHeaderValue> {
        let Some(i) = self.last else {
            return Ok(false);
        };

        let existing = &self.entries[i].1;
        let mut joined = BytesMut::with_capacity(existing.len() + continuation.len());
        joined.extend_from_slice(existing.as_bytes());
        joined.extend_from_slice(continuation);
        self.entries[i].1 = HeaderValue::from_maybe_shared(joined.freeze())?;
        Ok(true)
    }

    /// Name of the field a continuation line would extend.
    pub fn last_name(&self) -> Option<&HeaderName> {
        self.last.map(|i| &self.entries[i].0)
    }

    /// Removes every entry named `name`, returning the first value.
    pub fn remove<K: AsRef<str>>(&mut self, name: K) -> Option<HeaderValue> {
        self.take_all(name.as_ref()).into_iter().next()
    }

    /// Removes every entry named `name` and returns their values in order.
    pub fn take_all(&mut self, name: &str) -> Vec<HeaderValue> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for (n, v) in self.entries.drain(..) {
            if n.as_str().eq_ignore_ascii_case(name) {
                taken.push(v);
            } else {
                kept.push((n, v));
            }
        }
        self.entries = kept;
        if !taken.is_empty() {
            self.last = None;
        }
        taken
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    /// Sets `Host` from the URI authority unless a `Host` field is already present.
    pub fn inject_host(&mut self, uri: &Uri) {
        if self.contains(HOST) {
            return;
        }
        if let Some(value) = uri.authority().and_then(|authority| HeaderValue::from_str(authority.as_str()).ok()) {
            self.set(HOST, value);
        }
    }

    /// Describes the body framing: `Content-Length` for fixed bodies,
    /// `Transfer-Encoding: chunked` for streaming ones.
    pub fn inject_body_metadata(&mut self, body: &Body) {
        match body {
            Body::Fixed(bytes) => {
                self.remove(TRANSFER_ENCODING);
                self.set(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            }
            Body::Streaming(_) => {
                self.remove(CONTENT_LENGTH);
                self.set(TRANSFER_ENCODING, CHUNKED);
            }
        }
    }

    /// Adds `Connection: keep-alive` unless the message already chose a value.
    pub fn ensure_connection(&mut self) {
        if !self.contains(CONNECTION) {
            self.set(CONNECTION, KEEP_ALIVE);
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
    }

    fn push(&mut self, name: HeaderName, value: HeaderValue) {
        self.entries.push((name, value));
        self.last = Some(self.entries.len() - 1);
    }
}

impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Headers {}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl FromIterator<(HeaderName, HeaderValue)> for Headers {
    fn from_iter<T: IntoIterator<Item = (HeaderName, HeaderValue)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}
