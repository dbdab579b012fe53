use std::fmt;
use std::str::FromStr;

use crate::protocol::{ParseError, VersionError};

/// An `HTTP/<major>.<minor>` protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub fn parse(token: &[u8]) -> Result<Self, VersionError> {
        let rest = token.strip_prefix(b"HTTP/").ok_or(VersionError::MissingPrefix)?;
        let dot = rest.iter().position(|b| *b == b'.').ok_or(VersionError::InvalidMajor)?;
        let major = parse_digits(&rest[..dot]).ok_or(VersionError::InvalidMajor)?;
        let minor = parse_digits(&rest[dot + 1..]).ok_or(VersionError::InvalidMinor)?;
        Ok(Self { major, minor })
    }
}

fn parse_digits(digits: &[u8]) -> Option<u8> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    // all ascii digits, so always valid utf-8
    std::str::from_utf8(digits).ok()?.parse().ok()
}

impl Default for Version {
    fn default() -> Self {
        Self::HTTP_11
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes()).map_err(ParseError::InvalidVersion)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

impl TryFrom<Version> for http::Version {
    type Error = VersionError;

    fn try_from(value: Version) -> Result<Self, Self::Error> {
        match (value.major, value.minor) {
            (0, 9) => Ok(http::Version::HTTP_09),
            (1, 0) => Ok(http::Version::HTTP_10),
            (1, 1) => Ok(http::Version::HTTP_11),
            (2, 0) => Ok(http::Version::HTTP_2),
            (3, 0) => Ok(http::Version::HTTP_3),
            (1, _) => Err(VersionError::InvalidMinor),
            _ => Err(VersionError::InvalidMajor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_versions() {
        assert_eq!(Version::parse(b"HTTP/1.1"), Ok(Version::HTTP_11));
        assert_eq!(Version::parse(b"HTTP/1.0"), Ok(Version::HTTP_10));
        assert_eq!(Version::parse(b"HTTP/2.0"), Ok(Version::new(2, 0)));
        assert_eq!(Version::parse(b"HTTP/12.34"), Ok(Version::new(12, 34)));
    }

    #[test]
    fn parse_invalid_versions() {
        assert_eq!(Version::parse(b"http/1.1"), Err(VersionError::MissingPrefix));
        assert_eq!(Version::parse(b"HTTP1.1"), Err(VersionError::MissingPrefix));
        assert_eq!(Version::parse(b"HTTP/1"), Err(VersionError::InvalidMajor));
        assert_eq!(Version::parse(b"HTTP/x.1"), Err(VersionError::InvalidMajor));
        assert_eq!(Version::parse(b"HTTP/1."), Err(VersionError::InvalidMinor));
        assert_eq!(Version::parse(b"HTTP/1.1 "), Err(VersionError::InvalidMinor));
        assert_eq!(Version::parse(b"HTTP/1.999"), Err(VersionError::InvalidMinor));
    }

    #[test]
    fn display() {
        assert_eq!(Version::HTTP_11.to_string(), "HTTP/1.1");
        assert_eq!("HTTP/1.0".parse::<Version>().unwrap(), Version::HTTP_10);
    }

    #[test]
    fn into_http_version() {
        assert_eq!(http::Version::try_from(Version::HTTP_11), Ok(http::Version::HTTP_11));
        assert_eq!(http::Version::try_from(Version::new(1, 7)), Err(VersionError::InvalidMinor));
    }
}
