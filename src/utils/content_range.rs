//! `Content-Range` parsing and validation.
//!
//! A `206 Partial Content` response confirms which bytes it carries with a
//! header of the form `bytes <start>-<end>/<total>`, where `total` may be `*`
//! when the server does not know the full length. The seeker only ever asks
//! for open-ended ranges (`bytes=<offset>-`), so a valid answer must start at
//! the requested offset and run to the last byte of the resource.

use crate::error::{Error, Result};

use reqwest::header::{HeaderMap, CONTENT_RANGE};
use std::fmt;
use std::str::FromStr;

/// A parsed `Content-Range` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First byte position, inclusive.
    pub start: u64,
    /// Last byte position, inclusive.
    pub end: u64,
    /// Complete length of the resource, `None` for `*`.
    pub total: Option<u64>,
}

impl ContentRange {
    /// Reads and parses the `Content-Range` header of a response.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let value = headers
            .get(CONTENT_RANGE)
            .ok_or(Error::MissingContentRange)?;
        let value = value
            .to_str()
            .map_err(|_| Error::MalformedContentRange(format!("{:?}", value)))?;
        value.parse()
    }

    /// Checks the range against the request that produced it.
    ///
    /// `requested_offset` is the offset sent in the `Range` header and
    /// `known_size` the size confirmed by an earlier response, if any.
    /// Returns the total size the header reports.
    pub fn validate(&self, requested_offset: u64, known_size: Option<u64>) -> Result<Option<u64>> {
        if self.start != requested_offset {
            return Err(Error::RangeStartMismatch {
                expected: requested_offset,
                actual: self.start,
            });
        }

        let Some(total) = self.total else {
            return Ok(None);
        };

        if self.end.checked_add(1) != Some(total) {
            return Err(Error::IncompleteRange(self.to_string()));
        }

        match known_size {
            Some(previous) if previous != total => Err(Error::SizeChanged {
                previous,
                reported: total,
            }),
            _ => Ok(Some(total)),
        }
    }
}

impl FromStr for ContentRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedContentRange(s.to_string());

        let (unit, rest) = s.trim().split_once(' ').ok_or_else(malformed)?;
        if !unit.eq_ignore_ascii_case("bytes") {
            return Err(malformed());
        }

        let (range, total) = rest.trim_start().split_once('/').ok_or_else(malformed)?;
        let (start, end) = range.split_once('-').ok_or_else(malformed)?;
        let start = parse_position(start).ok_or_else(malformed)?;
        let end = parse_position(end).ok_or_else(malformed)?;
        if end < start {
            return Err(malformed());
        }

        let total = match total.trim() {
            "*" => None,
            t => Some(parse_position(t).ok_or_else(malformed)?),
        };

        Ok(ContentRange { start, end, total })
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total {
            Some(total) => write!(f, "bytes {}-{}/{}", self.start, self.end, total),
            None => write!(f, "bytes {}-{}/*", self.start, self.end),
        }
    }
}

// `u64::from_str` accepts a leading `+`, which is not valid here.
fn parse_position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
