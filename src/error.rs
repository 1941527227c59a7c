//! Error handling for the httpseek library.
//!
//! Errors fall into three families:
//!
//! - transport failures (network, timeouts, middleware), which may go away
//!   if the request is issued again;
//! - protocol violations (a missing or inconsistent `Content-Range`, a server
//!   that ignores the `Range` header, a resource that changes size between
//!   requests), which fail the same way every time;
//! - unexpected truncation, where a body stops before the confirmed size.
//!
//! [`Error::is_transient`] tells the two apart for the retry layer, and
//! [`Error::is_byte_range_violation`] singles out the sentinel a retry policy
//! can use to stop immediately.

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Errors that can happen when reading a remote resource through a seeker.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O Error.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    ///
    /// Covers failures to send the request as well as failures while
    /// streaming the response body.
    #[error("Reqwest Error")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error from a middleware stack wrapped around the Reqwest client.
    #[error("Middleware Error")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// The server answered a ranged request with a full response.
    #[error("expected HTTP 206 from byte range request, got {status}")]
    RangeNotHonored { status: StatusCode },

    /// A `206 Partial Content` response without a `Content-Range` header.
    #[error("no Content-Range header found in HTTP 206 response")]
    MissingContentRange,

    /// A `Content-Range` header that does not follow `bytes start-end/total`.
    #[error("could not parse Content-Range header: {0}")]
    MalformedContentRange(String),

    /// The server returned a range that does not start where we asked.
    #[error("received Content-Range starting at offset {actual} instead of requested {expected}")]
    RangeStartMismatch { expected: u64, actual: u64 },

    /// The returned range stops before the end of the content.
    #[error("range in Content-Range stops before the end of the content: {0}")]
    IncompleteRange(String),

    /// The resource reported a different size than a previous response.
    #[error("resource size changed from {previous} to {reported} bytes")]
    SizeChanged { previous: u64, reported: u64 },

    /// Seeking relative to the end without a known content length.
    #[error("content length not known")]
    SizeUnknown,

    /// The resulting seek position would be before the start of the resource.
    #[error("invalid seek to a negative or overflowing position")]
    NegativeOffset,

    /// The body ended before the confirmed size was reached.
    #[error("body ended at offset {offset} before the expected {size} bytes")]
    Truncated { offset: u64, size: u64 },

    /// The request template carries a streaming body and cannot be re-sent.
    #[error("request cannot be cloned for a ranged retry")]
    RequestNotCloneable,

    /// The retry layer gave up after repeated failed re-seeks.
    #[error("gave up after {attempts} consecutive failed seeks")]
    TooManySeekFailures {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns true for the sentinel raised when a server ignores a `Range` header.
    ///
    /// Retrying such a request will get the same full response again, so
    /// retry policies should stop as soon as they see it.
    pub fn is_byte_range_violation(&self) -> bool {
        matches!(self, Error::RangeNotHonored { .. })
    }

    /// Returns true for I/O-category errors that a re-seek may fix.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::IOError { .. }
                | Error::Reqwest { .. }
                | Error::Middleware { .. }
                | Error::Truncated { .. }
        )
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::IOError { source } => source,
            Error::Truncated { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, error),
            Error::NegativeOffset | Error::SizeUnknown => {
                io::Error::new(io::ErrorKind::InvalidInput, error)
            }
            other => io::Error::other(other),
        }
    }
}

/// Result type alias for operations that can fail with an httpseek error.
pub type Result<T> = std::result::Result<T, Error>;
