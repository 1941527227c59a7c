//! A remote HTTP resource presented as a seekable byte stream.
//!
//! The [`Seeker`] keeps a cursor into the resource and, whenever it needs a
//! body positioned at that cursor, sends a copy of its request template with a
//! `Range: bytes=<offset>-` header. The server's answer is checked before it
//! is trusted:
//!
//! - `200`/`204` is only acceptable for offset 0. Anywhere else the server
//!   ignored the range, and [`Error::RangeNotHonored`] is returned.
//! - `206` must carry a `Content-Range` that starts at the requested offset,
//!   runs to the end of the resource and agrees with any size learned before.
//! - Redirects are followed (keeping the `Range` header) for up to
//!   [`MAX_REDIRECTS`] hops.
//! - Anything else is handed through as a terminal response of unknown size.
//!
//! The seeker never retries on its own; see [`crate::retry`] for that.
//!
//! # Examples
//!
//! ```rust,no_run
//! use httpseek::{http::create_http_client, HttpClientConfig, Seeker};
//! use std::io::SeekFrom;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_http_client(HttpClientConfig::default())?;
//! let request = client.get("https://example.com/hello.txt").build()?;
//! let mut seeker = Seeker::new(client, request);
//!
//! seeker.seek(SeekFrom::Start(6)).await?;
//! let mut buf = [0u8; 6];
//! let n = seeker.read(&mut buf).await?;
//! println!("read {} bytes, now at {}", n, seeker.offset());
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::http::Transport;
use crate::utils::ContentRange;

use bytes::{Buf, Bytes};
use futures::stream::{self, Stream};
use reqwest::{
    header::{
        HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, COOKIE, LOCATION, PROXY_AUTHORIZATION,
        RANGE,
    },
    Request, Response, StatusCode, Url, Version,
};
use std::fmt;
use std::io::SeekFrom;
use tracing::debug;

/// Maximum number of redirects followed for a single seek.
pub const MAX_REDIRECTS: usize = 10;

/// Status line and headers of a response, kept after its body has moved on.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// Final URL, after redirects.
    pub url: Url,
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    /// Declared body length, if the server sent one.
    pub content_length: Option<u64>,
}

impl From<&Response> for ResponseHead {
    fn from(response: &Response) -> Self {
        Self {
            url: response.url().clone(),
            status: response.status(),
            version: response.version(),
            headers: response.headers().clone(),
            content_length: declared_length(response),
        }
    }
}

enum Body {
    /// No request issued yet, or the last stream was invalidated.
    Closed,
    Open(Box<Response>),
    /// The stream ended normally; reads report end-of-stream until the next seek.
    Exhausted,
}

/// Reads an HTTP resource with `Range` requests, one open body at a time.
///
/// Not meant for concurrent use: every operation takes `&mut self`.
pub struct Seeker<T> {
    transport: T,
    request: Request,
    response: Option<ResponseHead>,
    body: Body,
    /// Bytes received from the body but not yet handed out.
    pending: Bytes,
    offset: u64,
    size: Option<u64>,
}

impl<T> fmt::Debug for Seeker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match self.body {
            Body::Closed => "closed",
            Body::Open(_) => "open",
            Body::Exhausted => "exhausted",
        };
        f.debug_struct("Seeker")
            .field("method", self.request.method())
            .field("url", &self.request.url().as_str())
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("body", &body)
            .finish()
    }
}

impl<T: Transport> Seeker<T> {
    /// Creates a seeker that issues copies of `request` through `transport`.
    ///
    /// No request is sent until the first read, seek or [`Seeker::response`].
    pub fn new(transport: T, request: Request) -> Self {
        Self {
            transport,
            request,
            response: None,
            body: Body::Closed,
            pending: Bytes::new(),
            offset: 0,
            size: None,
        }
    }

    /// Position of the next byte a read will return.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total size of the resource, once a response has confirmed it.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// The request template every attempt is cloned from.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Reads up to `buf.len()` bytes at the current offset.
    ///
    /// Returns `Ok(0)` only at the end of the resource. A body that stops
    /// before the confirmed size yields [`Error::Truncated`] and is closed, so
    /// the next read starts a fresh request where this one stopped.
    ///
    /// A status other than 200, 204, 206 or a redirect is not an error: its
    /// body is streamed as if it were the resource, also when it answers a
    /// re-seek halfway through. Check [`Seeker::response`] first if that
    /// matters.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || !self.fill().await? {
            return Ok(0);
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        self.offset += n as u64;
        Ok(n)
    }

    /// Returns the next chunk of the body, or `None` at the end of the resource.
    ///
    /// Same semantics as [`Seeker::read`], without the copy.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        if !self.fill().await? {
            return Ok(None);
        }
        let chunk = std::mem::take(&mut self.pending);
        self.offset += chunk.len() as u64;
        Ok(Some(chunk))
    }

    /// Moves the cursor and opens a body at the new position.
    ///
    /// Seeking from the end requires a known size. Positions at or past the
    /// end of a resource of known size are accepted without a request and
    /// read as end-of-stream. Returns the new absolute offset.
    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.offset.checked_add_signed(delta),
            SeekFrom::End(delta) => self
                .size
                .ok_or(Error::SizeUnknown)?
                .checked_add_signed(delta),
        }
        .ok_or(Error::NegativeOffset)?;

        self.seek_to(target).await?;
        Ok(target)
    }

    /// Status and headers of the response for offset 0.
    ///
    /// If no such response has been seen yet, one is requested. When the
    /// cursor is still at 0 that response becomes the active body; otherwise
    /// the current body is left alone and only the head is kept.
    pub async fn response(&mut self) -> Result<&ResponseHead> {
        if self.response.is_none() {
            if self.offset == 0 && matches!(self.body, Body::Closed) {
                self.open(0).await?;
            } else {
                let response = self.send(0).await?;
                self.size = self.check(&response, 0)?;
                self.response = Some(ResponseHead::from(&response));
            }
        }
        self.response
            .as_ref()
            .ok_or_else(|| Error::Internal("offset 0 response was not recorded".into()))
    }

    /// Releases the open body, if any. Calling it again is a no-op.
    pub fn close(&mut self) {
        self.reset();
    }

    /// Turns the seeker into a stream of body chunks from the current offset.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send + 'static
    where
        T: 'static,
    {
        stream::try_unfold(self, |mut seeker| async move {
            Ok::<_, Error>(seeker.chunk().await?.map(|chunk| (chunk, seeker)))
        })
    }

    /// Makes sure `pending` holds data, returning false at end-of-stream.
    async fn fill(&mut self) -> Result<bool> {
        while self.pending.is_empty() {
            if self.size.is_some_and(|size| self.offset >= size) {
                return Ok(false);
            }

            let next = match &mut self.body {
                Body::Exhausted => return Ok(false),
                Body::Closed => None,
                Body::Open(response) => Some(response.chunk().await),
            };

            match next {
                None => self.seek_to(self.offset).await?,
                Some(Ok(Some(chunk))) => self.pending = chunk,
                Some(Ok(None)) => {
                    if let Some(size) = self.size {
                        if self.offset < size {
                            self.reset();
                            return Err(Error::Truncated {
                                offset: self.offset,
                                size,
                            });
                        }
                    }
                    self.reset();
                    self.body = Body::Exhausted;
                    return Ok(false);
                }
                Some(Err(e)) => {
                    self.reset();
                    return Err(e.into());
                }
            }
        }
        Ok(true)
    }

    async fn seek_to(&mut self, offset: u64) -> Result<()> {
        if let Some(size) = self.size {
            if offset >= size {
                debug!(offset, size, "Seek at or past the end, no request needed");
                self.reset();
                self.offset = offset;
                self.body = Body::Exhausted;
                return Ok(());
            }
        }
        self.open(offset).await
    }

    /// Requests a body starting at `offset` and makes it the active one.
    async fn open(&mut self, offset: u64) -> Result<()> {
        let response = self.send(offset).await?;
        let size = self.check(&response, offset)?;
        debug!(
            url = %response.url(),
            status = %response.status(),
            offset,
            ?size,
            "Accepted response"
        );

        self.reset();
        if offset == 0 {
            self.response = Some(ResponseHead::from(&response));
        }
        self.size = size;
        self.offset = offset;
        self.body = Body::Open(Box::new(response));
        Ok(())
    }

    /// Clones the template for `offset`, adding the `Range` header if needed.
    fn prepare(&self, offset: u64) -> Result<Request> {
        let mut request = self
            .request
            .try_clone()
            .ok_or(Error::RequestNotCloneable)?;
        if offset > 0 {
            let range = HeaderValue::try_from(format!("bytes={}-", offset))
                .map_err(|e| Error::Internal(e.to_string()))?;
            request.headers_mut().insert(RANGE, range);
        }
        Ok(request)
    }

    async fn send(&mut self, offset: u64) -> Result<Response> {
        let request = self.prepare(offset)?;
        follow_redirects(&self.transport, request, offset).await
    }

    /// Validates a response for `offset` and returns the size it implies.
    fn check(&self, response: &Response, offset: u64) -> Result<Option<u64>> {
        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                if offset > 0 {
                    return Err(Error::RangeNotHonored { status });
                }
                match (self.size, declared_length(response)) {
                    (Some(previous), Some(reported)) if previous != reported => {
                        Err(Error::SizeChanged { previous, reported })
                    }
                    (previous, reported) => Ok(reported.or(previous)),
                }
            }
            StatusCode::PARTIAL_CONTENT => {
                let range = ContentRange::from_headers(response.headers())?;
                Ok(range.validate(offset, self.size)?.or(self.size))
            }
            _ => Ok(self.size),
        }
    }

    fn reset(&mut self) {
        self.body = Body::Closed;
        self.pending.clear();
    }
}

/// Executes `request`, following up to [`MAX_REDIRECTS`] redirects.
///
/// A redirect without a usable `Location` is returned as the final response,
/// as is the last hop once the limit is reached.
async fn follow_redirects<T: Transport>(
    transport: &T,
    mut request: Request,
    offset: u64,
) -> Result<Response> {
    let mut hops = 0;
    loop {
        debug!(method = %request.method(), url = %request.url(), offset, "Sending request");
        let next = request.try_clone();
        let from = request.url().clone();
        let response = transport.execute(request).await?;

        if !is_redirect(response.status()) || hops >= MAX_REDIRECTS {
            return Ok(response);
        }
        let Some(target) = redirect_target(&from, &response) else {
            return Ok(response);
        };
        let Some(mut next) = next else {
            return Err(Error::RequestNotCloneable);
        };

        debug!(status = %response.status(), %from, to = %target, "Following redirect");
        if target.origin() != from.origin() {
            let headers = next.headers_mut();
            headers.remove(AUTHORIZATION);
            headers.remove(COOKIE);
            headers.remove(PROXY_AUTHORIZATION);
        }
        *next.url_mut() = target;
        request = next;
        hops += 1;
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Body length announced by the response, from the body or its header.
fn declared_length(response: &Response) -> Option<u64> {
    response.content_length().or_else(|| {
        response
            .headers()
            .get(CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    })
}

fn redirect_target(from: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    from.join(location).ok()
}
