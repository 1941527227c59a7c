//! A reader that repairs its stream instead of failing.
//!
//! [`RetryingReader`] reads through a [`Seeker`]. When a read fails with a
//! transient error it asks the [`ErrorHandler`](super::ErrorHandler) what to do; if the handler
//! approves, the seeker is re-positioned at the last byte handed out (which
//! issues a new ranged request) and the read starts over. Protocol violations
//! are never retried, and without a handler every error is surfaced as-is.

use super::handler::SharedErrorHandler;
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::seeker::{ResponseHead, Seeker};

use bytes::Bytes;
use futures::stream::{self, Stream};
use std::fmt;
use std::io::SeekFrom;
use tracing::warn;

/// Reads a [`Seeker`], resuming with a fresh range request after failures.
pub struct RetryingReader<T> {
    seeker: Seeker<T>,
    handler: Option<SharedErrorHandler>,
    max_seek_failures: Option<u32>,
}

impl<T> fmt::Debug for RetryingReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingReader")
            .field("seeker", &self.seeker)
            .field("handler", &self.handler.is_some())
            .field("max_seek_failures", &self.max_seek_failures)
            .finish()
    }
}

impl<T: Transport> RetryingReader<T> {
    /// Wraps `seeker`. With `handler` set to `None`, nothing is retried.
    pub fn new(seeker: Seeker<T>, handler: Option<SharedErrorHandler>) -> Self {
        Self {
            seeker,
            handler,
            max_seek_failures: None,
        }
    }

    /// Gives up after `max` consecutive failed re-seeks, even if the handler
    /// keeps approving.
    pub fn max_seek_failures(mut self, max: u32) -> Self {
        self.max_seek_failures = Some(max);
        self
    }

    /// Position of the next byte a read will return.
    pub fn offset(&self) -> u64 {
        self.seeker.offset()
    }

    /// Total size of the resource, once a response has confirmed it.
    pub fn size(&self) -> Option<u64> {
        self.seeker.size()
    }

    /// See [`Seeker::response`].
    pub async fn response(&mut self) -> Result<&ResponseHead> {
        self.seeker.response().await
    }

    /// Reads up to `buf.len()` bytes, recovering from transient failures.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.seeker.read(buf).await {
                Ok(n) => return Ok(n),
                Err(e) => self.recover(e).await?,
            }
        }
    }

    /// Returns the next chunk, recovering from transient failures.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.seeker.chunk().await {
                Ok(chunk) => return Ok(chunk),
                Err(e) => self.recover(e).await?,
            }
        }
    }

    /// Moves the underlying seeker. Seek failures are not retried.
    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.seeker.seek(pos).await
    }

    /// Releases the open body. The next read reopens it at the current offset.
    pub fn close(&mut self) {
        self.seeker.close();
    }

    /// Returns the wrapped seeker.
    pub fn into_inner(self) -> Seeker<T> {
        self.seeker
    }

    /// Turns the reader into a stream of body chunks from the current offset.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send + 'static
    where
        T: 'static,
    {
        stream::try_unfold(self, |mut reader| async move {
            Ok::<_, Error>(reader.chunk().await?.map(|chunk| (chunk, reader)))
        })
    }

    async fn recover(&mut self, error: Error) -> Result<()> {
        consult(self.handler.as_ref(), error).await?;
        let offset = self.seeker.offset();
        warn!(offset, "Read failed, resuming with a ranged request");
        seek_until_ready(
            &mut self.seeker,
            offset,
            self.handler.as_ref(),
            self.max_seek_failures,
        )
        .await
    }
}

/// Asks the handler about a failure. Hard errors skip the handler.
pub(crate) async fn consult(handler: Option<&SharedErrorHandler>, error: Error) -> Result<()> {
    if !error.is_transient() {
        return Err(error);
    }
    match handler {
        Some(handler) => handler.handle(error).await,
        None => Err(error),
    }
}

/// Seeks to `offset`, consulting the handler after every failed attempt.
pub(crate) async fn seek_until_ready<T: Transport>(
    seeker: &mut Seeker<T>,
    offset: u64,
    handler: Option<&SharedErrorHandler>,
    max_failures: Option<u32>,
) -> Result<()> {
    let mut failures = 0;
    loop {
        let error = match seeker.seek(SeekFrom::Start(offset)).await {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };

        failures += 1;
        if error.is_transient() && max_failures.is_some_and(|max| failures >= max) {
            return Err(Error::TooManySeekFailures {
                attempts: failures,
                source: Box::new(error),
            });
        }
        warn!(offset, failures, error = %error, "Seek failed");
        consult(handler, error).await?;
    }
}
