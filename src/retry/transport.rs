//! A drop-in [`Transport`] whose response bodies heal themselves.
//!
//! For `GET` requests, [`RetryingTransport`] opens a [`Seeker`] at offset 0
//! (retrying the first response as long as the handler allows) and returns a
//! response with the first response's URL, status line and headers and a
//! body that streams from a [`RetryingReader`]. Every other method goes straight
//! to the base transport.

use super::handler::SharedErrorHandler;
use super::reader::{seek_until_ready, RetryingReader};
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::seeker::{ResponseHead, Seeker};

use async_trait::async_trait;
use reqwest::{Body, Method, Request, Response, ResponseBuilderExt};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Wraps a transport so that `GET` bodies resume after read failures.
///
/// ```rust
/// use httpseek::{http::create_http_client, retry::handler_fn, HttpClientConfig, RetryingTransport};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = create_http_client(HttpClientConfig::default())?;
/// let transport = RetryingTransport::new(client, Some(handler_fn(|_| Ok(()))));
/// # Ok(())
/// # }
/// ```
pub struct RetryingTransport<T> {
    base: Arc<T>,
    handler: Option<SharedErrorHandler>,
    max_seek_failures: Option<u32>,
}

impl<T> fmt::Debug for RetryingTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingTransport")
            .field("handler", &self.handler.is_some())
            .field("max_seek_failures", &self.max_seek_failures)
            .finish()
    }
}

impl<T> Clone for RetryingTransport<T> {
    fn clone(&self) -> Self {
        Self {
            base: Arc::clone(&self.base),
            handler: self.handler.clone(),
            max_seek_failures: self.max_seek_failures,
        }
    }
}

impl<T: Transport + 'static> RetryingTransport<T> {
    /// Wraps `base`. With `handler` set to `None`, responses are still
    /// validated but nothing is retried.
    pub fn new(base: T, handler: Option<SharedErrorHandler>) -> Self {
        Self {
            base: Arc::new(base),
            handler,
            max_seek_failures: None,
        }
    }

    /// Bounds consecutive failed seeks, both for the first response and for
    /// recoveries in the returned bodies.
    pub fn max_seek_failures(mut self, max: u32) -> Self {
        self.max_seek_failures = Some(max);
        self
    }

    /// The wrapped transport.
    pub fn base(&self) -> &T {
        &self.base
    }
}

#[async_trait]
impl<T: Transport + 'static> Transport for RetryingTransport<T> {
    async fn execute(&self, request: Request) -> Result<Response> {
        // A streaming body cannot be sent twice.
        let streaming = request
            .body()
            .is_some_and(|body| body.as_bytes().is_none());
        if request.method() != Method::GET || streaming {
            return self.base.execute(request).await;
        }

        debug!(url = %request.url(), "Opening retrying reader");
        let mut seeker = Seeker::new(Arc::clone(&self.base), request);
        seek_until_ready(
            &mut seeker,
            0,
            self.handler.as_ref(),
            self.max_seek_failures,
        )
        .await?;

        let head = seeker.response().await?.clone();
        let mut reader = RetryingReader::new(seeker, self.handler.clone());
        if let Some(max) = self.max_seek_failures {
            reader = reader.max_seek_failures(max);
        }
        into_response(head, reader)
    }
}

fn into_response<T: Transport + 'static>(
    head: ResponseHead,
    reader: RetryingReader<T>,
) -> Result<Response> {
    let mut builder = http::Response::builder()
        .url(head.url)
        .status(head.status)
        .version(head.version);
    if let Some(headers) = builder.headers_mut() {
        *headers = head.headers;
    }
    let response = builder
        .body(Body::wrap_stream(reader.into_stream()))
        .map_err(|e| Error::Internal(e.to_string()))?;
    Ok(Response::from(response))
}
