//! HTTP client setup and middleware configuration.
//!
//! This module builds the client a [`Seeker`](crate::Seeker) issues its
//! ranged requests through. The client:
//!
//! - never follows redirects, so that the seeker can follow them itself and
//!   keep its `Range` header on every hop;
//! - traces every request through `reqwest-tracing`;
//! - retries nothing by default. Setting [`HttpClientConfig::retries`] adds
//!   exponential backoff for failures to *establish* a response, below any
//!   [`ErrorHandler`](crate::ErrorHandler). Failures halfway through a body
//!   are the job of [`RetryingReader`](crate::RetryingReader).
//!
//! # Examples
//!
//! ```rust
//! use httpseek::http::{create_http_client, HttpClientConfig};
//! use reqwest::header::{HeaderMap, USER_AGENT};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut headers = HeaderMap::new();
//! headers.insert(USER_AGENT, "MyReader/1.0".parse()?);
//!
//! let config = HttpClientConfig {
//!     retries: 5,
//!     proxy: None,
//!     headers: Some(headers),
//!     timeout: Some(Duration::from_secs(30)),
//! };
//!
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

use reqwest::{header::HeaderMap, redirect, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Number of retries for requests that fail before a response arrives.
    /// Zero, the default, leaves every retry decision to the caller.
    pub retries: u32,
    /// Optional proxy configuration.
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
    /// Total timeout applied to each request, body included.
    pub timeout: Option<Duration>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retries: 0,
            proxy: None,
            headers: None,
            timeout: None,
        }
    }
}

/// Creates an HTTP client suitable as a seeker transport.
///
/// This function sets up a reqwest client with:
/// - Redirects disabled
/// - Tracing middleware for request/response logging
/// - Retry middleware with exponential backoff, when `config.retries > 0`
/// - Optional proxy, default headers and timeout
///
/// # Example
///
/// ```rust
/// use httpseek::http::client::{create_http_client, HttpClientConfig};
///
/// let config = HttpClientConfig::default();
/// let client = create_http_client(config).unwrap();
/// ```
pub fn create_http_client(
    config: HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    // Build the inner reqwest client. Redirects are followed by the seeker.
    let mut inner_client_builder = reqwest::Client::builder().redirect(redirect::Policy::none());

    // Configure proxy if provided
    if let Some(proxy) = config.proxy {
        inner_client_builder = inner_client_builder.proxy(proxy);
    }

    // Configure default headers if provided
    if let Some(headers) = config.headers {
        inner_client_builder = inner_client_builder.default_headers(headers);
    }

    // Bound each request, body included
    if let Some(timeout) = config.timeout {
        inner_client_builder = inner_client_builder.timeout(timeout);
    }

    let inner_client = inner_client_builder.build()?;

    // Trace HTTP requests. See the tracing crate to make use of these traces.
    let mut client = ClientBuilder::new(inner_client).with(TracingMiddleware::default());

    // Retry failed requests, only when asked to.
    if config.retries > 0 {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.retries);
        client = client.with(RetryTransientMiddleware::new_with_policy(retry_policy));
    }

    Ok(client.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, USER_AGENT};

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.retries, 0);
        assert!(config.proxy.is_none());
        assert!(config.headers.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_create_http_client_default() {
        let client = create_http_client(HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_http_client_with_headers_and_timeout() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("test-agent"));

        let config = HttpClientConfig {
            retries: 5,
            proxy: None,
            headers: Some(headers),
            timeout: Some(Duration::from_secs(5)),
        };

        let client = create_http_client(config);
        assert!(client.is_ok());
    }
}
