//! httpseek turns a non-seekable HTTP response body into a seekable,
//! resumable byte stream, using `Range` requests to reposition on demand and
//! to recover from connections that drop halfway through a body.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use httpseek::{http::create_http_client, HttpClientConfig, Seeker};
//! use std::io::SeekFrom;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), httpseek::Error> {
//! let client = create_http_client(HttpClientConfig::default())?;
//! let request = client.get("https://example.com/hello.txt").build()?;
//!
//! let mut seeker = Seeker::new(client, request);
//! seeker.seek(SeekFrom::Start(6)).await?;
//! while let Some(chunk) = seeker.chunk().await? {
//!     println!("{:?}", chunk);
//! }
//! assert_eq!(Some(seeker.offset()), seeker.size());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`seeker`] - The [`Seeker`], issuing and validating ranged requests
//! - [`retry`] - [`RetryingReader`] and [`RetryingTransport`], which resume
//!   after read failures when an [`ErrorHandler`] allows it
//! - [`http`] - The [`Transport`] seam and the client factory
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`utils`] - `Content-Range` parsing and validation

pub mod error;
pub mod http;
pub mod retry;
pub mod seeker;
pub mod utils;

pub use crate::error::{Error, Result};
pub use crate::http::{create_http_client, HttpClientConfig, Transport};
pub use crate::retry::{
    handler_fn, Backoff, ErrorHandler, RetryingReader, RetryingTransport, SharedErrorHandler,
};
pub use crate::seeker::{ResponseHead, Seeker, MAX_REDIRECTS};
pub use crate::utils::ContentRange;
