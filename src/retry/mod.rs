//! Failure recovery on top of the [`Seeker`](crate::Seeker).
//!
//! - [`handler`] - The [`ErrorHandler`] strategy deciding retry or abort
//! - [`reader`] - [`RetryingReader`], which re-seeks after a failed read
//! - [`transport`] - [`RetryingTransport`], a transport handing out
//!   self-healing response bodies
//!
//! # Examples
//!
//! ```rust,no_run
//! use httpseek::{http::create_http_client, retry::Backoff, HttpClientConfig};
//! use httpseek::{RetryingReader, Seeker, SharedErrorHandler};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_http_client(HttpClientConfig::default())?;
//! let request = client.get("https://example.com/big.iso").build()?;
//! let handler: SharedErrorHandler = Arc::new(Backoff::new(5));
//!
//! let mut reader = RetryingReader::new(Seeker::new(client, request), Some(handler));
//! while let Some(chunk) = reader.chunk().await? {
//!     println!("{} bytes", chunk.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod handler;
pub mod reader;
pub mod transport;

pub use handler::{handler_fn, Backoff, ErrorHandler, SharedErrorHandler};
pub use reader::RetryingReader;
pub use transport::RetryingTransport;
