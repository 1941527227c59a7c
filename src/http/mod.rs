//! HTTP plumbing underneath the seeker.
//!
//! - [`client`] - HTTP client creation and middleware configuration
//! - [`transport`] - The [`Transport`] trait the seeker sends requests through
//!
//! # Examples
//!
//! ```rust
//! use httpseek::http::{create_http_client, HttpClientConfig, Transport};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_http_client(HttpClientConfig::default())?;
//! fn assert_transport<T: Transport>(_: &T) {}
//! assert_transport(&client);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod transport;

pub use client::{create_http_client, HttpClientConfig};
pub use transport::Transport;
