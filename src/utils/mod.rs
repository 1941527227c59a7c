//! Shared utility functions.
//!
//! This module contains helpers used by the seeker when it interprets
//! server responses.
//!
//! - [`content_range`] - Parsing and validation of `Content-Range` headers
//!
//! # Examples
//!
//! ```rust
//! use httpseek::utils::ContentRange;
//!
//! let range: ContentRange = "bytes 6-11/12".parse().unwrap();
//! assert_eq!(range.validate(6, None).unwrap(), Some(12));
//! ```

pub mod content_range;

pub use content_range::ContentRange;
