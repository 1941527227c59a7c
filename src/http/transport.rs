//! The request-execution capability the seeker is built on.
//!
//! A [`Transport`] sends one prepared [`Request`] and hands back the
//! [`Response`] as-is. Connection pooling, TLS and proxies all live below
//! this seam. Implementations are provided for [`reqwest::Client`] and
//! [`ClientWithMiddleware`], and the retrying wrapper in
//! [`crate::retry`] implements it too, so the layers stack.
//!
//! Transports handed to a [`Seeker`](crate::Seeker) should not follow
//! redirects themselves; see [`create_http_client`](super::create_http_client).

use crate::error::Result;

use async_trait::async_trait;
use reqwest::{Request, Response};
use reqwest_middleware::ClientWithMiddleware;
use std::sync::Arc;

/// Sends a request and returns the response, or the error that prevented it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes a single HTTP transaction.
    async fn execute(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn execute(&self, request: Request) -> Result<Response> {
        Ok(reqwest::Client::execute(self, request).await?)
    }
}

#[async_trait]
impl Transport for ClientWithMiddleware {
    async fn execute(&self, request: Request) -> Result<Response> {
        Ok(ClientWithMiddleware::execute(self, request).await?)
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: Request) -> Result<Response> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn execute(&self, request: Request) -> Result<Response> {
        (**self).execute(request).await
    }
}
