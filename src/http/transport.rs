//! The single capability the detection engine needs from the network

use crate::core::error::TransportError;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use async_trait::async_trait;
use std::sync::Arc;

/// Issues one HTTP request and returns the response.
///
/// Implementations own their timeout policy. The engine calls `issue`
/// strictly sequentially within a session, but one transport may be
/// shared by many concurrent sessions.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn issue(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn issue(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).issue(request).await
    }
}
