//! Common API types and utilities

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::pipeline::{Dispatcher, PipelineResult, Request, RequestContext, RequestResult};
use crate::shared::error::PlatformError;

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// State shared by every aggregate router.
#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Arc<Dispatcher>,
    /// Cancelled when the server shuts down; each request runs on a child.
    pub shutdown: CancellationToken,
}

impl ApiState {
    pub fn new(dispatcher: Arc<Dispatcher>, shutdown: CancellationToken) -> Self {
        Self { dispatcher, shutdown }
    }

    /// Dispatch a request on behalf of an HTTP call.
    pub async fn dispatch<R: Request>(
        &self,
        request: R,
        meta: RequestMeta,
    ) -> PipelineResult<R::Response> {
        let mut ctx = RequestContext::for_request::<R>(self.shutdown.child_token());
        if let Some(correlation_id) = meta.correlation_id {
            ctx = ctx.with_correlation_id(correlation_id);
        }
        if let Some(customer_id) = meta.customer_id {
            ctx = ctx.with_principal(customer_id);
        }
        self.dispatcher.dispatch_with_context(request, ctx).await
    }
}

/// Turn a pipeline outcome into an HTTP response.
pub fn respond<T: Serialize>(
    result: PipelineResult<T>,
    status: StatusCode,
) -> Result<Response, PlatformError> {
    match result? {
        RequestResult::Success(value) => Ok((status, Json(value)).into_response()),
        outcome => Err(PlatformError::from_outcome(outcome)),
    }
}

pub fn ok<T: Serialize>(result: PipelineResult<T>) -> Result<Response, PlatformError> {
    respond(result, StatusCode::OK)
}

pub fn created<T: Serialize>(result: PipelineResult<T>) -> Result<Response, PlatformError> {
    respond(result, StatusCode::CREATED)
}

/// Caller metadata taken from request headers.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub correlation_id: Option<String>,
    pub customer_id: Option<i64>,
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestMeta {
            correlation_id: header_str(parts, CORRELATION_ID_HEADER).map(String::from),
            customer_id: header_str(parts, CUSTOMER_ID_HEADER).and_then(|v| v.parse().ok()),
        })
    }
}

/// Authenticated customer, from the `X-Customer-Id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for CustomerId
where
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = header_str(parts, CUSTOMER_ID_HEADER)
            .ok_or_else(|| PlatformError::unauthorized("Missing X-Customer-Id header"))?;

        raw.parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(CustomerId)
            .ok_or_else(|| PlatformError::unauthorized("Malformed X-Customer-Id header"))
    }
}

/// Parse a path id. Ids are i64 internally and strings on the wire.
pub fn parse_id(raw: &str, label: &str) -> Result<i64, PlatformError> {
    raw.parse::<i64>()
        .map_err(|_| PlatformError::bad_request(format!("Invalid {} id: {}", label, raw)))
}
