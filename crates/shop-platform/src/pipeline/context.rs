//! Request Context
//!
//! Carries tracing identifiers, the optional caller identity and the
//! cancellation token through every stage of a dispatch.

use std::future::Future;
use std::time::{Duration, Instant};

use shop_common::TsidGenerator;
use tokio_util::sync::CancellationToken;

use super::error::PipelineError;
use super::request::{Request, RequestKind};

#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique ID for this dispatch (TSID)
    pub request_id: String,
    /// Name of the request being dispatched
    pub request_name: &'static str,
    pub kind: RequestKind,
    /// ID for distributed tracing, defaults to the request ID
    pub correlation_id: String,
    /// Caller identity, when the boundary established one
    pub principal_id: Option<i64>,
    pub started_at: Instant,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a fresh context for a request type.
    pub fn for_request<R: Request>(cancellation: CancellationToken) -> Self {
        let request_id = TsidGenerator::generate();
        Self {
            correlation_id: request_id.clone(),
            request_id,
            request_name: R::NAME,
            kind: R::KIND,
            principal_id: None,
            started_at: Instant::now(),
            cancellation,
        }
    }

    /// Context with no cancellation source. Mostly useful in tests and jobs.
    pub fn detached<R: Request>() -> Self {
        Self::for_request::<R>(CancellationToken::new())
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn with_principal(mut self, principal_id: i64) -> Self {
        self.principal_id = Some(principal_id);
        self
    }

    /// Re-target a context built by a caller at the request type being dispatched.
    pub(crate) fn bind<R: Request>(mut self) -> Self {
        self.request_name = R::NAME;
        self.kind = R::KIND;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Fail fast when the caller has already given up.
    pub fn ensure_active(&self) -> Result<(), PipelineError> {
        if self.cancellation.is_cancelled() {
            return Err(PipelineError::Cancelled(self.request_name));
        }
        Ok(())
    }

    /// Race a future against cancellation of this request.
    pub async fn cancellable<F, T>(&self, future: F) -> Result<T, PipelineError>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(PipelineError::Cancelled(self.request_name)),
            output = future => Ok(output),
        }
    }
}
