use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::field::{display, Empty};
use tracing::{debug, error, info_span, Instrument};

use super::PipelineBehavior;
use crate::pipeline::{Next, PipelineResult, Request, RequestContext};

/// Outermost behaviour: one span per dispatch.
///
/// The span is entered for the whole downstream future and closed when it is
/// dropped, so it ends on success, fault and cancellation alike. Faults are
/// annotated and re-raised unchanged.
#[derive(Debug, Clone, Default)]
pub struct TracingBehavior;

impl TracingBehavior {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineBehavior for TracingBehavior {
    fn handle<'a, R: Request>(
        &'a self,
        _request: &'a R,
        ctx: &'a RequestContext,
        next: Next<'a, R::Response>,
    ) -> BoxFuture<'a, PipelineResult<R::Response>> {
        let span = info_span!(
            "request",
            otel.name = R::NAME,
            request = R::NAME,
            kind = R::KIND.as_str(),
            request_id = %ctx.request_id,
            correlation_id = %ctx.correlation_id,
            otel.status_code = Empty,
            outcome = Empty,
            error.kind = Empty,
            error.message = Empty,
        );
        let recorder = span.clone();

        async move {
            debug!("Dispatching {}", R::NAME);
            let result = next.run().await;
            let elapsed_ms = ctx.elapsed().as_millis() as u64;

            match &result {
                Ok(outcome) => {
                    recorder.record("otel.status_code", "OK");
                    recorder.record("outcome", outcome.tag());
                    debug!(elapsed_ms, outcome = outcome.tag(), "Request {} completed", R::NAME);
                }
                Err(err) => {
                    recorder.record("otel.status_code", "ERROR");
                    recorder.record("error.kind", err.kind());
                    recorder.record("error.message", display(err));
                    error!(elapsed_ms, error = %err, "Request {} failed", R::NAME);
                }
            }

            result
        }
        .instrument(span)
        .boxed()
    }
}
