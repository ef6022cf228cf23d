use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::PipelineBehavior;
use crate::persistence::UnitOfWork;
use crate::pipeline::{Next, PipelineResult, Request, RequestContext};

/// Runs transactional requests inside a unit of work.
///
/// Business outcomes, including non-success ones, commit; faults roll back.
/// A transient fault re-runs the downstream stages in a fresh transaction.
pub struct TransactionalBehavior<U> {
    unit_of_work: Arc<U>,
}

impl<U> TransactionalBehavior<U> {
    pub fn new(unit_of_work: Arc<U>) -> Self {
        Self { unit_of_work }
    }
}

impl<U> Clone for TransactionalBehavior<U> {
    fn clone(&self) -> Self {
        Self {
            unit_of_work: Arc::clone(&self.unit_of_work),
        }
    }
}

impl<U: UnitOfWork> PipelineBehavior for TransactionalBehavior<U> {
    fn handle<'a, R: Request>(
        &'a self,
        _request: &'a R,
        ctx: &'a RequestContext,
        next: Next<'a, R::Response>,
    ) -> BoxFuture<'a, PipelineResult<R::Response>> {
        async move {
            if !R::TRANSACTIONAL {
                return next.run().await;
            }

            ctx.ensure_active()?;
            let next = &next;
            self.unit_of_work
                .execute_in_transaction(ctx, move || next.run())
                .await
        }
        .boxed()
    }
}
