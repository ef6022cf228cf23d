use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use super::PipelineBehavior;
use crate::cache::CacheManager;
use crate::pipeline::{Next, PipelineResult, Request, RequestContext, RequestResult};

/// Read-through caching for cacheable queries plus post-success eviction.
///
/// Only `Success` values are stored. Eviction of a request's declared keys
/// runs after the downstream stages returned, i.e. after the unit of work has
/// committed, and is not interrupted by cancellation.
#[derive(Clone)]
pub struct CachingBehavior {
    cache: CacheManager,
}

impl CachingBehavior {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }
}

impl PipelineBehavior for CachingBehavior {
    fn handle<'a, R: Request>(
        &'a self,
        request: &'a R,
        ctx: &'a RequestContext,
        next: Next<'a, R::Response>,
    ) -> BoxFuture<'a, PipelineResult<R::Response>> {
        async move {
            ctx.ensure_active()?;

            let policy = if R::CACHEABLE {
                request.cache_policy()
            } else {
                None
            };

            if let Some(policy) = &policy {
                let cached = ctx
                    .cancellable(self.cache.get::<R::Response>(&policy.key))
                    .await?;
                if let Some(value) = cached {
                    debug!(key = %policy.key, "Cache hit for {}", R::NAME);
                    return Ok(RequestResult::success(value));
                }
                debug!(key = %policy.key, "Cache miss for {}", R::NAME);
            }

            let result = next.run().await?;

            if let RequestResult::Success(value) = &result {
                if let Some(policy) = &policy {
                    ctx.cancellable(self.cache.set(&policy.key, value, policy.duration))
                        .await?;
                }

                for key in request.cache_invalidations() {
                    self.cache.invalidate(&key).await;
                }
            }

            Ok(result)
        }
        .boxed()
    }
}
