//! Continuation handed to each pipeline behaviour.

use futures::future::BoxFuture;

use super::error::PipelineResult;

/// The rest of the pipeline, downstream of the current behaviour.
///
/// `run` may be called more than once; the unit of work re-runs it when a
/// transient fault forces a fresh transaction.
pub struct Next<'a, T> {
    inner: Box<dyn Fn() -> BoxFuture<'a, PipelineResult<T>> + Send + Sync + 'a>,
}

impl<'a, T> Next<'a, T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> BoxFuture<'a, PipelineResult<T>> + Send + Sync + 'a,
    {
        Self { inner: Box::new(f) }
    }

    pub fn run(&self) -> BoxFuture<'a, PipelineResult<T>> {
        (self.inner)()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;

    use super::*;
    use crate::pipeline::{PipelineError, RequestResult};

    #[tokio::test]
    async fn test_next_can_be_rerun() {
        let calls = AtomicUsize::new(0);
        let calls_ref = &calls;
        let next: Next<'_, usize> = Next::new(move || {
            async move {
                let n = calls_ref.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, PipelineError>(RequestResult::success(n))
            }
            .boxed()
        });

        assert_eq!(next.run().await.unwrap(), RequestResult::Success(1));
        assert_eq!(next.run().await.unwrap(), RequestResult::Success(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
