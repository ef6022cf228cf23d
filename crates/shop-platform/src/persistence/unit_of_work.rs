//! Unit of Work
//!
//! Runs an action inside a store transaction: commit when it returns, roll
//! back when it faults. Transient faults raised by the action re-run it from
//! scratch in a fresh transaction.
//!
//! A commit rejected for a write conflict is retried the same way.
//!
//! The action must be safe to re-run. Writes through `Collection` are, since a
//! failed attempt's writes are discarded, but calls to external systems made
//! from inside the action would be repeated.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, error, warn};

use super::transaction::with_transaction;
use super::{DocumentStore, Transaction};
use crate::pipeline::{PipelineError, RequestContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Base delay, multiplied by the attempt number
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &shop_config::TransactionConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

pub trait UnitOfWork: Send + Sync + 'static {
    /// Run `action` in a transaction and commit its outcome.
    ///
    /// `action` may be invoked more than once when a transient fault forces a
    /// retry; only the last attempt's writes are ever committed.
    fn execute_in_transaction<'a, T, F>(
        &'a self,
        ctx: &'a RequestContext,
        action: F,
    ) -> BoxFuture<'a, Result<T, PipelineError>>
    where
        T: Send + 'a,
        F: Fn() -> BoxFuture<'a, Result<T, PipelineError>> + Send + Sync + 'a;
}

/// Unit of work over a `DocumentStore`.
pub struct StoreUnitOfWork {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
}

impl StoreUnitOfWork {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn discard(&self, tx: &Arc<dyn Transaction>, ctx: &RequestContext) {
        if let Err(e) = tx.rollback().await {
            warn!(request = ctx.request_name, error = %e, "Rollback failed");
        }
    }
}

impl UnitOfWork for StoreUnitOfWork {
    fn execute_in_transaction<'a, T, F>(
        &'a self,
        ctx: &'a RequestContext,
        action: F,
    ) -> BoxFuture<'a, Result<T, PipelineError>>
    where
        T: Send + 'a,
        F: Fn() -> BoxFuture<'a, Result<T, PipelineError>> + Send + Sync + 'a,
    {
        async move {
            let mut attempt: u32 = 0;

            loop {
                ctx.ensure_active()?;

                let outcome = match self.store.begin().await {
                    Ok(tx) => {
                        let run =
                            with_transaction(Arc::clone(&tx), ctx.cancellable(action())).await;
                        match run.and_then(|result| result) {
                            Ok(value) => match tx.commit().await {
                                Ok(()) => {
                                    debug!(
                                        request = ctx.request_name,
                                        attempt,
                                        "Transaction committed"
                                    );
                                    return Ok(value);
                                }
                                // A rejected commit wrote nothing, so the action may run again.
                                Err(e) if e.is_write_conflict() => PipelineError::from(e),
                                // Any other commit failure may have been applied: never re-run.
                                Err(e) => {
                                    error!(
                                        request = ctx.request_name,
                                        request_id = %ctx.request_id,
                                        error = %e,
                                        "Transaction commit failed"
                                    );
                                    return Err(e.into());
                                }
                            },
                            Err(err) => {
                                self.discard(&tx, ctx).await;
                                err
                            }
                        }
                    }
                    Err(e) => PipelineError::from(e),
                };

                if outcome.is_transient() && attempt < self.retry.max_retries {
                    attempt += 1;
                    warn!(
                        request = ctx.request_name,
                        attempt,
                        max_retries = self.retry.max_retries,
                        error = %outcome,
                        "Transient fault, retrying unit of work"
                    );
                    ctx.cancellable(tokio::time::sleep(self.retry.delay * attempt))
                        .await?;
                    continue;
                }

                if outcome.is_cancelled() {
                    warn!(request = ctx.request_name, "Unit of work cancelled, rolled back");
                } else {
                    error!(
                        request = ctx.request_name,
                        request_id = %ctx.request_id,
                        attempts = attempt + 1,
                        error = %outcome,
                        "Unit of work rolled back"
                    );
                }
                return Err(outcome);
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::persistence::{current_transaction, MemoryDocumentStore};
    use crate::pipeline::{Request, RequestKind};

    struct Job;

    impl Request for Job {
        type Response = ();
        const NAME: &'static str = "Job";
        const KIND: RequestKind = RequestKind::Command;
        const TRANSACTIONAL: bool = true;
    }

    fn unit_of_work(store: &MemoryDocumentStore, retries: u32) -> StoreUnitOfWork {
        StoreUnitOfWork::new(Arc::new(store.clone()), RetryPolicy::new(retries, Duration::ZERO))
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let store = MemoryDocumentStore::new();
        let uow = unit_of_work(&store, 0);
        let ctx = RequestContext::detached::<Job>();

        let value = uow
            .execute_in_transaction(&ctx, || {
                async {
                    let tx = current_transaction().expect("transaction in scope");
                    tx.upsert("items", 1, json!({ "id": 1 })).await?;
                    Ok::<_, PipelineError>(7)
                }
                .boxed()
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(store.count("items"), 1);
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_rollback_on_fault() {
        let store = MemoryDocumentStore::new();
        let uow = unit_of_work(&store, 3);
        let ctx = RequestContext::detached::<Job>();

        let err = uow
            .execute_in_transaction(&ctx, || {
                async {
                    let tx = current_transaction().expect("transaction in scope");
                    tx.upsert("items", 1, json!({ "id": 1 })).await?;
                    Err::<(), _>(PipelineError::handler("boom"))
                }
                .boxed()
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "handler");
        assert_eq!(store.count("items"), 0);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_transient_fault_retries_in_fresh_transaction() {
        let store = MemoryDocumentStore::new();
        let uow = unit_of_work(&store, 2);
        let ctx = RequestContext::detached::<Job>();
        let attempts = AtomicUsize::new(0);
        let attempts_ref = &attempts;

        uow.execute_in_transaction(&ctx, move || {
            async move {
                let n = attempts_ref.fetch_add(1, Ordering::SeqCst);
                let tx = current_transaction().expect("transaction in scope");
                tx.upsert("items", n as i64, json!({ "attempt": n })).await?;
                if n == 0 {
                    return Err(PipelineError::transient("write conflict"));
                }
                Ok::<_, PipelineError>(())
            }
            .boxed()
        })
        .await
        .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(store.commit_count(), 1);
        // Only the second attempt's write survives
        assert_eq!(store.count("items"), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let store = MemoryDocumentStore::new();
        let uow = unit_of_work(&store, 2);
        let ctx = RequestContext::detached::<Job>();
        let attempts = AtomicUsize::new(0);
        let attempts_ref = &attempts;

        let err = uow
            .execute_in_transaction(&ctx, move || {
                async move {
                    attempts_ref.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(PipelineError::transient("still failing"))
                }
                .boxed()
            })
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_commit_failure_does_not_rerun_action() {
        let store = MemoryDocumentStore::new();
        store.fail_next_commits(1);
        let uow = unit_of_work(&store, 3);
        let ctx = RequestContext::detached::<Job>();
        let attempts = AtomicUsize::new(0);
        let attempts_ref = &attempts;

        let err = uow
            .execute_in_transaction(&ctx, move || {
                async move {
                    attempts_ref.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, PipelineError>(())
                }
                .boxed()
            })
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let store = MemoryDocumentStore::new();
        let uow = unit_of_work(&store, 3);
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::for_request::<Job>(token);

        let err = uow
            .execute_in_transaction(&ctx, || async { Ok::<_, PipelineError>(()) }.boxed())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_buyers_cannot_oversell() {
        let store = MemoryDocumentStore::new();
        store.upsert("products", 1, json!({ "id": 1, "stock": 1 })).await.unwrap();
        let uow = Arc::new(unit_of_work(&store, 3));
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let buyers: Vec<_> = (0..2)
            .map(|_| {
                let uow = Arc::clone(&uow);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    let ctx = RequestContext::detached::<Job>();
                    let attempts = AtomicUsize::new(0);
                    let attempts_ref = &attempts;
                    let barrier_ref = &barrier;
                    uow.execute_in_transaction(&ctx, move || {
                        async move {
                            let tx = current_transaction().expect("transaction in scope");
                            let product = tx.get("products", 1).await?.expect("product exists");
                            let stock = product["stock"].as_i64().unwrap_or_default();
                            // Both buyers read before either writes.
                            if attempts_ref.fetch_add(1, Ordering::SeqCst) == 0 {
                                barrier_ref.wait().await;
                            }
                            if stock < 1 {
                                return Ok(false);
                            }
                            tx.upsert("products", 1, json!({ "id": 1, "stock": stock - 1 }))
                                .await?;
                            Ok::<_, PipelineError>(true)
                        }
                        .boxed()
                    })
                    .await
                })
            })
            .collect();

        let mut sold = 0;
        for buyer in buyers {
            if buyer.await.unwrap().unwrap() {
                sold += 1;
            }
        }

        assert_eq!(sold, 1);
        let product = store.get("products", 1).await.unwrap().unwrap();
        assert_eq!(product["stock"], 0);
        assert_eq!(store.commit_count(), 2);
    }
}
