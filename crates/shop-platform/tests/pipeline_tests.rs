//! Request Pipeline Integration Tests
//!
//! Tests for:
//! - Read-through caching and TTL expiry
//! - Rollback on handler faults
//! - Transient retry with a single commit
//! - Validation short-circuit, including validator faults
//! - Pattern invalidation after successful commands
//! - Registration and cancellation errors

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use shop_platform::cache::MemoryCacheStore;
use shop_platform::persistence::{Collection, Entity};
use shop_platform::pipeline::{CachePolicy, ValidationErrors};
use shop_platform::{
    CacheError, CacheManager, CacheStore, Dispatcher, DispatcherBuilder, MemoryDocumentStore,
    PipelineError, PipelineResult, Request, RequestContext, RequestHandler, RequestKind,
    RequestResult, RetryPolicy, StoreUnitOfWork, ValidationFailure, Validator,
};

const WIDGET_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Widget {
    id: i64,
    name: String,
}

impl Entity for Widget {
    const COLLECTION: &'static str = "widgets";

    fn id(&self) -> i64 {
        self.id
    }
}

struct GetWidgetQuery {
    id: i64,
}

impl Request for GetWidgetQuery {
    type Response = Widget;
    const NAME: &'static str = "GetWidgetQuery";
    const KIND: RequestKind = RequestKind::Query;
    const CACHEABLE: bool = true;

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(format!("widget:{}", self.id), WIDGET_TTL))
    }
}

/// Counts invocations; id 0 is never found.
struct GetWidgetHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RequestHandler<GetWidgetQuery> for GetWidgetHandler {
    async fn handle(
        &self,
        request: &GetWidgetQuery,
        _ctx: &RequestContext,
    ) -> PipelineResult<Widget> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.id == 0 {
            return Ok(RequestResult::not_found("Widget 0 not found"));
        }
        Ok(RequestResult::success(Widget {
            id: request.id,
            name: format!("widget-{}", request.id),
        }))
    }
}

struct SaveWidgetCommand {
    id: i64,
    name: String,
}

impl Request for SaveWidgetCommand {
    type Response = Widget;
    const NAME: &'static str = "SaveWidgetCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;

    fn cache_invalidations(&self) -> Vec<String> {
        vec![format!("widget:{}", self.id), "widgets:*".to_string()]
    }
}

struct SaveWidgetValidator;

#[async_trait]
impl Validator<SaveWidgetCommand> for SaveWidgetValidator {
    async fn validate(
        &self,
        request: &SaveWidgetCommand,
        _ctx: &RequestContext,
    ) -> Result<Vec<ValidationFailure>, PipelineError> {
        let mut errors = ValidationErrors::new();
        errors.text(&request.name, "name", "Name", 50);
        Ok(errors.into_failures())
    }
}

#[derive(Clone, Copy)]
enum Fault {
    None,
    /// Fail transiently on the first `n` attempts
    TransientTimes(usize),
    /// Fail permanently after writing
    AfterWrite,
}

struct SaveWidgetHandler {
    widgets: Collection<Widget>,
    calls: Arc<AtomicUsize>,
    fault: Fault,
}

#[async_trait]
impl RequestHandler<SaveWidgetCommand> for SaveWidgetHandler {
    async fn handle(
        &self,
        request: &SaveWidgetCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<Widget> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let widget = Widget {
            id: request.id,
            name: request.name.clone(),
        };
        self.widgets.save(&widget).await?;

        match self.fault {
            Fault::TransientTimes(n) if attempt <= n => {
                Err(PipelineError::transient("write conflict"))
            }
            Fault::AfterWrite => Err(PipelineError::handler("boom")),
            _ => Ok(RequestResult::success(widget)),
        }
    }
}

struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Utc::now())))
    }

    fn advance(&self, delta: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += TimeDelta::from_std(delta).unwrap();
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

struct Harness {
    store: MemoryDocumentStore,
    cache: CacheManager,
    dispatcher: Dispatcher,
    query_calls: Arc<AtomicUsize>,
    command_calls: Arc<AtomicUsize>,
}

impl Harness {
    fn new(fault: Fault, retries: u32) -> Self {
        Self::with_cache(fault, retries, CacheManager::in_memory())
    }

    fn with_cache(fault: Fault, retries: u32, cache: CacheManager) -> Self {
        let store = MemoryDocumentStore::new();
        let unit_of_work = Arc::new(StoreUnitOfWork::new(
            Arc::new(store.clone()),
            RetryPolicy::new(retries, Duration::from_millis(1)),
        ));
        let query_calls = Arc::new(AtomicUsize::new(0));
        let command_calls = Arc::new(AtomicUsize::new(0));

        let mut builder: DispatcherBuilder = Dispatcher::builder(cache.clone(), unit_of_work);
        builder
            .register_handler::<GetWidgetQuery, _>(GetWidgetHandler {
                calls: query_calls.clone(),
            })
            .unwrap()
            .register_handler::<SaveWidgetCommand, _>(SaveWidgetHandler {
                widgets: Collection::new(Arc::new(store.clone())),
                calls: command_calls.clone(),
                fault,
            })
            .unwrap();
        builder.register_validator::<SaveWidgetCommand, _>(SaveWidgetValidator);

        Self {
            store,
            cache,
            dispatcher: builder.build(),
            query_calls,
            command_calls,
        }
    }

    async fn get(&self, id: i64) -> RequestResult<Widget> {
        self.dispatcher
            .dispatch(GetWidgetQuery { id }, CancellationToken::new())
            .await
            .unwrap()
    }

    async fn save(&self, id: i64, name: &str) -> PipelineResult<Widget> {
        self.dispatcher
            .dispatch(
                SaveWidgetCommand {
                    id,
                    name: name.to_string(),
                },
                CancellationToken::new(),
            )
            .await
    }
}

mod caching_tests {
    use super::*;

    #[tokio::test]
    async fn test_second_dispatch_is_served_from_cache() {
        let harness = Harness::new(Fault::None, 0);

        let first = harness.get(7).await;
        let second = harness.get(7).await;

        assert!(first.is_success());
        assert_eq!(first, second);
        assert_eq!(harness.query_calls.load(Ordering::SeqCst), 1);

        let cached: Option<Widget> = harness.cache.get("widget:7").await;
        assert_eq!(cached.map(|w| w.name), Some("widget-7".to_string()));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let clock = TestClock::new();
        let cache = CacheManager::new(Arc::new(MemoryCacheStore::with_clock(clock.clone())));
        let harness = Harness::with_cache(Fault::None, 0, cache);

        harness.get(3).await;
        clock.advance(WIDGET_TTL - Duration::from_secs(1));
        harness.get(3).await;
        assert_eq!(harness.query_calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        harness.get(3).await;
        assert_eq!(harness.query_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_success_outcome_is_not_cached() {
        let harness = Harness::new(Fault::None, 0);

        assert!(matches!(harness.get(0).await, RequestResult::NotFound(_)));
        assert!(matches!(harness.get(0).await, RequestResult::NotFound(_)));
        assert_eq!(harness.query_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_successful_command_invalidates_keys_and_patterns() {
        let harness = Harness::new(Fault::None, 0);
        let ttl = Duration::from_secs(60);
        harness.get(1).await;
        harness.cache.set("widgets:all", &vec![1, 2, 3], ttl).await;
        harness.cache.set("widgets:page:2", &vec![4], ttl).await;
        harness.cache.set("gadgets:all", &vec![9], ttl).await;

        let result = harness.save(1, "renamed").await.unwrap();
        assert!(result.is_success());

        assert!(harness.cache.get::<Widget>("widget:1").await.is_none());
        assert!(harness.cache.get::<Vec<i32>>("widgets:all").await.is_none());
        assert!(harness.cache.get::<Vec<i32>>("widgets:page:2").await.is_none());
        assert_eq!(harness.cache.get::<Vec<i32>>("gadgets:all").await, Some(vec![9]));

        // Next read goes back to the handler.
        harness.get(1).await;
        assert_eq!(harness.query_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_command_leaves_cache_alone() {
        let harness = Harness::new(Fault::AfterWrite, 0);
        harness.get(1).await;

        assert!(harness.save(1, "renamed").await.is_err());
        assert!(harness.cache.get::<Widget>("widget:1").await.is_some());
    }
}

mod transaction_tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_fault_rolls_back_writes() {
        let harness = Harness::new(Fault::AfterWrite, 3);

        let err = harness.save(1, "doomed").await.unwrap_err();

        assert!(matches!(err, PipelineError::Handler(_)));
        assert_eq!(
            harness.command_calls.load(Ordering::SeqCst),
            1,
            "permanent faults are not retried"
        );
        assert_eq!(harness.store.count(Widget::COLLECTION), 0);
        assert_eq!(harness.store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_transient_fault_is_retried_and_committed_once() {
        let harness = Harness::new(Fault::TransientTimes(1), 3);

        let result = harness.save(1, "eventually").await.unwrap();

        assert!(result.is_success());
        assert_eq!(harness.command_calls.load(Ordering::SeqCst), 2);
        assert_eq!(harness.store.commit_count(), 1);
        assert_eq!(harness.store.count(Widget::COLLECTION), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let harness = Harness::new(Fault::TransientTimes(100), 2);

        let err = harness.save(1, "never").await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(harness.command_calls.load(Ordering::SeqCst), 3);
        assert_eq!(harness.store.commit_count(), 0);
        assert_eq!(harness.store.count(Widget::COLLECTION), 0);
    }

    #[tokio::test]
    async fn test_commit_failure_does_not_rerun_handler() {
        let harness = Harness::new(Fault::None, 3);
        harness.store.fail_next_commits(1);

        let err = harness.save(1, "lost").await.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(harness.command_calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.store.count(Widget::COLLECTION), 0);
    }
}

mod validation_tests {
    use super::*;

    /// Memory cache that counts reads and writes.
    #[derive(Default)]
    struct CountingCacheStore {
        inner: MemoryCacheStore,
        gets: AtomicUsize,
        sets: AtomicUsize,
    }

    #[async_trait]
    impl CacheStore for CountingCacheStore {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value, ttl).await
        }

        async fn remove(&self, key: &str) -> Result<(), CacheError> {
            self.inner.remove(key).await
        }

        async fn remove_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
            self.inner.remove_by_pattern(pattern).await
        }
    }

    struct NonNegativeIdValidator;

    #[async_trait]
    impl Validator<GetWidgetQuery> for NonNegativeIdValidator {
        async fn validate(
            &self,
            request: &GetWidgetQuery,
            _ctx: &RequestContext,
        ) -> Result<Vec<ValidationFailure>, PipelineError> {
            let mut errors = ValidationErrors::new();
            errors.check(request.id >= 0, "id", "Id cannot be negative");
            Ok(errors.into_failures())
        }
    }

    /// A validator whose own lookup fails.
    struct UnreachableValidator;

    #[async_trait]
    impl Validator<GetWidgetQuery> for UnreachableValidator {
        async fn validate(
            &self,
            _request: &GetWidgetQuery,
            _ctx: &RequestContext,
        ) -> Result<Vec<ValidationFailure>, PipelineError> {
            Err(PipelineError::validator("reference data unavailable"))
        }
    }

    fn widget_query_dispatcher<V>(
        cache: CacheManager,
        validator: V,
    ) -> (Dispatcher, Arc<AtomicUsize>)
    where
        V: Validator<GetWidgetQuery> + 'static,
    {
        let unit_of_work = Arc::new(StoreUnitOfWork::new(
            Arc::new(MemoryDocumentStore::new()),
            RetryPolicy::none(),
        ));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut builder: DispatcherBuilder = Dispatcher::builder(cache, unit_of_work);
        builder
            .register_handler::<GetWidgetQuery, _>(GetWidgetHandler {
                calls: calls.clone(),
            })
            .unwrap();
        builder.register_validator::<GetWidgetQuery, _>(validator);

        (builder.build(), calls)
    }

    #[tokio::test]
    async fn test_invalid_query_touches_neither_cache_nor_handler() {
        let store = Arc::new(CountingCacheStore::default());
        let (dispatcher, calls) =
            widget_query_dispatcher(CacheManager::new(store.clone()), NonNegativeIdValidator);

        let result = dispatcher
            .dispatch(GetWidgetQuery { id: -1 }, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result,
            RequestResult::Invalid(vec![ValidationFailure::new("id", "Id cannot be negative")])
        );
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
        assert_eq!(store.sets.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // A valid query goes through the same cache.
        let valid = dispatcher
            .dispatch(GetWidgetQuery { id: 2 }, CancellationToken::new())
            .await
            .unwrap();
        assert!(valid.is_success());
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
        assert_eq!(store.sets.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validator_fault_propagates() {
        let (dispatcher, calls) =
            widget_query_dispatcher(CacheManager::in_memory(), UnreachableValidator);

        let err = dispatcher
            .dispatch(GetWidgetQuery { id: 1 }, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Validator(_)));
        assert_eq!(err.kind(), "validator");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_handler() {
        let harness = Harness::new(Fault::None, 0);

        let result = harness.save(1, "   ").await.unwrap();

        assert_eq!(
            result,
            RequestResult::Invalid(vec![ValidationFailure::new("name", "Name is required")])
        );
        assert_eq!(harness.command_calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.store.commit_count(), 0);
    }
}

mod dispatch_tests {
    use super::*;

    struct Orphan;

    impl Request for Orphan {
        type Response = ();
        const NAME: &'static str = "Orphan";
        const KIND: RequestKind = RequestKind::Query;
    }

    #[tokio::test]
    async fn test_unregistered_request_is_a_fault() {
        let harness = Harness::new(Fault::None, 0);

        let err = harness
            .dispatcher
            .dispatch(Orphan, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::HandlerNotRegistered("Orphan")));
    }

    #[tokio::test]
    async fn test_duplicate_handler_is_rejected() {
        let store = MemoryDocumentStore::new();
        let unit_of_work = Arc::new(StoreUnitOfWork::new(Arc::new(store), RetryPolicy::none()));
        let mut builder: DispatcherBuilder =
            Dispatcher::builder(CacheManager::in_memory(), unit_of_work);
        let calls = Arc::new(AtomicUsize::new(0));

        builder
            .register_handler::<GetWidgetQuery, _>(GetWidgetHandler { calls: calls.clone() })
            .unwrap();
        let err = builder
            .register_handler::<GetWidgetQuery, _>(GetWidgetHandler { calls })
            .err()
            .unwrap();

        assert!(matches!(err, PipelineError::Registration { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_request_does_no_work() {
        let harness = Harness::new(Fault::None, 0);
        let token = CancellationToken::new();
        token.cancel();

        let err = harness
            .dispatcher
            .dispatch(
                SaveWidgetCommand {
                    id: 1,
                    name: "late".to_string(),
                },
                token,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(harness.command_calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.store.count(Widget::COLLECTION), 0);
    }

    #[tokio::test]
    async fn test_context_metadata_reaches_handler() {
        struct Whoami;

        impl Request for Whoami {
            type Response = Option<i64>;
            const NAME: &'static str = "Whoami";
            const KIND: RequestKind = RequestKind::Query;
        }

        struct WhoamiHandler;

        #[async_trait]
        impl RequestHandler<Whoami> for WhoamiHandler {
            async fn handle(
                &self,
                _request: &Whoami,
                ctx: &RequestContext,
            ) -> PipelineResult<Option<i64>> {
                assert_eq!(ctx.request_name, "Whoami");
                assert_eq!(ctx.correlation_id, "corr-42");
                Ok(RequestResult::success(ctx.principal_id))
            }
        }

        let unit_of_work = Arc::new(StoreUnitOfWork::new(
            Arc::new(MemoryDocumentStore::new()),
            RetryPolicy::none(),
        ));
        let mut builder: DispatcherBuilder =
            Dispatcher::builder(CacheManager::in_memory(), unit_of_work);
        builder.register_handler::<Whoami, _>(WhoamiHandler).unwrap();
        let dispatcher = builder.build();

        let ctx = RequestContext::detached::<Orphan>()
            .with_correlation_id("corr-42")
            .with_principal(42);
        let result = dispatcher.dispatch_with_context(Whoami, ctx).await.unwrap();

        assert_eq!(result, RequestResult::Success(Some(42)));
    }
}
