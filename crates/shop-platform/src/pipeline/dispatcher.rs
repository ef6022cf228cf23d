//! Dispatcher
//!
//! Builds the behaviour chain around the registered handler for each request
//! and runs it. Handlers, validators and stores are wired once through
//! `DispatcherBuilder`; the resulting `Dispatcher` is immutable.

use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::behaviors::{
    CachingBehavior, PipelineBehavior, TracingBehavior, TransactionalBehavior, ValidationBehavior,
    Validator,
};
use super::context::RequestContext;
use super::error::{PipelineError, PipelineResult};
use super::next::Next;
use super::registry::{HandlerRegistry, RequestHandler};
use super::request::Request;
use crate::cache::CacheManager;
use crate::persistence::{StoreUnitOfWork, UnitOfWork};

pub struct DispatcherBuilder<U: UnitOfWork = StoreUnitOfWork> {
    registry: HandlerRegistry,
    cache: CacheManager,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> DispatcherBuilder<U> {
    pub fn new(cache: CacheManager, unit_of_work: Arc<U>) -> Self {
        Self {
            registry: HandlerRegistry::new(),
            cache,
            unit_of_work,
        }
    }

    /// Register the handler for `R`.
    ///
    /// Fails for a second handler of the same request and for capability
    /// tags that make no sense together, so misconfiguration stops startup.
    pub fn register_handler<R, H>(&mut self, handler: H) -> Result<&mut Self, PipelineError>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        self.registry.register_handler::<R, H>(handler)?;
        Ok(self)
    }

    pub fn register_validator<R, V>(&mut self, validator: V) -> &mut Self
    where
        R: Request,
        V: Validator<R> + 'static,
    {
        self.registry.register_validator::<R, V>(validator);
        self
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn build(self) -> Dispatcher<U> {
        info!(
            handlers = self.registry.len(),
            "Request dispatcher ready: {}",
            self.registry.names().join(", ")
        );

        let registry = Arc::new(self.registry);
        Dispatcher {
            tracing: TracingBehavior::new(),
            validation: ValidationBehavior::new(Arc::clone(&registry)),
            caching: CachingBehavior::new(self.cache.clone()),
            transactional: TransactionalBehavior::new(self.unit_of_work),
            registry,
            cache: self.cache,
        }
    }
}

/// Entry point for commands and queries.
///
/// Behaviour order, outermost first:
/// Tracing -> Validation -> Caching -> Transactional -> Handler.
pub struct Dispatcher<U: UnitOfWork = StoreUnitOfWork> {
    registry: Arc<HandlerRegistry>,
    cache: CacheManager,
    tracing: TracingBehavior,
    validation: ValidationBehavior,
    caching: CachingBehavior,
    transactional: TransactionalBehavior<U>,
}

impl<U: UnitOfWork> Dispatcher<U> {
    pub fn builder(cache: CacheManager, unit_of_work: Arc<U>) -> DispatcherBuilder<U> {
        DispatcherBuilder::new(cache, unit_of_work)
    }

    /// Dispatch with a fresh context bound to `cancellation`.
    pub async fn dispatch<R: Request>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> PipelineResult<R::Response> {
        let ctx = RequestContext::for_request::<R>(cancellation);
        self.run(&request, &ctx).await
    }

    /// Dispatch with a context built by the caller (correlation id, principal).
    pub async fn dispatch_with_context<R: Request>(
        &self,
        request: R,
        ctx: RequestContext,
    ) -> PipelineResult<R::Response> {
        let ctx = ctx.bind::<R>();
        self.run(&request, &ctx).await
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    async fn run<R: Request>(
        &self,
        request: &R,
        ctx: &RequestContext,
    ) -> PipelineResult<R::Response> {
        let Some(handler) = self.registry.handler::<R>() else {
            error!(request_id = %ctx.request_id, "No handler registered for {}", R::NAME);
            return Err(PipelineError::HandlerNotRegistered(R::NAME));
        };

        let handler_stage = move || {
            async move {
                ctx.ensure_active()?;
                handler.handle(request, ctx).await
            }
            .boxed()
        };
        let transactional_stage =
            move || self.transactional.handle(request, ctx, Next::new(handler_stage));
        let caching_stage =
            move || self.caching.handle(request, ctx, Next::new(transactional_stage));
        let validation_stage =
            move || self.validation.handle(request, ctx, Next::new(caching_stage));

        self.tracing
            .handle(request, ctx, Next::new(validation_stage))
            .await
    }
}
