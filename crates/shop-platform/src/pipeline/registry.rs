//! Handler Registry
//!
//! Explicit map from request name to its handler and validators, filled in
//! at startup and read-only afterwards.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::behaviors::Validator;
use super::context::RequestContext;
use super::error::{PipelineError, PipelineResult};
use super::request::{Request, RequestDescriptor};

/// Business logic for one request type.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: &R, ctx: &RequestContext) -> PipelineResult<R::Response>;
}

/// Type-erased storage keyed by `Request::NAME`.
///
/// Handlers are stored as `Arc<dyn RequestHandler<R>>` and validator lists as
/// `Vec<Arc<dyn Validator<R>>>`, each boxed as `Any` and recovered by downcast.
#[derive(Default)]
pub struct HandlerRegistry {
    descriptors: HashMap<&'static str, RequestDescriptor>,
    handlers: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    validators: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler<R, H>(&mut self, handler: H) -> Result<(), PipelineError>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let descriptor = RequestDescriptor::of::<R>();
        descriptor
            .check()
            .map_err(|message| PipelineError::registration(R::NAME, message))?;

        if self.handlers.contains_key(R::NAME) {
            return Err(PipelineError::registration(
                R::NAME,
                "a handler is already registered for this request",
            ));
        }

        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.descriptors.insert(R::NAME, descriptor);
        self.handlers.insert(R::NAME, Box::new(handler));
        Ok(())
    }

    pub fn register_validator<R, V>(&mut self, validator: V)
    where
        R: Request,
        V: Validator<R> + 'static,
    {
        let validator: Arc<dyn Validator<R>> = Arc::new(validator);
        let entry = self
            .validators
            .entry(R::NAME)
            .or_insert_with(|| Box::new(Vec::<Arc<dyn Validator<R>>>::new()));
        if let Some(list) = entry.downcast_mut::<Vec<Arc<dyn Validator<R>>>>() {
            list.push(validator);
        }
    }

    pub fn handler<R: Request>(&self) -> Option<&Arc<dyn RequestHandler<R>>> {
        self.handlers
            .get(R::NAME)
            .and_then(|h| h.downcast_ref::<Arc<dyn RequestHandler<R>>>())
    }

    pub fn validators<R: Request>(&self) -> &[Arc<dyn Validator<R>>] {
        self.validators
            .get(R::NAME)
            .and_then(|v| v.downcast_ref::<Vec<Arc<dyn Validator<R>>>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn descriptor(&self, name: &str) -> Option<&RequestDescriptor> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered request names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RequestKind, RequestResult, ValidationFailure};

    struct Echo(String);

    impl Request for Echo {
        type Response = String;
        const NAME: &'static str = "Echo";
        const KIND: RequestKind = RequestKind::Query;
    }

    struct EchoHandler;

    #[async_trait]
    impl RequestHandler<Echo> for EchoHandler {
        async fn handle(&self, request: &Echo, _ctx: &RequestContext) -> PipelineResult<String> {
            Ok(RequestResult::success(request.0.clone()))
        }
    }

    struct NotEmpty;

    #[async_trait]
    impl Validator<Echo> for NotEmpty {
        async fn validate(
            &self,
            request: &Echo,
            _ctx: &RequestContext,
        ) -> Result<Vec<ValidationFailure>, PipelineError> {
            if request.0.is_empty() {
                return Ok(vec![ValidationFailure::new("text", "Text is required")]);
            }
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_lookup_by_request_type() {
        let mut registry = HandlerRegistry::new();
        registry.register_handler::<Echo, _>(EchoHandler).unwrap();
        registry.register_validator::<Echo, _>(NotEmpty);
        registry.register_validator::<Echo, _>(NotEmpty);

        assert!(registry.contains("Echo"));
        assert_eq!(registry.names(), vec!["Echo"]);
        assert_eq!(registry.validators::<Echo>().len(), 2);

        let handler = registry.handler::<Echo>().unwrap();
        let ctx = RequestContext::detached::<Echo>();
        let result = handler.handle(&Echo("hi".into()), &ctx).await.unwrap();
        assert_eq!(result, RequestResult::Success("hi".to_string()));
    }

    #[test]
    fn test_duplicate_handler_rejected() {
        let mut registry = HandlerRegistry::new();
        registry.register_handler::<Echo, _>(EchoHandler).unwrap();
        let err = registry.register_handler::<Echo, _>(EchoHandler).unwrap_err();
        assert_eq!(err.kind(), "registration");
        assert_eq!(registry.len(), 1);
    }
}
