use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use super::PipelineBehavior;
use crate::pipeline::{
    HandlerRegistry, Next, PipelineError, PipelineResult, Request, RequestContext, RequestResult,
    ValidationFailure,
};

/// Input checks for one request type. Any number may be registered.
///
/// Expected problems are returned as failures; `Err` is reserved for faults
/// (a lookup that could not be performed, for instance).
#[async_trait]
pub trait Validator<R: Request>: Send + Sync {
    async fn validate(
        &self,
        request: &R,
        ctx: &RequestContext,
    ) -> Result<Vec<ValidationFailure>, PipelineError>;
}

/// Collects field failures inside a validator.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    failures: Vec<ValidationFailure>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.failures.push(ValidationFailure::new(field, message));
    }

    /// Record a failure unless `condition` holds.
    pub fn check(&mut self, condition: bool, field: &str, message: &str) {
        if !condition {
            self.add(field, message);
        }
    }

    /// Non-blank text no longer than `max` characters.
    pub fn text(&mut self, value: &str, field: &str, label: &str, max: usize) {
        if value.trim().is_empty() {
            self.add(field, format!("{} is required", label));
        } else if value.chars().count() > max {
            self.add(field, format!("{} must be at most {} characters", label, max));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<ValidationFailure> {
        self.failures
    }
}

/// Runs every registered validator; any failure short-circuits the dispatch
/// with `Invalid` before the cache or the handler are touched.
#[derive(Clone)]
pub struct ValidationBehavior {
    registry: Arc<HandlerRegistry>,
}

impl ValidationBehavior {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }
}

impl PipelineBehavior for ValidationBehavior {
    fn handle<'a, R: Request>(
        &'a self,
        request: &'a R,
        ctx: &'a RequestContext,
        next: Next<'a, R::Response>,
    ) -> BoxFuture<'a, PipelineResult<R::Response>> {
        async move {
            ctx.ensure_active()?;

            let validators = self.registry.validators::<R>();
            let mut failures = Vec::new();
            for validator in validators {
                failures.extend(validator.validate(request, ctx).await?);
            }

            if !failures.is_empty() {
                debug!(
                    failures = failures.len(),
                    "Request {} rejected by validation",
                    R::NAME
                );
                return Ok(RequestResult::invalid(failures));
            }

            next.run().await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_helpers() {
        let mut errors = ValidationErrors::new();
        errors.text("  ", "name", "Name", 10);
        errors.text("abcdefghijk", "description", "Description", 10);
        errors.text("ok", "title", "Title", 10);
        let (price, stock) = (5, -1);
        errors.check(price > 0, "price", "Price must be positive");
        errors.check(stock >= 0, "stock", "Stock cannot be negative");

        let failures = errors.into_failures();
        assert_eq!(failures.len(), 3);
        assert_eq!(failures[0], ValidationFailure::new("name", "Name is required"));
        assert_eq!(failures[1].field, "description");
        assert_eq!(failures[2].field, "stock");
    }
}
