//! Pipeline Behaviours
//!
//! Cross-cutting decorators wrapped around every handler. The dispatcher
//! composes them in a fixed order; each one either passes the outcome of
//! `next` through untouched or short-circuits with its own outcome.

mod caching;
mod trace;
mod transactional;
mod validation;

use futures::future::BoxFuture;

use super::context::RequestContext;
use super::error::PipelineResult;
use super::next::Next;
use super::request::Request;

pub use self::caching::CachingBehavior;
pub use self::trace::TracingBehavior;
pub use self::transactional::TransactionalBehavior;
pub use self::validation::{ValidationBehavior, ValidationErrors, Validator};

/// A decorator around the rest of the pipeline.
pub trait PipelineBehavior: Send + Sync {
    fn handle<'a, R: Request>(
        &'a self,
        request: &'a R,
        ctx: &'a RequestContext,
        next: Next<'a, R::Response>,
    ) -> BoxFuture<'a, PipelineResult<R::Response>>;
}
