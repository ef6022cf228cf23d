//! Request Pipeline
//!
//! CQRS-style dispatch of commands and queries through a fixed chain of
//! cross-cutting behaviours:
//!
//! ```text
//! dispatch(request)
//!   -> Tracing        span per request, fault annotation
//!   -> Validation     short-circuits with RequestResult::Invalid
//!   -> Caching        cacheable queries + post-success invalidation
//!   -> Transactional  unit of work with transient retry
//!   -> Handler        business logic
//! ```
//!
//! - `Request` - command/query value with capability tags
//! - `RequestResult<T>` - expected business outcomes
//! - `PipelineError` - unexpected faults, never converted to a result here
//! - `Dispatcher` - explicit handler registry built once at startup

pub mod behaviors;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod next;
pub mod registry;
pub mod request;
pub mod result;

pub use behaviors::{
    CachingBehavior, PipelineBehavior, TracingBehavior, TransactionalBehavior,
    ValidationBehavior, ValidationErrors, Validator,
};
pub use context::RequestContext;
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{PipelineError, PipelineResult};
pub use next::Next;
pub use registry::{HandlerRegistry, RequestHandler};
pub use request::{CachePolicy, Request, RequestDescriptor, RequestKind};
pub use result::{RequestResult, ValidationFailure};
