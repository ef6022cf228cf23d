//! Storefront Platform
//!
//! Core of the storefront backend:
//! - Request pipeline: commands and queries dispatched through tracing,
//!   validation, caching and transactional behaviours
//! - Cache manager with TTLs and wildcard invalidation (memory or Redis)
//! - Unit of work over a document store (memory or MongoDB) with transient retry
//! - Catalog, cart and order aggregates
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities and DTOs
//! - `repository` - Data access
//! - `operations` - Requests, validators and handlers
//! - `api` - REST endpoints

// Infrastructure
pub mod cache;
pub mod persistence;
pub mod pipeline;

// Aggregates
pub mod cart;
pub mod catalog;
pub mod order;

// HTTP boundary and wiring
pub mod platform;
pub mod seed;
pub mod shared;

pub use cache::{CacheError, CacheManager, CacheStore};
pub use persistence::{
    DocumentStore, MemoryDocumentStore, MongoDocumentStore, RetryPolicy, StoreError,
    StoreUnitOfWork, UnitOfWork,
};
pub use pipeline::{
    Dispatcher, DispatcherBuilder, PipelineError, PipelineResult, Request, RequestContext,
    RequestHandler, RequestKind, RequestResult, ValidationFailure, Validator,
};
pub use platform::{api_router, build_dispatcher, register_all, Repositories};
pub use seed::DevDataSeeder;
pub use shared::{ApiState, PlatformError};
