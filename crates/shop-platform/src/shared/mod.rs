//! Shared HTTP boundary pieces: error mapping, extractors and health checks.

pub mod api_common;
pub mod error;
pub mod health_api;

pub use api_common::{ApiError, ApiState, CustomerId, RequestMeta};
pub use error::PlatformError;
pub use health_api::health_router;
