//! Request contract
//!
//! A request is an immutable command or query value. Its capability tags
//! (`CACHEABLE`, `TRANSACTIONAL`) are associated constants so they can be
//! checked once, when the handler is registered.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Discriminates state-changing commands from read-only queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RequestKind {
    Command,
    Query,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Command => "command",
            RequestKind::Query => "query",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and for how long a cacheable request's response is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub key: String,
    pub duration: Duration,
}

impl CachePolicy {
    pub fn new(key: impl Into<String>, duration: Duration) -> Self {
        Self {
            key: key.into(),
            duration,
        }
    }
}

/// A command or query dispatched through the pipeline.
///
/// `cache_policy` must be a pure function of the request's fields so that two
/// logically identical requests resolve to the same cache entry.
///
/// ```ignore
/// pub struct GetCategoryByIdQuery { pub id: i64 }
///
/// impl Request for GetCategoryByIdQuery {
///     type Response = CategoryDto;
///     const NAME: &'static str = "GetCategoryByIdQuery";
///     const KIND: RequestKind = RequestKind::Query;
///     const CACHEABLE: bool = true;
///
///     fn cache_policy(&self) -> Option<CachePolicy> {
///         Some(CachePolicy::new(keys::category(self.id), keys::CATEGORY_TTL))
///     }
/// }
/// ```
pub trait Request: Send + Sync + 'static {
    /// Payload carried by `RequestResult::Success`.
    type Response: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Registry key and span name.
    const NAME: &'static str;

    const KIND: RequestKind;

    /// Eligible for the caching behaviour (queries only).
    const CACHEABLE: bool = false;

    /// Runs inside a unit of work.
    const TRANSACTIONAL: bool = false;

    /// Cache key and TTL. Only consulted when `CACHEABLE` is set.
    fn cache_policy(&self) -> Option<CachePolicy> {
        None
    }

    /// Exact keys or wildcard patterns to evict after a successful outcome.
    fn cache_invalidations(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Capability tags of a request type, captured at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub name: &'static str,
    pub kind: RequestKind,
    pub cacheable: bool,
    pub transactional: bool,
}

impl RequestDescriptor {
    pub fn of<R: Request>() -> Self {
        Self {
            name: R::NAME,
            kind: R::KIND,
            cacheable: R::CACHEABLE,
            transactional: R::TRANSACTIONAL,
        }
    }

    /// Capability combinations that are rejected at startup.
    pub fn check(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("request name must not be empty".to_string());
        }
        if self.cacheable && self.kind == RequestKind::Command {
            return Err("commands cannot be cacheable".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;

    impl Request for Ping {
        type Response = String;
        const NAME: &'static str = "Ping";
        const KIND: RequestKind = RequestKind::Query;
    }

    struct CachedWrite;

    impl Request for CachedWrite {
        type Response = ();
        const NAME: &'static str = "CachedWrite";
        const KIND: RequestKind = RequestKind::Command;
        const CACHEABLE: bool = true;
    }

    #[test]
    fn test_default_tags() {
        let descriptor = RequestDescriptor::of::<Ping>();
        assert_eq!(descriptor.name, "Ping");
        assert!(!descriptor.cacheable);
        assert!(!descriptor.transactional);
        assert!(descriptor.check().is_ok());
        assert!(Ping.cache_policy().is_none());
        assert!(Ping.cache_invalidations().is_empty());
    }

    #[test]
    fn test_cacheable_command_is_rejected() {
        let err = RequestDescriptor::of::<CachedWrite>().check().unwrap_err();
        assert!(err.contains("cacheable"));
    }
}
