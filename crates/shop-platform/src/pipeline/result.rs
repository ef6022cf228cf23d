//! Request Result Type
//!
//! Expected business outcomes of a request. Consumers branch on the variant;
//! faults (infrastructure or programming errors) travel separately as
//! `PipelineError` and never end up in here.

use serde::{Deserialize, Serialize};

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of a dispatched request. Exactly one variant is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum RequestResult<T> {
    Success(T),
    NotFound(String),
    Unauthorized,
    Forbidden,
    Conflict(String),
    Invalid(Vec<ValidationFailure>),
    Error(String),
}

impl<T> RequestResult<T> {
    pub fn success(value: T) -> Self {
        RequestResult::Success(value)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        RequestResult::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        RequestResult::Conflict(message.into())
    }

    pub fn invalid(errors: Vec<ValidationFailure>) -> Self {
        RequestResult::Invalid(errors)
    }

    /// Single-field shorthand for `Invalid`.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        RequestResult::Invalid(vec![ValidationFailure::new(field, message)])
    }

    pub fn error(message: impl Into<String>) -> Self {
        RequestResult::Error(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestResult::Success(_))
    }

    /// Stable tag for logs and span fields.
    pub fn tag(&self) -> &'static str {
        match self {
            RequestResult::Success(_) => "success",
            RequestResult::NotFound(_) => "not_found",
            RequestResult::Unauthorized => "unauthorized",
            RequestResult::Forbidden => "forbidden",
            RequestResult::Conflict(_) => "conflict",
            RequestResult::Invalid(_) => "invalid",
            RequestResult::Error(_) => "error",
        }
    }

    /// User-facing message of a non-success outcome.
    ///
    /// Validation failures are joined; callers that need the structured list
    /// should use `validation_errors`.
    pub fn message(&self) -> Option<String> {
        match self {
            RequestResult::Success(_) => None,
            RequestResult::NotFound(m) | RequestResult::Conflict(m) | RequestResult::Error(m) => {
                Some(m.clone())
            }
            RequestResult::Unauthorized => Some("Authentication is required".to_string()),
            RequestResult::Forbidden => Some("Access to this resource is forbidden".to_string()),
            RequestResult::Invalid(errors) => Some(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        }
    }

    pub fn validation_errors(&self) -> Option<&[ValidationFailure]> {
        match self {
            RequestResult::Invalid(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn as_success(&self) -> Option<&T> {
        match self {
            RequestResult::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            RequestResult::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Map the success value, carrying every other outcome over unchanged.
    pub fn map<U, F>(self, f: F) -> RequestResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            RequestResult::Success(v) => RequestResult::Success(f(v)),
            RequestResult::NotFound(m) => RequestResult::NotFound(m),
            RequestResult::Unauthorized => RequestResult::Unauthorized,
            RequestResult::Forbidden => RequestResult::Forbidden,
            RequestResult::Conflict(m) => RequestResult::Conflict(m),
            RequestResult::Invalid(e) => RequestResult::Invalid(e),
            RequestResult::Error(m) => RequestResult::Error(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result: RequestResult<String> = RequestResult::success("test".to_string());
        assert!(result.is_success());
        assert_eq!(result.tag(), "success");
        assert_eq!(result.message(), None);
        assert_eq!(result.into_success().as_deref(), Some("test"));
    }

    #[test]
    fn test_failure_messages() {
        let result: RequestResult<()> = RequestResult::not_found("Category 7 not found");
        assert_eq!(result.message().as_deref(), Some("Category 7 not found"));
        assert_eq!(result.tag(), "not_found");

        let result: RequestResult<()> = RequestResult::Forbidden;
        assert!(result.message().is_some());
        assert!(!result.is_success());
    }

    #[test]
    fn test_invalid_keeps_structured_errors() {
        let result: RequestResult<()> = RequestResult::invalid(vec![
            ValidationFailure::new("name", "Name is required"),
            ValidationFailure::new("price", "Price must be positive"),
        ]);

        assert_eq!(result.validation_errors().unwrap().len(), 2);
        assert_eq!(
            result.message().as_deref(),
            Some("name: Name is required; price: Price must be positive")
        );
    }

    #[test]
    fn test_map_preserves_failures() {
        let ok: RequestResult<i32> = RequestResult::success(21);
        assert_eq!(ok.map(|v| v * 2), RequestResult::Success(42));

        let conflict: RequestResult<i32> = RequestResult::conflict("taken");
        assert_eq!(conflict.map(|v| v * 2), RequestResult::Conflict("taken".to_string()));
    }

    #[test]
    fn test_serialized_shape() {
        let result: RequestResult<u32> = RequestResult::success(5);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "success", "value": 5 }));
    }
}
