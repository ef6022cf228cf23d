//! Pipeline Faults
//!
//! Unexpected failures: infrastructure errors, programming errors, cancelled
//! requests and registration mistakes. Business outcomes never use this type;
//! they are `RequestResult` variants.

use thiserror::Error;

use super::result::RequestResult;
use crate::persistence::StoreError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No handler registered for request {0}")]
    HandlerNotRegistered(&'static str),

    #[error("Invalid registration for {request}: {message}")]
    Registration {
        request: &'static str,
        message: String,
    },

    #[error("Request {0} was cancelled")]
    Cancelled(&'static str),

    #[error("Transient fault: {0}")]
    Transient(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validator fault: {0}")]
    Validator(String),

    #[error("Handler fault: {0}")]
    Handler(String),
}

impl PipelineError {
    pub fn registration(request: &'static str, message: impl Into<String>) -> Self {
        Self::Registration {
            request,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    pub fn validator(message: impl Into<String>) -> Self {
        Self::Validator(message.into())
    }

    /// Faults that may succeed when the whole unit of work is re-run.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Store(e) => e.is_transient(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Short fault category recorded on spans and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HandlerNotRegistered(_) => "handler_not_registered",
            Self::Registration { .. } => "registration",
            Self::Cancelled(_) => "cancelled",
            Self::Transient(_) => "transient",
            Self::Store(_) => "store",
            Self::Serialization(_) => "serialization",
            Self::Validator(_) => "validator",
            Self::Handler(_) => "handler",
        }
    }
}

/// What every pipeline stage returns: a business outcome or a fault.
pub type PipelineResult<T> = Result<RequestResult<T>, PipelineError>;
