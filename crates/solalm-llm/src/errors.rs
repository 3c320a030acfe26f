//! Error taxonomy for generative-service calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Shared error message and cause payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }
}

/// Provider error classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Authentication,
    AccessDenied,
    NotFound,
    InvalidRequest,
    RateLimit,
    Server,
    ContentFilter,
    QuotaExceeded,
    Other,
}

/// Error reported by the remote service itself (non-2xx response).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Error)]
#[error("{}", .info.message)]
pub struct ProviderError {
    pub info: ErrorInfo,
    pub provider: String,
    pub kind: ProviderErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl ProviderError {
    pub fn new(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let retryable = default_retryable_for_kind(&kind);
        Self {
            info: ErrorInfo::new(message),
            provider: provider.into(),
            kind,
            status_code: None,
            error_code: None,
            retryable,
            raw: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Error)]
#[error("{}", .info.message)]
pub struct RequestTimeoutError {
    pub info: ErrorInfo,
    pub retryable: bool,
}

impl RequestTimeoutError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            info: ErrorInfo::new(message),
            retryable: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Error)]
#[error("{}", .info.message)]
pub struct NetworkError {
    pub info: ErrorInfo,
    pub retryable: bool,
}

impl NetworkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            info: ErrorInfo::new(message),
            retryable: true,
        }
    }
}

/// The service answered but the payload was empty or did not match the
/// expected shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Error)]
#[error("{}", .info.message)]
pub struct NoObjectGeneratedError {
    pub info: ErrorInfo,
    pub retryable: bool,
}

impl NoObjectGeneratedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            info: ErrorInfo::new(message),
            retryable: false,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            info: ErrorInfo::with_cause(message, cause),
            retryable: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Error)]
#[error("{}", .info.message)]
pub struct ConfigurationError {
    pub info: ErrorInfo,
    pub retryable: bool,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            info: ErrorInfo::new(message),
            retryable: false,
        }
    }
}

/// Unified error type returned by every provider call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LlmError {
    #[error("{0}")]
    Provider(ProviderError),
    #[error("{0}")]
    RequestTimeout(RequestTimeoutError),
    #[error("{0}")]
    Network(NetworkError),
    #[error("{0}")]
    NoObjectGenerated(NoObjectGeneratedError),
    #[error("{0}")]
    Configuration(ConfigurationError),
}

impl LlmError {
    pub fn message(&self) -> &str {
        match self {
            LlmError::Provider(err) => &err.info.message,
            LlmError::RequestTimeout(err) => &err.info.message,
            LlmError::Network(err) => &err.info.message,
            LlmError::NoObjectGenerated(err) => &err.info.message,
            LlmError::Configuration(err) => &err.info.message,
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            LlmError::Provider(err) => err.retryable,
            LlmError::RequestTimeout(err) => err.retryable,
            LlmError::Network(err) => err.retryable,
            LlmError::NoObjectGenerated(err) => err.retryable,
            LlmError::Configuration(err) => err.retryable,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            LlmError::RequestTimeout(RequestTimeoutError::new(error.to_string()))
        } else {
            LlmError::Network(NetworkError::new(error.to_string()))
        }
    }
}

/// HTTP status classification result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HttpErrorClassification {
    Provider(ProviderErrorKind, bool),
    RequestTimeout(bool),
}

/// Map HTTP status codes to error classification.
pub fn map_http_status(status: u16) -> Option<HttpErrorClassification> {
    match status {
        400 | 422 => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::InvalidRequest,
            false,
        )),
        401 => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::Authentication,
            false,
        )),
        403 => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::AccessDenied,
            false,
        )),
        404 => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::NotFound,
            false,
        )),
        408 => Some(HttpErrorClassification::RequestTimeout(true)),
        413 => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::InvalidRequest,
            false,
        )),
        429 => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::RateLimit,
            true,
        )),
        500 | 502 | 503 | 504 => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::Server,
            true,
        )),
        _ => None,
    }
}

/// Map the gRPC-style `error.status` string Google APIs put in error bodies.
pub fn map_grpc_status(code: &str) -> Option<HttpErrorClassification> {
    match code.to_ascii_uppercase().as_str() {
        "NOT_FOUND" => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::NotFound,
            false,
        )),
        "INVALID_ARGUMENT" | "FAILED_PRECONDITION" => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::InvalidRequest,
            false,
        )),
        "UNAUTHENTICATED" => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::Authentication,
            false,
        )),
        "PERMISSION_DENIED" => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::AccessDenied,
            false,
        )),
        "RESOURCE_EXHAUSTED" => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::QuotaExceeded,
            true,
        )),
        "UNAVAILABLE" | "INTERNAL" => Some(HttpErrorClassification::Provider(
            ProviderErrorKind::Server,
            true,
        )),
        "DEADLINE_EXCEEDED" => Some(HttpErrorClassification::RequestTimeout(true)),
        _ => None,
    }
}

/// Classify error kind from message content when status codes are ambiguous.
pub fn classify_message(message: &str) -> Option<ProviderErrorKind> {
    let lower = message.to_ascii_lowercase();
    if lower.contains("not found") || lower.contains("does not exist") {
        return Some(ProviderErrorKind::NotFound);
    }
    if lower.contains("api key not valid") || lower.contains("unauthorized") {
        return Some(ProviderErrorKind::Authentication);
    }
    if lower.contains("safety") || lower.contains("blocked") {
        return Some(ProviderErrorKind::ContentFilter);
    }
    None
}

pub fn default_retryable_for_kind(kind: &ProviderErrorKind) -> bool {
    matches!(
        kind,
        ProviderErrorKind::RateLimit
            | ProviderErrorKind::Server
            | ProviderErrorKind::QuotaExceeded
            | ProviderErrorKind::Other
    )
}

/// Adapter-level timeouts for HTTP operations, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdapterTimeout {
    pub connect: f64,
    pub request: f64,
}

impl Default for AdapterTimeout {
    fn default() -> Self {
        Self {
            connect: 10.0,
            request: 120.0,
        }
    }
}
