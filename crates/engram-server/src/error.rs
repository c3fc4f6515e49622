//! HTTP-facing error taxonomy (§7) and the `{success:false, error:{...}}`
//! envelope it renders as.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value as Json_;

/// Error codes the HTTP surface can emit, each pinned to exactly one status
/// code per §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    RateLimitExceeded,
    ServiceUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A single API-facing error, ready to render as the §4.9 error envelope.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Json_>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Json_) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimitExceeded, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Generic timeout response: client-visible message stays generic per
    /// §5 ("Cancellation and timeouts").
    pub fn timeout() -> Self {
        Self::internal("The request could not be completed in time.")
            .with_details(serde_json::json!({"code": "TIMEOUT"}))
    }
}

/// Internal `engram-core` errors never surface raw — each maps to a
/// `VALIDATION_ERROR` with code-specific `details`, per §7.
impl From<engram_core::Error> for ApiError {
    fn from(err: engram_core::Error) -> Self {
        match err {
            engram_core::Error::InvalidInterval(msg) => ApiError::validation(msg)
                .with_details(serde_json::json!({"reason": "InvalidInterval"})),
            engram_core::Error::Schema(msg) => ApiError::validation(msg)
                .with_details(serde_json::json!({"reason": "SchemaError"})),
            engram_core::Error::ReadOnlyViolation(keyword) => ApiError::validation(format!(
                "expression contains a disallowed write keyword: {keyword}"
            ))
            .with_details(serde_json::json!({"reason": "ReadOnlyViolation", "keyword": keyword})),
            engram_core::Error::UnknownSymbol { name, suggestions } => ApiError::validation(
                format!("unknown node label or edge type: {name}"),
            )
            .with_details(serde_json::json!({
                "reason": "UnknownSymbol",
                "name": name,
                "suggestions": suggestions,
            })),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Json_>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.code.as_str(),
                message: self.message,
                details: self.details,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Collaborator failures on the main request path surface as 500s — the
/// caller has no actionable remedy for a graph or vector-store outage.
impl From<crate::collaborators::CollaboratorError> for ApiError {
    fn from(err: crate::collaborators::CollaboratorError) -> Self {
        ApiError::internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
