//! 标准错误码：把各家供应商的错误名称与 HTTP 状态归一为统一的错误分类。
//!
//! # Standard Error Codes
//!
//! Classified provider failures carry a vendor-specific name and an optional HTTP-like code.
//! [`StandardErrorCode`] folds both into one taxonomy so callers can branch on a stable value.
//!
//! | Prefix | Category    | Description                    |
//! |--------|-------------|--------------------------------|
//! | E1xxx  | client      | Request-side errors            |
//! | E2xxx  | rate        | Rate limit and quota errors    |
//! | E3xxx  | server      | Provider-side errors           |
//! | E4xxx  | operational | Lifecycle and state conflicts  |
//! | E9xxx  | unknown     | Catch-all / unclassified       |
//!
//! ```rust
//! use ai_lib_unify::error_code::StandardErrorCode;
//!
//! let code = StandardErrorCode::resolve("ThrottlingException", Some(400));
//! assert_eq!(code.code(), "E2001");
//! assert_eq!(code.category(), "rate");
//! ```

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardErrorCode {
    /// E1001: malformed request or invalid parameters
    InvalidRequest,
    /// E1002: invalid, expired or missing credentials
    Authentication,
    /// E1003: valid credentials, insufficient permissions
    PermissionDenied,
    /// E1004: model or resource does not exist
    NotFound,
    /// E1005: input exceeds the context window or payload limit
    RequestTooLarge,
    /// E1006: the provider refused the content
    ContentFiltered,
    /// E2001: request rate limit exceeded
    RateLimited,
    /// E2002: account quota or billing limit reached
    QuotaExhausted,
    /// E3001: internal provider error
    ServerError,
    /// E3002: provider temporarily overloaded or unavailable
    Overloaded,
    /// E3003: request timed out
    Timeout,
    /// E4001: state conflict
    Conflict,
    /// E4002: request cancelled by the client
    Cancelled,
    /// E9999: could not be classified
    Unknown,
}

impl StandardErrorCode {
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "E1001",
            Self::Authentication => "E1002",
            Self::PermissionDenied => "E1003",
            Self::NotFound => "E1004",
            Self::RequestTooLarge => "E1005",
            Self::ContentFiltered => "E1006",
            Self::RateLimited => "E2001",
            Self::QuotaExhausted => "E2002",
            Self::ServerError => "E3001",
            Self::Overloaded => "E3002",
            Self::Timeout => "E3003",
            Self::Conflict => "E4001",
            Self::Cancelled => "E4002",
            Self::Unknown => "E9999",
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Authentication => "authentication",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::RequestTooLarge => "request_too_large",
            Self::ContentFiltered => "content_filtered",
            Self::RateLimited => "rate_limited",
            Self::QuotaExhausted => "quota_exhausted",
            Self::ServerError => "server_error",
            Self::Overloaded => "overloaded",
            Self::Timeout => "timeout",
            Self::Conflict => "conflict",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// Default retryability of the category. A classifier verdict takes precedence.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError | Self::Overloaded | Self::Timeout | Self::Conflict
        )
    }

    /// `"client"`, `"rate"`, `"server"`, `"operational"` or `"unknown"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest
            | Self::Authentication
            | Self::PermissionDenied
            | Self::NotFound
            | Self::RequestTooLarge
            | Self::ContentFiltered => "client",
            Self::RateLimited | Self::QuotaExhausted => "rate",
            Self::ServerError | Self::Overloaded | Self::Timeout => "server",
            Self::Conflict | Self::Cancelled => "operational",
            Self::Unknown => "unknown",
        }
    }

    /// Map a vendor error name (error type, exception name or status string).
    pub fn from_provider_code(provider_code: &str) -> Option<Self> {
        let code = match provider_code {
            "invalid_request" | "invalid_request_error" | "ValidationException"
            | "INVALID_ARGUMENT" | "FAILED_PRECONDITION" => Self::InvalidRequest,
            "authentication" | "authentication_error" | "invalid_api_key" | "UNAUTHENTICATED" => {
                Self::Authentication
            }
            "permission_denied" | "permission_error" | "AccessDeniedException"
            | "PERMISSION_DENIED" => Self::PermissionDenied,
            "not_found" | "not_found_error" | "model_not_found" | "ResourceNotFoundException"
            | "NOT_FOUND" => Self::NotFound,
            "request_too_large" | "context_length_exceeded" => Self::RequestTooLarge,
            "content_filter" | "content_policy_violation" => Self::ContentFiltered,
            "rate_limited" | "rate_limit_error" | "rate_limit_exceeded" | "ThrottlingException" => {
                Self::RateLimited
            }
            "quota_exhausted" | "insufficient_quota" | "ServiceQuotaExceededException"
            | "RESOURCE_EXHAUSTED" => Self::QuotaExhausted,
            "server_error" | "api_error" | "InternalServerException" | "ModelErrorException"
            | "INTERNAL" => Self::ServerError,
            "overloaded" | "overloaded_error" | "ServiceUnavailableException"
            | "ModelNotReadyException" | "UNAVAILABLE" => Self::Overloaded,
            "timeout" | "ModelTimeoutException" | "DEADLINE_EXCEEDED" => Self::Timeout,
            "conflict" => Self::Conflict,
            "cancelled" | "CANCELLED" => Self::Cancelled,
            _ => return None,
        };
        Some(code)
    }

    /// Most likely code for an HTTP status.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::InvalidRequest,
            401 => Self::Authentication,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            409 => Self::Conflict,
            413 => Self::RequestTooLarge,
            429 => Self::RateLimited,
            499 => Self::Cancelled,
            503 | 529 => Self::Overloaded,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Name first, status second.
    pub fn resolve(name: &str, status: Option<u16>) -> Self {
        Self::from_provider_code(name)
            .or_else(|| status.map(Self::from_http_status))
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for StandardErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for StandardErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
