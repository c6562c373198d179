use super::rate_limiter::RateLimitError;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;

/// Message fragment Microsoft Graph places in the error message when a
/// continuous access evaluation policy revoked the presented token.
pub const CAE_CLAIMS_CHALLENGE_MESSAGE: &str =
    "Continuous access evaluation resulted in claims challenge";

/// Result type alias used across the crate.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors produced while talking to Microsoft Graph and the Entra ID token
/// endpoints.
///
/// Service errors keep the response headers so callers can inspect
/// `WWW-Authenticate` (claims challenges) or `Retry-After`.
///
/// # Examples
///
/// ```no_run
/// use nimbus_graph::common::GraphError;
///
/// fn describe(error: &GraphError) -> &'static str {
///     if error.is_claims_challenge() {
///         "re-authentication required"
///     } else if error.is_not_found() {
///         "missing"
///     } else {
///         "failed"
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum GraphError {
    /// Graph returned a non-success status with an OData error body.
    #[error("Graph service error {code} (HTTP {status}): {message}")]
    Service {
        status: StatusCode,
        code: String,
        message: String,
        headers: HeaderMap,
    },

    /// The request never produced a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Token acquisition failed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A claims challenge could not be extracted or handled.
    #[error("Claims challenge error: {0}")]
    ClaimsChallenge(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The caller lacks the permission required by the endpoint.
    #[error("Insufficient permissions: {message}. {hint}")]
    InsufficientPermissions { message: String, hint: String },

    /// The local request budget is exhausted.
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// The operation was cancelled through its cancellation token.
    #[error("Operation cancelled")]
    Cancelled,
}

impl GraphError {
    /// Builds a service error from its parts.
    pub fn service(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
        headers: HeaderMap,
    ) -> Self {
        Self::Service {
            status,
            code: code.into(),
            message: message.into(),
            headers,
        }
    }

    /// Whether this is a service error signalling a CAE claims challenge.
    pub fn is_claims_challenge(&self) -> bool {
        matches!(self, Self::Service { message, .. } if message.contains(CAE_CLAIMS_CHALLENGE_MESSAGE))
    }

    /// The Graph error code, when this is a service error.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Response headers of a service error.
    pub fn response_headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::Service { headers, .. } => Some(headers),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Service { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Errors that can occur while refreshing or acquiring tokens.
#[derive(Debug, Clone, Error)]
pub enum TokenRefreshError {
    #[error("Network error during token request: {reason}")]
    NetworkError { reason: String },

    #[error("Token request rejected: {error} - {description}")]
    Rejected { error: String, description: String },

    #[error("Device code expired before the user completed sign-in")]
    DeviceCodeExpired,

    #[error("Access was denied by the user or tenant policy")]
    AccessDenied,

    #[error("Rate limited by authentication provider")]
    RateLimited { retry_after_seconds: Option<u64> },
}

impl From<RateLimitError> for GraphError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::TooManyRequests { retry_after } => GraphError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            },
            RateLimitError::InvalidConfiguration(message) => GraphError::Configuration(message),
        }
    }
}

impl From<TokenRefreshError> for GraphError {
    fn from(err: TokenRefreshError) -> Self {
        match err {
            TokenRefreshError::RateLimited {
                retry_after_seconds,
            } => GraphError::RateLimited {
                retry_after_secs: retry_after_seconds.unwrap_or(1),
            },
            _ => GraphError::Authentication(err.to_string()),
        }
    }
}
