//! Error types for calendar API operations.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
///
/// Used by the retry policy and by the sync layer to pick the message shown
/// to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// 401, or no usable access token.
    AuthenticationFailed,
    /// 403.
    AuthorizationFailed,
    /// Connection failed, timed out or the body could not be read.
    NetworkError,
    /// 429, or the local rate limiter gave up.
    RateLimited,
    /// 5xx.
    ServerError,
    /// 410 on an incremental fetch: the sync token is no longer valid.
    SyncTokenInvalid,
    /// The response body could not be parsed.
    InvalidResponse,
    /// 404.
    NotFound,
    /// 400 and other client errors.
    BadRequest,
    /// Missing or invalid configuration.
    ConfigurationError,
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if this error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::SyncTokenInvalid => "sync_token_invalid",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }

    /// Maps an HTTP error status to a code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::AuthenticationFailed,
            403 => Self::AuthorizationFailed,
            404 => Self::NotFound,
            410 => Self::SyncTokenInvalid,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::BadRequest,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from the Calendar API, the OAuth endpoints or the rate limiter.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// HTTP status of the failed response, if there was one.
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates an error for a non-success HTTP response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::from_status(status), message).with_status(status)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn sync_token_invalid(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::SyncTokenInvalid, message).with_status(410)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {status})")?;
        }
        Ok(())
    }
}

#[cfg(feature = "google")]
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timeout".to_string()
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            format!("request failed: {err}")
        };
        let mut error = Self::network(message);
        if let Some(status) = err.status() {
            error = error.with_status(status.as_u16());
        }
        error.with_source(err)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ProviderErrorCode::from_status(401),
            ProviderErrorCode::AuthenticationFailed
        );
        assert_eq!(
            ProviderErrorCode::from_status(403),
            ProviderErrorCode::AuthorizationFailed
        );
        assert_eq!(
            ProviderErrorCode::from_status(410),
            ProviderErrorCode::SyncTokenInvalid
        );
        assert_eq!(ProviderErrorCode::from_status(429), ProviderErrorCode::RateLimited);
        assert_eq!(ProviderErrorCode::from_status(503), ProviderErrorCode::ServerError);
        assert_eq!(ProviderErrorCode::from_status(400), ProviderErrorCode::BadRequest);
    }

    #[test]
    fn retryable_codes() {
        assert!(ProviderErrorCode::NetworkError.is_retryable());
        assert!(ProviderErrorCode::RateLimited.is_retryable());
        assert!(ProviderErrorCode::ServerError.is_retryable());
        assert!(!ProviderErrorCode::SyncTokenInvalid.is_retryable());
        assert!(!ProviderErrorCode::AuthenticationFailed.is_retryable());
        assert!(!ProviderErrorCode::NotFound.is_retryable());
    }

    #[test]
    fn status_is_attached() {
        let err = ProviderError::from_status(503, "backend error");
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert_eq!(err.status(), Some(503));
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "server_error: backend error (HTTP 503)");

        let err = ProviderError::sync_token_invalid("gone");
        assert_eq!(err.status(), Some(410));
    }

    #[test]
    fn source_is_kept() {
        use std::error::Error;
        let io_err = std::io::Error::other("reset by peer");
        let err = ProviderError::network("request failed").with_source(io_err);
        assert!(err.source().is_some());
        assert_eq!(err.status(), None);
    }
}
