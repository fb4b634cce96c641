//! Sync error types.

use std::fmt;

use calmirror_core::{StorageError, ValidationErrors};
use calmirror_providers::{ProviderError, ProviderErrorCode};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// What went wrong, as far as the user is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncErrorKind {
    /// Nobody is signed in.
    NotSignedIn,
    /// 401, or the access token could not be refreshed.
    AuthExpired,
    /// 403.
    AccessDenied,
    /// 429, or the local rate limiter gave up.
    RateLimited,
    /// 5xx.
    ServiceUnavailable,
    /// 410 that survived the full-fetch retry.
    SyncTokenInvalid,
    Storage,
    Validation,
    Unknown,
}

impl SyncErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSignedIn => "not_signed_in",
            Self::AuthExpired => "auth_expired",
            Self::AccessDenied => "access_denied",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::SyncTokenInvalid => "sync_token_invalid",
            Self::Storage => "storage",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SyncErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ProviderErrorCode> for SyncErrorKind {
    fn from(code: ProviderErrorCode) -> Self {
        match code {
            ProviderErrorCode::AuthenticationFailed => Self::AuthExpired,
            ProviderErrorCode::AuthorizationFailed => Self::AccessDenied,
            ProviderErrorCode::RateLimited => Self::RateLimited,
            ProviderErrorCode::ServerError => Self::ServiceUnavailable,
            ProviderErrorCode::SyncTokenInvalid => Self::SyncTokenInvalid,
            _ => Self::Unknown,
        }
    }
}

/// An error surfaced to the user by the sync layer.
///
/// `Display` yields the message meant for the user; the underlying cause is
/// kept as the error source.
#[derive(Debug, Error)]
pub struct SyncError {
    kind: SyncErrorKind,
    detail: String,
    /// The operation that failed, e.g. "sync events".
    operation: Option<&'static str>,
    validation: Option<ValidationErrors>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SyncError {
    pub fn new(kind: SyncErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            operation: None,
            validation: None,
            source: None,
        }
    }

    pub fn not_signed_in() -> Self {
        Self::new(SyncErrorKind::NotSignedIn, "no valid access token")
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        let mut error = Self::new(SyncErrorKind::Validation, errors.to_string());
        error.validation = Some(errors);
        error
    }

    /// Records the operation that failed, unless one is already set.
    pub fn during(mut self, operation: &'static str) -> Self {
        self.operation.get_or_insert(operation);
        self
    }

    pub fn kind(&self) -> SyncErrorKind {
        self.kind
    }

    /// Technical detail, for logs.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn operation(&self) -> Option<&'static str> {
        self.operation
    }

    /// Field errors, for validation failures.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        self.validation.as_ref()
    }

    /// The message shown to the user.
    pub fn user_message(&self) -> String {
        match self.kind {
            SyncErrorKind::NotSignedIn => "Not signed in. Please sign in with Google.".to_string(),
            SyncErrorKind::AuthExpired => "Authentication expired. Please sign in again.".to_string(),
            SyncErrorKind::AccessDenied => {
                "Calendar access denied. Please reconnect your Google account.".to_string()
            }
            SyncErrorKind::RateLimited => {
                "Rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            SyncErrorKind::ServiceUnavailable => {
                "Google Calendar service unavailable. Please try again later.".to_string()
            }
            SyncErrorKind::SyncTokenInvalid => {
                "Calendar sync state expired. Please run a full sync.".to_string()
            }
            SyncErrorKind::Storage => format!("Failed to save local data: {}", self.detail),
            SyncErrorKind::Validation => format!("Invalid event: {}", self.detail),
            SyncErrorKind::Unknown => match self.operation {
                Some(operation) => format!("Failed to {}: {}", operation, self.detail),
                None => format!("Unexpected error: {}", self.detail),
            },
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl From<ProviderError> for SyncError {
    fn from(err: ProviderError) -> Self {
        let kind = SyncErrorKind::from(err.code());
        let mut error = Self::new(kind, err.message());
        error.source = Some(Box::new(err));
        error
    }
}

impl From<StorageError> for SyncError {
    fn from(err: StorageError) -> Self {
        let mut error = Self::new(SyncErrorKind::Storage, err.to_string());
        error.source = Some(Box::new(err));
        error
    }
}
