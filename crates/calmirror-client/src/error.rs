//! Client error types.

use std::fmt;

use calmirror_core::StorageError;
use calmirror_providers::ProviderError;
use calmirror_sync::{SyncError, SyncErrorKind};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Provider error outside of a sync operation, e.g. during sign-in.
    Provider(String),
    /// A sync operation failed; carries the user-facing message.
    Sync(String),
    /// Local storage could not be read or written.
    Storage(String),
    /// IO error.
    Io(std::io::Error),
    /// Authentication required.
    AuthRequired(String),
    /// Bad command-line input or event form values.
    InvalidInput(String),
    /// The named calendar or event does not exist locally.
    NotFound(String),
}

impl ClientError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::AuthRequired(_) => 3,
            Self::InvalidInput(_) | Self::NotFound(_) => 4,
            _ => 1,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Sync(msg) => write!(f, "{}", msg),
            Self::Storage(msg) => write!(f, "storage error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::AuthRequired(msg) => write!(f, "authentication required: {}", msg),
            Self::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            Self::NotFound(msg) => write!(f, "not found: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<StorageError> for ClientError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<SyncError> for ClientError {
    fn from(err: SyncError) -> Self {
        match err.kind() {
            SyncErrorKind::NotSignedIn | SyncErrorKind::AuthExpired => {
                Self::AuthRequired(err.user_message())
            }
            SyncErrorKind::Validation => Self::InvalidInput(err.user_message()),
            _ => Self::Sync(err.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_errors_map_to_exit_codes() {
        let err = ClientError::from(SyncError::not_signed_in());
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.to_string(),
            "authentication required: Not signed in. Please sign in with Google."
        );

        let err = ClientError::from(SyncError::from(ProviderError::from_status(503, "down")));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "Google Calendar service unavailable. Please try again later."
        );

        assert_eq!(ClientError::Config("x".into()).exit_code(), 2);
        assert_eq!(ClientError::NotFound("x".into()).exit_code(), 4);
    }
}
