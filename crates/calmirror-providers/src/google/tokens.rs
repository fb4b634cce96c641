//! Access token lifecycle.
//!
//! [`TokenManager`] owns the signed-in session: it restores it from the
//! key-value store, refreshes the access token shortly before it expires and
//! clears everything when refresh fails or the user signs out.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use calmirror_core::KeyValueStore;
use calmirror_core::storage::{
    ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY, USER_EMAIL_KEY,
};

use crate::api::BoxFuture;
use crate::error::ProviderResult;

/// Access tokens are refreshed this many seconds before they expire.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint does not report one.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

const SESSION_KEYS: [&str; 4] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    TOKEN_EXPIRY_KEY,
    USER_EMAIL_KEY,
];

/// Tokens returned by the OAuth token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthGrant {
    pub access_token: String,
    /// Only present on the first grant, or when the server rotates it.
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: Option<i64>,
}

impl OAuthGrant {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_expires_in(mut self, secs: i64) -> Self {
        self.expires_in = Some(secs);
        self
    }

    fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
    }
}

impl fmt::Debug for OAuthGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthGrant")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// The signed-in account and its tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub email: String,
}

impl AuthSession {
    /// True once `now` is within [`EXPIRY_BUFFER_SECS`] of expiry.
    pub fn is_expiring(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(EXPIRY_BUFFER_SECS)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    /// Never signed in, or signed out.
    Anonymous,
    Authenticated,
    /// The access token must be refreshed before use.
    Expiring,
    /// Refresh failed; the user has to sign in again.
    Invalid,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
            Self::Expiring => "expiring",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exchanges a refresh token for a new access token.
pub trait TokenRefresher: Send + Sync {
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, ProviderResult<OAuthGrant>>;
}

#[derive(Debug, Default)]
struct Inner {
    session: Option<AuthSession>,
    invalid: bool,
}

impl Inner {
    fn state(&self, now: DateTime<Utc>) -> AuthState {
        match &self.session {
            Some(session) if session.is_expiring(now) => AuthState::Expiring,
            Some(_) => AuthState::Authenticated,
            None if self.invalid => AuthState::Invalid,
            None => AuthState::Anonymous,
        }
    }
}

/// Owns the session and hands out valid access tokens.
///
/// All refreshes go through one lock, so concurrent callers of
/// [`ensure_valid_token`](Self::ensure_valid_token) trigger at most one
/// refresh.
pub struct TokenManager {
    store: Arc<dyn KeyValueStore>,
    refresher: Arc<dyn TokenRefresher>,
    inner: Mutex<Inner>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(store: Arc<dyn KeyValueStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            store,
            refresher,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Restores a persisted session.
    ///
    /// A session is restored only when all four entries are present and the
    /// expiry parses. An expired session is kept; the next
    /// [`ensure_valid_token`](Self::ensure_valid_token) refreshes it.
    pub async fn load(&self) -> AuthState {
        let session = self.read_session();
        let mut inner = self.inner.lock().await;
        inner.session = session;
        inner.invalid = false;
        let state = inner.state(Utc::now());
        debug!("restored auth state: {}", state);
        state
    }

    fn read_session(&self) -> Option<AuthSession> {
        let mut values = Vec::with_capacity(SESSION_KEYS.len());
        for key in SESSION_KEYS {
            match self.store.get(key) {
                Ok(Some(value)) => values.push(value),
                Ok(None) => return None,
                Err(e) => {
                    warn!("failed to read {}: {}", key, e);
                    return None;
                }
            }
        }

        let [access_token, refresh_token, expiry, email]: [String; 4] = values.try_into().ok()?;
        let expires_at = expiry
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        let Some(expires_at) = expires_at else {
            warn!("ignoring stored session with invalid expiry {:?}", expiry);
            return None;
        };

        Some(AuthSession {
            access_token,
            refresh_token: Some(refresh_token).filter(|t| !t.is_empty()),
            expires_at,
            email,
        })
    }

    fn persist(&self, session: &AuthSession) {
        let expiry = session.expires_at.timestamp_millis().to_string();
        let entries = [
            (ACCESS_TOKEN_KEY, session.access_token.as_str()),
            (
                REFRESH_TOKEN_KEY,
                session.refresh_token.as_deref().unwrap_or_default(),
            ),
            (TOKEN_EXPIRY_KEY, expiry.as_str()),
            (USER_EMAIL_KEY, session.email.as_str()),
        ];
        for (key, value) in entries {
            if let Err(e) = self.store.set(key, value) {
                warn!("failed to persist {}: {}", key, e);
            }
        }
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.store.remove_all(&SESSION_KEYS) {
            warn!("failed to clear stored session: {}", e);
        }
    }

    /// Starts a session from a fresh OAuth grant.
    pub async fn sign_in(&self, grant: OAuthGrant, email: impl Into<String>) -> AuthSession {
        let session = AuthSession {
            expires_at: grant.expires_at(Utc::now()),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            email: email.into(),
        };
        self.persist(&session);

        let mut inner = self.inner.lock().await;
        inner.session = Some(session.clone());
        inner.invalid = false;
        info!("signed in as {}", session.email);
        session
    }

    /// Ends the session and clears persisted tokens.
    pub async fn sign_out(&self) {
        let mut inner = self.inner.lock().await;
        inner.session = None;
        inner.invalid = false;
        self.clear_persisted();
        info!("signed out");
    }

    pub async fn state(&self) -> AuthState {
        self.inner.lock().await.state(Utc::now())
    }

    pub async fn session(&self) -> Option<AuthSession> {
        self.inner.lock().await.session.clone()
    }

    pub async fn email(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|s| s.email.clone())
    }

    /// Returns an access token that is valid for at least [`EXPIRY_BUFFER_SECS`].
    ///
    /// Refreshes first when the token is about to expire. Returns `None`
    /// when nobody is signed in or the refresh fails; in the latter case the
    /// session is cleared and the state becomes [`AuthState::Invalid`].
    pub async fn ensure_valid_token(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let session = inner.session.as_ref()?;
        if !session.is_expiring(Utc::now()) {
            return Some(session.access_token.clone());
        }

        let email = session.email.clone();
        let Some(refresh_token) = session.refresh_token.clone() else {
            warn!("access token expired and no refresh token is available");
            self.invalidate(&mut inner);
            return None;
        };

        debug!("access token expiring, refreshing");
        match self.refresher.refresh(&refresh_token).await {
            Ok(grant) => {
                let refreshed = AuthSession {
                    expires_at: grant.expires_at(Utc::now()),
                    access_token: grant.access_token,
                    refresh_token: grant.refresh_token.or(Some(refresh_token)),
                    email,
                };
                self.persist(&refreshed);
                let token = refreshed.access_token.clone();
                inner.session = Some(refreshed);
                Some(token)
            }
            Err(e) => {
                warn!("token refresh failed: {}", e);
                self.invalidate(&mut inner);
                None
            }
        }
    }

    fn invalidate(&self, inner: &mut Inner) {
        inner.session = None;
        inner.invalid = true;
        self.clear_persisted();
    }
}
