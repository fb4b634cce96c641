//! Wiring of configuration, local storage and the sync engine.

use std::sync::Arc;

use calmirror_core::{FileStore, KeyValueStore};
use calmirror_providers::api::BoxFuture;
use calmirror_providers::google::{
    AuthState, GoogleCalendarClient, GoogleConfig, OAuthClient, OAuthGrant, TokenManager,
    TokenRefresher,
};
use calmirror_providers::{ProviderError, ProviderResult};
use calmirror_sync::{StateFile, Store, SyncEngine};
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Local state of one CLI invocation.
pub struct App {
    pub config: ClientConfig,
    pub tz: Tz,
    prefs: Arc<FileStore>,
    store: Arc<Store>,
}

/// An app connected to Google.
pub struct Session {
    pub oauth: Arc<OAuthClient>,
    pub tokens: Arc<TokenManager>,
    pub engine: SyncEngine,
}

impl App {
    /// Opens the data directory and restores the store.
    ///
    /// `date` overrides today as the current date.
    pub async fn open(config: ClientConfig, date: Option<NaiveDate>) -> ClientResult<Self> {
        let tz = config.display.timezone().map_err(ClientError::Config)?;
        let prefs = Arc::new(FileStore::open(config.storage_path())?);
        let store =
            Store::new(prefs.clone(), tz).with_state_file(StateFile::new(config.state_path()));
        if let Some(date) = date {
            store.set_current_date(date).await;
        }
        debug!(
            data_dir = %config.data_dir().display(),
            tz = %tz,
            "opened local state"
        );

        Ok(Self {
            config,
            tz,
            prefs,
            store: Arc::new(store),
        })
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Token manager that cannot refresh, for commands that only inspect or
    /// drop the stored session.
    pub async fn offline_tokens(&self) -> (Arc<TokenManager>, AuthState) {
        let tokens = Arc::new(TokenManager::new(self.prefs(), Arc::new(OfflineRefresher)));
        let state = tokens.load().await;
        (tokens, state)
    }

    /// Builds the Google clients from `config.toml` and restores the session.
    pub async fn connect(&self) -> ClientResult<Session> {
        let google = self
            .config
            .google
            .to_provider_config()
            .map_err(ClientError::Config)?;
        self.connect_with(google).await
    }

    pub async fn connect_with(&self, google: GoogleConfig) -> ClientResult<Session> {
        let oauth = Arc::new(OAuthClient::new(google.clone())?);
        let api = GoogleCalendarClient::new(&google)?
            .with_retry_policy(self.config.sync.retry_policy());

        let tokens = Arc::new(TokenManager::new(self.prefs(), oauth.clone()));
        let state = tokens.load().await;
        debug!(%state, "restored session");

        let engine = SyncEngine::new(
            Arc::new(api),
            tokens.clone(),
            Arc::new(self.config.sync.rate_limiter()),
            self.store.clone(),
        )
        .with_buffer_days(self.config.sync.buffer_days);

        Ok(Session {
            oauth,
            tokens,
            engine,
        })
    }

    fn prefs(&self) -> Arc<dyn KeyValueStore> {
        self.prefs.clone()
    }
}

impl Session {
    /// Fails early when nobody is signed in.
    pub async fn require_sign_in(&self) -> ClientResult<()> {
        match self.tokens.state().await {
            AuthState::Anonymous | AuthState::Invalid => Err(ClientError::AuthRequired(
                "run `calmirror auth login` first".to_string(),
            )),
            AuthState::Authenticated | AuthState::Expiring => Ok(()),
        }
    }
}

struct OfflineRefresher;

impl TokenRefresher for OfflineRefresher {
    fn refresh<'a>(&'a self, _refresh_token: &'a str) -> BoxFuture<'a, ProviderResult<OAuthGrant>> {
        Box::pin(async {
            Err(ProviderError::configuration(
                "token refresh needs Google credentials in config.toml",
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calmirror_core::storage::{
        ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY, USER_EMAIL_KEY,
    };
    use calmirror_core::{CalendarView, Theme};

    fn config_in(dir: &std::path::Path) -> ClientConfig {
        ClientConfig {
            data_dir: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn open_applies_date_override_and_restores_preferences() {
        let tmp = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();

        let app = App::open(config_in(tmp.path()), Some(date)).await.unwrap();
        assert_eq!(app.store().current_date().await, date);
        app.store().set_view(CalendarView::Month).await;
        app.store().set_theme(Theme::DarkGreen).await;
        drop(app);

        let app = App::open(config_in(tmp.path()), None).await.unwrap();
        assert_eq!(app.store().view().await, CalendarView::Month);
        assert_eq!(app.store().theme().await, Theme::DarkGreen);
    }

    #[tokio::test]
    async fn connect_without_credentials_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let app = App::open(config_in(tmp.path()), None).await.unwrap();
        let err = app.connect().await.err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn offline_tokens_restore_and_cannot_refresh() {
        let tmp = tempfile::tempdir().unwrap();
        let app = App::open(config_in(tmp.path()), None).await.unwrap();
        let (_, state) = app.offline_tokens().await;
        assert_eq!(state, AuthState::Anonymous);

        // An expired session with a refresh token.
        let prefs = FileStore::open(app.config.storage_path()).unwrap();
        prefs.set(ACCESS_TOKEN_KEY, "old").unwrap();
        prefs.set(REFRESH_TOKEN_KEY, "refresh").unwrap();
        prefs.set(TOKEN_EXPIRY_KEY, "0").unwrap();
        prefs.set(USER_EMAIL_KEY, "me@example.com").unwrap();

        let app = App::open(config_in(tmp.path()), None).await.unwrap();
        let (tokens, state) = app.offline_tokens().await;
        assert_eq!(state, AuthState::Expiring);
        assert_eq!(tokens.email().await.as_deref(), Some("me@example.com"));
        assert!(tokens.ensure_valid_token().await.is_none());
        assert_eq!(tokens.state().await, AuthState::Invalid);
    }
}
