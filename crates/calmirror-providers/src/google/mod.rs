//! Google Calendar backend.
//!
//! - [`GoogleCalendarClient`] implements [`CalendarApi`](crate::CalendarApi)
//!   over Calendar API v3
//! - [`OAuthClient`] runs the PKCE loopback flow, refreshes tokens and looks
//!   up the account email
//! - [`TokenManager`] owns the session and persists it to a key-value store
//!
//! # Example
//!
//! ```ignore
//! use calmirror_providers::google::{GoogleConfig, OAuthClient, OAuthCredentials, TokenManager};
//!
//! let config = GoogleConfig::new(OAuthCredentials::new(client_id, client_secret));
//! let oauth = Arc::new(OAuthClient::new(config.clone())?);
//! let tokens = TokenManager::new(store, oauth.clone());
//!
//! if tokens.load().await == AuthState::Anonymous {
//!     let grant = oauth.authorize().await?;
//!     let email = oauth.fetch_user_email(&grant.access_token).await?;
//!     tokens.sign_in(grant, email).await;
//! }
//! ```

#[cfg(feature = "google")]
mod client;
mod config;
#[cfg(feature = "google")]
mod oauth;
mod tokens;

#[cfg(feature = "google")]
pub use client::{CALENDAR_API_BASE, GoogleCalendarClient};
pub use config::{
    GoogleConfig, OAuthCredentials, SCOPE_CALENDAR, SCOPE_CALENDAR_EVENTS, SCOPE_USERINFO_EMAIL,
};
#[cfg(feature = "google")]
pub use oauth::{OAuthClient, PkceFlow};
pub use tokens::{
    AuthSession, AuthState, EXPIRY_BUFFER_SECS, OAuthGrant, TokenManager, TokenRefresher,
};
