//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/calmirror/config.toml` by default. Every section is optional.
//!
//! ```toml
//! data_dir = "/home/me/.local/share/calmirror"
//!
//! [google]
//! client_id = "pass::google/calmirror-id"
//! client_secret = "env::CALMIRROR_CLIENT_SECRET"
//!
//! [sync]
//! buffer_days = 7
//!
//! [display]
//! timezone = "Europe/Paris"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use calmirror_core::{MAX_SYNC_BUFFER_DAYS, SYNC_BUFFER_DAYS};
use calmirror_providers::google::{GoogleConfig, OAuthCredentials};
use calmirror_providers::{RateLimiter, RetryPolicy};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Configuration for the calmirror client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Where `storage.json` and the sync state live.
    pub data_dir: Option<PathBuf>,

    pub google: GoogleSettings,

    pub sync: SyncSettings,

    pub display: DisplaySettings,
}

/// Google OAuth and HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,

    /// First and last port tried for the OAuth loopback redirect.
    pub loopback_port_start: u16,
    pub loopback_port_end: u16,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
            loopback_port_start: 8080,
            loopback_port_end: 8090,
        }
    }
}

/// Rate limiting, retry and sync window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Requests admitted per rate window.
    pub max_requests: usize,
    pub window_ms: u64,
    /// Attempts per API call, including the first.
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    /// Days synced on each side of the visible range.
    pub buffer_days: i64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window_ms: 100_000,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            buffer_days: SYNC_BUFFER_DAYS,
        }
    }
}

impl SyncSettings {
    /// Rejects values the sync engine cannot use.
    pub fn check(&self) -> Result<(), String> {
        if !(0..=MAX_SYNC_BUFFER_DAYS).contains(&self.buffer_days) {
            return Err(format!(
                "[sync] buffer_days must be between 0 and {}, got {}",
                MAX_SYNC_BUFFER_DAYS, self.buffer_days
            ));
        }
        Ok(())
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.max_requests, Duration::from_millis(self.window_ms))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}

/// Display settings for agenda output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// IANA time zone. Falls back to `$TZ`, then UTC.
    pub timezone: Option<String>,

    /// Show the calendar name after each event.
    pub show_calendar: bool,

    /// Skip days without events.
    pub skip_empty_days: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            timezone: None,
            show_calendar: true,
            skip_empty_days: false,
        }
    }
}

impl DisplaySettings {
    /// Resolves the display time zone.
    pub fn timezone(&self) -> Result<Tz, String> {
        match &self.timezone {
            Some(name) => name
                .parse()
                .map_err(|e| format!("invalid timezone `{}`: {}", name, e)),
            None => Ok(std::env::var("TZ")
                .ok()
                .and_then(|name| name.trim_start_matches(':').parse().ok())
                .unwrap_or(Tz::UTC)),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))?;
        config.sync.check()?;
        Ok(config)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calmirror")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calmirror")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(Self::default_data_dir)
    }

    /// Session and preference entries.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir().join("storage.json")
    }

    /// Calendars, events and sync tokens.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir().join("sync-state.json")
    }
}

impl GoogleSettings {
    /// Builds the provider configuration, resolving secret references.
    pub fn to_provider_config(&self) -> Result<GoogleConfig, String> {
        self.provider_config(self.resolve_credentials()?)
    }

    /// Builds the provider configuration around already resolved credentials.
    pub fn provider_config(&self, credentials: OAuthCredentials) -> Result<GoogleConfig, String> {
        credentials.validate().map_err(|e| e.to_string())?;

        Ok(GoogleConfig::new(credentials)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_loopback_port_range(self.loopback_port_start, self.loopback_port_end))
    }

    /// Resolves the client id and secret.
    pub fn resolve_credentials(&self) -> Result<OAuthCredentials, String> {
        let raw_id = self.client_id.as_deref().ok_or_else(|| {
            format!(
                "Google credentials not found. Add to {}:\n  \
                 [google]\n  \
                 client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                 client_secret = \"YOUR_SECRET\"\n\n  \
                 Or run: calmirror auth login --credentials-file <path>",
                ClientConfig::default_path().display()
            )
        })?;
        let raw_secret = self.client_secret.as_deref().ok_or_else(|| {
            "client_secret is missing from [google] section in config.toml".to_string()
        })?;

        let client_id = crate::secret::resolve(raw_id)
            .map_err(|e| format!("failed to resolve client_id: {}", e))?;
        let client_secret = crate::secret::resolve(raw_secret)
            .map_err(|e| format!("failed to resolve client_secret: {}", e))?;

        Ok(OAuthCredentials::new(client_id, client_secret))
    }

    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.sync.max_requests, 1000);
        assert_eq!(config.sync.window_ms, 100_000);
        assert_eq!(config.sync.buffer_days, 7);
        assert_eq!(config.google.timeout_secs, 30);
        assert!(config.display.show_calendar);
        assert!(!config.google.has_credentials());
    }

    #[test]
    fn sections_are_parsed() {
        let config: ClientConfig = toml::from_str(
            r#"
data_dir = "/tmp/calmirror-test"

[google]
client_id = "toml-id.apps.googleusercontent.com"
client_secret = "toml-secret"
loopback_port_start = 9000
loopback_port_end = 9005

[sync]
max_attempts = 5
buffer_days = 14

[display]
timezone = "Europe/Paris"
skip_empty_days = true
"#,
        )
        .unwrap();

        assert_eq!(
            config.state_path(),
            PathBuf::from("/tmp/calmirror-test/sync-state.json")
        );
        assert_eq!(config.sync.retry_policy().max_attempts, 5);
        assert_eq!(config.sync.buffer_days, 14);
        assert_eq!(config.display.timezone().unwrap(), chrono_tz::Europe::Paris);

        let google = config.google.to_provider_config().unwrap();
        assert_eq!(google.credentials.client_secret, "toml-secret");
        assert_eq!(google.loopback_port_range, (9000, 9005));
    }

    #[test]
    fn load_rejects_huge_buffer() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[sync]\nbuffer_days = 1000000000\n").unwrap();
        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(err.contains("buffer_days"), "{err}");

        std::fs::write(&path, "[sync]\nbuffer_days = 30\n").unwrap();
        assert_eq!(ClientConfig::load_from(&path).unwrap().sync.buffer_days, 30);
    }

    #[test]
    fn bad_timezone_is_reported() {
        let display = DisplaySettings {
            timezone: Some("Mars/Olympus".into()),
            ..Default::default()
        };
        assert!(display.timezone().unwrap_err().contains("Mars/Olympus"));
    }

    #[test]
    fn credentials_resolve_env_references() {
        unsafe {
            std::env::set_var("_CM_CFG_ID", "env-id.apps.googleusercontent.com");
            std::env::set_var("_CM_CFG_SECRET", "env-secret");
        }
        let settings = GoogleSettings {
            client_id: Some("env::_CM_CFG_ID".into()),
            client_secret: Some("env::_CM_CFG_SECRET".into()),
            ..Default::default()
        };
        let creds = settings.resolve_credentials().unwrap();
        assert_eq!(creds.client_id, "env-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "env-secret");
        unsafe {
            std::env::remove_var("_CM_CFG_ID");
            std::env::remove_var("_CM_CFG_SECRET");
        }
    }

    #[test]
    fn missing_credentials_explain_how_to_fix() {
        let err = GoogleSettings::default().resolve_credentials().unwrap_err();
        assert!(err.contains("credentials not found"));

        let err = GoogleSettings {
            client_id: Some("id.apps.googleusercontent.com".into()),
            ..Default::default()
        }
        .resolve_credentials()
        .unwrap_err();
        assert!(err.contains("client_secret"));
    }
}
