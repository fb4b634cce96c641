//! Authentication commands.

use std::path::{Path, PathBuf};

use calmirror_providers::google::{AuthState, OAuthCredentials};
use tracing::{info, warn};

use crate::app::App;
use crate::config::{ClientConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};
use crate::render::Status;

/// Runs the Google sign-in flow.
///
/// Resolves credentials from CLI flags, a `--credentials-file`, or
/// `config.toml`, then runs the OAuth 2.0 PKCE flow and loads the calendar
/// list.
///
/// Credentials given on the command line are persisted to `config_path` so
/// later commands can refresh the session.
pub async fn login(
    app: &App,
    config_path: &Path,
    client_id: Option<String>,
    client_secret: Option<String>,
    credentials_file: Option<PathBuf>,
    force: bool,
) -> ClientResult<()> {
    let resolved = resolve_google_credentials(
        client_id,
        client_secret,
        credentials_file,
        &app.config.google,
    )?;

    let google = app
        .config
        .google
        .provider_config(resolved.credentials.clone())
        .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;
    let session = app.connect_with(google).await?;

    if matches!(
        session.tokens.state().await,
        AuthState::Authenticated | AuthState::Expiring
    ) && !force
    {
        resolved.persist(config_path);
        let email = session.tokens.email().await.unwrap_or_default();
        println!("Already signed in as {}.", email);
        println!("Use --force to sign in again.");
        return Ok(());
    }

    println!("Starting Google sign-in...");
    println!();
    println!("A browser window will open for you to authorize access.");
    println!("If the browser doesn't open, check the terminal for a URL to copy.");
    println!();

    let grant = session.oauth.authorize().await?;
    let email = session.oauth.fetch_user_email(&grant.access_token).await?;
    session.tokens.sign_in(grant, &email).await;

    resolved.persist(config_path);

    info!(%email, "google sign-in successful");
    println!();
    println!("Signed in as {}.", email);

    let calendars = session.engine.sync_calendars().await?;
    println!(
        "Found {} calendars ({} shown). Run `calmirror` to see your week.",
        calendars.len(),
        calendars.iter().filter(|c| c.selected).count()
    );

    Ok(())
}

/// Signs out and forgets the synced calendars, events and sync tokens.
pub async fn logout(app: &App) -> ClientResult<()> {
    let (tokens, state) = app.offline_tokens().await;
    let email = tokens.email().await;
    tokens.sign_out().await;
    app.store().clear_account_data().await;

    match (state, email) {
        (AuthState::Anonymous, _) => println!("Not signed in; local data cleared."),
        (_, Some(email)) => println!("Signed out {}.", email),
        (_, None) => println!("Signed out."),
    }
    Ok(())
}

/// Prints the session state without contacting Google.
pub async fn status(app: &App, json: bool) -> ClientResult<()> {
    let (tokens, state) = app.offline_tokens().await;
    let email = tokens.email().await;
    let status = Status::from_state(state, email, &*app.store().read().await);

    if json {
        let out = serde_json::to_string_pretty(&status)
            .map_err(|e| ClientError::InvalidInput(format!("failed to serialize status: {}", e)))?;
        println!("{}", out);
    } else {
        print!("{}", status.to_text());
    }
    Ok(())
}

/// Client credentials plus whether they still need to be written to
/// `config.toml`.
#[derive(Debug)]
struct ResolvedCredentials {
    credentials: OAuthCredentials,
    from_config: bool,
}

impl ResolvedCredentials {
    /// Persists flag or file credentials under `[google]`, keeping the rest
    /// of the document. Returns true if the file was written.
    fn persist(&self, config_path: &Path) -> bool {
        if self.from_config {
            return false;
        }
        match write_google_table(config_path, &self.credentials) {
            Ok(()) => {
                info!(path = %config_path.display(), "credentials saved");
                println!("Credentials saved to {}", config_path.display());
                true
            }
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "credentials not saved");
                false
            }
        }
    }
}

fn write_google_table(config_path: &Path, credentials: &OAuthCredentials) -> Result<(), String> {
    let existing = match std::fs::read_to_string(config_path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.to_string()),
    };
    let mut doc: toml_edit::DocumentMut = existing.parse().map_err(|e| format!("{}", e))?;

    let google = doc
        .entry("google")
        .or_insert(toml_edit::table())
        .as_table_mut()
        .ok_or("`google` is not a table")?;
    google["client_id"] = toml_edit::value(credentials.client_id.as_str());
    google["client_secret"] = toml_edit::value(credentials.client_secret.as_str());

    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    }
    std::fs::write(config_path, doc.to_string()).map_err(|e| e.to_string())
}

/// Picks client credentials: an explicit id/secret pair wins over a
/// downloaded JSON file, which wins over `[google]` in `config.toml`.
fn resolve_google_credentials(
    client_id: Option<String>,
    client_secret: Option<String>,
    credentials_file: Option<PathBuf>,
    settings: &GoogleSettings,
) -> ClientResult<ResolvedCredentials> {
    let from_flags = |credentials| ResolvedCredentials {
        credentials,
        from_config: false,
    };

    match (client_id, client_secret) {
        (Some(id), Some(secret)) => return Ok(from_flags(OAuthCredentials::new(&id, &secret))),
        (None, None) => {}
        _ if credentials_file.is_none() && !settings.has_credentials() => {
            return Err(ClientError::Config(
                "--client-id and --client-secret must be given together".to_string(),
            ));
        }
        _ => {}
    }

    if let Some(path) = credentials_file {
        return OAuthCredentials::from_file(&path).map(from_flags).map_err(|e| {
            ClientError::Config(format!("cannot read {}: {}", path.display(), e))
        });
    }

    if settings.has_credentials() {
        let credentials = settings
            .resolve_credentials()
            .map_err(|e| ClientError::Config(format!("[google] credentials: {}", e)))?;
        return Ok(ResolvedCredentials {
            credentials,
            from_config: true,
        });
    }

    Err(ClientError::Config(format!(
        "no Google client credentials; set client_id and client_secret under [google] in {}, \
         pass --client-id/--client-secret or --credentials-file, \
         or export GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET",
        ClientConfig::default_path().display()
    )))
}
