//! OAuth 2.0 authorization-code flow with PKCE for Google.
//!
//! The desktop flow binds a loopback listener, opens the consent page in the
//! browser, waits for the redirect carrying the authorization code and
//! exchanges it (with the PKCE verifier) for tokens. The same client
//! refreshes access tokens and looks up the account email.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::api::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

use super::config::GoogleConfig;
use super::tokens::{OAuthGrant, TokenRefresher};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// PKCE verifier length in bytes, before base64 encoding.
const CODE_VERIFIER_LENGTH: usize = 32;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_PATH: &str = "/callback";

/// OAuth client for Google APIs.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: GoogleConfig,
    http_client: reqwest::Client,
    token_url: String,
    userinfo_url: String,
}

impl OAuthClient {
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {e}"))
                    .with_source(e)
            })?;

        Ok(Self {
            config,
            http_client,
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        })
    }

    /// Runs the interactive browser flow and returns the granted tokens.
    ///
    /// # Errors
    ///
    /// Fails when no loopback port is free, the user denies access, the
    /// callback does not arrive within five minutes, or the code exchange
    /// is rejected.
    pub async fn authorize(&self) -> ProviderResult<OAuthGrant> {
        let pkce = PkceFlow::new();

        let (listener, port) = bind_loopback_server(self.config.loopback_port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);
        let auth_url = pkce.build_auth_url(
            &self.config.credentials.client_id,
            &redirect_uri,
            &self.config.scopes,
        );

        info!("starting OAuth flow, opening browser");
        debug!("authorization URL: {}", auth_url);
        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            eprintln!("\nOpen this URL in your browser to continue:\n\n{}\n", auth_url);
        }

        let callback = tokio::task::spawn_blocking(move || wait_for_callback(listener))
            .await
            .map_err(|e| ProviderError::internal(format!("callback task failed: {e}")))??;

        if callback.state != pkce.state {
            return Err(ProviderError::authentication(
                "OAuth state mismatch, possible CSRF attempt",
            ));
        }

        info!("received authorization code, exchanging for tokens");
        self.exchange_code(&callback.code, &pkce.verifier, &redirect_uri)
            .await
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> ProviderResult<OAuthGrant> {
        let credentials = &self.config.credentials;
        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];
        let grant = self.token_request(&params, "token exchange").await?;
        if grant.refresh_token.is_none() {
            warn!("token exchange returned no refresh token; the session cannot be renewed");
        }
        Ok(grant)
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<OAuthGrant> {
        let credentials = &self.config.credentials;
        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let grant = self.token_request(&params, "token refresh").await?;
        info!("refreshed access token");
        Ok(grant)
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<OAuthGrant> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let error = ProviderError::authentication(format!(
                "{} failed ({}): {}",
                what,
                status,
                token_error_message(&body)
            ))
            .with_status(status.as_u16());
            return Err(error);
        }

        parse_token_response(&body)
    }

    /// Looks up the email address of the signed-in account.
    pub async fn fetch_user_email(&self, access_token: &str) -> ProviderResult<String> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(
                status.as_u16(),
                "failed to fetch account email",
            ));
        }

        let info: UserInfo = response.json().await.map_err(|e| {
            ProviderError::invalid_response(format!("invalid userinfo response: {}", e))
        })?;
        info.email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| ProviderError::invalid_response("userinfo response has no email"))
    }
}

impl TokenRefresher for OAuthClient {
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, ProviderResult<OAuthGrant>> {
        Box::pin(self.refresh_token(refresh_token))
    }
}

/// Binds the first free port in `port_range` on the loopback interface.
fn bind_loopback_server(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in port_range.0..=port_range.1 {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            debug!("bound loopback server on port {}", port);
            return Ok((listener, port));
        }
    }
    Err(ProviderError::configuration(format!(
        "no available port in range {}-{}",
        port_range.0, port_range.1
    )))
}

/// Authorization code and state from the redirect.
#[derive(Debug, PartialEq, Eq)]
struct Callback {
    code: String,
    state: String,
}

fn wait_for_callback(listener: TcpListener) -> ProviderResult<Callback> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Some(result) = handle_callback(stream) {
                        let _ = tx.send(result);
                        return;
                    }
                }
                Err(e) => error!("failed to accept connection: {}", e),
            }
        }
    });

    match rx.recv_timeout(CALLBACK_TIMEOUT) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            Err(ProviderError::authentication("OAuth callback timeout"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(ProviderError::internal("callback channel disconnected"))
        }
    }
}

/// Answers one request on the loopback server. Returns `None` for requests
/// that are not the OAuth redirect (favicon and the like).
fn handle_callback(mut stream: TcpStream) -> Option<ProviderResult<Callback>> {
    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line).ok()?;

    let result = parse_callback(&request_line)?;
    let response = match &result {
        Ok(_) => {
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
            <html><body><h1>Signed in to calmirror</h1>\
            <p>You can close this window and return to the terminal.</p></body></html>"
        }
        Err(_) => {
            "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
            <html><body><h1>Authorization failed</h1>\
            <p>You can close this window.</p></body></html>"
        }
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();

    Some(result)
}

/// Parses a request line such as `GET /callback?code=..&state=.. HTTP/1.1`.
fn parse_callback(request_line: &str) -> Option<ProviderResult<Callback>> {
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = Url::parse(&format!("http://127.0.0.1{}", parts.next()?)).ok()?;
    if target.path() != CALLBACK_PATH {
        return None;
    }

    let mut code = None;
    let mut state = None;
    for (key, value) in target.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Some(Err(ProviderError::authentication(format!(
                    "authorization denied: {}",
                    value
                ))));
            }
            _ => {}
        }
    }

    Some(match code {
        Some(code) => Ok(Callback {
            code,
            state: state.unwrap_or_default(),
        }),
        None => Err(ProviderError::authentication(
            "missing authorization code in callback",
        )),
    })
}

/// PKCE verifier, challenge and CSRF state for one authorization (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    /// Base64url SHA-256 of the verifier.
    pub challenge: String,
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the consent page URL, asking for offline access so Google
    /// returns a refresh token.
    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        let scope = scopes.join(" ");
        let params = [
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("code_challenge", self.challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("state", self.state.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        format!("{}?{}", GOOGLE_AUTH_URL, query)
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn parse_token_response(body: &str) -> ProviderResult<OAuthGrant> {
    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::invalid_response(format!("invalid token response: {}", e)))?;
    Ok(OAuthGrant {
        access_token: response.access_token,
        refresh_token: response.refresh_token,
        expires_in: response.expires_in,
    })
}

/// Extracts `error_description` (or `error`) from a token endpoint failure.
fn token_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct TokenError {
        error: String,
        error_description: Option<String>,
    }

    match serde_json::from_str::<TokenError>(body) {
        Ok(e) => e.error_description.unwrap_or(e.error),
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
}
