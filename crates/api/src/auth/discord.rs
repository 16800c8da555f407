//! Discord OAuth2 client for the login flow.
//!
//! Only the `identify` scope is requested: the login exists to learn a
//! display name for the session, nothing else.

use reqwest::Url;
use serde::Deserialize;

/// Production API base.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api";

const SCOPE: &str = "identify";

/// OAuth2 application credentials.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl DiscordConfig {
    /// Load Discord credentials from the environment.
    ///
    /// Returns `None` unless both `DISCORD_CLIENT_ID` and
    /// `DISCORD_CLIENT_SECRET` are set; the login flow is then disabled.
    /// `DISCORD_REDIRECT_URL` defaults to `{public_base_url}/redirect`.
    pub fn from_env(public_base_url: &str) -> Option<Self> {
        let client_id = std::env::var("DISCORD_CLIENT_ID").ok().filter(|s| !s.is_empty())?;
        let client_secret = std::env::var("DISCORD_CLIENT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())?;
        let redirect_url = std::env::var("DISCORD_REDIRECT_URL")
            .unwrap_or_else(|_| format!("{}/redirect", public_base_url.trim_end_matches('/')));

        Some(Self {
            client_id,
            client_secret,
            redirect_url,
        })
    }
}

/// Errors from the Discord API.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Discord API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid Discord API URL: {0}")]
    Url(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Subset of the Discord user object.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
}

impl DiscordUser {
    /// Name recorded for the session: `username#discriminator` for legacy
    /// accounts, plain `username` otherwise.
    pub fn display_name(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if !d.is_empty() && d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }
}

/// HTTP client for the Discord OAuth2 endpoints.
pub struct DiscordClient {
    client: reqwest::Client,
    api_base: String,
    config: DiscordConfig,
}

impl DiscordClient {
    pub fn new(config: DiscordConfig) -> Self {
        Self::with_api_base(config, DEFAULT_API_BASE.to_string())
    }

    /// Create a client against an alternative API host (test double).
    pub fn with_api_base(config: DiscordConfig, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            config,
        }
    }

    /// The authorize URL the browser is redirected to.
    pub fn authorize_url(&self) -> Result<Url, DiscordError> {
        Url::parse_with_params(
            &format!("{}/oauth2/authorize", self.api_base),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPE),
            ],
        )
        .map_err(|e| DiscordError::Url(e.to_string()))
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, DiscordError> {
        let response = self
            .client
            .post(format!("{}/oauth2/token", self.api_base))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = Self::parse_response(response).await?;
        Ok(token.access_token)
    }

    /// Fetch the user the access token belongs to.
    pub async fn fetch_user(&self, access_token: &str) -> Result<DiscordUser, DiscordError> {
        let response = self
            .client
            .get(format!("{}/users/@me", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DiscordError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DiscordError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}
