use std::path::PathBuf;

use lostsons_mux::client::{MuxCredentials, DEFAULT_BASE_URL};
use lostsons_pipeline::ResolutionMode;

use crate::auth::discord::DiscordConfig;
use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Built once in `main` and shared through `AppState`; nothing below the
/// HTTP layer reads the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8083`).
    pub port: u16,
    /// Base URL under which staged uploads are reachable by the provider.
    pub public_base_url: String,
    /// Directory for staged uploads, served at `/clips/temp`.
    pub staging_dir: PathBuf,
    /// Seconds a staged upload waits for the provider's ready or errored
    /// event before it is removed anyway (default: `3600`).
    pub staging_retention_secs: u64,
    /// Directory served for unmatched GET requests.
    pub static_dir: PathBuf,
    /// Body limit for `POST /clips/upload` in bytes (default: 40 MiB).
    pub max_upload_bytes: usize,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`).
    pub request_timeout_secs: u64,
    /// Asset provider settings.
    pub mux: MuxConfig,
    /// Session token configuration.
    pub jwt: JwtConfig,
    /// Discord OAuth2 credentials; `None` disables `/login`.
    pub discord: Option<DiscordConfig>,
}

/// Mux API and webhook settings.
#[derive(Debug, Clone)]
pub struct MuxConfig {
    pub credentials: MuxCredentials,
    pub base_url: String,
    /// When set, inbound webhooks must carry a valid `mux-signature`.
    pub webhook_secret: Option<String>,
    pub resolution: ResolutionMode,
}

impl MuxConfig {
    /// Load Mux settings from environment variables.
    ///
    /// | Env Var              | Required | Default               |
    /// |----------------------|----------|-----------------------|
    /// | `MUX_TOKEN_ID`       | **yes**  | --                    |
    /// | `MUX_TOKEN_SECRET`   | **yes**  | --                    |
    /// | `MUX_BASE_URL`       | no       | `https://api.mux.com` |
    /// | `MUX_WEBHOOK_SECRET` | no       | unset                 |
    /// | `MUX_RESOLUTION`     | no       | `sync`                |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or `MUX_RESOLUTION` is not
    /// `sync` or `webhook`.
    pub fn from_env() -> Self {
        let token_id = std::env::var("MUX_TOKEN_ID").expect("MUX_TOKEN_ID must be set");
        let token_secret =
            std::env::var("MUX_TOKEN_SECRET").expect("MUX_TOKEN_SECRET must be set");

        let base_url = std::env::var("MUX_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let webhook_secret = std::env::var("MUX_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let resolution: ResolutionMode = std::env::var("MUX_RESOLUTION")
            .unwrap_or_else(|_| "sync".into())
            .parse()
            .unwrap_or_else(|e| panic!("MUX_RESOLUTION: {e}"));

        Self {
            credentials: MuxCredentials {
                token_id,
                token_secret,
            },
            base_url,
            webhook_secret,
            resolution,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `DATABASE_URL`           | **required**            |
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `8083`                  |
    /// | `PUBLIC_BASE_URL`        | `http://localhost:8083` |
    /// | `STAGING_DIR`            | `clips/temp`            |
    /// | `STAGING_RETENTION_SECS` | `3600`                  |
    /// | `STATIC_DIR`             | `static`                |
    /// | `MAX_UPLOAD_BYTES`       | `41943040`              |
    /// | `CORS_ORIGINS`           | `http://localhost:8083` |
    /// | `REQUEST_TIMEOUT_SECS`   | `120`                   |
    ///
    /// Mux, JWT, and Discord settings are read by [`MuxConfig::from_env`],
    /// [`JwtConfig::from_env`], and [`DiscordConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is missing or a numeric value does not parse.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8083".into())
            .parse()
            .expect("PORT must be a valid u16");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8083".into())
            .trim_end_matches('/')
            .to_string();

        let staging_dir =
            PathBuf::from(std::env::var("STAGING_DIR").unwrap_or_else(|_| "clips/temp".into()));
        let staging_retention_secs: u64 = std::env::var("STAGING_RETENTION_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("STAGING_RETENTION_SECS must be a valid u64");
        let static_dir =
            PathBuf::from(std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into()));

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (40 << 20).to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8083".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let mux = MuxConfig::from_env();
        let jwt = JwtConfig::from_env();
        let discord = DiscordConfig::from_env(&public_base_url);

        Self {
            database_url,
            host,
            port,
            public_base_url,
            staging_dir,
            staging_retention_secs,
            static_dir,
            max_upload_bytes,
            cors_origins,
            request_timeout_secs,
            mux,
            jwt,
            discord,
        }
    }
}
