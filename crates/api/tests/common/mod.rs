//! Shared helpers for the HTTP integration tests.
//!
//! The app is built with the production router and a real PostgreSQL clip
//! store; only the video provider is replaced by a scripted in-memory fake.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use lostsons_api::auth::discord::{DiscordClient, DiscordConfig};
use lostsons_api::auth::jwt::{generate_session_token, JwtConfig};
use lostsons_api::config::{MuxConfig, ServerConfig};
use lostsons_api::router::build_app_router;
use lostsons_api::state::AppState;
use lostsons_db::PgClipStore;
use lostsons_mux::client::MuxCredentials;
use lostsons_mux::{AssetProvider, ProviderError, SubmittedAsset};
use lostsons_pipeline::{ClipPipeline, ResolutionMode, StagingArea};

pub const PUBLIC_BASE_URL: &str = "http://localhost:8083";
pub const BOUNDARY: &str = "lostsons-test-boundary";

// ---------------------------------------------------------------------------
// Fake provider
// ---------------------------------------------------------------------------

/// Scripted [`AssetProvider`].
///
/// Unscripted submissions get sequential ids (`as-1`/`pb-1`, `as-2`/`pb-2`,
/// ...). Every call is recorded.
#[derive(Default)]
pub struct FakeProvider {
    submit_results: Mutex<VecDeque<Result<SubmittedAsset, ProviderError>>>,
    delete_errors: Mutex<VecDeque<ProviderError>>,
    submitted: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    counter: AtomicUsize,
}

impl FakeProvider {
    /// Queue the identifiers returned by the next submission.
    pub fn script(&self, asset_id: &str, playback_id: Option<&str>) {
        self.submit_results.lock().unwrap().push_back(Ok(SubmittedAsset {
            asset_id: asset_id.to_string(),
            playback_id: playback_id.map(String::from),
        }));
    }

    pub fn fail_next_submit(&self, err: ProviderError) {
        self.submit_results.lock().unwrap().push_back(Err(err));
    }

    pub fn fail_next_delete(&self, err: ProviderError) {
        self.delete_errors.lock().unwrap().push_back(err);
    }

    pub fn submitted_urls(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn deleted_assets(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetProvider for FakeProvider {
    async fn submit_asset(&self, source_url: &str) -> Result<SubmittedAsset, ProviderError> {
        self.submitted.lock().unwrap().push(source_url.to_string());
        if let Some(result) = self.submit_results.lock().unwrap().pop_front() {
            return result;
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SubmittedAsset {
            asset_id: format!("as-{n}"),
            playback_id: Some(format!("pb-{n}")),
        })
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), ProviderError> {
        self.deleted.lock().unwrap().push(asset_id.to_string());
        match self.delete_errors.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Knobs for [`build_test_app_with`].
pub struct TestOptions {
    pub resolution: ResolutionMode,
    pub webhook_secret: Option<String>,
    /// Base URL of a mocked Discord API; `None` disables login.
    pub discord_api_base: Option<String>,
    pub max_upload_bytes: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            resolution: ResolutionMode::Sync,
            webhook_secret: None,
            discord_api_base: None,
            max_upload_bytes: 40 << 20,
        }
    }
}

/// A running test application and the handles tests inspect.
pub struct TestApp {
    pub router: Router,
    pub provider: Arc<FakeProvider>,
    pub config: ServerConfig,
    /// Holds `staging/` and `static/`; removed when the test ends.
    pub root: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// A valid session token for `username`.
    pub fn token(&self, username: &str) -> String {
        generate_session_token(username, &self.config.jwt).unwrap()
    }

    pub fn staging_dir(&self) -> &Path {
        &self.config.staging_dir
    }

    /// Number of files currently staged.
    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(self.staging_dir()).unwrap().count()
    }

    /// Request path of a submitted provider URL, as the provider would fetch it.
    pub fn fetch_path(url: &str) -> String {
        url.strip_prefix(PUBLIC_BASE_URL).unwrap().to_string()
    }
}

/// Build a test `ServerConfig` rooted at `root`.
pub fn test_config(root: &Path, options: &TestOptions) -> ServerConfig {
    ServerConfig {
        database_url: "postgres://provided-by-sqlx-test".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        public_base_url: PUBLIC_BASE_URL.to_string(),
        staging_dir: root.join("staging"),
        staging_retention_secs: 3600,
        static_dir: root.join("static"),
        max_upload_bytes: options.max_upload_bytes,
        cors_origins: vec![PUBLIC_BASE_URL.to_string()],
        request_timeout_secs: 30,
        mux: MuxConfig {
            credentials: MuxCredentials {
                token_id: "test-token-id".to_string(),
                token_secret: "test-token-secret".to_string(),
            },
            base_url: "http://mux.invalid".to_string(),
            webhook_secret: options.webhook_secret.clone(),
            resolution: options.resolution,
        },
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            expiry_days: 7,
        },
        discord: options.discord_api_base.as_ref().map(|_| DiscordConfig {
            client_id: "client-1".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_url: format!("{PUBLIC_BASE_URL}/redirect"),
        }),
    }
}

/// Build the application with default options (sync resolution, no login).
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, TestOptions::default())
}

/// Build the full application router, using the given database pool and a
/// fresh [`FakeProvider`].
pub fn build_test_app_with(pool: PgPool, options: TestOptions) -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path(), &options);
    std::fs::create_dir_all(&config.staging_dir).unwrap();
    std::fs::create_dir_all(&config.static_dir).unwrap();
    std::fs::write(
        config.static_dir.join("index.html"),
        "<!doctype html><title>The Lost Sons</title>",
    )
    .unwrap();

    let provider = Arc::new(FakeProvider::default());
    let pipeline = ClipPipeline::new(
        Arc::new(PgClipStore::new(pool.clone())),
        provider.clone(),
        StagingArea::new(&config.staging_dir, &config.public_base_url)
            .with_retention(Duration::from_secs(config.staging_retention_secs)),
        config.mux.resolution,
    );

    let discord = match (&config.discord, options.discord_api_base) {
        (Some(discord), Some(base)) => {
            Some(Arc::new(DiscordClient::with_api_base(discord.clone(), base)))
        }
        _ => None,
    };

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        pipeline: Arc::new(pipeline),
        discord,
    };

    TestApp {
        router: build_app_router(state, &config),
        provider,
        config,
        root,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_with_cookie(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST raw bytes with extra headers (webhook deliveries).
pub async fn post_raw(
    app: Router,
    uri: &str,
    headers: &[(&str, String)],
    body: impl Into<Body>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    send(app, builder.body(body.into()).unwrap()).await
}

/// A `multipart/form-data` body with text `fields` and an optional
/// `videofile` part.
pub fn multipart_body(fields: &[(&str, &str)], video: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = video {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"videofile\"; \
                 filename=\"{file_name}\"\r\nContent-Type: video/mp4\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart upload, authenticated with `token` when given.
pub async fn post_upload(
    app: Router,
    token: Option<&str>,
    fields: &[(&str, &str)],
    video: Option<(&str, &[u8])>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/clips/upload")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(multipart_body(fields, video)))
        .unwrap();
    send(app, request).await
}

/// The metadata fields of a typical upload.
pub fn clip_fields(title: &str) -> Vec<(&'static str, String)> {
    vec![
        ("title", title.to_string()),
        ("description", "retake on B".to_string()),
        ("game", "CS2".to_string()),
        ("tags", "ace,clutch".to_string()),
        ("players", "majestic".to_string()),
        ("username", "majestic".to_string()),
    ]
}

/// Borrow helper for [`clip_fields`] output.
pub fn as_pairs<'a>(fields: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

pub const VIDEO: &[u8] = b"\x00\x00\x00\x18ftypmp42fake-video-bytes";

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
