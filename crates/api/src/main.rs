use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lostsons_db::PgClipStore;
use lostsons_mux::MuxClient;
use lostsons_pipeline::{ClipPipeline, StagingArea};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lostsons_api::auth::discord::DiscordClient;
use lostsons_api::config::ServerConfig;
use lostsons_api::router::build_app_router;
use lostsons_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lostsons_api=debug,lostsons_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        public_base_url = %config.public_base_url,
        resolution = %config.mux.resolution,
        discord_login = config.discord.is_some(),
        "Loaded server configuration"
    );

    // --- Database ---
    let pool = lostsons_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    lostsons_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    lostsons_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Staging ---
    let staging = StagingArea::new(&config.staging_dir, &config.public_base_url)
        .with_retention(Duration::from_secs(config.staging_retention_secs));
    staging
        .ensure_dir()
        .await
        .expect("Failed to create staging directory");
    tracing::info!(dir = %config.staging_dir.display(), "Staging directory ready");

    // --- Pipeline ---
    let provider = MuxClient::with_base_url(
        config.mux.credentials.clone(),
        config.mux.base_url.clone(),
    );
    let pipeline = ClipPipeline::new(
        Arc::new(PgClipStore::new(pool.clone())),
        Arc::new(provider),
        staging,
        config.mux.resolution,
    );

    let discord = config
        .discord
        .clone()
        .map(|discord| Arc::new(DiscordClient::new(discord)));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        pipeline: Arc::new(pipeline),
        discord,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
