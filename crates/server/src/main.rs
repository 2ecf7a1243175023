use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcriptor_core::{
    load_config, load_config_from_env, validate_config, Config, FallbackResolver, Fetcher,
    JobRegistry, PlaylistPageResolver, Resolver, YouTubeTranscriptFetcher, YtDlpResolver,
};
use transcriptor_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = VERSION, "Starting transcriptor");

    let config = load(&config_path())?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Archive directory: {:?}", config.storage.archive_dir);
    info!("Max concurrent jobs: {}", config.jobs.max_concurrent);

    tokio::fs::create_dir_all(&config.storage.archive_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create archive directory {:?}",
                config.storage.archive_dir
            )
        })?;

    // yt-dlp first, the playlist page as a fallback
    let primary: Arc<dyn Resolver> = Arc::new(YtDlpResolver::new(config.resolver.clone()));
    let secondary: Arc<dyn Resolver> = Arc::new(
        PlaylistPageResolver::new(&config.resolver)
            .context("Failed to create playlist page resolver")?,
    );
    info!(
        primary = primary.name(),
        secondary = secondary.name(),
        "Resolvers configured"
    );
    let resolver = Arc::new(FallbackResolver::new(primary, secondary));

    let fetcher: Arc<dyn Fetcher> = Arc::new(
        YouTubeTranscriptFetcher::new(&config.fetcher)
            .context("Failed to create transcript fetcher")?,
    );
    info!("Transcript languages: {:?}", config.fetcher.languages);

    let registry = Arc::new(
        JobRegistry::new(resolver, fetcher, config.storage.archive_dir.clone())
            .with_max_concurrent(config.jobs.max_concurrent),
    );

    let state = Arc::new(AppState::new(config.clone(), registry));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Config file path from `TRANSCRIPTOR_CONFIG`, defaulting to `config.toml`.
fn config_path() -> PathBuf {
    std::env::var("TRANSCRIPTOR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"))
}

/// Load the config file, or defaults plus environment when it is absent.
fn load(path: &std::path::Path) -> Result<Config> {
    if path.exists() {
        info!("Loading configuration from {:?}", path);
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
    } else {
        info!("No configuration file at {:?}, using defaults", path);
        load_config_from_env().context("Failed to load config from environment")
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
