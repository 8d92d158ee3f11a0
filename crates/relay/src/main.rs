//! `camera-relay` — service binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP export).
//! 3. Derive the attachment token key and build the [`TokenCodec`].
//! 4. Open (and create if needed) the upload directory.
//! 5. Build the push notification client, if configured.
//! 6. Build the Axum router and start the HTTP server.

mod config;
mod crypto;
mod notify;
mod server;
mod storage;
mod telemetry;

use anyhow::{Context, Result};
use tracing::info;

use config::Config;
use crypto::TokenCodec;
use notify::Notifier;
use server::{middleware::ApiKey, state::AppState};
use storage::ImageStore;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "camera-relay starting"
    );

    // -----------------------------------------------------------------------
    // 3. Token codec
    // -----------------------------------------------------------------------
    let codec = TokenCodec::from_secret(cfg.token_secret.expose().as_bytes())
        .context("failed to initialise attachment token codec")?;
    info!(codec = ?codec, "attachment token codec ready");

    // -----------------------------------------------------------------------
    // 4. Storage
    // -----------------------------------------------------------------------
    let store = ImageStore::open(&cfg.upload_dir)
        .await
        .with_context(|| format!("failed to open upload directory {}", cfg.upload_dir))?;
    info!(upload_dir = %store.root().display(), "upload directory ready");

    // -----------------------------------------------------------------------
    // 5. Push notifications
    // -----------------------------------------------------------------------
    let notifier = Notifier::from_config(&cfg).context("failed to build notification client")?;
    if notifier.is_none() {
        info!("NOTIFICATION_URL not set; /notification is disabled");
    }

    // -----------------------------------------------------------------------
    // 6. HTTP server
    // -----------------------------------------------------------------------
    let api_key = ApiKey::new(cfg.api_key.expose())
        .map_err(|_| anyhow::anyhow!("failed to initialise API key verifier"))?;
    let state = AppState::new(codec, store, api_key, notifier, cfg.max_upload_bytes);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
