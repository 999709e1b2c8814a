//! Lotus Directory Engine Server
//!
//! Serves the directory REST API, health probes and Swagger UI.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LDE_CONFIG` | - | Path to a TOML config file |
//! | `LDE_HTTP_HOST` | `0.0.0.0` | Bind host |
//! | `LDE_HTTP_PORT` / `PORT` | `8080` | Bind port |
//! | `CORS_ORIGINS` | `*` | Comma-separated allowed origins |
//! | `LDE_DATABASE_BACKEND` | `postgres` | `postgres` or `memory` |
//! | `CONNECTION_STRING` | - | Postgres connection string without password |
//! | `DB_PASSWORD_KEY` | `DB_PASSWORD` | Name of the variable holding the password |
//! | `TLS_CERT_FILE` / `TLS_KEY_FILE` | - | Serve HTTPS when both are set |
//! | `LDE_CONFLICT_RETRIES` | `3` | Retries on concurrent modification |
//! | `LDE_DEV_MODE` | `false` | Use the in-memory store |
//! | `RUST_LOG` | `info` | Log level |
//! | `LOG_FORMAT` | `text` | `text` or `json` |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use lde_config::{AppConfig, DatabaseBackend};
use lde_directory::{DirectoryState, DirectoryStore, MemoryStore, PgStore};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    lde_common::init_logging("lde-server");

    info!("Starting Lotus Directory Engine");

    let config = AppConfig::load().context("failed to load configuration")?;
    let store = open_store(&config).await?;

    let state = DirectoryState::new(store, &config.membership);
    let app = lde_directory::app(state, &config.http);

    let addr: SocketAddr = config
        .http
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.http.bind_address()))?;

    match (&config.tls.cert_path, &config.tls.key_path) {
        (Some(cert), Some(key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key)
                .await
                .context("failed to load TLS certificate")?;

            let handle = axum_server::Handle::new();
            let shutdown = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            info!("Listening on https://{}", addr);
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        _ => {
            let listener = TcpListener::bind(addr).await?;
            info!("Listening on http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    info!("Lotus Directory Engine shutdown complete");
    Ok(())
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn DirectoryStore>> {
    match config.effective_backend() {
        DatabaseBackend::Memory => {
            if config.dev_mode {
                warn!("Dev mode: using in-memory store, data is lost on exit");
            } else {
                info!("Using in-memory store");
            }
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseBackend::Postgres => {
            let store = PgStore::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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
