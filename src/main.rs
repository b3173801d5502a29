// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum_server::tls_rustls::RustlsConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gm_report_server::{
    api::router,
    auth::{nonce::DEFAULT_NONCE_CAPACITY, NonceStore, NonceSweeper, SessionKeys},
    blockchain::EasClient,
    config::{AppConfig, LOG_FORMAT_ENV},
    state::AppState,
    storage::{AppDatabase, MediaStore},
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let db = AppDatabase::open(&config.database_path())
        .with_context(|| format!("Failed to open database at {}", config.database_path().display()))?;
    let media = MediaStore::from_config(&config.media, &config.media_dir())
        .context("Failed to initialize media store")?;
    info!(backend = media.backend_name(), "Media store ready");

    let sessions = SessionKeys::new(&config.session_secret, config.session_ttl);
    let nonces = Arc::new(NonceStore::new(DEFAULT_NONCE_CAPACITY, config.nonce_ttl));

    let mut state = AppState::new(db, media, sessions, nonces.clone(), &config.siwe_domain);
    match config.eas_network.clone() {
        Some(network) => {
            info!(chain = %network.chain, rpc_url = %network.rpc_url, "On-chain attestation checks enabled");
            let client = EasClient::new(network).context("Failed to create EAS client")?;
            state = state.with_eas(client);
        }
        None => info!("EAS_NETWORK not set; attestations are recorded as submitted"),
    }

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(NonceSweeper::new(nonces).run(shutdown.clone()));

    let app = router(state, config.max_upload_bytes);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;

    match &config.tls {
        Some(tls) => {
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .context("Failed to load TLS certificate and key")?;

            let handle = axum_server::Handle::new();
            let server_handle = handle.clone();
            let token = shutdown.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                token.cancel();
                server_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
            });

            info!("gm report server listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            info!("gm report server listening on http://{addr} (docs at /docs)");

            let token = shutdown.clone();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    token.cancel();
                })
                .await
                .context("HTTP server failed")?;
        }
    }

    shutdown.cancel();
    let _ = sweeper.await;
    info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = ctrl_c.await;
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("Received Ctrl+C, shutting down...");
    }
}
