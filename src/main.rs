// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc};

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use identity_gateway::{
    api::router,
    auth::{KeyStore, KeyStoreError, TokenVerifier},
    config::{GatewayConfig, TlsConfig},
    identity::{
        remote, IdentityAggregator, RemoteTenantDirectory, RemoteWorkspaceDirectory,
        TenantDirectory, WorkspaceDirectory,
    },
    init_tracing,
    state::AppState,
    store::InMemoryDirectory,
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("signing keys unavailable: {0}")]
    KeyStore(#[from] KeyStoreError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to install rustls crypto provider")]
    CryptoProvider,
    #[error("failed to load TLS credentials: {0}")]
    Tls(std::io::Error),
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("identity-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    let keys = KeyStore::initialize(config.jwks_url.as_str(), config.jwks_refresh_interval).await?;
    let verifier = TokenVerifier::new(keys, config.issuer.clone(), config.audience.clone())
        .with_leeway(config.clock_skew_leeway_secs);

    let (workspaces, tenants): (Arc<dyn WorkspaceDirectory>, Arc<dyn TenantDirectory>) =
        match &config.downstream {
            Some(downstream) => {
                let client = remote::http_client()?;
                tracing::info!(
                    identity_api = %downstream.identity_api_url,
                    user_api = %downstream.user_api_url,
                    "Using remote identity services"
                );
                (
                    Arc::new(RemoteWorkspaceDirectory::new(
                        downstream.identity_api_url.clone(),
                        client.clone(),
                    )),
                    Arc::new(RemoteTenantDirectory::new(
                        downstream.user_api_url.clone(),
                        client,
                    )),
                )
            }
            None => {
                tracing::warn!(
                    "No downstream identity services configured, using seeded in-memory directory"
                );
                let directory = Arc::new(InMemoryDirectory::seeded());
                (directory.clone(), directory)
            }
        };

    let aggregator =
        IdentityAggregator::new(workspaces, tenants).with_timeout(config.aggregation_timeout);

    let shutdown = CancellationToken::new();
    let state = AppState::new(verifier, aggregator).with_shutdown(shutdown.clone());
    let app = router(state);

    tokio::spawn(watch_signals(shutdown.clone()));

    match &config.tls {
        Some(tls) => serve_tls(app, &config, tls, shutdown).await,
        None => serve_plain(app, &config, shutdown).await,
    }
}

async fn serve_plain(
    app: Router,
    config: &GatewayConfig,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(StartupError::Serve)?;
    tracing::info!(
        addr = %config.bind_addr,
        issuer = %config.issuer,
        "Identity gateway listening on http (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(StartupError::Serve)
}

async fn serve_tls(
    app: Router,
    config: &GatewayConfig,
    tls: &TlsConfig,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| StartupError::CryptoProvider)?;

    let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(StartupError::Tls)?;

    let handle = Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        shutdown_handle.graceful_shutdown(None);
    });

    tracing::info!(
        addr = %config.bind_addr,
        issuer = %config.issuer,
        "Identity gateway listening on https (docs at /docs)"
    );

    axum_server::bind_rustls(config.bind_addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(StartupError::Serve)
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received, draining connections");
    shutdown.cancel();
}
