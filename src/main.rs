use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use apsviz_settings::api::{self, ApiState};
use apsviz_settings::auth::BearerGuard;
use apsviz_settings::config::Config;
use apsviz_settings::settings::job_order::DefaultJobOrder;
use apsviz_settings::settings::repo::{APSVIZ, ASGS, ASGS_BATCH};
use apsviz_settings::{DbRegistry, SettingsRepo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Arc::new(Config::from_env()?);

    tracing::info!(
        bind = %cfg.bind_addr,
        system = %cfg.system,
        peers = cfg.peers.len(),
        "settings service starting"
    );

    let mut registry = DbRegistry::new();
    registry.register(ASGS, &cfg.asgs_db.url(), true, cfg.retry.clone())?;
    registry.register(ASGS_BATCH, &cfg.asgs_db.url(), false, cfg.retry.clone())?;
    registry.register(APSVIZ, &cfg.apsviz_db.url(), true, cfg.retry.clone())?;
    let registry = Arc::new(registry);

    let job_order = Arc::new(DefaultJobOrder::load(cfg.job_order_path.as_deref())?);
    let repo = SettingsRepo::new(registry.clone(), job_order);

    let state = ApiState {
        repo,
        cfg: cfg.clone(),
        guard: Arc::new(BearerGuard::new(&cfg.jwt_secret)),
        http: reqwest::Client::new(),
    };

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on http://{}", cfg.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // rolls back any open batch transaction before the pools go away
    registry.close_all().await;
    tracing::info!("settings service stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install sigterm handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
