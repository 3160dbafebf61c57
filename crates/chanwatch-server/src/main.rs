mod api;
mod middleware;
mod scheduler;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use chanwatch_db::SqliteStore;
use chanwatch_engine::{EngineSettings, Evaluator};
use chanwatch_giphy::GiphyClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(chanwatch_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = chanwatch_db::PoolConfig::from_app_config(&config);
    let pool = chanwatch_db::connect_pool(&config.database_url, pool_config).await?;
    chanwatch_db::run_migrations(&pool).await?;

    let shutdown = CancellationToken::new();
    let client = GiphyClient::new(&config.source)?;
    let evaluator = Arc::new(
        Evaluator::new(
            client,
            SqliteStore::new(pool.clone()),
            EngineSettings::from_app_config(&config),
        )
        .with_cancellation(shutdown.clone()),
    );

    let mut scheduler =
        scheduler::build_scheduler(Arc::clone(&evaluator), &config.refresh_cron).await?;

    let auth = AuthState::from_keys(
        &config.api_keys,
        matches!(config.env, chanwatch_core::Environment::Development),
    )?;
    let app = build_app(AppState { pool, evaluator }, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "chanwatch-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "scheduler did not shut down cleanly");
    }
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
    shutdown.cancel();
}
