mod api;
mod middleware;
mod runner;
mod scheduler;

use std::sync::Arc;

use erpbridge_db::{PgAssetStore, PgCatalogStore};
use erpbridge_sync::{AssetImporter, ImageSync, SyncOrchestrator};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    runner::SyncRunner,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = erpbridge_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = erpbridge_db::PoolConfig::from_app_config(&config);
    let pool = erpbridge_db::connect_pool(&config.database_url, pool_config).await?;
    erpbridge_db::run_migrations(&pool).await?;

    let erp = erpbridge_erp::build_erp_client(&config)?;
    let images = ImageSync::new(
        AssetImporter::from_config(&config)?,
        Arc::new(PgAssetStore::new(pool.clone(), config.media_dir.clone())),
    );
    let orchestrator =
        SyncOrchestrator::new(Arc::clone(&erp), Arc::new(PgCatalogStore::new(pool.clone())))
            .with_images(images);
    let runner = SyncRunner::new(pool.clone(), orchestrator, config.erp_mode.to_string());

    let _scheduler =
        scheduler::build_scheduler(runner.clone(), config.sync_schedule.as_deref()).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        erpbridge_core::Environment::Development
    ))?;
    let app = build_app(
        AppState { pool, erp, runner },
        auth,
        default_rate_limit_state(),
    );

    tracing::info!(bind_addr = %config.bind_addr, erp_mode = %config.erp_mode, "erpbridge-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
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
}
