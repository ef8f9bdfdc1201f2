mod api;
mod mailer;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    mailer::SmtpMailer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(zeeorder_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = zeeorder_db::PoolConfig::from_app_config(&config);
    let pool = zeeorder_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = zeeorder_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    tokio::fs::create_dir_all(&config.uploads_dir).await?;

    if !config.is_auth_configured() {
        tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; sign-in will fail until configured");
    }

    let state = AppState {
        pool,
        config: Arc::clone(&config),
        mailer: Arc::new(SmtpMailer),
    };
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "zeeorder-server listening");
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
