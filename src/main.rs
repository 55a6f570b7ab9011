use anyhow::anyhow;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beacon::config::{AppConfig, StoreBackend};
use beacon::infra::{self, db::Db};
use beacon::{http, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    match config.app_mode.as_str() {
        "api" => {
            let store = infra::connect_store(&config).await?;
            let state = AppState {
                store,
                admin_token: config.admin_token.clone(),
                paseto_access_key: config.paseto_access_key,
                access_ttl_minutes: config.access_ttl_minutes,
            };

            let app = http::router(state).layer(TraceLayer::new_for_http());
            let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
            tracing::info!("listening on {}", config.http_addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        "migrate" => {
            if config.store_backend != StoreBackend::Postgres {
                return Err(anyhow!("APP_MODE=migrate requires STORE_BACKEND=postgres"));
            }
            let db = Db::connect(&config).await?;
            db.migrate().await?;
            tracing::info!("migrations applied");
        }
        other => return Err(anyhow!("unknown APP_MODE: {}", other)),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
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
