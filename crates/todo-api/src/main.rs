//! todo-api バイナリのエントリポイント
//! 環境変数から設定を読み、HTTP サーバを起動します。

use std::sync::Arc;

use anyhow::Context;
use domain::SystemClock;
use infrastructure::{
    DynamoDbClient, DynamoTodoRepository, InMemoryTodoRepository, RetryConfig, TodoRepository,
};
use shared::{init_tracing, Config, StoreBackend};
use todo_api::{app_with_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format).map_err(|e| anyhow::anyhow!(e))?;

    let repo: Arc<dyn TodoRepository> = match config.store_backend {
        StoreBackend::Memory => Arc::new(InMemoryTodoRepository::new()),
        StoreBackend::DynamoDb => {
            let db = DynamoDbClient::new(&config).await;
            Arc::new(DynamoTodoRepository::new(db, RetryConfig::from_config(&config)))
        }
    };
    let state = AppState::new(repo, Arc::new(SystemClock));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind address {addr}"))?;
    tracing::info!(%addr, backend = ?config.store_backend, "server starting");

    axum::serve(listener, app_with_state(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

/// SIGINT / SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
