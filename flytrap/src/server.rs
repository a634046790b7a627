//! axumサーバー起動・シャットダウンハンドリング
//!
//! キャプチャ用・照会用の2つのリスナーとプルーナーを同じシャットダウン信号で管理する

use crate::shutdown::ShutdownController;
use crate::AppState;
use flytrap_common::config::TrapConfig;
use flytrap_common::error::{FlytrapError, FlytrapResult};
use tokio::net::TcpListener;
use tracing::{error, info};

/// リスナーをバインド
pub async fn bind(addr: &str) -> FlytrapResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| FlytrapError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// 設定からサーバーを起動し、OSシグナルで停止するまで待機する
pub async fn run(config: TrapConfig) -> FlytrapResult<()> {
    let capture_listener = bind(&config.capture_addr()).await?;
    let query_listener = bind(&config.query_addr()).await?;

    let state = AppState::new(config)?;
    tokio::spawn(watch_os_signals(state.shutdown.clone()));

    serve(state, capture_listener, query_listener).await
}

/// Serve both routers on already-bound listeners until shutdown is requested.
///
/// The pruner is started here and stopped before returning.
pub async fn serve(
    state: AppState,
    capture_listener: TcpListener,
    query_listener: TcpListener,
) -> FlytrapResult<()> {
    let shutdown = state.shutdown.clone();
    let pruner = state.pruner().start();

    log_listening("Capture", &capture_listener);
    log_listening("Query", &query_listener);

    let capture_app = crate::api::create_capture_router(state.clone());
    let query_app = crate::api::create_query_router(state);

    let capture_server = axum::serve(capture_listener, capture_app)
        .with_graceful_shutdown(wait_owned(shutdown.clone()));
    let query_server = axum::serve(query_listener, query_app)
        .with_graceful_shutdown(wait_owned(shutdown.clone()));

    let result = tokio::try_join!(
        async { capture_server.await },
        async { query_server.await }
    )
    .map(|_| ())
    .map_err(|e| FlytrapError::Server(e.to_string()));

    // 片方が失敗した場合も含めて、残りの処理を止める
    shutdown.request_shutdown();
    if let Err(e) = pruner.await {
        error!(error = %e, "Pruner task failed");
    }

    if let Err(e) = &result {
        error!(error = %e, "Server stopped with an error");
    }
    info!("Server shutdown complete");
    result
}

async fn wait_owned(shutdown: ShutdownController) {
    shutdown.wait().await
}

fn log_listening(name: &str, listener: &TcpListener) {
    match listener.local_addr() {
        Ok(addr) => info!("{} listener on {}", name, addr),
        Err(e) => error!(error = %e, "{} listener has no local address", name),
    }
}

/// OSシグナルを待機し、シャットダウンを要求する
async fn watch_os_signals(shutdown: ShutdownController) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = shutdown.wait() => {
            return;
        }
    }
    shutdown.request_shutdown();
}
