//! HTTP 接口层
//! POST /analyze（需跨域白名单 + API Key）
//! GET  /health（无鉴权）
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::engine::AnalyzerFactory;
use crate::orchestrator::AnalysisOrchestrator;

pub use self::routes::create_router;

/// 处理器共享状态，只读
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub orchestrator: Arc<AnalysisOrchestrator>,
}

impl AppState {
    pub fn new(config: ServerConfig, factory: Arc<dyn AnalyzerFactory>) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(AnalysisOrchestrator::new(factory)),
        }
    }
}

/// 绑定地址并运行服务，收到 Ctrl+C / SIGTERM 后优雅退出
pub async fn serve(config: ServerConfig, factory: Arc<dyn AnalyzerFactory>) -> std::io::Result<()> {
    if config.uses_placeholder_key() {
        warn!("API_KEY is not set, using the placeholder key; override it in any real deployment");
    }

    let addr = config
        .socket_addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        allowed_origins = ?config.allowed_origins,
        "Wappalyzer API server running on port {}",
        config.port
    );

    let router = create_router(AppState::new(config, factory));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
