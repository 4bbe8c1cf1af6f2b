//! rswappalyzer-server - rswappalyzer 网站技术栈检测 HTTP 接口服务
//! 提交 URL，返回检测结果 JSON；检测能力完全委托给检测引擎

// 导出全局错误类型
pub use self::error::{EngineError, EngineResult, ServerError, ServerResult};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, ServerConfig};

// 导出引擎接口
pub use self::engine::{
    run_scoped, AnalysisOptions, AnalysisResult, Analyzer, AnalyzerFactory, AnalyzerSession, Site,
};
#[cfg(feature = "embedded-engine")]
pub use self::engine::EmbeddedAnalyzerFactory;

// 导出编排与服务入口
pub use self::orchestrator::{AnalysisOrchestrator, AnalysisRequest};
pub use self::server::{create_router, serve, AppState};

// 声明所有子模块
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod server;
pub mod utils;
