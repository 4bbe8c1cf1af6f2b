//! 全局错误类型定义
//! EngineError: 检测引擎侧错误（初始化/打开目标/分析/释放）
//! ServerError: 请求侧错误，直接映射为 HTTP 响应

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::server::models::ErrorBody;

/// 跨域拒绝时返回给调用方的说明
pub const CORS_REJECTION_MESSAGE: &str =
    "The CORS policy for this site does not allow access from the specified Origin.";

/// 检测引擎错误
/// 消息原样透传给调用方，因此 Display 只输出上游消息本身
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("{0}")]
    Init(String),

    #[error("{0}")]
    Navigation(String),

    #[error("Navigation timeout of {0} ms exceeded")]
    Timeout(u64),

    #[error("{0}")]
    Analyze(String),

    #[error("{0}")]
    Release(String),
}

/// 请求处理错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("URL is required")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Origin not allowed: {0}")]
    OriginNotAllowed(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(#[from] EngineError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingUrl | Self::InvalidUrl(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Self::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
            Self::AnalysisFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::MissingUrl => ErrorBody::new("URL is required"),
            Self::InvalidUrl(reason) => ErrorBody::with_message("Invalid URL", reason),
            Self::InvalidBody(reason) => ErrorBody::with_message("Invalid request body", reason),
            Self::InvalidApiKey => ErrorBody::new("Invalid API key"),
            Self::OriginNotAllowed(_) => {
                ErrorBody::with_message("Origin not allowed", CORS_REJECTION_MESSAGE)
            }
            Self::AnalysisFailed(e) => ErrorBody::with_message("Analysis failed", e.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

// 全局Result类型
pub type EngineResult<T> = Result<T, EngineError>;
pub type ServerResult<T> = Result<T, ServerError>;
