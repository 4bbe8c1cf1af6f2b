//! 请求守卫中间件
//! origin_filter: 跨域白名单，先于所有处理器执行
//! require_api_key: x-api-key 校验，先于请求体解析执行

use axum::extract::{Request, State};
use axum::http::header::ORIGIN;
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;
use tracing::debug;

use super::AppState;
use crate::config::ServerConfig;
use crate::error::ServerError;

pub static API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// 无 Origin（非浏览器调用方）放行；有 Origin 时必须在白名单内
pub fn check_origin(config: &ServerConfig, headers: &HeaderMap) -> Result<(), ServerError> {
    let Some(origin) = headers.get(ORIGIN) else {
        return Ok(());
    };

    match origin.to_str() {
        Ok(origin) if config.is_origin_allowed(origin) => Ok(()),
        Ok(origin) => Err(ServerError::OriginNotAllowed(origin.to_string())),
        Err(_) => Err(ServerError::OriginNotAllowed(String::from_utf8_lossy(origin.as_bytes()).into_owned())),
    }
}

/// 常量时间比较，长度不同直接判定不匹配
pub fn check_api_key(config: &ServerConfig, headers: &HeaderMap) -> Result<(), ServerError> {
    let provided = headers
        .get(&API_KEY_HEADER)
        .map(|v| v.as_bytes())
        .ok_or(ServerError::InvalidApiKey)?;

    let matches: bool = provided.ct_eq(config.api_key.as_bytes()).into();
    if matches {
        Ok(())
    } else {
        Err(ServerError::InvalidApiKey)
    }
}

pub async fn origin_filter(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    check_origin(&state.config, request.headers())?;
    Ok(next.run(request).await)
}

pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if let Err(e) = check_api_key(&state.config, request.headers()) {
        debug!(uri = %request.uri(), "Rejected request with missing or invalid API key");
        return Err(e);
    }
    Ok(next.run(request).await)
}
