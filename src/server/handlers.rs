//! 接口处理器

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use super::models::HealthResponse;
use super::AppState;
use crate::engine::AnalysisResult;
use crate::error::ServerResult;
use crate::orchestrator::AnalysisRequest;

/// POST /analyze
/// 请求体按 JSON 解析，不要求 Content-Type
pub async fn analyze(State(state): State<AppState>, body: Bytes) -> ServerResult<Json<AnalysisResult>> {
    let request = AnalysisRequest::from_body(&body)?;
    let result = state.orchestrator.analyze(request).await?;
    Ok(Json(result))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
