//! 路由与中间件装配
//! 执行顺序（外 -> 内）：TraceLayer -> origin_filter -> CorsLayer -> require_api_key -> handler

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers;
use super::middleware::{origin_filter, require_api_key, API_KEY_HEADER};
use super::AppState;
use crate::config::ServerConfig;

/// 跨域仅放行 POST，允许携带凭据
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| warn!(origin = %origin, "Invalid CORS origin in config; skipping"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE, API_KEY_HEADER.clone()])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

pub fn create_router(state: AppState) -> Router {
    let analyze = post(handlers::analyze)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/analyze", analyze)
        .route("/health", get(handlers::health))
        .layer(cors_layer(&state.config))
        .layer(middleware::from_fn_with_state(state.clone(), origin_filter))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
