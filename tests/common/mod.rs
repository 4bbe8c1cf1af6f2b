//! 集成测试公共工具：记录型分析引擎与请求构造函数
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use url::Url;

use rswappalyzer_server::{
    create_router, AnalysisOptions, AnalysisResult, Analyzer, AnalyzerFactory, AppState, ConfigManager,
    EngineError, EngineResult, ServerConfig, Site,
};

pub const API_KEY: &str = "test-api-key";
pub const ALLOWED_ORIGIN: &str = "https://app.example.com";

/// 模拟引擎在哪个生命周期步骤失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    Initialize,
    Open,
    Analyze,
}

#[derive(Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub initialized: AtomicUsize,
    pub opened: AtomicUsize,
    pub analyzed: AtomicUsize,
    pub released: AtomicUsize,
    pub last_options: Mutex<Option<AnalysisOptions>>,
    pub last_url: Mutex<Option<String>>,
}

impl Counters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn analyzed(&self) -> usize {
        self.analyzed.load(Ordering::SeqCst)
    }
}

pub struct RecordingFactory {
    pub counters: Arc<Counters>,
    failure: Failure,
    result: Value,
}

impl RecordingFactory {
    pub fn new(failure: Failure) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            failure,
            result: sample_result(),
        }
    }
}

pub fn sample_result() -> Value {
    json!({
        "urls": {"https://example.com/": {"status": 200}},
        "technologies": [
            {"name": "Nginx", "version": "1.25.3", "categories": ["Web servers"], "confidence": 100}
        ]
    })
}

impl AnalyzerFactory for RecordingFactory {
    fn create(&self, options: &AnalysisOptions) -> EngineResult<Box<dyn Analyzer>> {
        // 与内置引擎一致：创建前校验选项类型
        options.max_wait()?;
        options.debug()?;
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        *self.counters.last_options.lock().unwrap() = Some(options.clone());
        Ok(Box::new(RecordingAnalyzer {
            counters: self.counters.clone(),
            failure: self.failure,
            result: self.result.clone(),
        }))
    }
}

struct RecordingAnalyzer {
    counters: Arc<Counters>,
    failure: Failure,
    result: Value,
}

#[async_trait]
impl Analyzer for RecordingAnalyzer {
    async fn initialize(&mut self) -> EngineResult<()> {
        self.counters.initialized.fetch_add(1, Ordering::SeqCst);
        if self.failure == Failure::Initialize {
            return Err(EngineError::Init("browser failed to launch".into()));
        }
        Ok(())
    }

    async fn open(&mut self, url: &Url) -> EngineResult<Box<dyn Site>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        *self.counters.last_url.lock().unwrap() = Some(url.to_string());
        if self.failure == Failure::Open {
            return Err(EngineError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
        }
        Ok(Box::new(RecordingSite {
            counters: self.counters.clone(),
            fail: self.failure == Failure::Analyze,
            result: self.result.clone(),
        }))
    }

    async fn release(&mut self) -> EngineResult<()> {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct RecordingSite {
    counters: Arc<Counters>,
    fail: bool,
    result: Value,
}

#[async_trait]
impl Site for RecordingSite {
    async fn analyze(&mut self) -> EngineResult<AnalysisResult> {
        self.counters.analyzed.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EngineError::Analyze("Cannot read properties of undefined".into()));
        }
        Ok(self.result.clone())
    }
}

pub fn test_config() -> ServerConfig {
    ConfigManager::custom()
        .api_key(API_KEY)
        .allowed_origins([ALLOWED_ORIGIN])
        .build()
}

/// 构建由全新记录型引擎支撑的 Router
pub fn test_app(failure: Failure) -> (Router, Arc<Counters>) {
    let factory = RecordingFactory::new(failure);
    let counters = factory.counters.clone();
    let router = create_router(AppState::new(test_config(), Arc::new(factory)));
    (router, counters)
}

pub fn analyze_request(body: &str, api_key: Option<&str>, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    if let Some(origin) = origin {
        builder = builder.header("origin", origin);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Response<Body>) {
    let response = router.oneshot(request).await.unwrap();
    (response.status(), response)
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
