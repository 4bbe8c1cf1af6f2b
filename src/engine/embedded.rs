//! Embedded engine module
//! 内置检测引擎：reqwest 拉取目标页面，rswappalyzer 内置规则库完成技术识别
//! 核心职责：
//! 1. 规则库进程内懒加载一次，只读共享（会话本身不共享）
//! 2. 每个会话独立的 HTTP 客户端（maxWait 超时 / userAgent / headers）
//! 3. 检测在阻塞线程池执行，不占用异步工作线程

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::header::HeaderMap;
use reqwest::Client;
use rswappalyzer::{RuleConfig, TechDetector};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

use super::{AnalysisOptions, AnalysisResult, Analyzer, AnalyzerFactory, Site};
use crate::error::{EngineError, EngineResult};
use crate::utils::HeaderConverter;

/// 默认 User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("rswappalyzer-server/", env!("CARGO_PKG_VERSION"));

/// 目标页面响应体上限（10 MiB），超出视为打开失败
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// 内置引擎工厂
/// 设计说明：
/// - rules: 编译后的规则库，首次 initialize 时加载，之后所有会话复用
/// - 每次 create 返回全新的分析器，HTTP 客户端与页面数据归会话独占
/// - max_body_bytes: 单个目标页面允许读取的最大字节数
#[derive(Clone)]
pub struct EmbeddedAnalyzerFactory {
    rules: Arc<OnceCell<TechDetector>>,
    max_body_bytes: usize,
}

impl Default for EmbeddedAnalyzerFactory {
    fn default() -> Self {
        Self {
            rules: Arc::new(OnceCell::new()),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl EmbeddedAnalyzerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 调整响应体上限
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// 启动时预加载规则库，避免首个请求承担加载耗时
    pub fn preload(&self) -> EngineResult<()> {
        load_rules(&self.rules).map(|_| ())
    }
}

impl AnalyzerFactory for EmbeddedAnalyzerFactory {
    fn create(&self, options: &AnalysisOptions) -> EngineResult<Box<dyn Analyzer>> {
        let settings = FetchSettings::from_options(options)?;
        Ok(Box::new(EmbeddedAnalyzer {
            rules: self.rules.clone(),
            max_body_bytes: self.max_body_bytes,
            settings,
            client: None,
            detector: None,
        }))
    }
}

fn load_rules(cell: &OnceCell<TechDetector>) -> EngineResult<&TechDetector> {
    cell.get_or_try_init(|| {
        info!("Loading rswappalyzer embedded rule library");
        TechDetector::with_embedded_rules(RuleConfig::default())
    })
    .map_err(|e| EngineError::Init(format!("Failed to load rule library: {}", e)))
}

/// 从分析选项中解析出的抓取参数
#[derive(Debug, Clone)]
struct FetchSettings {
    max_wait: Duration,
    user_agent: String,
    headers: HeaderMap,
    debug: bool,
}

impl FetchSettings {
    fn from_options(options: &AnalysisOptions) -> EngineResult<Self> {
        let debug = options.debug()?;
        let max_wait = options.max_wait()?;
        let delay = options.delay()?;
        let max_urls = options.max_urls()?;
        let recursive = options.recursive()?;

        if recursive && max_urls > 1 {
            debug!(
                max_urls,
                delay_ms = delay.as_millis() as u64,
                "Recursive crawling is not supported by the embedded engine, analyzing the target page only"
            );
        }

        let headers = match options.headers()? {
            Some(raw) => HeaderConverter::from_json(raw)?,
            None => HeaderMap::new(),
        };

        Ok(Self {
            max_wait,
            user_agent: options.user_agent()?.unwrap_or(DEFAULT_USER_AGENT).to_string(),
            headers,
            debug,
        })
    }

    fn max_wait_ms(&self) -> u64 {
        self.max_wait.as_millis() as u64
    }
}

struct EmbeddedAnalyzer {
    rules: Arc<OnceCell<TechDetector>>,
    max_body_bytes: usize,
    settings: FetchSettings,
    client: Option<Client>,
    detector: Option<TechDetector>,
}

#[async_trait]
impl Analyzer for EmbeddedAnalyzer {
    async fn initialize(&mut self) -> EngineResult<()> {
        // 规则库解压与反序列化是 CPU 密集操作，首次加载放到阻塞线程池
        let cached = self.rules.get().cloned();
        let detector = match cached {
            Some(detector) => detector,
            None => {
                let rules = self.rules.clone();
                tokio::task::spawn_blocking(move || load_rules(&rules).cloned())
                    .await
                    .map_err(|e| EngineError::Init(format!("Rule loading task failed: {}", e)))??
            }
        };
        let client = Client::builder()
            .timeout(self.settings.max_wait)
            .user_agent(self.settings.user_agent.as_str())
            .default_headers(self.settings.headers.clone())
            .build()
            .map_err(|e| EngineError::Init(format!("Failed to build HTTP client: {}", e)))?;

        self.client = Some(client);
        self.detector = Some(detector);
        log_step(self.settings.debug, "initialized");
        Ok(())
    }

    async fn open(&mut self, url: &Url) -> EngineResult<Box<dyn Site>> {
        let (Some(client), Some(detector)) = (&self.client, &self.detector) else {
            return Err(EngineError::Init("Analyzer is not initialized".to_string()));
        };
        let max_wait_ms = self.settings.max_wait_ms();
        let started = Instant::now();

        let mut response = client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| fetch_error(e, max_wait_ms))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let body = read_body(&mut response, self.max_body_bytes, max_wait_ms).await?;

        if self.settings.debug {
            info!(
                url = %final_url,
                status,
                body_len = body.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                headers = ?HeaderConverter::to_hashmap(&headers),
                "Target page fetched"
            );
        } else {
            debug!(url = %final_url, status, body_len = body.len(), "Target page fetched");
        }

        Ok(Box::new(EmbeddedSite {
            detector: detector.clone(),
            page: Some(FetchedPage {
                url: final_url,
                status,
                headers,
                body,
            }),
            debug: self.settings.debug,
        }))
    }

    async fn release(&mut self) -> EngineResult<()> {
        self.client.take();
        self.detector.take();
        log_step(self.settings.debug, "released");
        Ok(())
    }
}

/// 分块读取响应体，超过上限立即中止
async fn read_body(response: &mut reqwest::Response, limit: usize, max_wait_ms: u64) -> EngineResult<Vec<u8>> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(body_too_large(limit));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| fetch_error(e, max_wait_ms))? {
        if body.len() + chunk.len() > limit {
            return Err(body_too_large(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn body_too_large(limit: usize) -> EngineError {
    EngineError::Navigation(format!("Response body exceeds {} bytes", limit))
}

fn fetch_error(e: reqwest::Error, max_wait_ms: u64) -> EngineError {
    if e.is_timeout() {
        EngineError::Timeout(max_wait_ms)
    } else {
        EngineError::Navigation(e.to_string())
    }
}

// debug=true 时提升为 info 级别
fn log_step(verbose: bool, step: &str) {
    if verbose {
        info!(step, "Embedded analyzer step");
    } else {
        debug!(step, "Embedded analyzer step");
    }
}

/// 抓取到的页面
struct FetchedPage {
    url: String,
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
}

struct EmbeddedSite {
    detector: TechDetector,
    page: Option<FetchedPage>,
    debug: bool,
}

#[async_trait]
impl Site for EmbeddedSite {
    async fn analyze(&mut self) -> EngineResult<AnalysisResult> {
        let page = self
            .page
            .take()
            .ok_or_else(|| EngineError::Analyze("Site has already been analyzed".to_string()))?;
        let detector = self.detector.clone();
        let page_url = page.url.clone();
        let status = page.status;

        let technologies = tokio::task::spawn_blocking(move || {
            let detected = detector
                .detect(&page.headers, &[page.url.as_str()], &page.body)
                .map_err(|e| EngineError::Analyze(e.to_string()))?;
            technologies_of(&detected)
        })
        .await
        .map_err(|e| EngineError::Analyze(format!("Detection task failed: {}", e)))??;

        log_step(self.debug, "analyzed");

        let mut urls = Map::new();
        urls.insert(page_url, json!({ "status": status }));
        Ok(json!({
            "urls": urls,
            "technologies": technologies,
        }))
    }
}

// 取出检测结果中的 technologies 数组
fn technologies_of<T: Serialize>(detected: &T) -> EngineResult<Value> {
    let mut value = serde_json::to_value(detected)
        .map_err(|e| EngineError::Analyze(format!("Failed to serialize detection result: {}", e)))?;
    Ok(value
        .get_mut("technologies")
        .map(Value::take)
        .unwrap_or_else(|| Value::Array(Vec::new())))
}
