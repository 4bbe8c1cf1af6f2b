//! 分析编排：校验请求 -> 合并选项 -> 执行一次完整的引擎会话
//! 不重试，不返回部分结果

use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

use crate::engine::{run_scoped, AnalysisOptions, AnalysisResult, AnalyzerFactory};
use crate::error::{ServerError, ServerResult};

/// 分析请求体 `{url, options?}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub options: Option<Map<String, Value>>,
}

impl AnalysisRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            options: None,
        }
    }

    /// 解析请求体，空请求体等同于 `{}`
    /// 只接受 JSON 对象，数组等其他形式一律视为请求体非法
    pub fn from_body(body: &[u8]) -> ServerResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value =
            serde_json::from_slice(body).map_err(|e| ServerError::InvalidBody(e.to_string()))?;
        if !value.is_object() {
            return Err(ServerError::InvalidBody(
                "request body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| ServerError::InvalidBody(e.to_string()))
    }

    /// 校验 url：缺失/空白返回 MissingUrl，非 http(s) 绝对地址返回 InvalidUrl
    pub fn validated_url(&self) -> ServerResult<Url> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ServerError::MissingUrl)?;

        let url = Url::parse(raw).map_err(|e| ServerError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ServerError::InvalidUrl(format!("unsupported scheme '{}'", other))),
        }
    }
}

/// 分析编排器，持有引擎工厂，自身无可变状态
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    factory: Arc<dyn AnalyzerFactory>,
}

impl AnalysisOrchestrator {
    pub fn new(factory: Arc<dyn AnalyzerFactory>) -> Self {
        Self { factory }
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> ServerResult<AnalysisResult> {
        // url 校验失败时不创建任何引擎实例
        let url = request.validated_url()?;
        info!("Analyzing: {}", url);

        let options = AnalysisOptions::merged(request.options);
        run_scoped(self.factory.as_ref(), &options, &url)
            .await
            .map_err(|e| {
                error!(url = %url, error = ?e, "Analysis error");
                ServerError::AnalysisFailed(e)
            })
    }
}
