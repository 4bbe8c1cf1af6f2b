//! 分析会话：作用域内持有分析器，任何退出路径都保证释放
//! 正常路径显式 await release；guard 被提前丢弃（如客户端断开）时在 Drop 中补发释放任务

use tokio::runtime::Handle;
use tracing::{debug, warn};
use url::Url;

use super::{AnalysisOptions, AnalysisResult, Analyzer, AnalyzerFactory};
use crate::error::{EngineError, EngineResult};

/// 单个请求独占的分析器会话，不共享、不复用
pub struct AnalyzerSession {
    analyzer: Option<Box<dyn Analyzer>>,
}

impl std::fmt::Debug for AnalyzerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerSession")
            .field("released", &self.analyzer.is_none())
            .finish()
    }
}

impl AnalyzerSession {
    /// 创建分析器；创建失败时没有需要释放的资源
    pub fn acquire(factory: &dyn AnalyzerFactory, options: &AnalysisOptions) -> EngineResult<Self> {
        let analyzer = factory.create(options)?;
        Ok(Self {
            analyzer: Some(analyzer),
        })
    }

    /// 依次执行 initialize -> open -> analyze
    pub async fn run(&mut self, url: &Url) -> EngineResult<AnalysisResult> {
        let analyzer = self
            .analyzer
            .as_mut()
            .ok_or_else(|| EngineError::Init("analyzer session already released".to_string()))?;

        analyzer.initialize().await?;
        let mut site = analyzer.open(url).await?;
        site.analyze().await
    }

    /// 释放分析器，消费 guard 保证只执行一次
    pub async fn release(mut self) -> EngineResult<()> {
        match self.analyzer.take() {
            Some(mut analyzer) => analyzer.release().await,
            None => Ok(()),
        }
    }
}

impl Drop for AnalyzerSession {
    fn drop(&mut self) {
        let Some(mut analyzer) = self.analyzer.take() else {
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                debug!("Analyzer session dropped before release, scheduling release");
                handle.spawn(async move {
                    if let Err(e) = analyzer.release().await {
                        warn!(error = %e, "Deferred analyzer release failed");
                    }
                });
            }
            Err(_) => warn!("Analyzer session dropped outside a runtime, resources not released"),
        }
    }
}

/// 完整执行一次会话生命周期
/// 分析与释放都失败时报告分析错误，释放错误只记录日志
pub async fn run_scoped(
    factory: &dyn AnalyzerFactory,
    options: &AnalysisOptions,
    url: &Url,
) -> EngineResult<AnalysisResult> {
    let mut session = AnalyzerSession::acquire(factory, options)?;
    let outcome = session.run(url).await;
    let released = session.release().await;

    match (outcome, released) {
        (Ok(result), Ok(())) => Ok(result),
        (Ok(_), Err(release_err)) => Err(release_err),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            warn!(error = %release_err, "Analyzer release failed after analysis error");
            Err(e)
        }
    }
}
