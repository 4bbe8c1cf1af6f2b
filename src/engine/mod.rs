//! 检测引擎接口：外部技术检测库的生命周期抽象
//! create -> initialize -> open -> analyze -> release
pub mod options;
pub mod session;
#[cfg(feature = "embedded-engine")]
pub mod embedded;

use async_trait::async_trait;
use url::Url;

use crate::error::EngineResult;

// 导出核心接口
pub use self::options::AnalysisOptions;
pub use self::session::{run_scoped, AnalyzerSession};
#[cfg(feature = "embedded-engine")]
pub use self::embedded::EmbeddedAnalyzerFactory;

/// 引擎输出，服务端不解析其结构，原样返回
pub type AnalysisResult = serde_json::Value;

/// 引擎工厂：每个请求创建一个全新的分析器实例
pub trait AnalyzerFactory: Send + Sync {
    /// 用合并后的选项创建分析器，选项非法时返回错误
    fn create(&self, options: &AnalysisOptions) -> EngineResult<Box<dyn Analyzer>>;
}

/// 单次会话持有的分析器
#[async_trait]
pub trait Analyzer: Send {
    async fn initialize(&mut self) -> EngineResult<()>;

    /// 打开目标站点，返回可分析的站点句柄
    async fn open(&mut self, url: &Url) -> EngineResult<Box<dyn Site>>;

    /// 释放全部资源，每个创建出的分析器必须调用且仅调用一次
    async fn release(&mut self) -> EngineResult<()>;
}

/// 已打开的目标站点
#[async_trait]
pub trait Site: Send {
    async fn analyze(&mut self) -> EngineResult<AnalysisResult>;
}
