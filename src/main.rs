//! rswappalyzer-server 命令行入口
//! 配置优先级：命令行参数 > 环境变量 > 默认值

use clap::Parser;
use std::sync::Arc;
use tracing::info;

use rswappalyzer_server::config::{ConfigManager, CustomConfigBuilder};
use rswappalyzer_server::logging::init_tracing;
use rswappalyzer_server::{serve, EmbeddedAnalyzerFactory, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "rswappalyzer-server", version, about = "HTTP API for rswappalyzer technology detection")]
struct Cli {
    /// 监听地址（默认读取 HOST，否则 0.0.0.0）
    #[arg(long)]
    host: Option<String>,

    /// 监听端口（默认读取 PORT，否则 3000）
    #[arg(short, long)]
    port: Option<u16>,

    /// x-api-key 需匹配的密钥（默认读取 API_KEY）
    #[arg(long)]
    api_key: Option<String>,

    /// 允许跨域的 Origin，可重复指定；不指定时使用内置白名单
    #[arg(long = "allowed-origin", value_name = "ORIGIN")]
    allowed_origins: Vec<String>,

    /// 默认日志过滤规则（RUST_LOG 优先）
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 启动时不预加载规则库
    #[arg(long)]
    lazy_rules: bool,
}

impl Cli {
    /// 环境变量打底，命令行参数覆盖
    fn into_config(self) -> ServerConfig {
        let mut builder = CustomConfigBuilder::from_config(ConfigManager::from_env());

        if let Some(host) = self.host {
            builder = builder.host(host);
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(key) = self.api_key.filter(|k| !k.is_empty()) {
            builder = builder.api_key(key);
        }
        if !self.allowed_origins.is_empty() {
            builder = builder.allowed_origins(self.allowed_origins);
        }

        builder.build()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let lazy_rules = cli.lazy_rules;
    let config = cli.into_config();

    let factory = EmbeddedAnalyzerFactory::new();
    if !lazy_rules {
        let preloader = factory.clone();
        tokio::task::spawn_blocking(move || preloader.preload()).await??;
        info!("Rule library loaded");
    }

    serve(config, Arc::new(factory)).await?;
    Ok(())
}
