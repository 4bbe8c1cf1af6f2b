//! 日志初始化
//! tracing-subscriber 默认开启 tracing-log，检测库的 log 记录一并输出

use tracing_subscriber::EnvFilter;

/// 安装全局 fmt 订阅者；RUST_LOG 优先于传入的默认过滤规则
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
