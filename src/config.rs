//! 服务配置管理，进程启动时构建一次，之后只读共享

use std::net::SocketAddr;

/// 未配置 API_KEY 时使用的占位密钥，生产环境必须覆盖
pub const PLACEHOLDER_API_KEY: &str = "your-secret-api-key";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// 默认跨域白名单
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["https://yourdomain.com", "https://www.yourdomain.com"];

/// 服务配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    // 监听地址
    pub host: String,
    // 监听端口
    pub port: u16,
    // 请求头 x-api-key 需匹配的密钥
    pub api_key: String,
    // 允许跨域访问的 Origin 列表（精确匹配）
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: PLACEHOLDER_API_KEY.to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

impl ServerConfig {
    /// 是否仍在使用占位密钥
    pub fn uses_placeholder_key(&self) -> bool {
        self.api_key == PLACEHOLDER_API_KEY
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> ServerConfig {
        ServerConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }

    /// 从进程环境变量读取（PORT / API_KEY / HOST）
    pub fn from_env() -> ServerConfig {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取，缺失或无效时回退默认值
    pub fn from_lookup<F>(lookup: F) -> ServerConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = CustomConfigBuilder::new();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            builder = builder.host(host.trim());
        }

        if let Some(raw) = lookup("PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => builder = builder.port(port),
                Err(_) => tracing::warn!(port = %raw, "Invalid PORT, falling back to {}", DEFAULT_PORT),
            }
        }

        // 空字符串与未设置同等处理
        if let Some(key) = lookup("API_KEY").filter(|k| !k.is_empty()) {
            builder = builder.api_key(key);
        }

        builder.build()
    }
}

/// 配置构建器（链式 API）
#[derive(Debug, Clone)]
pub struct CustomConfigBuilder {
    config: ServerConfig,
}

impl Default for CustomConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// 基于已有配置继续修改
    pub fn from_config(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    /// 整体替换白名单
    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
