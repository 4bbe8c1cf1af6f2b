//! 分析选项：调用方选项浅合并到默认值之上
//! 未知键原样透传给引擎

use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::{EngineError, EngineResult};

pub const DEFAULT_DEBUG: bool = false;
pub const DEFAULT_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_URLS: u64 = 1;
pub const DEFAULT_MAX_WAIT_MS: u64 = 10_000;
pub const DEFAULT_RECURSIVE: bool = false;

/// 单次分析的有效配置
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisOptions(Map<String, Value>);

impl Default for AnalysisOptions {
    fn default() -> Self {
        let mut map = Map::new();
        map.insert("debug".into(), Value::Bool(DEFAULT_DEBUG));
        map.insert("delay".into(), Value::from(DEFAULT_DELAY_MS));
        map.insert("maxUrls".into(), Value::from(DEFAULT_MAX_URLS));
        map.insert("maxWait".into(), Value::from(DEFAULT_MAX_WAIT_MS));
        map.insert("recursive".into(), Value::Bool(DEFAULT_RECURSIVE));
        Self(map)
    }
}

impl AnalysisOptions {
    /// 调用方的键总是覆盖默认值（浅合并，不递归）
    pub fn merged(overrides: Option<Map<String, Value>>) -> Self {
        let mut options = Self::default();
        if let Some(overrides) = overrides {
            options.0.extend(overrides);
        }
        options
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn debug(&self) -> EngineResult<bool> {
        self.bool_or("debug", DEFAULT_DEBUG)
    }

    pub fn recursive(&self) -> EngineResult<bool> {
        self.bool_or("recursive", DEFAULT_RECURSIVE)
    }

    pub fn delay(&self) -> EngineResult<Duration> {
        self.millis_or("delay", DEFAULT_DELAY_MS)
    }

    pub fn max_wait(&self) -> EngineResult<Duration> {
        self.millis_or("maxWait", DEFAULT_MAX_WAIT_MS)
    }

    pub fn max_urls(&self) -> EngineResult<u64> {
        self.u64_or("maxUrls", DEFAULT_MAX_URLS)
    }

    pub fn user_agent(&self) -> EngineResult<Option<&str>> {
        match self.present("userAgent") {
            None => Ok(None),
            Some(Value::String(ua)) => Ok(Some(ua.as_str())),
            Some(_) => Err(invalid("userAgent", "expected a string")),
        }
    }

    /// 额外请求头，值必须为字符串
    pub fn headers(&self) -> EngineResult<Option<&Map<String, Value>>> {
        match self.present("headers") {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(invalid("headers", "expected an object")),
        }
    }

    // null 视为未设置，回退默认值
    fn present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn bool_or(&self, key: &str, default: bool) -> EngineResult<bool> {
        match self.present(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(invalid(key, "expected a boolean")),
        }
    }

    fn u64_or(&self, key: &str, default: u64) -> EngineResult<u64> {
        let Some(value) = self.present(key) else {
            return Ok(default);
        };
        if let Some(n) = value.as_u64() {
            return Ok(n);
        }
        match value.as_f64() {
            Some(f) if f.is_finite() && f >= 0.0 => Ok(f as u64),
            _ => Err(invalid(key, "expected a non-negative number")),
        }
    }

    fn millis_or(&self, key: &str, default: u64) -> EngineResult<Duration> {
        self.u64_or(key, default).map(Duration::from_millis)
    }
}

fn invalid(key: &str, reason: &str) -> EngineError {
    EngineError::InvalidOption {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
