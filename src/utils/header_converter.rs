//! Header格式转换工具
//! 调用方 options.headers（JSON 对象）与 HeaderMap 之间的转换

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// Header 数量上限
const MAX_HEADERS: usize = 100;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 将 JSON 对象转换为 HeaderMap，值必须为字符串
    pub fn from_json(headers: &Map<String, Value>) -> EngineResult<HeaderMap> {
        if headers.len() > MAX_HEADERS {
            return Err(invalid(format!("at most {} headers are allowed", MAX_HEADERS)));
        }

        let mut map = HeaderMap::with_capacity(headers.len());
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| invalid(format!("invalid header name '{}'", key)))?;
            let raw = value
                .as_str()
                .ok_or_else(|| invalid(format!("header '{}' must be a string", key)))?;
            let value = HeaderValue::from_str(raw)
                .map_err(|_| invalid(format!("invalid value for header '{}'", key)))?;
            map.append(name, value);
        }

        Ok(map)
    }

    /// 将HeaderMap转换为HashMap<String, Vec<String>>，非 ASCII 值丢弃
    pub fn to_hashmap(header_map: &HeaderMap) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::with_capacity(header_map.keys_len());

        for (key, value) in header_map.iter() {
            match value.to_str() {
                Ok(v) => map.entry(key.as_str().to_string()).or_default().push(v.to_string()),
                Err(_) => warn!(header = %key, "Dropping non-ASCII header value"),
            }
        }

        map
    }
}

fn invalid(reason: String) -> EngineError {
    EngineError::InvalidOption {
        key: "headers".to_string(),
        reason,
    }
}
