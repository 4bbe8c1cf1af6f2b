//! 通用工具模块
#[cfg(feature = "embedded-engine")]
pub mod header_converter;

#[cfg(feature = "embedded-engine")]
pub use self::header_converter::HeaderConverter;
