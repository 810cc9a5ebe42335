//! 脚本站点错误类型
//!
//! 区分 "站点改版" (Parse) 与 "网络故障" (Network)，两者都不会自动重试。

use thiserror::Error;

use crate::error::ErrorKind;

/// 列出版本、抓取代码或元数据时可能发生的错误
#[derive(Error, Debug)]
pub enum SourceError {
    /// 脚本 ID 格式不正确 (在任何网络请求之前检查)
    #[error("无效的脚本 ID: {0}")]
    InvalidScriptId(String),

    /// 脚本或版本在站点上不存在
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 页面已获取，但结构与预期模式不匹配
    #[error("页面结构不匹配: {0}")]
    Parse(String),

    /// 传输层错误
    #[error("网络错误: {0}")]
    Network(String),
}

impl SourceError {
    /// Create an InvalidScriptId error
    pub fn invalid_script_id(input: impl Into<String>) -> Self {
        Self::InvalidScriptId(input.into())
    }

    /// Create a NotFound error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a Parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a Network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidScriptId(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Network(_) => ErrorKind::Network,
        }
    }
}
