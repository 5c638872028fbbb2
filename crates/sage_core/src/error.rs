//! 全局错误处理机制

use thiserror::Error;

/// ScreenSage 统一错误类型
#[derive(Error, Debug)]
pub enum ScreenSageError {
    #[error("Screen capture error: {0}")]
    Capture(String),

    #[error("Text extraction error: {0}")]
    Extraction(String),

    #[error("LLM transport error: {0}")]
    LlmTransport(String),

    #[error("LLM authentication error: {0}")]
    LlmAuth(String),

    #[error("LLM quota exceeded: {0}")]
    LlmQuota(String),

    #[error("LLM service returned {status}: {body}")]
    LlmStatus { status: u16, body: String },

    #[error("LLM response malformed: {0}")]
    LlmMalformed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A capture cycle is already in flight")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScreenSageError {
    /// 按 HTTP 状态码归类远端服务错误
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::LlmAuth(format!("{status}: {body}")),
            429 => Self::LlmQuota(format!("{status}: {body}")),
            _ => Self::LlmStatus { status, body },
        }
    }

    /// 是否属于远端问答服务的失败 (在 Answer 边界被吞掉的那一类)
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            Self::LlmTransport(_)
                | Self::LlmAuth(_)
                | Self::LlmQuota(_)
                | Self::LlmStatus { .. }
                | Self::LlmMalformed(_)
        )
    }
}

/// 统一 Result 类型别名
pub type Result<T> = std::result::Result<T, ScreenSageError>;
