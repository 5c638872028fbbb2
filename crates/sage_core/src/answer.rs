//! 题型与答案

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScreenSageError;

/// 未识别到文本时展示的固定答案
pub const NO_TEXT_DETECTED: &str = "No text detected.";

/// 所有占位答案共用的警告标记
pub const WARNING_TOKEN: &str = "⚠️";

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    /// 选择题 (含 A) B) C) D) 选项标记)
    MultipleChoice,
    /// 开放问答
    FreeForm,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleChoice => f.write_str("multiple-choice"),
            Self::FreeForm => f.write_str("free-form"),
        }
    }
}

/// 远端服务失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Transport,
    Auth,
    Quota,
    Status,
    Malformed,
}

/// 远端服务失败 (已在 Answer 边界捕获, 不再向上传播)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<ScreenSageError> for ServiceFailure {
    fn from(err: ScreenSageError) -> Self {
        let kind = match &err {
            ScreenSageError::LlmAuth(_) => FailureKind::Auth,
            ScreenSageError::LlmQuota(_) => FailureKind::Quota,
            ScreenSageError::LlmStatus { .. } => FailureKind::Status,
            ScreenSageError::LlmMalformed(_) | ScreenSageError::Serialization(_) => {
                FailureKind::Malformed
            }
            _ => FailureKind::Transport,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// 单次问答调用的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AskOutcome {
    /// 服务返回的文本 (已去除首尾空白)
    Answered(String),
    /// 服务未返回任何文本
    Empty,
    /// 服务调用失败
    Failed(ServiceFailure),
}

impl AskOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    pub fn render(&self) -> String {
        match self {
            Self::Answered(text) => text.clone(),
            Self::Empty => format!("{WARNING_TOKEN} No response from Gemini."),
            Self::Failed(failure) => format!("{WARNING_TOKEN} Error: {}", failure.message),
        }
    }
}

/// 最终展示给用户的答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    /// 截图中没有文本, 未调用远端服务
    NoTextDetected,
    /// 远端服务的回复 (或其失败占位)
    Reply(AskOutcome),
}

impl Answer {
    pub fn render(&self) -> String {
        match self {
            Self::NoTextDetected => NO_TEXT_DETECTED.to_string(),
            Self::Reply(outcome) => outcome.render(),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
