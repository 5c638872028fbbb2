//! # sage_llm - ScreenSage LLM Layer
//!
//! 题型判定、Prompt 构建与远端问答服务 (Gemini) 调用。
//! 远端失败在 `answer::ask` 边界被转换为 `AskOutcome::Failed`, 不再向上传播。

pub mod answer;
pub mod classify;
pub mod prompt;
pub mod provider;

pub use answer::{ask, AnswerClient, TextGenerator};
pub use classify::classify;
pub use prompt::{build_prompt, Prompt, PromptBuilder};
pub use provider::GoogleAiStudioProvider;

pub use sage_core::{Result, ScreenSageError};
