//! LLM Provider 子模块

pub mod gemini_common;
pub mod google_ai_studio;

pub use google_ai_studio::{GoogleAiStudioConfig, GoogleAiStudioProvider};
