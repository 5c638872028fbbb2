//! Google AI Studio Provider 实现
//!
//! 通过 API Key 访问 Google AI Studio (generativelanguage.googleapis.com)
//!
//! URL 格式: `{base_url}/v1beta/models/{model}:{action}`
//! 认证方式: `x-goog-api-key` header

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::answer::TextGenerator;
use crate::prompt::Prompt;
use crate::provider::gemini_common::{compile_gemini_request, parse_gemini_response};
use sage_core::config::{SageConfig, DEFAULT_BASE_URL};
use sage_core::ScreenSageError;

// ── 常量 ────────────────────────────────────────────────────────────────────────
const GOOGLE_AI_STUDIO_API_VERSION: &str = "v1beta";

// ── 数据结构 ────────────────────────────────────────────────────────────────────
/// Google AI Studio provider 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleAiStudioConfig {
    /// Google API Key（从 https://aistudio.google.com/app/apikey 获取）
    pub api_key: String,
    /// 模型，如 "gemini-1.5-flash"
    pub model: String,
    /// 服务根地址 (测试时指向本地桩服务)
    pub base_url: String,
}

pub struct GoogleAiStudioProvider {
    config: GoogleAiStudioConfig,
    client: reqwest::Client,
}

// ── 主实现 ───────────────────────────────────────────────────────────────────────
impl GoogleAiStudioProvider {
    pub fn new(config: GoogleAiStudioConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 以 API key 和模型名称构建
    pub fn from_api_key(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(GoogleAiStudioConfig {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// 由应用配置构建; 缺少 API Key 时报 Config 错误
    pub fn from_config(config: &SageConfig) -> sage_core::Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let gemini = &config.gemini;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = gemini.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            ScreenSageError::Config(format!("google_ai_studio: http client init failed: {}", e))
        })?;

        Ok(Self {
            config: GoogleAiStudioConfig {
                api_key,
                model: gemini.model.clone(),
                base_url: gemini.base_url.trim_end_matches('/').to_string(),
            },
            client,
        })
    }

    /// 构造 API URL
    fn build_url(&self, action: &str) -> String {
        format!(
            "{}/{}/models/{}:{}",
            self.config.base_url, GOOGLE_AI_STUDIO_API_VERSION, self.config.model, action
        )
    }

    /// 非流式生成（generateContent）
    ///
    /// 服务返回合法响应但没有候选文本时得到空串。
    pub async fn complete(&self, prompt: &Prompt) -> sage_core::Result<String> {
        let url = self.build_url("generateContent");
        let body = compile_gemini_request(prompt);

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ScreenSageError::LlmTransport(format!(
                    "google_ai_studio: generateContent request failed: {}",
                    e
                ))
            })?;

        let status = resp.status();
        let raw_text = resp.text().await.map_err(|e| {
            ScreenSageError::LlmTransport(format!(
                "google_ai_studio: generateContent read body failed: {}",
                e
            ))
        })?;

        if !status.is_success() {
            return Err(ScreenSageError::from_status(
                status.as_u16(),
                raw_text.trim(),
            ));
        }

        Ok(parse_gemini_response(&raw_text)?.unwrap_or_default())
    }
}

#[async_trait]
impl TextGenerator for GoogleAiStudioProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &Prompt) -> sage_core::Result<String> {
        self.complete(prompt).await
    }
}

// ── 测试 ─────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let provider = GoogleAiStudioProvider::from_api_key("test-key", "gemini-1.5-flash");
        assert_eq!(
            provider.build_url("generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = SageConfig::default();
        config.gemini.api_key = Some("AIzaSyTestKey".to_string());
        config.gemini.model = "gemini-2.5-pro".to_string();
        config.gemini.base_url = "http://127.0.0.1:9999/".to_string();
        config.gemini.timeout_secs = Some(5);

        let provider = GoogleAiStudioProvider::from_config(&config).unwrap();
        assert_eq!(provider.config.api_key, "AIzaSyTestKey");
        assert_eq!(provider.model(), "gemini-2.5-pro");
        assert_eq!(
            provider.build_url("generateContent"),
            "http://127.0.0.1:9999/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_from_config_without_key() {
        let result = GoogleAiStudioProvider::from_config(&SageConfig::default());
        assert!(matches!(result, Err(ScreenSageError::Config(_))));
    }
}
