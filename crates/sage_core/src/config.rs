//! 运行配置
//!
//! 加载顺序: 内置默认值 -> 可选 JSON 文件 -> 环境变量覆盖。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::region::ClampPolicy;

/// Gemini API Key 环境变量
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
/// 模型覆盖环境变量
pub const ENV_MODEL: &str = "SCREENSAGE_MODEL";
/// tesseract 可执行文件路径覆盖
pub const ENV_TESSERACT: &str = "SCREENSAGE_TESSERACT";
/// 配置文件路径
pub const ENV_CONFIG: &str = "SCREENSAGE_CONFIG";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CAPTURE_WIDTH: u32 = 900;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 400;

/// 顶层配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SageConfig {
    pub gemini: GeminiSettings,
    pub ocr: OcrSettings,
    pub capture: CaptureSettings,
}

/// Gemini 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// API Key (通常来自环境变量, 不建议写进配置文件)
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// 请求超时; 为空时沿用传输层默认行为
    pub timeout_secs: Option<u64>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

/// OCR 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// tesseract 可执行文件
    pub command: String,
    /// 识别语言, 如 "eng" / "eng+chi_sim"
    pub language: String,
    /// 页面分割模式 (--psm)
    pub psm: Option<u8>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            language: "eng".to_string(),
            psm: None,
        }
    }
}

/// 截图区域配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub clamp: ClampPolicy,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
            clamp: ClampPolicy::TopLeft,
        }
    }
}

impl SageConfig {
    /// 从 JSON 文件读取 (缺省字段取默认值)
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 完整加载流程: 文件 (可选) + 进程环境变量
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let env_path = std::env::var(ENV_CONFIG).ok();
        let path = path.or_else(|| env_path.as_deref().map(Path::new));

        let mut config = match path {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// 用给定的查找函数应用环境变量覆盖
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY) {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            self.gemini.model = model;
        }
        if let Some(command) = non_empty(ENV_TESSERACT) {
            self.ocr.command = command;
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(crate::ScreenSageError::Config(format!(
                "capture size must be positive, got {}x{}",
                self.capture.width, self.capture.height
            )));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(crate::ScreenSageError::Config(
                "gemini.model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// 取 API Key; 未配置时报 Config 错误
    pub fn require_api_key(&self) -> crate::Result<&str> {
        self.gemini
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                crate::ScreenSageError::Config(format!(
                    "no Gemini API key configured; set {ENV_API_KEY}"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_overlay_constants() {
        let config = SageConfig::default();
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.capture.width, 900);
        assert_eq!(config.capture.height, 400);
        assert_eq!(config.capture.clamp, ClampPolicy::TopLeft);
        assert!(config.gemini.timeout_secs.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SageConfig =
            serde_json::from_str(r#"{ "capture": { "clamp": "contain" }, "ocr": { "psm": 6 } }"#)
                .unwrap();
        assert_eq!(config.capture.clamp, ClampPolicy::Contain);
        assert_eq!(config.capture.width, 900);
        assert_eq!(config.ocr.psm, Some(6));
        assert_eq!(config.ocr.command, "tesseract");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_KEY, "AIzaTest"),
            (ENV_MODEL, "gemini-2.5-flash"),
            (ENV_TESSERACT, "   "),
        ]);
        let mut config = SageConfig::default();
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.require_api_key().unwrap(), "AIzaTest");
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        // 空白值不覆盖
        assert_eq!(config.ocr.command, "tesseract");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = SageConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(crate::ScreenSageError::Config(_))
        ));
    }

    #[test]
    fn test_zero_capture_size_rejected() {
        let mut config = SageConfig::default();
        config.capture.height = 0;
        assert!(config.validate().is_err());
    }
}
