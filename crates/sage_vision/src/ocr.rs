//! OCR 模块
//!
//! 文本提取器只承诺 `image -> text`; 引擎失败统一报 `Extraction` 错误,
//! 由调用方决定如何展示。

use std::io::Cursor;
use std::process::Stdio;

use async_trait::async_trait;
use image::DynamicImage;
use sage_core::config::OcrSettings;
use sage_core::ScreenSageError;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// 文本提取器特征
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// 识别图像中的文本 (可能为空串)
    async fn extract_text(&self, image: &DynamicImage) -> sage_core::Result<String>;
}

/// tesseract 命令行引擎
///
/// 以 `tesseract stdin stdout -l <lang>` 方式运行, PNG 经 stdin 写入。
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    command: String,
    language: String,
    psm: Option<u8>,
}

impl TesseractExtractor {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            command: settings.command.clone(),
            language: settings.language.clone(),
            psm: settings.psm,
        }
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
        ];
        if let Some(psm) = self.psm {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        args
    }
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self::new(&OcrSettings::default())
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    async fn extract_text(&self, image: &DynamicImage) -> sage_core::Result<String> {
        let start = std::time::Instant::now();
        let png = encode_png(image)?;

        let mut child = Command::new(&self.command)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ScreenSageError::Extraction(format!("failed to start `{}`: {}", self.command, e))
            })?;

        // tesseract 先读完整张图再输出, 先写后读不会互相阻塞
        let fed = match child.stdin.take() {
            Some(mut stdin) => {
                let written = stdin.write_all(&png).await;
                drop(stdin);
                written
            }
            None => Ok(()),
        };

        let output = child.wait_with_output().await.map_err(|e| {
            ScreenSageError::Extraction(format!("{} did not finish: {}", self.command, e))
        })?;

        // 进程提前退出时写入会报 broken pipe, 以退出状态为准
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScreenSageError::Extraction(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }
        fed.map_err(|e| {
            ScreenSageError::Extraction(format!("failed to feed image to {}: {}", self.command, e))
        })?;

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::debug!(
            "OCR completed in {:?}, extracted {} chars",
            start.elapsed(),
            text.len()
        );
        Ok(text)
    }
}

fn encode_png(image: &DynamicImage) -> sage_core::Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| ScreenSageError::Extraction(format!("failed to encode image to PNG: {e}")))?;
    Ok(buffer.into_inner())
}

/// 固定输出的提取器 (演示与测试用)
#[derive(Debug, Clone)]
pub struct StaticExtractor {
    response: Result<String, String>,
}

impl StaticExtractor {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self::with_text("")
    }

    /// 模拟 OCR 引擎不可用
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            response: Err(reason.into()),
        }
    }
}

#[async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract_text(&self, _image: &DynamicImage) -> sage_core::Result<String> {
        self.response.clone().map_err(ScreenSageError::Extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn blank() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::new(8, 8))
    }

    #[test]
    fn test_default_args() {
        let extractor = TesseractExtractor::default();
        assert_eq!(extractor.args(), vec!["stdin", "stdout", "-l", "eng"]);
    }

    #[test]
    fn test_psm_args() {
        let extractor = TesseractExtractor::new(&OcrSettings {
            command: "tesseract".into(),
            language: "eng+chi_sim".into(),
            psm: Some(6),
        });
        assert_eq!(
            extractor.args(),
            vec!["stdin", "stdout", "-l", "eng+chi_sim", "--psm", "6"]
        );
    }

    #[test]
    fn test_png_encoding() {
        let png = encode_png(&blank()).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_missing_engine_is_extraction_error() {
        let extractor = TesseractExtractor::new(&OcrSettings {
            command: "screensage-no-such-ocr-binary".into(),
            ..OcrSettings::default()
        });
        let result = extractor.extract_text(&blank()).await;
        assert!(matches!(result, Err(ScreenSageError::Extraction(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_extraction_error() {
        // `cat stdin stdout -l eng` 找不到这些文件, 以非零状态退出
        let extractor = TesseractExtractor::new(&OcrSettings {
            command: "cat".into(),
            ..OcrSettings::default()
        });
        match extractor.extract_text(&blank()).await {
            Err(ScreenSageError::Extraction(message)) => {
                assert!(message.contains("exited with"), "{message}")
            }
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[tokio::test]
    #[ignore = "requires tesseract on PATH"]
    async fn test_real_tesseract_blank_image() {
        let text = TesseractExtractor::default()
            .extract_text(&blank())
            .await
            .unwrap();
        assert!(text.trim().is_empty());
    }

    #[test]
    fn test_static_extractor() {
        let text = tokio_test::block_on(StaticExtractor::with_text("A) 1").extract_text(&blank()));
        assert_eq!(text.unwrap(), "A) 1");

        let failed = tokio_test::block_on(StaticExtractor::failing("offline").extract_text(&blank()));
        assert!(matches!(failed, Err(ScreenSageError::Extraction(_))));
    }
}
