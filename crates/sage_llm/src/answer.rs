//! 问答边界
//!
//! `TextGenerator` 是对远端模型的最小抽象; `ask` 把它的一切失败
//! 折叠为 `AskOutcome`, 调用方永远拿到可展示的结果。

use std::sync::Arc;

use async_trait::async_trait;
use sage_core::{AskOutcome, ServiceFailure};

use crate::prompt::Prompt;

/// 文本生成服务
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 模型标识 (仅用于日志)
    fn model(&self) -> &str;

    /// 发送 Prompt, 返回原始回复文本
    async fn generate(&self, prompt: &Prompt) -> sage_core::Result<String>;
}

/// 向服务提问, 失败不向上传播
pub async fn ask(generator: &dyn TextGenerator, prompt: &Prompt) -> AskOutcome {
    let start = std::time::Instant::now();

    match generator.generate(prompt).await {
        Ok(reply) => {
            let reply = reply.trim();
            tracing::debug!(
                "{} answered in {:?} ({} chars)",
                generator.model(),
                start.elapsed(),
                reply.len()
            );
            if reply.is_empty() {
                AskOutcome::Empty
            } else {
                AskOutcome::Answered(reply.to_string())
            }
        }
        Err(e) => {
            if e.is_service_failure() {
                tracing::warn!("{} request failed: {}", generator.model(), e);
            } else {
                tracing::error!("{} generator error: {}", generator.model(), e);
            }
            AskOutcome::Failed(ServiceFailure::from(e))
        }
    }
}

/// 可共享的问答客户端
#[derive(Clone)]
pub struct AnswerClient {
    generator: Arc<dyn TextGenerator>,
}

impl AnswerClient {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    pub async fn ask(&self, prompt: &Prompt) -> AskOutcome {
        ask(self.generator.as_ref(), prompt).await
    }
}
