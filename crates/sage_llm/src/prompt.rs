//! Prompt 构建器
//!
//! 固定模板 (静态片段) 与截图文本/用户上下文 (动态片段) 拼接成最终 Prompt。
//! 截图文本原样嵌入, 不做长度校验也不做转义。

use std::fmt;

use sage_core::QuestionKind;
use serde::{Deserialize, Serialize};

const MULTIPLE_CHOICE_HEAD: &str = "You are solving a multiple-choice question.\nText captured:\n";
const MULTIPLE_CHOICE_TAIL: &str = "\n\nInstructions: Pick the most likely correct option (A, B, C, or D) and give a brief explanation.\nAnswer format: \"Correct option: X. Explanation: ...\".\n";

const FREE_FORM_HEAD: &str = "Captured text:\n";
const FREE_FORM_TAIL: &str = "\n\nPlease answer the question briefly and clearly.";

/// 用户上下文与模板之间的分隔 (空行)
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Prompt 片段类型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PromptSegment {
    /// 模板片段
    Static(&'static str),
    /// 截图文本与用户上下文
    Dynamic(String),
}

impl PromptSegment {
    fn as_str(&self) -> &str {
        match self {
            Self::Static(s) => s,
            Self::Dynamic(s) => s,
        }
    }
}

/// 最终 Prompt (只读, 被问答服务消费一次)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    text: String,
    kind: QuestionKind,
}

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Prompt 构建器
#[derive(Debug)]
pub struct PromptBuilder {
    kind: QuestionKind,
    context: Option<String>,
    captured: String,
}

impl PromptBuilder {
    pub fn new(kind: QuestionKind) -> Self {
        Self {
            kind,
            context: None,
            captured: String::new(),
        }
    }

    /// 用户上下文; 去除首尾空白后为空则忽略
    pub fn context(mut self, context: &str) -> Self {
        let trimmed = context.trim();
        self.context = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// 截图文本 (原样嵌入)
    pub fn captured(mut self, text: impl Into<String>) -> Self {
        self.captured = text.into();
        self
    }

    fn segments(&self) -> Vec<PromptSegment> {
        let mut segments = Vec::with_capacity(5);

        if let Some(context) = &self.context {
            segments.push(PromptSegment::Dynamic(context.clone()));
            segments.push(PromptSegment::Static(CONTEXT_SEPARATOR));
        }

        let (head, tail) = match self.kind {
            QuestionKind::MultipleChoice => (MULTIPLE_CHOICE_HEAD, MULTIPLE_CHOICE_TAIL),
            QuestionKind::FreeForm => (FREE_FORM_HEAD, FREE_FORM_TAIL),
        };
        segments.push(PromptSegment::Static(head));
        segments.push(PromptSegment::Dynamic(self.captured.clone()));
        segments.push(PromptSegment::Static(tail));

        segments
    }

    /// 构建最终 Prompt
    pub fn build(&self) -> Prompt {
        let segments = self.segments();
        let text: String = segments.iter().map(PromptSegment::as_str).collect();

        let dynamic_len: usize = segments
            .iter()
            .filter_map(|s| match s {
                PromptSegment::Dynamic(s) => Some(s.len()),
                _ => None,
            })
            .sum();
        tracing::debug!(
            kind = %self.kind,
            total = text.len(),
            dynamic = dynamic_len,
            "prompt built"
        );

        Prompt {
            text,
            kind: self.kind,
        }
    }
}

/// 由截图文本、题型与用户上下文构建 Prompt
pub fn build_prompt(text: &str, kind: QuestionKind, context: &str) -> Prompt {
    PromptBuilder::new(kind)
        .context(context)
        .captured(text)
        .build()
}
