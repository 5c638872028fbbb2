//! Gemini 方言公共代码
//!
//! - `compile_gemini_request`: 将 Prompt 编译为 Gemini JSON 请求体
//! - `parse_gemini_response`: 解析 generateContent 非流式响应

use serde_json::Value;

use crate::prompt::Prompt;
use sage_core::ScreenSageError;

/// 将 Prompt 编译为 Gemini JSON 请求体
///
/// 截图问答是单轮对话: 整段 Prompt 作为一条 role 为 "user" 的消息,
/// parts: [{ "text": "..." }]
pub fn compile_gemini_request(prompt: &Prompt) -> Value {
    serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt.as_str() }]
        }]
    })
}

/// 解析 generateContent 响应
///
/// 拼接首个候选的所有 text part; 响应是合法 JSON 但没有候选文本
/// (例如被安全策略拦截) 时返回 `None`, 非 JSON 报 `LlmMalformed`。
pub fn parse_gemini_response(raw: &str) -> sage_core::Result<Option<String>> {
    let json: Value = serde_json::from_str(raw).map_err(|e| {
        ScreenSageError::LlmMalformed(format!(
            "gemini: generateContent decode response failed: {}",
            e
        ))
    })?;

    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    let Some(parts) = parts else {
        if let Some(reason) = json
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(|r| r.as_str())
        {
            tracing::warn!("gemini: prompt blocked ({})", reason);
        }
        return Ok(None);
    };

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    Ok((!text.is_empty()).then_some(text))
}
