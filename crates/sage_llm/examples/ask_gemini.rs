//! 不经截图, 直接对一段文本走 题型判定 -> Prompt -> Gemini 流程
//!
//! 用法:
//!   ask_gemini [text] [--context TEXT] [--model MODEL] [--show-prompt]
//!
//! 示例:
//!   ask_gemini "What is 2+2? A) 3 B) 4 C) 5 D) 6"
//!   ask_gemini "Capital of France?" --context "history quiz" --show-prompt
//!
//! 环境变量:
//!   GEMINI_API_KEY    - API Key（从 https://aistudio.google.com/app/apikey 获取）
//!   SCREENSAGE_MODEL  - 模型名称（默认 gemini-1.5-flash）

use sage_core::config::SageConfig;
use sage_llm::{ask, build_prompt, classify, GoogleAiStudioProvider, TextGenerator};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // ── 解析命令行参数 ────────────────────────────────────────────────────────────
    let show_prompt = args.iter().any(|a| a == "--show-prompt");

    let option = |name: &str| {
        args.windows(2)
            .find(|w| w[0] == name)
            .map(|w| w[1].clone())
    };
    let context = option("--context").unwrap_or_default();
    let model = option("--model");

    // text（跳过所有 -- 选项和其值）
    let mut skip_next = false;
    let text = args
        .iter()
        .skip(1)
        .filter(|a| {
            if skip_next {
                skip_next = false;
                return false;
            }
            if *a == "--context" || *a == "--model" {
                skip_next = true;
                return false;
            }
            !a.starts_with("--")
        })
        .cloned()
        .next()
        .unwrap_or_else(|| "What is 2+2? A) 3 B) 4 C) 5 D) 6".to_string());

    // ── 构建 Provider ────────────────────────────────────────────────────────────
    let mut config = SageConfig::load(None).unwrap();
    if let Some(model) = model {
        config.gemini.model = model;
    }
    let provider = match GoogleAiStudioProvider::from_config(&config) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("[错误] {}", e);
            eprintln!();
            eprintln!("获取 API Key: https://aistudio.google.com/app/apikey");
            std::process::exit(1);
        }
    };

    let kind = classify(&text);
    let prompt = build_prompt(&text, kind, &context);

    println!("========================================");
    println!("  ScreenSage Ask");
    println!("========================================");
    println!("  模型: {}", provider.model());
    println!("  题型: {}", kind);
    println!("========================================");
    if show_prompt {
        println!("{}", prompt);
        println!("----------------------------------------");
    }

    let rt = tokio::runtime::Runtime::new().unwrap();
    let outcome = rt.block_on(ask(&provider, &prompt));

    println!("{}", outcome.render());
    if !outcome.is_answered() {
        std::process::exit(1);
    }
}
