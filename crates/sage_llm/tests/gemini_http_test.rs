//! Google AI Studio provider 对本地桩服务的端到端测试

use std::io::Read;
use std::thread::JoinHandle;

use sage_core::config::SageConfig;
use sage_core::{AskOutcome, FailureKind, QuestionKind, ScreenSageError};
use sage_llm::{ask, build_prompt, classify, GoogleAiStudioProvider};

/// 桩服务收到的请求
struct Captured {
    url: String,
    api_key: Option<String>,
    body: serde_json::Value,
}

/// 启动只应答一次的桩服务, 返回 base_url
fn stub(status: u16, body: &'static str) -> (String, JoinHandle<Captured>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    let handle = std::thread::spawn(move || {
        let mut request = server.recv().unwrap();

        let api_key = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("x-goog-api-key"))
            .map(|h| h.value.as_str().to_string());
        let mut raw = String::new();
        request.as_reader().read_to_string(&mut raw).unwrap();
        let captured = Captured {
            url: request.url().to_string(),
            api_key,
            body: serde_json::from_str(&raw).unwrap(),
        };

        let response = tiny_http::Response::from_string(body).with_status_code(status);
        request.respond(response).unwrap();
        captured
    });

    (format!("http://{}", addr), handle)
}

fn provider(base_url: &str) -> GoogleAiStudioProvider {
    let mut config = SageConfig::default();
    config.gemini.api_key = Some("test-key".to_string());
    config.gemini.base_url = base_url.to_string();
    config.gemini.timeout_secs = Some(10);
    GoogleAiStudioProvider::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_answer_is_trimmed_and_request_well_formed() {
    let (base, handle) = stub(
        200,
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"\n Correct option: B. Explanation: 2+2=4. \n"}]}}]}"#,
    );

    let text = "What is 2+2? A) 3 B) 4 C) 5 D) 6";
    let prompt = build_prompt(text, classify(text), "");
    let outcome = ask(&provider(&base), &prompt).await;

    assert_eq!(
        outcome,
        AskOutcome::Answered("Correct option: B. Explanation: 2+2=4.".to_string())
    );

    let captured = handle.join().unwrap();
    assert_eq!(
        captured.url,
        "/v1beta/models/gemini-1.5-flash:generateContent"
    );
    assert_eq!(captured.api_key.as_deref(), Some("test-key"));
    assert_eq!(captured.body["contents"][0]["role"], "user");
    assert_eq!(
        captured.body["contents"][0]["parts"][0]["text"],
        prompt.as_str()
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_failure() {
    let (base, handle) = stub(401, r#"{"error":{"message":"API key not valid"}}"#);
    let prompt = build_prompt("Capital of France?", QuestionKind::FreeForm, "");

    let outcome = ask(&provider(&base), &prompt).await;
    handle.join().unwrap();

    match &outcome {
        AskOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::Auth);
            assert!(failure.message.contains("API key not valid"));
        }
        other => panic!("expected auth failure, got {other:?}"),
    }
    assert!(outcome.render().starts_with("⚠️ Error: "));
}

#[tokio::test]
async fn test_rate_limit_maps_to_quota_failure() {
    let (base, handle) = stub(429, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#);
    let prompt = build_prompt("Q", QuestionKind::FreeForm, "");

    let result = provider(&base).complete(&prompt).await;
    handle.join().unwrap();

    assert!(matches!(result, Err(ScreenSageError::LlmQuota(_))));
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let (base, handle) = stub(500, "internal");
    let prompt = build_prompt("Q", QuestionKind::FreeForm, "");

    let outcome = ask(&provider(&base), &prompt).await;
    handle.join().unwrap();

    match outcome {
        AskOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::Status);
            assert!(failure.message.contains("500"));
        }
        other => panic!("expected status failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let (base, handle) = stub(200, "<html>proxy error</html>");
    let prompt = build_prompt("Q", QuestionKind::FreeForm, "");

    let outcome = ask(&provider(&base), &prompt).await;
    handle.join().unwrap();

    assert!(matches!(
        outcome,
        AskOutcome::Failed(ref f) if f.kind == FailureKind::Malformed
    ));
}

#[tokio::test]
async fn test_missing_candidates_is_empty() {
    let (base, handle) = stub(200, r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
    let prompt = build_prompt("Q", QuestionKind::FreeForm, "");

    let outcome = ask(&provider(&base), &prompt).await;
    handle.join().unwrap();

    assert_eq!(outcome, AskOutcome::Empty);
    assert_eq!(outcome.render(), "⚠️ No response from Gemini.");
}

#[tokio::test]
async fn test_unreachable_service_is_transport_failure() {
    // 绑定后立即释放端口, 连接会被拒绝
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let prompt = build_prompt("Q", QuestionKind::FreeForm, "");

    let outcome = ask(&provider(&format!("http://{}", addr)), &prompt).await;
    assert!(matches!(
        outcome,
        AskOutcome::Failed(ref f) if f.kind == FailureKind::Transport
    ));
}
