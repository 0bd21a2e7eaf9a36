mod gemini_stub;

use std::time::Duration;

use coursegen::config::GeminiConfig;
use coursegen::error::GenerationError;
use coursegen::gateway::{CourseGateway, GeminiClient, TextGenerator, TextRequest};
use coursegen::models::Difficulty;
use gemini_stub::GeminiStub;

fn client(base_url: &str, api_key: Option<&str>) -> GeminiClient {
    GeminiClient::new(&GeminiConfig {
        api_key: api_key.map(str::to_owned),
        model: "gemini-test".into(),
        base_url: base_url.to_owned(),
        timeout: Duration::from_secs(10),
    })
    .unwrap()
}

fn json_request() -> TextRequest {
    TextRequest {
        system_instruction: Some("be an instructor".into()),
        prompt: "make a course".into(),
        json: true,
    }
}

#[tokio::test]
async fn posts_generate_content_with_key_and_returns_text() {
    let stub = GeminiStub::replying_text("{\"ok\":true}");
    let text = client(&stub.base_url, Some("secret"))
        .generate_text(json_request())
        .await
        .unwrap();
    assert_eq!(text, "{\"ok\":true}");

    let requests = stub.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/v1beta/models/gemini-test:generateContent");
    assert_eq!(requests[0].api_key.as_deref(), Some("secret"));
    assert_eq!(
        requests[0].body["systemInstruction"]["parts"][0]["text"],
        "be an instructor"
    );
    assert_eq!(
        requests[0].body["generationConfig"]["responseMimeType"],
        "application/json"
    );
}

#[tokio::test]
async fn quota_errors_are_classified() {
    let stub = GeminiStub::failing(429, "You exceeded your current quota, please check your plan.");
    let err = client(&stub.base_url, Some("k"))
        .generate_text(json_request())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::QuotaExhausted), "{err:?}");
}

#[tokio::test]
async fn plain_429_is_rate_limited() {
    let stub = GeminiStub::failing(429, "Too many requests, slow down.");
    let err = client(&stub.base_url, Some("k"))
        .generate_text(json_request())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::RateLimited), "{err:?}");
    assert!(err.to_string().contains("temporarily busy"));
}

#[tokio::test]
async fn other_upstream_failures_are_generic() {
    let stub = GeminiStub::failing(500, "internal error");
    let err = client(&stub.base_url, Some("k"))
        .generate_text(json_request())
        .await
        .unwrap_err();
    match err {
        GenerationError::Upstream(msg) => assert!(msg.contains("internal error")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn missing_api_key_never_reaches_upstream() {
    let stub = GeminiStub::replying_text("unused");
    let err = client(&stub.base_url, None)
        .generate_text(json_request())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Unconfigured));
    assert!(stub.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_course_json_from_upstream_fails_structurally() {
    let stub = GeminiStub::replying_text("{\"title\": \"Python Programming\", \"modules\": [");
    let gateway = CourseGateway::new(std::sync::Arc::new(client(&stub.base_url, Some("k"))));
    let err = gateway
        .generate("Python Programming", Difficulty::Beginner)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Malformed(_)), "{err:?}");
    assert_eq!(stub.requests.lock().unwrap().len(), 1);
}
