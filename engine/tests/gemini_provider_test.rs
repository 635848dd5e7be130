//! Integration tests for the Gemini provider
//!
//! A wiremock server stands in for the Generative Language API.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tutor_engine::config::GeminiConfig;
use tutor_engine::llm::gemini::GeminiProvider;
use tutor_engine::llm::retry::{RetryPolicy, RetryingProvider};
use tutor_engine::llm::{LLMError, LLMProvider, Message, MessageRole};
use tutor_engine::secrets::SecretString;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/models/gemini-2.5-flash-lite:generateContent";

fn provider(server: &MockServer, timeout: Duration) -> GeminiProvider {
    let config = GeminiConfig {
        base_url: server.uri(),
        ..GeminiConfig::default()
    };
    GeminiProvider::new(config, SecretString::new("test-key"), timeout).unwrap()
}

/// Sends response headers, then stalls before the body is complete
async fn stalled_body_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 1024\r\n\r\n{\"candidates\": [",
                    )
                    .await;
                tokio::time::sleep(Duration::from_secs(10)).await;
            });
        }
    });
    format!("http://{}", addr)
}

fn reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_generate_sends_instruction_and_history() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "You are a Czech tutor" }] },
            "contents": [{ "role": "user", "parts": [{ "text": "Ask me a Czech question" }] }],
            "generationConfig": { "temperature": 0.0 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("Kolik je ti let?")))
        .expect(1)
        .mount(&server)
        .await;

    let message = provider(&server, Duration::from_secs(5))
        .generate("You are a Czech tutor", &[Message::human("Ask me a Czech question")])
        .await
        .unwrap();

    assert_eq!(message.role, MessageRole::Assistant);
    assert_eq!(message.content, "Kolik je ti let?");
}

#[tokio::test]
async fn test_multi_part_reply_is_joined() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Dobře! " }, { "text": "Well done." }] }
            }]
        })))
        .mount(&server)
        .await;

    let message = provider(&server, Duration::from_secs(5))
        .generate("sys", &[Message::human("Ahoj")])
        .await
        .unwrap();

    assert_eq!(message.content, "Dobře! Well done.");
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let cases = [
        (429, "rate"),
        (401, "auth"),
        (403, "auth"),
        (400, "invalid"),
        (503, "unavailable"),
    ];

    for (status, kind) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;

        let err = provider(&server, Duration::from_secs(5))
            .generate("sys", &[Message::human("Ahoj")])
            .await
            .unwrap_err();

        let matched = match kind {
            "rate" => matches!(err, LLMError::RateLimitExceeded),
            "auth" => matches!(err, LLMError::AuthenticationFailed(_)),
            "invalid" => matches!(err, LLMError::InvalidRequest(_)),
            _ => matches!(err, LLMError::ProviderUnavailable(_)),
        };
        assert!(matched, "status {} produced {:?}", status, err);
    }
}

#[tokio::test]
async fn test_blank_reply_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("   ")))
        .mount(&server)
        .await;

    let err = provider(&server, Duration::from_secs(5))
        .generate("sys", &[Message::human("Ahoj")])
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::EmptyResponse));
}

#[tokio::test]
async fn test_missing_candidates_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = provider(&server, Duration::from_secs(5))
        .generate("sys", &[Message::human("Ahoj")])
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::ParseError(_)));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = provider(&server, Duration::from_millis(200))
        .generate("sys", &[Message::human("Ahoj")])
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::Timeout));
}

#[tokio::test]
async fn test_stalled_body_times_out() {
    let config = GeminiConfig {
        base_url: stalled_body_server().await,
        ..GeminiConfig::default()
    };
    let provider =
        GeminiProvider::new(config, SecretString::new("test-key"), Duration::from_millis(300))
            .unwrap();

    let err = provider
        .generate("sys", &[Message::human("Ahoj")])
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::Timeout), "got {:?}", err);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_health_check_queries_model() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models/gemini-2.5-flash-lite"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/gemini-2.5-flash-lite"
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(provider(&server, Duration::from_secs(5)).check_health().await);
}

#[tokio::test]
async fn test_health_check_fails_on_rejected_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models/gemini-2.5-flash-lite"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    assert!(!provider(&server, Duration::from_secs(5)).check_health().await);
}

#[tokio::test]
async fn test_retry_recovers_from_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("Ano, správně.")))
        .mount(&server)
        .await;

    let inner: Arc<dyn LLMProvider> = Arc::new(provider(&server, Duration::from_secs(5)));
    let retrying = RetryingProvider::new(inner, RetryPolicy::new(2, Duration::from_millis(10)));

    let message = retrying
        .generate("sys", &[Message::human("Ahoj")])
        .await
        .unwrap();

    assert_eq!(message.content, "Ano, správně.");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
