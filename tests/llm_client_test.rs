//! Integration tests for the chat-completions client and live provider
//!
//! Tests HTTP behavior using wiremock for request/response mocking.

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use journey_funnel_mcp::config::{LlmConfig, RequestConfig};
use journey_funnel_mcp::error::LlmError;
use journey_funnel_mcp::funnel::normalizer::normalize;
use journey_funnel_mcp::funnel::{FallbackKind, Step};
use journey_funnel_mcp::llm::{ChatMessage, ChatRequest, LlmClient};
use journey_funnel_mcp::suggestions::{LiveProvider, SuggestionSource};

fn llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        model: "gpt-test".to_string(),
        temperature: 0.2,
        max_tokens: 500,
    }
}

fn request_config(max_retries: u32) -> RequestConfig {
    RequestConfig {
        timeout_ms: 5000,
        max_retries,
        retry_delay_ms: 10,
    }
}

/// Create a test client pointing to mock server
fn create_test_client(base_url: &str, max_retries: u32) -> LlmClient {
    LlmClient::new(&llm_config(base_url), request_config(max_retries))
        .expect("Failed to create client")
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-123",
        "model": "gpt-test",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 80, "total_tokens": 200 }
    })
}

fn frameworks(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod client_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_chat() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(body_partial_json(json!({ "model": "gpt-test" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("hello")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 0);
        let request = ChatRequest::new("gpt-test", vec![ChatMessage::user("hi")]);
        let response = client.chat(request).await;

        assert!(response.is_ok(), "Chat should succeed: {:?}", response.err());
        let response = response.unwrap();
        assert_eq!(response.content(), Some("hello"));
        assert_eq!(response.usage.unwrap().total_tokens, Some(200));
    }

    #[tokio::test]
    async fn test_server_error_exhausts_retries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 2);
        let request = ChatRequest::new("gpt-test", vec![ChatMessage::user("hi")]);
        let err = client.chat(request).await.unwrap_err();

        match err {
            LlmError::Unavailable { message, retries } => {
                assert_eq!(retries, 3);
                assert!(message.contains("500"), "unexpected message: {}", message);
            }
            other => panic!("Expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("second")))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 1);
        let request = ChatRequest::new("gpt-test", vec![ChatMessage::user("hi")]);
        let response = client.chat(request).await.unwrap();
        assert_eq!(response.content(), Some("second"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 0);
        let request = ChatRequest::new("gpt-test", vec![ChatMessage::user("hi")]);
        let err = client.chat(request).await.unwrap_err();

        match err {
            LlmError::Unavailable { message, .. } => {
                assert!(message.contains("Failed to parse response"));
            }
            other => panic!("Expected Unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = create_test_client("http://localhost:9999/", 0);
        assert_eq!(client.base_url(), "http://localhost:9999");
    }
}

#[cfg(test)]
mod live_provider_tests {
    use super::*;

    fn provider(base_url: &str) -> LiveProvider {
        LiveProvider::new(&llm_config(base_url), request_config(0)).unwrap()
    }

    #[tokio::test]
    async fn test_live_suggestions_parsed() {
        let mock_server = MockServer::start().await;
        let content = r#"```json
{"assessments": [
  {"stepIndex": 0, "frameworks": {
    "PAS": {"suggestion": "Name the pain", "reasoning": "Users hesitate", "confidence": 0.9, "estimated_uplift_pp": 4.5},
    "Fogg": {"suggestion": "Add a nudge", "reasoning": "Low trigger", "confidence": 0.7, "estimated_uplift_pp": 2.0, "motivation_score": 4, "trigger_score": 2}
  }}
]}
```"#;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({ "temperature": 0.2, "max_tokens": 500 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let steps = vec![Step::new(0.6), Step::new(0.5)];
        let batch = provider(&mock_server.uri())
            .fetch(&steps, &[0, 1], &frameworks(&["PAS", "Fogg"]))
            .await;

        assert_eq!(batch.policy.kind, FallbackKind::Standard);
        assert_eq!(batch.table.len(), 2);
        let pas = batch.table.get(0, "PAS").unwrap();
        assert_eq!(pas.framework, "PAS");
        assert_eq!(pas.estimated_uplift_pp, 4.5);
        let fogg = batch.table.fogg(0, "Fogg").unwrap();
        assert_eq!(fogg.motivation_score, Some(4.0));
        assert!(batch.table.step(1).is_none());
    }

    #[tokio::test]
    async fn test_live_failure_uses_error_fallback() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&mock_server)
            .await;

        let steps = vec![Step::new(0.6), Step::new(0.5)];
        let requested = frameworks(&["AIDA"]);
        let batch = provider(&mock_server.uri())
            .fetch(&steps, &[0, 1], &requested)
            .await;

        assert_eq!(batch.policy.kind, FallbackKind::Error);
        assert!(batch.table.is_empty());

        let table = normalize(&steps, &requested, &batch.table, &batch.policy).unwrap();
        assert_eq!(table.len(), 2);
        let record = table.get(1, "AIDA").unwrap();
        assert_eq!(record.confidence, 0.5);
        assert_eq!(record.estimated_uplift_pp, 1.0);
        assert!(record.suggestion.starts_with("Error generating AIDA suggestion"));
    }

    #[tokio::test]
    async fn test_unparseable_completion_uses_error_fallback() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion("I can't do that right now.")),
            )
            .mount(&mock_server)
            .await;

        let steps = vec![Step::new(0.6)];
        let requested = frameworks(&["SCARF"]);
        let batch = provider(&mock_server.uri())
            .fetch(&steps, &[0], &requested)
            .await;

        assert_eq!(batch.policy.kind, FallbackKind::Error);
        assert!(batch.table.is_empty());
        let table = normalize(&steps, &requested, &batch.table, &batch.policy).unwrap();
        assert!(table.contains(0, "SCARF"));
    }

    #[tokio::test]
    async fn test_empty_funnel_skips_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
            .expect(0)
            .mount(&mock_server)
            .await;

        let batch = provider(&mock_server.uri())
            .fetch(&[], &[], &frameworks(&["PAS"]))
            .await;

        assert!(batch.table.is_empty());
        assert_eq!(provider(&mock_server.uri()).name(), "live");
    }
}
