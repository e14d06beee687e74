//! Gemini AI provider implementation.
//!
//! Implements non-streaming text generation using Google's Gemini API.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the configured model and the given method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            method
        )
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![ContentPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        // Errors are stripped of their URL so nothing request-specific reaches
        // the response envelope.
        let response = self
            .client
            .post(self.api_url("generateContent"))
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        api_response.into_provider_response()
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

impl GenerateContentResponse {
    fn into_provider_response(self) -> Result<ProviderResponse, ProviderError> {
        let usage = self.usage_metadata.unwrap_or_default();
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        let finish_reason = FinishReason::from_api(candidate.finish_reason.as_deref());
        if finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    fn config(base_url: &str) -> GeminiConfig {
        GeminiConfig {
            api_key: Secret::new("test-key".to_string()),
            model: "gemini-2.0-flash".to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Serve `router` on a random local port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_api_url() {
        let provider = GeminiTextProvider::new(config("https://example.test/v1beta/")).unwrap();
        assert_eq!(
            provider.api_url("generateContent"),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Paris"}, {"text": " city"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 2}
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let response = parsed.into_provider_response().unwrap();

        assert_eq!(response.text, "Paris city");
        assert_eq!(response.input_tokens, 12);
        assert_eq!(response.output_tokens, 2);
        assert_eq!(response.finish_reason, FinishReason::Complete);
    }

    #[test]
    fn test_parse_response_safety_block() {
        let raw = json!({"candidates": [{"finishReason": "SAFETY"}]});
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            parsed.into_provider_response(),
            Err(ProviderError::ContentFiltered)
        ));
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            parsed.into_provider_response(),
            Err(ProviderError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_generate_against_stub_server() {
        let router = Router::new().route(
            "/models/:method",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers[API_KEY_HEADER], "test-key");
                let prompt = body["contents"][0]["parts"][0]["text"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "candidates": [{
                        "content": {"parts": [{"text": format!("Echo: {}", prompt)}]},
                        "finishReason": "STOP"
                    }]
                }))
            }),
        );
        let base_url = serve(router).await;

        let provider = GeminiTextProvider::new(config(&base_url)).unwrap();
        let response = provider.generate("hello").await.unwrap();
        assert_eq!(response.text, "Echo: hello");
    }

    #[tokio::test]
    async fn test_generate_maps_rate_limit() {
        let router = Router::new().route(
            "/models/:method",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base_url = serve(router).await;

        let provider = GeminiTextProvider::new(config(&base_url)).unwrap();
        assert!(matches!(
            provider.generate("hello").await,
            Err(ProviderError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_generate_maps_api_error() {
        let router = Router::new().route(
            "/models/:method",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base_url = serve(router).await;

        let provider = GeminiTextProvider::new(config(&base_url)).unwrap();
        match provider.generate("hello").await {
            Err(ProviderError::ApiError(msg)) => assert!(msg.contains("401")),
            other => panic!("expected ApiError, got {:?}", other.map(|r| r.text)),
        }
    }

    #[tokio::test]
    async fn test_health_check_requires_api_key() {
        let mut cfg = config("http://localhost");
        cfg.api_key = Secret::new(String::new());
        let provider = GeminiTextProvider::new(cfg).unwrap();
        assert!(provider.health_check().await.is_err());
    }
}
