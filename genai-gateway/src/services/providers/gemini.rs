//! Gemini AI provider implementation.
//!
//! Calls the `generateContent` method of Google's Generative Language API.

use super::{Contents, FinishReason, Message, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Base URL up to and including the API version, e.g. `.../v1beta`.
    pub api_base: String,
    pub timeout: Duration,
}

/// Gemini content generation provider.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            model,
            method
        )
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        model: &str,
        contents: &Contents,
    ) -> Result<ProviderResponse, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let request = GenerateContentRequest {
            contents: contents.clone().into_messages(),
        };

        tracing::debug!(
            model = %model,
            parts = contents.part_count(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url(model, "generateContent"))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(api_response.into_provider_response())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        // Listing models is the cheapest call that proves the key works
        let url = format!("{}/models", self.config.api_base.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(api_error(status, &body))
        }
    }
}

/// Map a non-2xx response to a provider error, preferring the message from
/// Google's `{"error": {...}}` envelope over the raw body.
fn api_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("Gemini API error {}", status)
            } else {
                format!("Gemini API error {}: {}", status, body.trim())
            }
        });

    if status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::RateLimited(message);
    }

    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Message>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    fn into_provider_response(self) -> ProviderResponse {
        let usage = self.usage_metadata.unwrap_or_default();
        let candidate = self.candidates.into_iter().next();

        let finish_reason = candidate
            .as_ref()
            .map(|c| match c.finish_reason.as_deref() {
                Some("STOP") | None => FinishReason::Complete,
                Some("MAX_TOKENS") => FinishReason::Length,
                Some("SAFETY") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => {
                    FinishReason::ContentFilter
                }
                Some(_) => FinishReason::Other,
            })
            .unwrap_or(FinishReason::ContentFilter);

        // Concatenate every non-thought text part of the first candidate
        let text = candidate.and_then(|c| c.content).and_then(|content| {
            let texts: Vec<String> = content
                .parts
                .into_iter()
                .filter(|p| !p.thought.unwrap_or(false))
                .filter_map(|p| p.text)
                .collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.concat())
            }
        });

        ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::Part;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new(GeminiConfig {
            api_key: "test-key".to_string(),
            api_base: format!("{}/v1beta", server.uri()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn reply(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 7 }
        })
    }

    #[tokio::test]
    async fn bare_prompt_is_sent_as_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Hi there" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("Hello!")))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .generate("gemini-2.5-flash", &Contents::Prompt("Hi there".to_string()))
            .await
            .unwrap();

        assert_eq!(response.text.as_deref(), Some("Hello!"));
        assert_eq!(response.input_tokens, 4);
        assert_eq!(response.output_tokens, 7);
        assert_eq!(response.finish_reason, FinishReason::Complete);
    }

    #[tokio::test]
    async fn inline_data_uses_camel_case_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(body_json(json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "Transcribe the following audio:" },
                        { "inlineData": { "mimeType": "audio/mpeg", "data": "AAEC" } }
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("words")))
            .expect(1)
            .mount(&server)
            .await;

        let contents = Contents::Messages(vec![Message::user(vec![
            Part::text("Transcribe the following audio:"),
            Part::inline_data("audio/mpeg", "AAEC"),
        ])]);

        let response = provider(&server)
            .generate("gemini-2.5-flash", &contents)
            .await
            .unwrap();
        assert_eq!(response.text.as_deref(), Some("words"));
    }

    #[tokio::test]
    async fn text_parts_are_concatenated_and_thoughts_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "Hello, " },
                        { "text": "world" }
                    ]},
                    "finishReason": "MAX_TOKENS"
                }]
            })))
            .mount(&server)
            .await;

        let response = provider(&server)
            .generate("m", &Contents::Prompt("x".to_string()))
            .await
            .unwrap();

        assert_eq!(response.text.as_deref(), Some("Hello, world"));
        assert_eq!(response.finish_reason, FinishReason::Length);
    }

    #[tokio::test]
    async fn blocked_prompt_yields_no_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let response = provider(&server)
            .generate("m", &Contents::Prompt("x".to_string()))
            .await
            .unwrap();

        assert_eq!(response.text, None);
        assert_eq!(response.finish_reason, FinishReason::ContentFilter);
    }

    #[tokio::test]
    async fn error_envelope_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate("m", &Contents::Prompt("x".to_string()))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::Api {
                status: 400,
                message: "API key not valid. Please pass a valid API key.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exhausted"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate("m", &Contents::Prompt("x".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::RateLimited(ref m) if m.contains("quota exhausted")));
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let provider = GeminiProvider::new(GeminiConfig {
            api_key: String::new(),
            api_base: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let err = provider
            .generate("m", &Contents::Prompt("x".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_configured");
    }

    #[tokio::test]
    async fn health_check_lists_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(provider(&server).health_check().await.is_ok());
    }
}
