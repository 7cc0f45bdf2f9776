//! Generative Language API HTTP client

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

use super::AnswerService;
use super::types::*;

/// Client for `models/{model}:generateContent`
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.llm.timeout_secs))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            api_key: config.llm.api_key.clone(),
            model: config.llm.model.clone(),
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create with custom base URL (for testing or proxies)
    pub fn with_base_url(config: &Config, base_url: impl Into<String>) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(client)
    }

    /// Endpoint URL without the key query parameter
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send a generateContent request and decode the envelope
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint();

        debug!("Sending request to Generative Language API: {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Generative Language API error: {} - {}", status, message);
            return Err(Error::Api(format!("{}: {}", status, message)));
        }

        let parsed = GenerateContentResponse::from_body(&body)?;

        info!(
            "Generative Language API response: candidates={}, finish_reason={:?}",
            parsed.candidates.len(),
            parsed.candidates.first().and_then(|c| c.finish_reason.as_deref())
        );

        Ok(parsed)
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AnswerService for GeminiClient {
    async fn answer(&self, question: &str) -> Result<String> {
        let request = GenerateContentRequest::from_question(question);
        self.generate_content(&request).await?.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.llm.api_key = "test-key".to_string();
        config
    }

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::with_base_url(&test_config(), format!("{}/v1beta/", server.uri())).unwrap()
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(&test_config()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
        assert_eq!(client.model(), "gemini-pro");
    }

    #[tokio::test]
    async fn test_answer_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_json(json!({"contents": [{"parts": [{"text": "2+2?"}]}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "4"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.answer("2+2?").await.unwrap(), "4");
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.answer("hi").await {
            Err(Error::Api(msg)) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("API key not valid."));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.answer("hi").await {
            Err(Error::Api(msg)) => assert!(msg.contains("upstream unavailable")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.answer("hi").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.is_service_failure());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        // nothing listens on port 1
        let client = GeminiClient::with_base_url(&test_config(), "http://127.0.0.1:1").unwrap();
        let err = client.answer("hi").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
