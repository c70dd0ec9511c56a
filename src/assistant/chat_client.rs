use crate::{
    config::OpenAiConfig,
    error::ChatError,
    models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage},
};
use reqwest::Client;
use std::time::Duration;

const CHAT_TIMEOUT_SECS: u64 = 60;

/// Proxy to an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    config: OpenAiConfig,
}

impl ChatClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(CHAT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ChatError::RequestError(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let api_key = self.config.api_key.as_ref().ok_or(ChatError::NotConfigured)?;
        let url = format!("{}/chat/completions", self.config.base_url);
        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages,
        };

        log::info!("Invoking chat model: {}", self.config.model);
        log::debug!("Chat request with {} messages", messages.len());

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChatError::RequestError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Chat completion failed with status {}: {}", status, body);
            return Err(ChatError::ResponseError(format!(
                "upstream returned {}",
                status.as_u16()
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::ResponseError(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ChatError::ResponseError("No choices returned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> OpenAiConfig {
        OpenAiConfig::new()
            .with_api_key("sk-test")
            .with_base_url(format!("{}/v1", server.uri()))
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "Which style suits a small flat?" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Scandinavian." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(config_for(&server)).unwrap();
        let reply = client
            .complete(&[ChatMessage::user("Which style suits a small flat?")])
            .await
            .unwrap();

        assert_eq!(reply, "Scandinavian.");
    }

    #[tokio::test]
    async fn test_complete_without_key() {
        let client = ChatClient::new(OpenAiConfig::new()).unwrap();
        assert!(!client.is_configured());
        let result = client.complete(&[ChatMessage::user("hi")]).await;
        assert!(matches!(result, Err(ChatError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_complete_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let client = ChatClient::new(config_for(&server)).unwrap();
        let result = client.complete(&[ChatMessage::user("hi")]).await;
        assert!(matches!(result, Err(ChatError::ResponseError(_))));
    }

    #[test]
    fn test_missing_role_defaults_to_user() {
        let message: ChatMessage = serde_json::from_value(json!({ "content": "hello" })).unwrap();
        assert_eq!(message.role, "user");
        let message: ChatMessage = serde_json::from_value(json!({})).unwrap();
        assert_eq!(message.content, "");
    }
}
