use async_trait::async_trait;
use reqwest::Client;

use super::gemini::{GenerateRequest, GenerateResponse};
use super::{AiError, AiResult, ApiRejection, AssistantBackend, Generation};
use crate::config::AppConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the hosted `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.gemini_base_url, &config.gemini_model)
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl AssistantBackend for GeminiClient {
    async fn generate(&self, api_key: &str, prompt: &str) -> AiResult<Generation> {
        let endpoint = self.endpoint();
        tracing::debug!(%endpoint, prompt_len = prompt.len(), "sending generateContent");

        let response = self
            .client
            .post(&endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(&GenerateRequest::for_prompt(prompt))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        // Error payloads are honoured whatever the HTTP status says.
        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        if let Some(error) = parsed.error {
            tracing::warn!(%status, status_text = ?error.status, "generateContent rejected");
            return Ok(Generation::Rejected(ApiRejection {
                http_status: Some(status.as_u16()),
                code: error.code,
                status: error.status,
                message: error.message,
            }));
        }

        match parsed.first_text() {
            Some(text) => Ok(Generation::Reply(text.to_string())),
            None => {
                tracing::warn!(%status, "generateContent returned no candidate text");
                Err(AiError::EmptyResponse)
            }
        }
    }
}
