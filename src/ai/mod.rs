//! AI module for Sahayak
//!
//! Talks to the hosted generative-language `generateContent` endpoint. The
//! conversation controller only sees the [`AssistantBackend`] trait, so tests
//! and alternative hosts can substitute their own backend.
//!
//! # Architecture
//!
//! - `client` - reqwest-based [`GeminiClient`]
//! - `gemini` - request/response wire types and prompt assembly
//!
//! # Usage
//!
//! ```rust,no_run
//! use sahayak::ai::{AssistantBackend, GeminiClient};
//!
//! # async fn example() -> Result<(), sahayak::ai::AiError> {
//! let client = GeminiClient::new("https://generativelanguage.googleapis.com", "gemini-pro");
//! let reply = client.generate("my-key", "Hello!").await?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod gemini;

use async_trait::async_trait;

pub use client::GeminiClient;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unreadable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response contained no candidate text")]
    EmptyResponse,
}

pub type AiResult<T> = Result<T, AiError>;

/// What the endpoint answered, when it answered at all.
#[derive(Clone, Debug, PartialEq)]
pub enum Generation {
    /// Text of the first candidate.
    Reply(String),
    /// The endpoint returned an error payload.
    Rejected(ApiRejection),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiRejection {
    pub http_status: Option<u16>,
    pub code: Option<i64>,
    pub status: Option<String>,
    pub message: String,
}

impl ApiRejection {
    /// Text shown to the user in place of a reply.
    pub fn display_text(&self) -> String {
        format!("Error: {}", self.message)
    }

    /// True when the credential was refused rather than the request.
    pub fn is_credential_error(&self) -> bool {
        let status_refused = matches!(
            self.status.as_deref(),
            Some("PERMISSION_DENIED") | Some("UNAUTHENTICATED")
        );
        let code_refused = matches!(self.code, Some(401) | Some(403))
            || matches!(self.http_status, Some(401) | Some(403));
        status_refused || code_refused || self.message.contains("API_KEY_INVALID")
    }
}

#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Sends one prompt. Error payloads come back as
    /// [`Generation::Rejected`]; only transport and decoding problems are
    /// `Err`.
    async fn generate(&self, api_key: &str, prompt: &str) -> AiResult<Generation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection(status: Option<&str>, code: Option<i64>, message: &str) -> ApiRejection {
        ApiRejection {
            http_status: None,
            code,
            status: status.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn display_text_prefixes_error() {
        assert_eq!(rejection(None, None, "m").display_text(), "Error: m");
    }

    #[test]
    fn credential_errors_are_recognized() {
        assert!(rejection(Some("PERMISSION_DENIED"), None, "m").is_credential_error());
        assert!(rejection(Some("UNAUTHENTICATED"), None, "m").is_credential_error());
        assert!(rejection(None, Some(403), "m").is_credential_error());
        assert!(
            rejection(Some("INVALID_ARGUMENT"), Some(400), "API key not valid. [API_KEY_INVALID]")
                .is_credential_error()
        );
        assert!(!rejection(Some("RESOURCE_EXHAUSTED"), Some(429), "quota").is_credential_error());
    }
}
