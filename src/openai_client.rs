use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const API_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("The model returned no text")]
    EmptyResponse,
}

/// Turns a prompt into email body text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(OpenAiClient {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: API_BASE_URL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// For Azure OpenAI or any compatible endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(self.temperature),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, retry_after.as_deref(), body));
        }

        let body: ChatResponse = response.json().await?;
        first_message(body)
    }
}

fn error_for_status(status: StatusCode, retry_after: Option<&str>, body: String) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED => GenerationError::AuthError("Invalid API key".to_string()),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimitExceeded {
            retry_after: retry_after
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        _ => GenerationError::ApiError {
            status: status.as_u16(),
            message: body,
        },
    }
}

fn first_message(response: ChatResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = OpenAiClient::new("sk-test".to_string())
            .unwrap()
            .with_model("gpt-4o-mini")
            .with_temperature(0.2);
        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.model, "gpt-4o-mini");
        assert_eq!(client.temperature, 0.2);
    }

    #[test]
    fn test_request_body() {
        let client = OpenAiClient::new("sk-test".to_string()).unwrap();
        let body = serde_json::to_value(client.build_request("Hello")).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o",
                "messages": [{ "role": "user", "content": "Hello" }],
                "temperature": 0.7f32
            })
        );
    }

    #[test]
    fn test_error_for_status() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, None, String::new()),
            GenerationError::AuthError(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, Some("17"), String::new()),
            GenerationError::RateLimitExceeded { retry_after: 17 }
        ));
        // HTTP-date form is not understood, fall back to the default wait
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, Some("Wed, 21 Oct 2015 07:28:00 GMT"), String::new()),
            GenerationError::RateLimitExceeded { retry_after: 60 }
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, None, String::new()),
            GenerationError::RateLimitExceeded { retry_after: 60 }
        ));

        let err = error_for_status(StatusCode::INTERNAL_SERVER_ERROR, None, "upstream timeout".to_string());
        assert!(matches!(
            err,
            GenerationError::ApiError { status: 500, ref message } if message == "upstream timeout"
        ));
    }

    #[test]
    fn test_first_message() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Good morning!" } }]
        }))
        .unwrap();
        assert_eq!(first_message(response).unwrap(), "Good morning!");

        let empty: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(first_message(empty), Err(GenerationError::EmptyResponse)));
    }
}
