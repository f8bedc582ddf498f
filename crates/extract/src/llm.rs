use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::prompt;
use crate::stream::SseCollector;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-4-maverick-17b-128e-instruct";
pub const DEFAULT_TEXT_MODEL: &str = "llama-3.3-70b-versatile";

/// A hosted vision-language model that can describe a document image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Returns the model's structured description of the image.
    async fn analyze_document(&self, image_data_url: &str) -> Result<String>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Client for an OpenAI-compatible chat completion API (Groq by default).
#[derive(Clone)]
pub struct GroqClient {
    base_url: String,
    vision_model: String,
    text_model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    temperature: f64,
    max_completion_tokens: u32,
    top_p: f64,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_models(mut self, vision_model: String, text_model: String) -> Self {
        self.vision_model = vision_model;
        self.text_model = text_model;
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("GROQ_API_KEY environment variable is not set")
    }

    async fn post(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(request)
            .send()
            .await
            .context("Failed to send request to Groq")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Groq request failed: {} {}", status, body);
        }

        Ok(response)
    }

    /// Send a streaming chat request and collect the streamed text.
    async fn stream_chat(&self, request: &ChatRequest<'_>) -> Result<String> {
        let response = self.post(request).await?;

        let mut collector = SseCollector::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("Groq stream interrupted")?;
            collector.push(&chunk);
            if collector.is_done() {
                break;
            }
        }

        Ok(collector.finish())
    }

    /// Two passes: a free-form description, then a structured extraction
    /// that sees the first answer as conversation history.
    pub async fn describe_image(&self, image_data_url: &str) -> Result<String> {
        self.api_key()?;

        let image_part = json!({"type": "image_url", "image_url": {"url": image_data_url}});

        let description_request = ChatRequest {
            model: &self.vision_model,
            messages: vec![json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt::build_description_prompt()},
                    image_part.clone(),
                ],
            })],
            temperature: 0.3,
            max_completion_tokens: 2048,
            top_p: 0.9,
            stream: true,
        };

        let description = self
            .stream_chat(&description_request)
            .await
            .context("Description pass failed")?;
        if description.trim().is_empty() {
            anyhow::bail!("No response from vision model");
        }
        debug!(chars = description.len(), "Description pass complete");

        let extraction_request = ChatRequest {
            model: &self.vision_model,
            messages: vec![
                json!({
                    "role": "user",
                    "content": [
                        {"type": "text", "text": prompt::build_structured_prompt()},
                        image_part,
                    ],
                }),
                json!({"role": "assistant", "content": description}),
                json!({"role": "user", "content": prompt::build_follow_up_instruction()}),
            ],
            temperature: 0.2,
            max_completion_tokens: 1536,
            top_p: 0.8,
            stream: true,
        };

        let structured = self
            .stream_chat(&extraction_request)
            .await
            .context("Extraction pass failed")?;

        info!(
            model = %self.vision_model,
            description_chars = description.len(),
            structured_chars = structured.len(),
            "Vision analysis complete"
        );

        if structured.is_empty() {
            Ok(description)
        } else {
            Ok(structured)
        }
    }

    pub async fn translate_text(&self, text: &str, target_language: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.text_model,
            messages: vec![
                json!({"role": "system", "content": prompt::build_translation_prompt(target_language)}),
                json!({"role": "user", "content": text}),
            ],
            temperature: 0.2,
            max_completion_tokens: 2048,
            top_p: 0.9,
            stream: false,
        };

        let response: ChatResponse = self
            .post(&request)
            .await?
            .json()
            .await
            .context("Failed to parse Groq translation response")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .context("No translation returned from API")
    }
}

#[async_trait]
impl VisionModel for GroqClient {
    async fn analyze_document(&self, image_data_url: &str) -> Result<String> {
        self.describe_image(image_data_url).await
    }
}

#[async_trait]
impl Translator for GroqClient {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        self.translate_text(text, target_language).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sse_body(parts: &[&str]) -> String {
        let mut body = String::new();
        for part in parts {
            body.push_str(&format!(
                "data: {}\n\n",
                json!({"choices": [{"delta": {"content": part}}]})
            ));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = GroqClient::new("http://127.0.0.1:9".to_string(), None);
        let err = client.translate_text("hello", "ko").await.unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));

        let err = client.describe_image("data:image/png;base64,AA==").await.unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn test_translate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": DEFAULT_TEXT_MODEL,
                "stream": false,
            })))
            .with_header("content-type", "application/json")
            .with_body(json!({"choices": [{"message": {"content": "  고혈압  "}}]}).to_string())
            .create_async()
            .await;

        let client = GroqClient::new(server.url(), Some("test-key".to_string()));
        let translated = client.translate_text("Hypertension", "ko").await.unwrap();

        assert_eq!(translated, "고혈압");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_translate_without_choices() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_body(json!({"choices": []}).to_string())
            .create_async()
            .await;

        let client = GroqClient::new(server.url(), Some("k".to_string()));
        let err = client.translate_text("x", "ja").await.unwrap_err();
        assert!(err.to_string().contains("No translation"));
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let client = GroqClient::new(server.url(), Some("k".to_string()));
        let err = client.translate_text("x", "ja").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_describe_image_returns_structured_pass() {
        let mut server = mockito::Server::new_async().await;
        let description = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({"temperature": 0.3})))
            .with_body(sse_body(&["A prescription ", "for asthma."]))
            .create_async()
            .await;
        let structured = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({"temperature": 0.2})))
            .with_body(sse_body(&["**Disease Name:** Asthma"]))
            .create_async()
            .await;

        let client = GroqClient::new(server.url(), Some("k".to_string()));
        let text = client.describe_image("data:image/png;base64,AA==").await.unwrap();

        assert_eq!(text, "**Disease Name:** Asthma");
        description.assert_async().await;
        structured.assert_async().await;
    }

    #[tokio::test]
    async fn test_describe_image_falls_back_to_description() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({"temperature": 0.3})))
            .with_body(sse_body(&["Only a description"]))
            .create_async()
            .await;
        server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({"temperature": 0.2})))
            .with_body(sse_body(&[]))
            .create_async()
            .await;

        let client = GroqClient::new(server.url(), Some("k".to_string()));
        let text = client.describe_image("data:image/png;base64,AA==").await.unwrap();
        assert_eq!(text, "Only a description");
    }
}
