use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ChatConfig;

/// A chat-completion endpoint that answers a single user prompt.
///
/// Implementations never fail: transport and status errors come back as text
/// that can stand in for the assistant's reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, prompt: &str, credential: &str) -> String;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Client for Mistral's OpenAI-compatible chat completions API.
pub struct MistralClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl MistralClient {
    pub fn new(base_url: String, model: String, temperature: f32, timeout: Duration) -> Self {
        info!("Initialized MistralClient: model={}, base_url={}", model, base_url);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url,
            model,
            temperature,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            config.temperature,
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn request(&self, prompt: &str, credential: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Chat endpoint returned {}", status.as_u16());
            return Ok(format!("Error {}: {}", status.as_u16(), text));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("response contained no choices"))
    }
}

#[async_trait]
impl ChatBackend for MistralClient {
    async fn send(&self, prompt: &str, credential: &str) -> String {
        debug!("Sending chat prompt ({} chars)", prompt.len());
        match self.request(prompt, credential).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Chat request failed: {}", e);
                format!("Connection Error: {}", e)
            }
        }
    }
}
