use async_trait::async_trait;
use base64::Engine as _;
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

use super::interface::SynthesisBackend;
use super::job::VoiceConfig;
use crate::error::SynthesisError;
use crate::text::chunk_text;

const TTS_RPC: &str = "jQ1olc";

fn audio_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"jQ1olc","\[\\"(.*)\\"]"#).expect("valid audio regex"))
}

/// Network speech provider backed by Google Translate's text-to-speech RPC.
pub struct GoogleTranslateTts {
    client: Client,
    endpoint: Option<String>,
    max_chunk_chars: usize,
}

impl GoogleTranslateTts {
    pub fn new(endpoint: Option<String>, max_chunk_chars: usize, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint,
            max_chunk_chars,
        }
    }

    fn endpoint_for(&self, region: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "https://translate.google.{}/_/TranslateWebserverUi/data/batchexecute",
                region
            ),
        }
    }

    async fn fetch_chunk(&self, url: &str, chunk: &str, config: &VoiceConfig) -> Result<Vec<u8>, SynthesisError> {
        let response = self
            .client
            .post(url)
            .form(&[("f.req", package_rpc(chunk, &config.language, config.slow))])
            .send()
            .await
            .map_err(|e| {
                warn!("Speech service request failed: {}", e);
                SynthesisError::Unreachable
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SynthesisError::QuotaExceeded);
        }
        if !status.is_success() {
            return Err(SynthesisError::Rejected { status: status.as_u16() });
        }

        let body = response.text().await.map_err(|_| SynthesisError::MalformedResponse)?;
        decode_audio(&body)
    }
}

/// Build the `f.req` payload for one chunk.
fn package_rpc(text: &str, language: &str, slow: bool) -> String {
    let speed = if slow { json!(true) } else { json!(null) };
    let parameter = json!([text, language, speed, "null"]).to_string();
    json!([[[TTS_RPC, parameter, null, "generic"]]]).to_string()
}

/// Pull the base64 audio out of a batchexecute response.
fn decode_audio(body: &str) -> Result<Vec<u8>, SynthesisError> {
    let encoded = body
        .lines()
        .filter(|line| line.contains(TTS_RPC))
        .find_map(|line| audio_pattern().captures(line))
        .and_then(|caps| caps.get(1))
        .ok_or(SynthesisError::MalformedResponse)?;

    base64::engine::general_purpose::STANDARD
        .decode(encoded.as_str())
        .map_err(|_| SynthesisError::MalformedResponse)
}

#[async_trait]
impl SynthesisBackend for GoogleTranslateTts {
    fn name(&self) -> &'static str {
        "google"
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }

    async fn synthesize(
        &self,
        text: &str,
        config: &VoiceConfig,
        output: &Path,
    ) -> Result<(), SynthesisError> {
        let chunks = chunk_text(text, self.max_chunk_chars);
        if chunks.is_empty() {
            return Err(SynthesisError::EmptyOutput);
        }

        let url = self.endpoint_for(&config.region);
        debug!("Requesting {} chunk(s) from {}", chunks.len(), url);

        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.fetch_chunk(&url, chunk, config).await?);
        }

        tokio::fs::write(output, audio).await?;
        Ok(())
    }
}
