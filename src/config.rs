use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use anyhow::Result;
use regex::Regex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub tts_config: TtsConfig,
    #[serde(default)]
    pub chat_config: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Where audio files are written and served from.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    12393
}

fn default_output_dir() -> String {
    "cache".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// `google` (network) or `espeak` (local engine).
    #[serde(default = "default_tts_backend")]
    pub backend: String,
    #[serde(default)]
    pub google_endpoint: Option<String>,
    #[serde(default = "default_espeak_bin")]
    pub espeak_bin: String,
    #[serde(default = "default_engine_timeout_secs")]
    pub engine_timeout_secs: u64,
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

fn default_tts_backend() -> String {
    "google".to_string()
}

fn default_espeak_bin() -> String {
    "espeak-ng".to_string()
}

fn default_engine_timeout_secs() -> u64 {
    20
}

fn default_max_chunk_chars() -> usize {
    100
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_api_key", skip_serializing)]
    pub api_key: Option<String>,
}

fn default_chat_base_url() -> String {
    "https://api.mistral.ai/v1/chat/completions".to_string()
}

fn default_chat_model() -> String {
    "mistral-tiny".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_chat_timeout_secs() -> u64 {
    10
}

fn default_api_key() -> Option<String> {
    std::env::var("MISTRAL_API_KEY").ok()
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: default_tts_backend(),
            google_endpoint: None,
            espeak_bin: default_espeak_bin(),
            engine_timeout_secs: default_engine_timeout_secs(),
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            model: default_chat_model(),
            temperature: default_temperature(),
            timeout_secs: default_chat_timeout_secs(),
            api_key: default_api_key(),
        }
    }
}

impl SystemConfig {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

impl Config {
    /// Load a JSON/JSON-LD or YAML config file, chosen by extension.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }
        let content = substitute_env(&load_text_file_with_guess_encoding(path)?);

        let path_lower = path.to_lowercase();
        let config = if path_lower.ends_with(".jsonld") || path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Load the first config found in `paths`, or the defaults if none exists.
    pub fn load_first(paths: &[String]) -> Result<(Self, Option<String>)> {
        for path in paths {
            if !Path::new(path).exists() {
                tracing::debug!("No config at {}", path);
                continue;
            }
            let config = Self::load(path)?;
            return Ok((config, Some(path.clone())));
        }
        Ok((Self::default(), None))
    }
}

/// Replace `${VAR_NAME}` with the variable's value, leaving unknown variables as-is.
pub fn substitute_env(content: &str) -> String {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"\$\{(\w+)\}").expect("valid env regex"));
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Read a text file, stripping a UTF-8 BOM and falling back to GBK.
pub fn load_text_file_with_guess_encoding(file_path: &str) -> Result<String> {
    let bytes = fs::read(file_path)?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            let (cow, _, _) = encoding_rs::GBK.decode(bytes);
            Ok(cow.into_owned())
        }
    }
}
