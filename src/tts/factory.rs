use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use tracing::info;

use super::catalog::VoiceCatalog;
use super::espeak::EspeakTts;
use super::google::GoogleTranslateTts;
use super::interface::SynthesisBackend;
use crate::config::TtsConfig;

/// Factory for creating synthesis backends and their matching catalogs
pub struct TTSFactory;

impl TTSFactory {
    /// Create the backend named by `tts_config.backend`.
    pub fn create_backend(tts_config: &TtsConfig) -> Result<Arc<dyn SynthesisBackend>> {
        info!("Initializing TTS backend: {}", tts_config.backend);
        let timeout = Duration::from_secs(tts_config.engine_timeout_secs);

        match tts_config.backend.as_str() {
            "google" | "gtts" => Ok(Arc::new(GoogleTranslateTts::new(
                tts_config.google_endpoint.clone(),
                tts_config.max_chunk_chars,
                timeout,
            ))),
            "espeak" | "espeak-ng" | "local" => Ok(Arc::new(EspeakTts::new(
                &tts_config.espeak_bin,
                timeout,
            ))),
            other => Err(anyhow::anyhow!("Unsupported TTS backend: {}", other)),
        }
    }

    /// Build the voice catalog that fits the configured backend.
    pub async fn create_catalog(tts_config: &TtsConfig) -> VoiceCatalog {
        match tts_config.backend.as_str() {
            "espeak" | "espeak-ng" | "local" => {
                VoiceCatalog::discover(
                    Path::new(&tts_config.espeak_bin),
                    Duration::from_secs(tts_config.engine_timeout_secs),
                )
                .await
            }
            _ => VoiceCatalog::accents(),
        }
    }
}
