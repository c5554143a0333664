use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::ValidationError;
use crate::text::SanitizedText;

/// Backend-specific parameters resolved from a catalog selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceConfig {
    /// Local engine voice; `None` uses the engine default.
    pub voice_id: Option<String>,
    /// Language or accent tag sent to the backend.
    pub language: String,
    /// Provider region (the network provider's top-level domain).
    pub region: String,
    /// Words per minute.
    pub rate: u32,
    /// Between 0.0 and 1.0.
    pub volume: f32,
    pub slow: bool,
}

impl VoiceConfig {
    pub const DEFAULT_RATE: u32 = 200;
    pub const DEFAULT_REGION: &'static str = "com";

    pub fn with_volume(mut self, volume: Option<f32>) -> Self {
        if let Some(v) = volume {
            self.volume = if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 };
        }
        self
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: None,
            language: "en".to_string(),
            region: Self::DEFAULT_REGION.to_string(),
            rate: Self::DEFAULT_RATE,
            volume: 1.0,
            slow: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

/// One text-to-audio conversion attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisJob {
    id: String,
    #[serde(skip)]
    input: SanitizedText,
    config: VoiceConfig,
    output_path: PathBuf,
    status: JobStatus,
    error: Option<String>,
}

impl SynthesisJob {
    /// Create a pending job. Only valid text can be submitted.
    pub fn new(
        id: String,
        input: SanitizedText,
        config: VoiceConfig,
        output_path: PathBuf,
    ) -> Result<Self, ValidationError> {
        let input = input.into_valid()?;
        Ok(Self {
            id,
            input,
            config,
            output_path,
            status: JobStatus::Pending,
            error: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn input(&self) -> &SanitizedText {
        &self.input
    }

    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.output_path.file_name().and_then(|n| n.to_str())
    }

    pub(crate) fn succeed(self) -> Self {
        debug_assert_eq!(self.status, JobStatus::Pending);
        Self {
            status: JobStatus::Succeeded,
            ..self
        }
    }

    pub(crate) fn fail(self, error: String) -> Self {
        debug_assert_eq!(self.status, JobStatus::Pending);
        Self {
            status: JobStatus::Failed,
            error: Some(error),
            ..self
        }
    }
}
