use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::interface::SynthesisBackend;
use super::job::{SynthesisJob, VoiceConfig};
use crate::error::{SynthesisError, ValidationError};
use crate::text::SanitizedText;

/// Process-wide sequence so jobs submitted in the same millisecond get distinct names.
static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Turns sanitized text into uniquely named audio files.
pub struct SynthesisEngine {
    backend: Arc<dyn SynthesisBackend>,
    output_dir: PathBuf,
}

impl SynthesisEngine {
    pub fn new(backend: Arc<dyn SynthesisBackend>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            output_dir: output_dir.into(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create a job named after its submission time.
    pub fn submit(&self, input: SanitizedText, config: VoiceConfig) -> Result<SynthesisJob, ValidationError> {
        let seq = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}_{}", Utc::now().timestamp_millis(), seq);
        let path = self
            .output_dir
            .join(format!("output_{}.{}", id, self.backend.extension()));
        SynthesisJob::new(id, input, config, path)
    }

    /// Create a job for a chat turn, named after the turn's position.
    ///
    /// Replaying the same turn targets the same file.
    pub fn submit_for_turn(
        &self,
        session_id: &str,
        turn_index: usize,
        input: SanitizedText,
        config: VoiceConfig,
    ) -> Result<SynthesisJob, ValidationError> {
        let id = format!("{}_{}", session_id, turn_index);
        let path = self
            .output_dir
            .join(format!("chat_{}.{}", id, self.backend.extension()));
        SynthesisJob::new(id, input, config, path)
    }

    /// Run a pending job to a terminal state.
    ///
    /// The backend writes to a scratch file that is renamed onto `output_path`
    /// only after it holds audio. A failed run leaves any existing artifact in place.
    pub async fn synthesize(&self, job: SynthesisJob) -> SynthesisJob {
        debug!("Synthesizing job {} -> {}", job.id(), job.output_path().display());

        let scratch = self.scratch_path(&job);
        let result = match tokio::fs::create_dir_all(&self.output_dir).await {
            Ok(()) => {
                self.backend
                    .synthesize(job.input().cleaned(), job.config(), &scratch)
                    .await
            }
            Err(e) => Err(SynthesisError::from(e)),
        };
        let result = match result {
            Ok(()) => verify_output(&scratch).await,
            Err(e) => Err(e),
        };
        let result = match result {
            Ok(()) => tokio::fs::rename(&scratch, job.output_path())
                .await
                .map_err(SynthesisError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!("Synthesis job {} succeeded", job.id());
                job.succeed()
            }
            Err(e) => {
                error!("Synthesis job {} failed: {}", job.id(), e);
                remove_partial(&scratch).await;
                job.fail(e.to_string())
            }
        }
    }

    fn scratch_path(&self, job: &SynthesisJob) -> PathBuf {
        let seq = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.output_dir.join(format!(
            ".partial_{}_{}.{}",
            seq,
            job.id(),
            self.backend.extension()
        ))
    }
}

async fn verify_output(path: &Path) -> Result<(), SynthesisError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(SynthesisError::EmptyOutput),
    }
}

async fn remove_partial(path: &Path) {
    if tokio::fs::metadata(path).await.is_ok() {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed partial audio file: {}", path.display()),
            Err(e) => error!("Failed to remove partial audio file {}: {}", path.display(), e),
        }
    }
}
