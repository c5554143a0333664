use async_trait::async_trait;
use std::path::Path;

use super::job::VoiceConfig;
use crate::error::SynthesisError;

/// A speech backend that writes one audio file per call.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;

    /// Audio container extension of the files this backend writes.
    fn extension(&self) -> &'static str;

    /// Synthesize `text` with `config` into `output`.
    ///
    /// Implementations may leave a partial file behind on failure; the engine
    /// removes it.
    async fn synthesize(
        &self,
        text: &str,
        config: &VoiceConfig,
        output: &Path,
    ) -> Result<(), SynthesisError>;
}
