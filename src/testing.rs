//! Test doubles for the synthesis and chat backends.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::chat::ChatBackend;
use crate::error::SynthesisError;
use crate::tts::{SynthesisBackend, VoiceConfig};

/// Writes fixed bytes and remembers every text it was asked to speak.
pub struct RecordingBackend {
    bytes: Vec<u8>,
    texts: Mutex<Vec<String>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::writing(b"ID3fake-audio")
    }
}

impl RecordingBackend {
    pub fn writing(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }

    async fn synthesize(&self, text: &str, _config: &VoiceConfig, output: &Path) -> Result<(), SynthesisError> {
        self.texts.lock().unwrap().push(text.to_string());
        tokio::fs::write(output, &self.bytes).await?;
        Ok(())
    }
}

/// Always fails, optionally after writing a partial file.
pub struct FailingBackend {
    error: SynthesisError,
    partial: bool,
}

impl FailingBackend {
    pub fn new(error: SynthesisError) -> Self {
        Self { error, partial: false }
    }

    pub fn writing_partial(error: SynthesisError) -> Self {
        Self { error, partial: true }
    }
}

#[async_trait]
impl SynthesisBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }

    async fn synthesize(&self, _text: &str, _config: &VoiceConfig, output: &Path) -> Result<(), SynthesisError> {
        if self.partial {
            tokio::fs::write(output, b"ID3trunc").await?;
        }
        Err(self.error.clone())
    }
}

/// Chat backend with canned replies; echoes the prompt once they run out.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedChat {
    pub fn echo() -> Self {
        Self::replying(Vec::<String>::new())
    }

    pub fn replying<S: Into<String>>(replies: Vec<S>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn send(&self, prompt: &str, _credential: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.replies.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| format!("echo: {}", prompt))
    }
}
