use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::interface::SynthesisBackend;
use super::job::VoiceConfig;
use crate::error::SynthesisError;

/// Local speech engine driven through the `espeak-ng` command line.
///
/// Every call spawns its own engine process.
pub struct EspeakTts {
    bin: PathBuf,
    timeout: Duration,
}

impl EspeakTts {
    pub fn new(bin: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    fn command(&self, config: &VoiceConfig, output: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        if let Some(voice) = &config.voice_id {
            cmd.arg("-v").arg(voice);
        }
        cmd.arg("-s")
            .arg(config.rate.to_string())
            .arg("-a")
            .arg(amplitude(config.volume).to_string())
            .arg("-w")
            .arg(output)
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// espeak amplitude for a volume in `[0, 1]`.
fn amplitude(volume: f32) -> u32 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u32
}

#[async_trait]
impl SynthesisBackend for EspeakTts {
    fn name(&self) -> &'static str {
        "espeak"
    }

    fn extension(&self) -> &'static str {
        "wav"
    }

    async fn synthesize(
        &self,
        text: &str,
        config: &VoiceConfig,
        output: &Path,
    ) -> Result<(), SynthesisError> {
        let mut child = self.command(config, output).spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SynthesisError::NoVoiceDriver
            } else {
                SynthesisError::EngineFailed(e.kind().to_string())
            }
        })?;

        let stdin = child.stdin.take();
        let run = async move {
            if let Some(mut stdin) = stdin {
                // An engine that exits early closes its end; its stderr explains why.
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    if e.kind() != ErrorKind::BrokenPipe {
                        return Err(e);
                    }
                }
            }
            child.wait_with_output().await
        };

        debug!("Waiting on speech engine for {}", output.display());
        let out = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Speech engine timed out after {:?}", self.timeout);
                return Err(SynthesisError::Timeout(self.timeout.as_secs()));
            }
        };

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let reason = stderr.lines().next().unwrap_or("unknown error").trim().to_string();
            return Err(SynthesisError::EngineFailed(reason));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_maps_to_amplitude() {
        assert_eq!(amplitude(1.0), 100);
        assert_eq!(amplitude(0.5), 50);
        assert_eq!(amplitude(0.0), 0);
        assert_eq!(amplitude(7.0), 100);
    }

    #[test]
    fn builds_engine_arguments() {
        let tts = EspeakTts::new("espeak-ng", Duration::from_secs(1));
        let config = VoiceConfig {
            voice_id: Some("en-us".into()),
            rate: 150,
            volume: 0.5,
            ..VoiceConfig::default()
        };
        let cmd = tts.command(&config, Path::new("out.wav"));
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["-v", "en-us", "-s", "150", "-a", "50", "-w", "out.wav", "--stdin"]);
    }

    #[test]
    fn default_voice_omits_voice_flag() {
        let tts = EspeakTts::new("espeak-ng", Duration::from_secs(1));
        let cmd = tts.command(&VoiceConfig::default(), Path::new("o.wav"));
        assert!(!cmd.as_std().get_args().any(|a| a == "-v"));
    }

    #[cfg(unix)]
    fn fake_engine(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("espeak-ng");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_engine_that_stops_reading_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let tts = EspeakTts::new(fake_engine(dir.path(), "exec sleep 30"), Duration::from_secs(1));
        let text = "word ".repeat(40_000);

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            tts.synthesize(&text, &VoiceConfig::default(), &dir.path().join("a.wav")),
        )
        .await
        .expect("engine timeout should fire first");
        assert_eq!(result.unwrap_err(), SynthesisError::Timeout(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn engine_reads_text_and_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        // Default voice: -s rate -a amp -w out --stdin, so the output path is $6.
        let engine = fake_engine(dir.path(), "cat > /dev/null\nprintf RIFFfake > \"$6\"");
        let tts = EspeakTts::new(engine, Duration::from_secs(5));
        let out = dir.path().join("a.wav");

        tts.synthesize(&"word ".repeat(40_000), &VoiceConfig::default(), &out)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"RIFFfake");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn engine_failure_reports_first_stderr_line() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "echo 'unknown voice' >&2\nexit 1");
        let tts = EspeakTts::new(engine, Duration::from_secs(5));

        let err = tts
            .synthesize("hello", &VoiceConfig::default(), &dir.path().join("a.wav"))
            .await
            .unwrap_err();
        assert_eq!(err, SynthesisError::EngineFailed("unknown voice".into()));
    }

    #[tokio::test]
    async fn missing_engine_reports_no_driver() {
        let tts = EspeakTts::new("/nonexistent/espeak-ng", Duration::from_secs(1));
        let dir = tempfile::tempdir().unwrap();
        let err = tts
            .synthesize("hello", &VoiceConfig::default(), &dir.path().join("a.wav"))
            .await
            .unwrap_err();
        assert_eq!(err, SynthesisError::NoVoiceDriver);
    }
}
