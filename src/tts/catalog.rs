use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use super::job::VoiceConfig;

/// Accent choices offered by the network provider: (label, tag).
pub const ACCENTS: &[(&str, &str)] = &[
    ("English (US)", "en-us"),
    ("English (UK)", "en-uk"),
    ("English (India)", "en-in"),
    ("English (Australia)", "en-au"),
    ("French", "fr"),
    ("Spanish", "es"),
];

const ACCENT_SPEEDS: &[&str] = &["Normal", "Slow"];

/// Speed selectors for the local engine, in words per minute.
const ENGINE_RATES: &[(&str, u32)] = &[("Slow", 150), ("Normal", 200), ("Fast", 250)];

const MALE_NAME_FRAGMENTS: &[&str] = &["david", "mark", "george", "james", "richard", "daniel"];
const FEMALE_NAME_FRAGMENTS: &[&str] = &["zira", "hazel", "susan", "samantha", "karen", "victoria"];

pub const DEFAULT_VOICE_TAG: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceOption {
    pub label: String,
    pub tag: String,
}

impl VoiceOption {
    fn new(label: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tag: tag.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogKind {
    Accents,
    Engine,
}

/// Voices a user can pick from and how a pick becomes a [`VoiceConfig`].
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    kind: CatalogKind,
    options: Vec<VoiceOption>,
}

/// Provider region for an accent tag.
pub fn region_for(tag: &str) -> &'static str {
    match tag {
        "en-us" => "com",
        "en-uk" => "co.uk",
        "en-in" => "co.in",
        "en-au" => "com.au",
        _ => VoiceConfig::DEFAULT_REGION,
    }
}

/// Regional English accents are a region of plain `en` for the provider.
fn provider_language(tag: &str) -> String {
    if tag.starts_with("en-") {
        "en".to_string()
    } else {
        tag.to_string()
    }
}

fn gender_suffix(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    if MALE_NAME_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        Some(" (Male)")
    } else if FEMALE_NAME_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        Some(" (Female)")
    } else {
        None
    }
}

impl VoiceCatalog {
    /// Fixed accent catalog for the network provider.
    pub fn accents() -> Self {
        Self {
            kind: CatalogKind::Accents,
            options: ACCENTS.iter().map(|(l, t)| VoiceOption::new(*l, *t)).collect(),
        }
    }

    /// Enumerate the local engine's voices, degrading to a single default
    /// entry when none can be discovered.
    pub async fn discover(espeak_bin: &Path, timeout: Duration) -> Self {
        let listing = Command::new(espeak_bin)
            .arg("--voices")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let catalog = match tokio::time::timeout(timeout, listing).await {
            Ok(Ok(out)) if out.status.success() => {
                Self::from_voice_listing(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(Ok(out)) => {
                warn!("Voice discovery exited with {}", out.status);
                Self::engine_default()
            }
            Ok(Err(e)) => {
                warn!("Voice discovery failed to start {}: {}", espeak_bin.display(), e);
                Self::engine_default()
            }
            Err(_) => {
                warn!("Voice discovery timed out");
                Self::engine_default()
            }
        };

        info!("Discovered {} local voice(s)", catalog.options.len());
        catalog
    }

    /// Parse `espeak-ng --voices` output.
    pub fn from_voice_listing(listing: &str) -> Self {
        let mut options: Vec<VoiceOption> = Vec::new();
        for line in listing.lines().skip(1) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                continue;
            }
            let tag = fields[1];
            if options.iter().any(|o| o.tag == tag) {
                continue;
            }
            let name = fields[3].replace('_', " ");
            let label = match gender_suffix(&name) {
                Some(suffix) => format!("{}{}", name, suffix),
                None => name,
            };
            options.push(VoiceOption::new(label, tag));
        }

        if options.is_empty() {
            return Self::engine_default();
        }
        Self {
            kind: CatalogKind::Engine,
            options,
        }
    }

    fn engine_default() -> Self {
        Self {
            kind: CatalogKind::Engine,
            options: vec![VoiceOption::new("Default", DEFAULT_VOICE_TAG)],
        }
    }

    pub fn list_options(&self) -> &[VoiceOption] {
        &self.options
    }

    pub fn speed_options(&self) -> Vec<&'static str> {
        match self.kind {
            CatalogKind::Accents => ACCENT_SPEEDS.to_vec(),
            CatalogKind::Engine => ENGINE_RATES.iter().map(|(s, _)| *s).collect(),
        }
    }

    pub fn default_tag(&self) -> &str {
        self.options
            .first()
            .map(|o| o.tag.as_str())
            .unwrap_or(DEFAULT_VOICE_TAG)
    }

    /// Resolve a selection. Unknown speeds fall back to normal speed.
    pub fn resolve(&self, tag: &str, speed: &str) -> VoiceConfig {
        match self.kind {
            CatalogKind::Accents => VoiceConfig {
                language: provider_language(tag),
                region: region_for(tag).to_string(),
                slow: speed == "Slow",
                ..VoiceConfig::default()
            },
            CatalogKind::Engine => {
                let known = tag != DEFAULT_VOICE_TAG && self.options.iter().any(|o| o.tag == tag);
                let rate = ENGINE_RATES
                    .iter()
                    .find(|(s, _)| *s == speed)
                    .map(|(_, r)| *r)
                    .unwrap_or(VoiceConfig::DEFAULT_RATE);
                VoiceConfig {
                    voice_id: known.then(|| tag.to_string()),
                    rate,
                    ..VoiceConfig::default()
                }
            }
        }
    }
}
