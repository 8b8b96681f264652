//! Speech synthesis resources and voice selection

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{Error, Result};

/// A voice offered by a synthesis backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Voice name (e.g. "Samantha")
    pub name: String,
    /// Voice locale (e.g. "en-US")
    pub lang: String,
    /// Backend tags (e.g. "female")
    pub tags: Vec<String>,
}

impl VoiceInfo {
    /// Create a voice descriptor
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            tags: Vec::new(),
        }
    }

    /// Add a tag
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    fn is_female(&self) -> bool {
        self.name.to_lowercase().contains("female")
            || self.tags.iter().any(|tag| tag.eq_ignore_ascii_case("female"))
    }
}

/// Text to speak plus voice parameters
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceOutputRequest {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// `None` means the platform default voice
    pub voice: Option<VoiceInfo>,
}

impl VoiceOutputRequest {
    /// A request at normal rate, pitch and volume
    pub fn new(text: impl Into<String>, voice: Option<VoiceInfo>) -> Self {
        Self {
            text: text.into(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice,
        }
    }
}

/// Host speech-synthesis capability
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Whether the host can synthesize speech at all
    fn is_available(&self) -> bool {
        true
    }

    /// Voices the host offers
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Cancel any in-flight utterance
    fn cancel(&self);

    /// Speak a request, resolving when playback ends
    async fn speak(&self, request: &VoiceOutputRequest) -> Result<()>;
}

/// Pick a voice: any female voice, else a preferred name, else the default
#[must_use]
pub fn select_voice(voices: &[VoiceInfo], preferred: &[String]) -> Option<VoiceInfo> {
    voices
        .iter()
        .find(|voice| voice.is_female() || preferred.iter().any(|name| *name == voice.name))
        .cloned()
}

/// Speaks replies through a synthesis backend, never failing
#[derive(Clone)]
pub struct Speaker {
    backend: Arc<dyn SynthesisBackend>,
    preferred_voices: Vec<String>,
}

impl Speaker {
    /// Create a speaker
    pub fn new(backend: Arc<dyn SynthesisBackend>, preferred_voices: Vec<String>) -> Self {
        Self {
            backend,
            preferred_voices,
        }
    }

    /// Speak `text`, cancelling anything already playing
    ///
    /// Resolves when playback ends. Errors are logged, not returned.
    pub async fn speak(&self, text: &str) {
        if !self.backend.is_available() {
            tracing::warn!(error = %Error::UnsupportedCapability("speech synthesis"), "cannot speak reply");
            return;
        }

        self.backend.cancel();

        let voice = select_voice(&self.backend.voices(), &self.preferred_voices);
        let request = VoiceOutputRequest::new(text, voice);
        tracing::debug!(
            voice = request.voice.as_ref().map_or("default", |v| v.name.as_str()),
            chars = text.len(),
            "speaking"
        );

        if let Err(e) = self.backend.speak(&request).await {
            tracing::error!(error = %e, "speech synthesis failed");
        }
    }

    /// Cancel playback best-effort
    pub fn cancel(&self) {
        self.backend.cancel();
    }
}

/// Prints replies instead of speaking them
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSynthesizer;

#[async_trait]
impl SynthesisBackend for ConsoleSynthesizer {
    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    fn cancel(&self) {}

    async fn speak(&self, request: &VoiceOutputRequest) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "Nova: {}", request.text)?;
        stdout.flush()?;
        Ok(())
    }
}
