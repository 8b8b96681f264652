//! Text-to-speech (TTS) via the `OpenAI` speech API

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::playback::AudioPlayback;
use super::synthesis::{SynthesisBackend, VoiceInfo, VoiceOutputRequest};
use crate::{Error, Result};

const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Voices offered by the `OpenAI` speech API
const OPENAI_VOICES: &[(&str, &str)] = &[
    ("alloy", "neutral"),
    ("echo", "male"),
    ("fable", "neutral"),
    ("onyx", "male"),
    ("nova", "female"),
    ("shimmer", "female"),
];

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    model: String,
}

impl TextToSpeech {
    /// Create a new `OpenAI` TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new_openai(api_key: SecretString, voice: String, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            model,
        })
    }

    /// Synthesize text to MP3 audio
    ///
    /// `voice` overrides the configured voice; `speed` follows the request rate.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn synthesize(&self, text: &str, voice: Option<&str>, speed: f32) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: voice.unwrap_or(&self.voice),
            speed,
        };

        let response = self
            .client
            .post(SPEECH_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

/// Cloud synthesis played through the default speakers
pub struct CloudSynthesizer {
    tts: TextToSpeech,
    playback: Arc<AudioPlayback>,
    current: Mutex<Option<Arc<AtomicBool>>>,
}

impl CloudSynthesizer {
    /// Create a cloud synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn new(tts: TextToSpeech) -> Result<Self> {
        Ok(Self {
            tts,
            playback: Arc::new(AudioPlayback::new()?),
            current: Mutex::new(None),
        })
    }
}

#[async_trait]
impl SynthesisBackend for CloudSynthesizer {
    fn voices(&self) -> Vec<VoiceInfo> {
        OPENAI_VOICES
            .iter()
            .map(|(name, tag)| VoiceInfo::new(*name, "en-US").tagged(*tag))
            .collect()
    }

    fn cancel(&self) {
        if let Ok(mut current) = self.current.lock()
            && let Some(stop) = current.take()
        {
            stop.store(true, Ordering::SeqCst);
        }
    }

    async fn speak(&self, request: &VoiceOutputRequest) -> Result<()> {
        let stop = Arc::new(AtomicBool::new(false));
        if let Ok(mut current) = self.current.lock() {
            *current = Some(Arc::clone(&stop));
        }

        let voice = request.voice.as_ref().map(|v| v.name.as_str());
        let audio = self.tts.synthesize(&request.text, voice, request.rate).await?;
        if stop.load(Ordering::SeqCst) {
            return Ok(());
        }

        let playback = Arc::clone(&self.playback);
        tokio::task::spawn_blocking(move || playback.play_mp3_blocking(&audio, &stop))
            .await
            .map_err(|e| Error::Audio(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        let result = TextToSpeech::new_openai(
            SecretString::from(String::new()),
            "nova".to_string(),
            "tts-1".to_string(),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_openai_voice_table_has_female_voice() {
        let female: Vec<_> = OPENAI_VOICES
            .iter()
            .filter(|(_, tag)| *tag == "female")
            .map(|(name, _)| *name)
            .collect();
        assert!(female.contains(&"nova"));
    }
}
