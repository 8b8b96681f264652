//! Speech-to-text (STT) via the `OpenAI` Whisper API

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Response from `OpenAI` Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    language: Option<String>,
}

impl SpeechToText {
    /// Create a new Whisper transcriber
    ///
    /// `locale` such as "en-US" is reduced to its language code.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new_whisper(api_key: SecretString, model: String, locale: &str) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        let language = locale
            .split(['-', '_'])
            .next()
            .filter(|lang| !lang.is_empty())
            .map(str::to_lowercase);

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            language,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects the audio
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model", self.model.clone());
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(WHISPER_URL)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transcription(format!("Whisper error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        tracing::debug!(text = %result.text, "transcription complete");
        Ok(result.text)
    }
}
