//! Configuration management for the Nova assistant
//!
//! Values are layered env > TOML file > defaults.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::{Error, Result};

use file::NovaConfigFile;

/// Default wake word
pub const DEFAULT_WAKE_WORD: &str = "nova";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 18790;

/// Default delay before capture is re-armed after a spoken prompt
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Nova configuration
#[derive(Debug)]
pub struct Config {
    /// Path to data directory (command log database)
    pub data_dir: PathBuf,

    /// Voice session configuration
    pub voice: VoiceConfig,

    /// Classifier configuration
    pub assistant: AssistantConfig,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice session configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Wake word that prefixes explicit commands
    pub wake_word: String,

    /// Capture locale
    pub locale: String,

    /// Delay before capture is re-armed after the assistant speaks a prompt
    pub settle_delay: Duration,

    /// Voice names preferred when picking a synthesis voice
    pub preferred_voices: Vec<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            wake_word: DEFAULT_WAKE_WORD.to_string(),
            locale: "en-US".to_string(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            preferred_voices: default_preferred_voices(),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "nova".to_string(),
        }
    }
}

/// Classifier configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Remote classifier base URL; commands are classified in-process when unset
    pub backend_url: Option<String>,

    /// City reported when a weather request names no known city
    pub default_city: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            default_city: crate::assistant::DEFAULT_CITY.to_string(),
        }
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web front end)
    pub static_dir: Option<PathBuf>,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (for Whisper and TTS)
    pub openai: Option<SecretString>,
}

fn default_preferred_voices() -> Vec<String> {
    ["Samantha", "Google US English Female", "nova"]
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("nova"))
}

impl Config {
    /// Load configuration from the environment and the optional config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        let config = Self::resolve(fc, |key| std::env::var(key).ok())?;

        // Ensure data dir exists
        std::fs::create_dir_all(&config.data_dir).ok();

        Ok(config)
    }

    /// Merge a parsed config file with an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the wake word is empty or a numeric value does not parse
    pub fn resolve<F>(fc: NovaConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = VoiceConfig::default();

        let wake_word = env("NOVA_WAKE_WORD")
            .or(fc.voice.wake_word)
            .unwrap_or(defaults.wake_word)
            .trim()
            .to_lowercase();
        if wake_word.is_empty() {
            return Err(Error::Config("wake word must not be empty".to_string()));
        }

        let settle_delay_ms = match env("NOVA_SETTLE_DELAY_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                Error::Config(format!("invalid NOVA_SETTLE_DELAY_MS {raw:?}: {e}"))
            })?,
            None => fc.voice.settle_delay_ms.unwrap_or(DEFAULT_SETTLE_DELAY_MS),
        };

        let voice = VoiceConfig {
            wake_word,
            locale: env("NOVA_LOCALE")
                .or(fc.voice.locale)
                .unwrap_or(defaults.locale),
            settle_delay: Duration::from_millis(settle_delay_ms),
            preferred_voices: fc.voice.preferred_voices.unwrap_or(defaults.preferred_voices),
            stt_model: env("NOVA_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(defaults.stt_model),
            tts_model: env("NOVA_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or(defaults.tts_model),
            tts_voice: env("NOVA_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or(defaults.tts_voice),
        };

        let assistant = AssistantConfig {
            backend_url: env("NOVA_BACKEND_URL")
                .or(fc.assistant.backend_url)
                .filter(|url| !url.trim().is_empty()),
            default_city: env("NOVA_DEFAULT_CITY")
                .or(fc.assistant.default_city)
                .unwrap_or_else(|| crate::assistant::DEFAULT_CITY.to_string()),
        };

        let port = match env("NOVA_PORT").or_else(|| env("PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("invalid port {raw:?}: {e}")))?,
            None => fc.server.port.unwrap_or(DEFAULT_PORT),
        };

        let api_server = ApiServerConfig {
            port,
            static_dir: env("NOVA_STATIC_DIR")
                .map(PathBuf::from)
                .or(fc.server.static_dir),
        };

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|key| !key.is_empty())
                .map(SecretString::from),
        };

        let data_dir = env("NOVA_DATA_DIR")
            .map(PathBuf::from)
            .or(fc.data_dir)
            .unwrap_or_else(default_data_dir);

        Ok(Self {
            data_dir,
            voice,
            assistant,
            api_server,
            api_keys,
        })
    }

    /// Path of the command log database
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("nova.db")
    }
}
