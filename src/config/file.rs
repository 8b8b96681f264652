//! TOML configuration file loading
//!
//! Supports `~/.config/nova/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct NovaConfigFile {
    /// Data directory for the command log
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Voice session configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Classifier configuration
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Voice session configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Wake word (e.g. "nova")
    pub wake_word: Option<String>,

    /// Capture locale (e.g. "en-US")
    pub locale: Option<String>,

    /// Delay before re-arming capture after a spoken prompt
    pub settle_delay_ms: Option<u64>,

    /// Voice names preferred when picking a synthesis voice
    pub preferred_voices: Option<Vec<String>>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "nova")
    pub tts_voice: Option<String>,
}

/// Classifier configuration
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Base URL of a remote classifier; classify locally when unset
    pub backend_url: Option<String>,

    /// City reported when a weather request names no known city
    pub default_city: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,

    /// Static files directory for a web front end
    pub static_dir: Option<PathBuf>,
}

/// Load the config file from the standard location
///
/// Returns `NovaConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> NovaConfigFile {
    let Some(path) = config_file_path() else {
        return NovaConfigFile::default();
    };

    if !path.exists() {
        return NovaConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                NovaConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            NovaConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/nova/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("nova").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_file() {
        let fc: NovaConfigFile = toml::from_str(
            r#"
            [voice]
            wake_word = "jarvis"
            settle_delay_ms = 250

            [assistant]
            default_city = "London"
            "#,
        )
        .unwrap();

        assert_eq!(fc.voice.wake_word.as_deref(), Some("jarvis"));
        assert_eq!(fc.voice.settle_delay_ms, Some(250));
        assert_eq!(fc.assistant.default_city.as_deref(), Some("London"));
        assert!(fc.server.port.is_none());
        assert!(fc.api_keys.openai.is_none());
    }

    #[test]
    fn test_parse_empty_file() {
        let fc: NovaConfigFile = toml::from_str("").unwrap();
        assert!(fc.voice.wake_word.is_none());
        assert!(fc.data_dir.is_none());
    }
}
