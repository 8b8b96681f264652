//! Error types for the Nova assistant

use thiserror::Error;

/// Result type alias for Nova operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Nova assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The host offers no speech capture or synthesis
    #[error("{0} not supported on this host")]
    UnsupportedCapability(&'static str),

    /// Device, permission or network failure while listening
    #[error("capture error: {0}")]
    Capture(String),

    /// The session was stopped before it produced a result
    #[error("voice session stopped")]
    SessionStopped,

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Transcription(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Synthesis(String),

    /// Remote classifier call failed
    #[error("classification transport error: {0}")]
    Classification(String),

    /// Arithmetic expression could not be parsed or evaluated
    #[error("expression error: {0}")]
    Expression(String),

    /// Command log error
    #[error("database error: {0}")]
    Database(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
