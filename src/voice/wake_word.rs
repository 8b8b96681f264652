//! Wake word handling
//!
//! Decides what a finalized transcript means for the session: a bare wake
//! word, a wake word followed by a command, or an informal utterance.

use crate::{Error, Result};

/// What a transcript means relative to the wake word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeDecision {
    /// Exactly the wake word; acknowledge and wait for the command
    Acknowledge,
    /// Wake word with nothing after it; prompt again
    Reprompt,
    /// Wake word followed by a command (prefix stripped)
    Command(String),
    /// No wake word; the transcript is the command
    Passthrough(String),
}

/// Matches transcripts against a wake word
#[derive(Debug, Clone)]
pub struct WakeWord {
    word: String,
}

impl WakeWord {
    /// Create a wake word matcher
    ///
    /// # Errors
    ///
    /// Returns error if the wake word is empty after normalization
    pub fn new(word: &str) -> Result<Self> {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return Err(Error::Config("wake word must not be empty".to_string()));
        }

        tracing::debug!(wake_word = %word, "wake word configured");
        Ok(Self { word })
    }

    /// The normalized wake word
    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Classify a transcript
    ///
    /// The transcript is trimmed and lowercased first. The wake word only
    /// counts when followed by a word boundary, so "novak" is not "nova".
    #[must_use]
    pub fn decide(&self, transcript: &str) -> WakeDecision {
        let normalized = transcript.trim().to_lowercase();

        if normalized == self.word {
            tracing::info!(wake_word = %self.word, "wake word detected");
            return WakeDecision::Acknowledge;
        }

        match self.strip(&normalized) {
            Some(command) if command.is_empty() => WakeDecision::Reprompt,
            Some(command) => {
                tracing::info!(wake_word = %self.word, command, "wake word with command");
                WakeDecision::Command(command.to_string())
            }
            None => WakeDecision::Passthrough(normalized),
        }
    }

    /// Strip the wake word prefix and separators, if present
    fn strip<'a>(&self, normalized: &'a str) -> Option<&'a str> {
        let rest = normalized.strip_prefix(self.word.as_str())?;
        if rest.chars().next().is_some_and(char::is_alphanumeric) {
            return None;
        }
        Some(rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '.' || c == '!'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nova() -> WakeWord {
        WakeWord::new("nova").unwrap()
    }

    #[test]
    fn test_bare_wake_word() {
        assert_eq!(nova().decide("Nova"), WakeDecision::Acknowledge);
        assert_eq!(nova().decide("  nova "), WakeDecision::Acknowledge);
    }

    #[test]
    fn test_wake_word_with_command() {
        assert_eq!(
            nova().decide("Nova, open Google"),
            WakeDecision::Command("open google".to_string())
        );
        assert_eq!(
            nova().decide("nova what is the time"),
            WakeDecision::Command("what is the time".to_string())
        );
    }

    #[test]
    fn test_wake_word_with_empty_remainder() {
        assert_eq!(nova().decide("nova,"), WakeDecision::Reprompt);
        assert_eq!(nova().decide("nova ..."), WakeDecision::Reprompt);
    }

    #[test]
    fn test_no_wake_word() {
        assert_eq!(
            nova().decide("Open Google"),
            WakeDecision::Passthrough("open google".to_string())
        );
    }

    #[test]
    fn test_wake_word_needs_boundary() {
        assert_eq!(
            nova().decide("novak djokovic"),
            WakeDecision::Passthrough("novak djokovic".to_string())
        );
    }

    #[test]
    fn test_wake_word_normalization() {
        let wake = WakeWord::new("  NOVA ").unwrap();
        assert_eq!(wake.word(), "nova");
        assert!(WakeWord::new("   ").is_err());
    }
}
