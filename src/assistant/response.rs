//! Structured classifier output

use serde::{Deserialize, Serialize};

/// Reply used when no rule matches
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I didn't understand that command. Could you try again?";

/// Reply used when the remote classifier cannot be reached
pub const TRANSPORT_FAILURE_REPLY: &str =
    "Sorry, I'm having trouble connecting to my backend services.";

/// Reply used when an arithmetic expression cannot be evaluated
pub const CALCULATION_FAILURE_REPLY: &str = "Sorry, I couldn't calculate that.";

/// What the caller should do with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Pass the reply text to speech synthesis
    #[serde(rename = "SPEAK")]
    Speak,
    /// Offer the payload URL as an affordance; never navigate automatically
    #[serde(rename = "SUGGEST_URL")]
    SuggestLink,
    /// Ask the user for more structured input before a follow-up call
    #[serde(rename = "COLLECT_DETAILS")]
    CollectDetails,
}

impl Directive {
    /// Wire name of the directive
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Speak => "SPEAK",
            Self::SuggestLink => "SUGGEST_URL",
            Self::CollectDetails => "COLLECT_DETAILS",
        }
    }
}

/// Details a `CollectDetails` response asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    /// Follow-up action tag (e.g. `send_email`)
    pub follow_up: String,
    /// Fields the caller should collect
    pub fields: Vec<String>,
}

/// Optional response payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Link to suggest
    Url(String),
    /// Follow-up descriptor
    FollowUp(FollowUp),
    /// Structured data (e.g. news articles)
    Data(serde_json::Value),
}

/// Response produced by the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Reply text
    pub response: String,
    /// Directive for the caller
    pub action: Directive,
    /// Optional payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
}

impl CommandResponse {
    /// A reply to be spoken
    pub fn speak(text: impl Into<String>) -> Self {
        Self {
            response: text.into(),
            action: Directive::Speak,
            data: None,
        }
    }

    /// A reply suggesting a link
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            response: text.into(),
            action: Directive::SuggestLink,
            data: Some(Payload::Url(url.into())),
        }
    }

    /// A reply asking for more details
    pub fn collect(text: impl Into<String>, follow_up: &str, fields: &[&str]) -> Self {
        Self {
            response: text.into(),
            action: Directive::CollectDetails,
            data: Some(Payload::FollowUp(FollowUp {
                follow_up: follow_up.to_string(),
                fields: fields.iter().map(ToString::to_string).collect(),
            })),
        }
    }

    /// Attach structured data
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(Payload::Data(data));
        self
    }

    /// The suggested URL, if any
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match &self.data {
            Some(Payload::Url(url)) => Some(url),
            _ => None,
        }
    }

    /// The fixed fallback for an unreachable classifier
    #[must_use]
    pub fn transport_failure() -> Self {
        Self::speak(TRANSPORT_FAILURE_REPLY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(CommandResponse::link("Go", "https://www.google.com")).unwrap();
        assert_eq!(json["action"], "SUGGEST_URL");
        assert_eq!(json["data"], "https://www.google.com");

        let json = serde_json::to_value(CommandResponse::speak("Hi")).unwrap();
        assert_eq!(json["action"], "SPEAK");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_follow_up_wire_format() {
        let response = CommandResponse::collect("Who to?", "send_email", &["recipient"]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["action"], "COLLECT_DETAILS");
        assert_eq!(json["data"]["followUp"], "send_email");

        let parsed: CommandResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_array_payload_parses_as_data() {
        let parsed: CommandResponse = serde_json::from_str(
            r#"{"response":"News","action":"SPEAK","data":[{"title":"a"},{"title":"b"}]}"#,
        )
        .unwrap();
        assert!(matches!(parsed.data, Some(Payload::Data(_))));
    }
}
