//! Command classification
//!
//! Maps a command string to a [`CommandResponse`] by walking an ordered
//! rule table over a static knowledge base. The classifier is pure apart
//! from the wall clock and the random joke pick.

pub mod client;
pub mod expr;
pub mod knowledge;
pub mod response;
pub mod rules;

use chrono::{Local, NaiveDateTime};

pub use client::{Assistant, COMMAND_PATH, LocalAssistant, RemoteAssistant};
pub use knowledge::{DEFAULT_CITY, KnowledgeBase};
pub use response::{
    CALCULATION_FAILURE_REPLY, CommandResponse, Directive, FALLBACK_REPLY, FollowUp, Payload,
    TRANSPORT_FAILURE_REPLY,
};

/// Keyword command classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    knowledge: KnowledgeBase,
}

impl Classifier {
    /// Create a classifier over a knowledge base
    #[must_use]
    pub const fn new(knowledge: KnowledgeBase) -> Self {
        Self { knowledge }
    }

    /// Classify a command at the current local time
    #[must_use]
    pub fn classify(&self, command: &str) -> CommandResponse {
        self.classify_at(command, Local::now().naive_local())
    }

    /// Classify a command at a fixed time
    #[must_use]
    pub fn classify_at(&self, command: &str, now: NaiveDateTime) -> CommandResponse {
        let command = normalize(command);
        let ctx = rules::Context {
            now,
            knowledge: &self.knowledge,
        };

        match rules::find(&command) {
            Some(rule) => {
                tracing::debug!(rule = rule.name, command, "command matched");
                rule.respond(&command, &ctx)
            }
            None => {
                tracing::debug!(command, "no rule matched");
                rules::fallback()
            }
        }
    }

    /// Name of the rule that would handle `command`
    #[must_use]
    pub fn matched_rule(command: &str) -> &'static str {
        rules::find(&normalize(command)).map_or(rules::FALLBACK_RULE, |rule| rule.name)
    }

    /// Rule names in precedence order
    pub fn rule_names() -> impl Iterator<Item = &'static str> {
        rules::RULES.iter().map(|rule| rule.name)
    }
}

/// Classify with the built-in knowledge base
#[must_use]
pub fn classify(command: &str) -> CommandResponse {
    Classifier::default().classify(command)
}

fn normalize(command: &str) -> String {
    command.trim().to_lowercase()
}
