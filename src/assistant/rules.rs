//! Ordered command rules
//!
//! Rules are evaluated top to bottom and the first match wins. Matching is
//! literal substring containment on the lowercased command.

use chrono::NaiveDateTime;

use super::expr;
use super::knowledge::{self, KnowledgeBase, MUSIC_URL, NEWS, SITES};
use super::response::{CALCULATION_FAILURE_REPLY, CommandResponse, FALLBACK_REPLY};

/// Inputs available to a rule handler
pub struct Context<'a> {
    /// Local wall-clock time of the request
    pub now: NaiveDateTime,
    /// Knowledge base
    pub knowledge: &'a KnowledgeBase,
}

/// A (predicate, handler) pair
pub struct Rule {
    /// Rule name, used for logging and precedence tests
    pub name: &'static str,
    matches: fn(&str) -> bool,
    respond: fn(&str, &Context<'_>) -> CommandResponse,
}

impl Rule {
    /// Check whether this rule accepts a normalized command
    #[must_use]
    pub fn matches(&self, command: &str) -> bool {
        (self.matches)(command)
    }

    /// Produce this rule's response
    #[must_use]
    pub fn respond(&self, command: &str, ctx: &Context<'_>) -> CommandResponse {
        (self.respond)(command, ctx)
    }
}

/// The rule table, in precedence order
pub static RULES: &[Rule] = &[
    Rule { name: "open_site", matches: is_open_site, respond: open_site },
    Rule { name: "time", matches: is_time, respond: time },
    Rule { name: "date", matches: is_date, respond: date },
    Rule { name: "weather", matches: is_weather, respond: weather },
    Rule { name: "news", matches: is_news, respond: news },
    Rule { name: "send_email", matches: is_send_email, respond: send_email },
    Rule { name: "wikipedia", matches: is_wikipedia, respond: wikipedia },
    Rule { name: "greeting", matches: is_greeting, respond: greeting },
    Rule { name: "goodbye", matches: is_goodbye, respond: goodbye },
    Rule { name: "help", matches: is_help, respond: help },
    Rule { name: "play_music", matches: is_play_music, respond: play_music },
    Rule { name: "joke", matches: is_joke, respond: joke },
    Rule { name: "arithmetic", matches: is_arithmetic, respond: arithmetic },
];

/// Name reported when no rule matches
pub const FALLBACK_RULE: &str = "fallback";

/// Find the first rule accepting a normalized command
#[must_use]
pub fn find(command: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(command))
}

/// Response for unmatched commands
#[must_use]
pub fn fallback() -> CommandResponse {
    CommandResponse::speak(FALLBACK_REPLY)
}

fn contains_any(command: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| command.contains(needle))
}

fn is_open_site(command: &str) -> bool {
    SITES.iter().any(|site| command.contains(site.trigger))
}

fn open_site(command: &str, _ctx: &Context<'_>) -> CommandResponse {
    SITES
        .iter()
        .find(|site| command.contains(site.trigger))
        .map_or_else(fallback, |site| {
            CommandResponse::link(
                format!(
                    "I would open {} for you, but I'm running in a browser already. You can visit {} directly.",
                    site.name,
                    site.url.trim_start_matches("https://www.")
                ),
                site.url,
            )
        })
}

fn is_time(command: &str) -> bool {
    contains_any(command, &["the time", "what time"])
}

fn time(_command: &str, ctx: &Context<'_>) -> CommandResponse {
    CommandResponse::speak(format!(
        "The current time is {}",
        ctx.now.format("%-I:%M:%S %p")
    ))
}

fn is_date(command: &str) -> bool {
    contains_any(command, &["the date", "what day", "today's date"])
}

fn date(_command: &str, ctx: &Context<'_>) -> CommandResponse {
    CommandResponse::speak(format!("Today is {}", ctx.now.format("%A, %B %-d, %Y")))
}

fn is_weather(command: &str) -> bool {
    command.contains("weather")
}

fn weather(command: &str, ctx: &Context<'_>) -> CommandResponse {
    let requested = command
        .split_once("weather in ")
        .and_then(|(_, rest)| knowledge::city_prefix(rest));
    let report = requested.unwrap_or_else(|| ctx.knowledge.default_weather());

    CommandResponse::speak(format!(
        "The weather in {} is {} and {}.",
        report.city, report.temperature, report.status
    ))
    .with_data(serde_json::json!(report))
}

fn is_news(command: &str) -> bool {
    contains_any(command, &["news", "headlines"])
}

fn news(_command: &str, _ctx: &Context<'_>) -> CommandResponse {
    let mut reply = String::from("Here are the top headlines: ");
    for (index, article) in NEWS.iter().enumerate() {
        reply.push_str(&format!(
            "{}. {} from {}. {} ",
            index + 1,
            article.title,
            article.source,
            article.description
        ));
    }

    CommandResponse::speak(reply.trim_end()).with_data(serde_json::json!(NEWS))
}

fn is_send_email(command: &str) -> bool {
    contains_any(
        command,
        &["send email", "send an email", "compose email", "write an email"],
    )
}

fn send_email(_command: &str, _ctx: &Context<'_>) -> CommandResponse {
    CommandResponse::collect(
        "Sure, I can help with that email. Who should I send it to, and what should it say?",
        "send_email",
        &["recipient", "subject", "body"],
    )
}

fn is_wikipedia(command: &str) -> bool {
    contains_any(command, &["wikipedia", "search for"])
}

/// Words dropped when extracting a search topic
const SEARCH_FILLER: &[&str] = &[
    "search", "wikipedia", "on", "in", "for", "about", "tell", "me", "look", "up", "please",
];

fn search_topic(command: &str) -> String {
    let text = command
        .split_once("search for")
        .map_or(command, |(_, rest)| rest);

    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty() && !SEARCH_FILLER.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn wikipedia(command: &str, _ctx: &Context<'_>) -> CommandResponse {
    let topic = search_topic(command);
    if topic.is_empty() {
        return CommandResponse::speak("What would you like me to search for?");
    }

    CommandResponse::speak(format!(
        "According to Wikipedia, {topic} is a widely covered subject. This is a demo summary, so connect a knowledge source for the full article."
    ))
    .with_data(serde_json::json!({
        "topic": topic,
        "url": format!(
            "https://en.wikipedia.org/wiki/Special:Search?search={}",
            topic.replace(' ', "+")
        ),
    }))
}

fn is_greeting(command: &str) -> bool {
    matches!(command, "hi" | "hey")
        || contains_any(
            command,
            &[
                "hello",
                "hi nova",
                "hey nova",
                "good morning",
                "good afternoon",
                "good evening",
            ],
        )
}

fn greeting(_command: &str, _ctx: &Context<'_>) -> CommandResponse {
    CommandResponse::speak("Hello! How can I assist you today?")
}

fn is_goodbye(command: &str) -> bool {
    command.contains("bye")
}

fn goodbye(_command: &str, _ctx: &Context<'_>) -> CommandResponse {
    CommandResponse::speak("Goodbye! Have a nice day!")
}

fn is_help(command: &str) -> bool {
    contains_any(command, &["help", "what can you do"])
}

fn help(_command: &str, _ctx: &Context<'_>) -> CommandResponse {
    CommandResponse::speak(
        "You can ask me to open Google, YouTube or LinkedIn, tell you the time or the date, \
         check the weather, read the news, search Wikipedia, tell a joke, play music, \
         or calculate something like two plus two.",
    )
}

fn is_play_music(command: &str) -> bool {
    command.contains("play") && contains_any(command, &["music", "song"])
}

fn play_music(_command: &str, _ctx: &Context<'_>) -> CommandResponse {
    CommandResponse::link(
        "I can't play music directly, but here's a link to YouTube Music.",
        MUSIC_URL,
    )
}

fn is_joke(command: &str) -> bool {
    command.contains("joke")
}

fn joke(_command: &str, ctx: &Context<'_>) -> CommandResponse {
    CommandResponse::speak(ctx.knowledge.joke())
}

fn is_arithmetic(command: &str) -> bool {
    command.contains("calculate")
        || (command.contains("what is") && command.contains(['+', '-', '*', '/']))
}

fn arithmetic(command: &str, _ctx: &Context<'_>) -> CommandResponse {
    let expression = expr::prepare_expression(command);
    match expr::evaluate(&expression) {
        Ok(value) => CommandResponse::speak(format!(
            "The result is {}",
            expr::format_number(value)
        )),
        Err(e) => {
            tracing::debug!(expression, error = %e, "arithmetic evaluation failed");
            CommandResponse::speak(CALCULATION_FAILURE_REPLY)
        }
    }
}
