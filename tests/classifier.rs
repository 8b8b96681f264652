//! Command classifier integration tests

use chrono::{NaiveDate, NaiveDateTime};
use nova_assistant::assistant::knowledge::JOKES;
use nova_assistant::assistant::{
    CALCULATION_FAILURE_REPLY, FALLBACK_REPLY, KnowledgeBase, Payload,
};
use nova_assistant::{Classifier, Directive, classify};

/// Friday, March 14, 2025 at 9:05:07 in the morning
fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .unwrap()
        .and_hms_opt(9, 5, 7)
        .unwrap()
}

fn reply(command: &str) -> String {
    Classifier::default().classify_at(command, morning()).response
}

#[test]
fn test_open_site_suggests_link() {
    let response = classify("Open Google");
    assert_eq!(response.action, Directive::SuggestLink);
    assert_eq!(response.url(), Some("https://www.google.com"));
    assert!(response.response.contains("google.com"));

    assert_eq!(classify("open linkedin please").url(), Some("https://www.linkedin.com"));
}

#[test]
fn test_time_and_date() {
    assert_eq!(reply("what time is it"), "The current time is 9:05:07 AM");
    assert_eq!(reply("tell me the date"), "Today is Friday, March 14, 2025");
    assert_eq!(reply("what day is it"), "Today is Friday, March 14, 2025");
}

#[test]
fn test_time_in_the_evening() {
    let evening = NaiveDate::from_ymd_opt(2025, 3, 14)
        .unwrap()
        .and_hms_opt(21, 30, 0)
        .unwrap();
    let response = Classifier::default().classify_at("what's the time", evening);
    assert_eq!(response.response, "The current time is 9:30:00 PM");
}

#[test]
fn test_weather_default_and_named_city() {
    assert_eq!(reply("how is the weather"), "The weather in Mumbai is 28°C and Sunny.");
    assert_eq!(
        reply("weather in london"),
        "The weather in London is 15°C and Rainy."
    );
    assert_eq!(
        reply("what's the weather in new york tomorrow"),
        "The weather in New York is 22°C and Partly Cloudy."
    );
    // Unknown cities fall back to the default
    assert_eq!(reply("weather in atlantis"), "The weather in Mumbai is 28°C and Sunny.");
}

#[test]
fn test_weather_configured_default_city() {
    let classifier = Classifier::new(KnowledgeBase::default().with_default_city("Tokyo"));
    let response = classifier.classify_at("weather", morning());
    assert_eq!(response.response, "The weather in Tokyo is 24°C and Clear.");

    let classifier = Classifier::new(KnowledgeBase::default().with_default_city("Gotham"));
    let response = classifier.classify_at("weather", morning());
    assert_eq!(response.response, "The weather in Mumbai is 28°C and Sunny.");
}

#[test]
fn test_news_lists_headlines() {
    let response = classify("give me the latest headlines");
    assert_eq!(response.action, Directive::Speak);
    assert!(response.response.starts_with("Here are the top headlines: 1. "));
    assert!(response.response.contains("3. Stock markets reach new heights"));

    match response.data {
        Some(Payload::Data(data)) => assert_eq!(data.as_array().map(Vec::len), Some(3)),
        other => panic!("expected news data, got {other:?}"),
    }
}

#[test]
fn test_send_email_collects_details() {
    let response = classify("send an email to my boss");
    assert_eq!(response.action, Directive::CollectDetails);

    match response.data {
        Some(Payload::FollowUp(follow_up)) => {
            assert_eq!(follow_up.follow_up, "send_email");
            assert_eq!(follow_up.fields, vec!["recipient", "subject", "body"]);
        }
        other => panic!("expected follow-up, got {other:?}"),
    }
}

#[test]
fn test_wikipedia_topic() {
    let response = classify("search for alan turing");
    assert!(response.response.contains("alan turing"));

    assert_eq!(classify("wikipedia").response, "What would you like me to search for?");
}

#[test]
fn test_small_talk() {
    assert_eq!(classify("hi").response, "Hello! How can I assist you today?");
    assert_eq!(classify("Good morning Nova").response, "Hello! How can I assist you today?");
    assert_eq!(classify("bye").response, "Goodbye! Have a nice day!");
    assert!(classify("what can you do").response.starts_with("You can ask me"));
}

#[test]
fn test_music_suggests_link() {
    let response = classify("play some music");
    assert_eq!(response.action, Directive::SuggestLink);
    assert_eq!(response.url(), Some("https://music.youtube.com"));
}

#[test]
fn test_joke_comes_from_table() {
    let response = classify("tell me a joke");
    assert!(JOKES.contains(&response.response.as_str()));
}

#[test]
fn test_arithmetic() {
    assert_eq!(classify("what is 2 + 2").response, "The result is 4");
    assert_eq!(classify("calculate 7 divided by 2").response, "The result is 3.5");
    assert_eq!(classify("calculate (1 + 2) times 3").response, "The result is 9");
    assert_eq!(classify("calculate 10 divided by 0").response, CALCULATION_FAILURE_REPLY);
    assert_eq!(classify("calculate the universe").response, CALCULATION_FAILURE_REPLY);
}

#[test]
fn test_fallback() {
    assert_eq!(classify("what is the meaning of life").response, FALLBACK_REPLY);
    assert_eq!(classify("this").response, FALLBACK_REPLY);
    assert_eq!(Classifier::matched_rule("sing"), "fallback");
}

#[test]
fn test_normalization() {
    let response = classify("   OPEN YOUTUBE   ");
    assert_eq!(response.url(), Some("https://www.youtube.com"));
}

#[test]
fn test_rule_precedence() {
    assert_eq!(Classifier::matched_rule("open google and tell me the time"), "open_site");
    assert_eq!(Classifier::matched_rule("what time is the weather report"), "time");
    assert_eq!(Classifier::matched_rule("weather news"), "weather");
    assert_eq!(Classifier::matched_rule("hello, play music"), "greeting");
    assert_eq!(Classifier::matched_rule("help me say bye"), "goodbye");
    assert_eq!(Classifier::matched_rule("search for a joke"), "wikipedia");

    let names: Vec<_> = Classifier::rule_names().collect();
    assert_eq!(names.first(), Some(&"open_site"));
    assert_eq!(names.last(), Some(&"arithmetic"));
}

#[test]
fn test_wire_format() {
    let json = serde_json::to_value(classify("open youtube")).unwrap();
    assert_eq!(json["action"], "SUGGEST_URL");
    assert_eq!(json["data"], "https://www.youtube.com");

    let json = serde_json::to_value(classify("hi")).unwrap();
    assert_eq!(json["action"], "SPEAK");
    assert!(json.get("data").is_none());

    let json = serde_json::to_value(classify("compose email")).unwrap();
    assert_eq!(json["action"], "COLLECT_DETAILS");
    assert_eq!(json["data"]["followUp"], "send_email");
}

#[test]
fn test_spoken_arithmetic() {
    let response = classify("calculate 2 plus 2");
    assert_eq!(response.action, Directive::Speak);
    assert!(response.response.contains('4'));
}

#[test]
fn test_incomplete_arithmetic_fails() {
    assert_eq!(classify("calculate 2 +").response, CALCULATION_FAILURE_REPLY);
}
