//! Static mock knowledge base
//!
//! Weather, news, jokes and site links are fixed tables. Nothing here talks
//! to a real data source.

use serde::Serialize;

/// City reported when a weather request names no known city
pub const DEFAULT_CITY: &str = "Mumbai";

/// Fixed weather for one city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherReport {
    pub city: &'static str,
    pub temperature: &'static str,
    pub status: &'static str,
}

/// A news headline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewsArticle {
    pub title: &'static str,
    pub source: &'static str,
    pub description: &'static str,
}

/// A site reachable with "open <name>"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    /// Phrase that triggers the suggestion (e.g. "open google")
    pub trigger: &'static str,
    /// Display name
    pub name: &'static str,
    /// Suggested URL
    pub url: &'static str,
}

pub static WEATHER: &[WeatherReport] = &[
    WeatherReport { city: "Mumbai", temperature: "28°C", status: "Sunny" },
    WeatherReport { city: "Delhi", temperature: "33°C", status: "Hazy" },
    WeatherReport { city: "London", temperature: "15°C", status: "Rainy" },
    WeatherReport { city: "New York", temperature: "22°C", status: "Partly Cloudy" },
    WeatherReport { city: "Paris", temperature: "18°C", status: "Cloudy" },
    WeatherReport { city: "San Francisco", temperature: "17°C", status: "Foggy" },
    WeatherReport { city: "Sydney", temperature: "20°C", status: "Windy" },
    WeatherReport { city: "Tokyo", temperature: "24°C", status: "Clear" },
];

pub static NEWS: &[NewsArticle] = &[
    NewsArticle {
        title: "New technology breakthrough announced",
        source: "Tech News",
        description: "Scientists have developed a new AI model that can understand human emotions.",
    },
    NewsArticle {
        title: "Global climate conference begins",
        source: "World News",
        description: "Leaders from around the world gather to discuss climate change solutions.",
    },
    NewsArticle {
        title: "Stock markets reach new heights",
        source: "Financial News",
        description: "Major indices hit record levels amid strong corporate earnings.",
    },
];

pub static JOKES: &[&str] = &[
    "Why don't scientists trust atoms? Because they make up everything.",
    "I told my computer I needed a break, and it said no problem, it would go to sleep.",
    "Why did the developer go broke? Because he used up all his cache.",
    "What do you call a fake noodle? An impasta.",
    "Why was the math book sad? It had too many problems.",
];

pub static SITES: &[Site] = &[
    Site { trigger: "open google", name: "Google", url: "https://www.google.com" },
    Site { trigger: "open youtube", name: "YouTube", url: "https://www.youtube.com" },
    Site { trigger: "open linkedin", name: "LinkedIn", url: "https://www.linkedin.com" },
];

/// Link suggested for music requests
pub const MUSIC_URL: &str = "https://music.youtube.com";

/// Knowledge base with a configurable default city
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeBase {
    default_weather: &'static WeatherReport,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self {
            default_weather: &WEATHER[0],
        }
    }
}

impl KnowledgeBase {
    /// Use `city` as the default weather location
    ///
    /// Unknown cities keep the built-in default.
    #[must_use]
    pub fn with_default_city(mut self, city: &str) -> Self {
        match find_city(city) {
            Some(report) => self.default_weather = report,
            None => tracing::warn!(city, "unknown default city, keeping {}", self.default_weather.city),
        }
        self
    }

    /// Weather for the default city
    #[must_use]
    pub const fn default_weather(&self) -> &'static WeatherReport {
        self.default_weather
    }

    /// Weather for `city`, falling back to the default city
    #[must_use]
    pub fn weather_for(&self, city: Option<&str>) -> &'static WeatherReport {
        city.and_then(find_city).unwrap_or(self.default_weather)
    }

    /// Pick a random joke
    #[must_use]
    pub fn joke(&self) -> &'static str {
        use rand::seq::SliceRandom;

        JOKES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("I'm all out of jokes right now.")
    }
}

/// Look up a city by name, case-insensitively
#[must_use]
pub fn find_city(name: &str) -> Option<&'static WeatherReport> {
    let name = name.trim();
    WEATHER.iter().find(|w| w.city.eq_ignore_ascii_case(name))
}

/// Find the known city that `text` starts with
///
/// The longest match wins and must end on a word boundary, so
/// "new york tomorrow" resolves to New York.
#[must_use]
pub fn city_prefix(text: &str) -> Option<&'static WeatherReport> {
    let text = text.trim_start().to_lowercase();
    WEATHER
        .iter()
        .filter(|w| {
            let city = w.city.to_lowercase();
            text.strip_prefix(city.as_str())
                .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_alphanumeric()))
        })
        .max_by_key(|w| w.city.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_city_is_first_entry() {
        let kb = KnowledgeBase::default();
        assert_eq!(kb.default_weather().city, DEFAULT_CITY);
    }

    #[test]
    fn test_with_default_city() {
        let kb = KnowledgeBase::default().with_default_city("london");
        assert_eq!(kb.default_weather().city, "London");

        let kb = KnowledgeBase::default().with_default_city("Atlantis");
        assert_eq!(kb.default_weather().city, DEFAULT_CITY);
    }

    #[test]
    fn test_city_prefix() {
        assert_eq!(city_prefix("new york tomorrow").unwrap().city, "New York");
        assert_eq!(city_prefix(" Tokyo?").unwrap().city, "Tokyo");
        assert!(city_prefix("londonderry").is_none());
        assert!(city_prefix("atlantis").is_none());
    }

    #[test]
    fn test_joke_comes_from_table() {
        let kb = KnowledgeBase::default();
        for _ in 0..10 {
            assert!(JOKES.contains(&kb.joke()));
        }
    }
}
