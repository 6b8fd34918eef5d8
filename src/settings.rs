//! Application settings and their environment overrides.

use std::env;

use serde_json::{json, Value};

use crate::window::Geometry;

/// Overrides the URL the request buttons send to.
pub const ENDPOINT_VAR: &str = "FIGHTER_ENDPOINT";
/// When set to `1` or `true`, trigger buttons also show a message box.
pub const ANNOUNCE_VAR: &str = "FIGHTER_ANNOUNCE";

/// Everything configurable about the demo window.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// The window's title.
    pub title: String,
    /// The window's position and size.
    pub geometry: Geometry,
    /// The prompt shown above the buttons.
    pub prompt: String,
    /// The labels of the static trigger buttons.
    pub trigger_labels: Vec<String>,
    /// Whether trigger clicks also show a message with the clicked label.
    pub announce: bool,
    /// The URL requests are sent to.
    pub endpoint: String,
    /// The body sent with POST requests.
    pub payload: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: String::from("My window"),
            geometry: Geometry::new(200, 200, 600, 600),
            prompt: String::from("Choose your fighter!"),
            trigger_labels: vec![String::from("Push me!"), String::from("No, push me!")],
            announce: false,
            endpoint: String::from("https://echo.free.beeceptor.com"),
            payload: json!({"Hello": "World!"}),
        }
    }
}

impl Settings {
    /// Returns the default settings with overrides from the process
    /// environment applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides found by `lookup` and returns self.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_VAR).filter(|value| !value.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(announce) = lookup(ANNOUNCE_VAR) {
            self.announce = matches!(
                announce.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Settings, ANNOUNCE_VAR, ENDPOINT_VAR};

    #[test]
    fn defaults_match_the_demo() {
        let settings = Settings::default();
        assert_eq!(settings.title, "My window");
        assert_eq!(settings.prompt, "Choose your fighter!");
        assert_eq!(settings.trigger_labels, ["Push me!", "No, push me!"]);
        assert!(!settings.announce);
        assert_eq!(settings.payload.to_string(), r#"{"Hello":"World!"}"#);
    }

    #[test]
    fn overrides() {
        let settings = Settings::default().with_overrides(|key| match key {
            ENDPOINT_VAR => Some(String::from(" http://localhost:8080 ")),
            ANNOUNCE_VAR => Some(String::from("TRUE")),
            _ => None,
        });
        assert_eq!(settings.endpoint, "http://localhost:8080");
        assert!(settings.announce);
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let settings = Settings::default().with_overrides(|key| match key {
            ENDPOINT_VAR => Some(String::from("   ")),
            ANNOUNCE_VAR => Some(String::from("nope")),
            _ => None,
        });
        assert_eq!(settings.endpoint, Settings::default().endpoint);
        assert!(!settings.announce);
    }
}
