use std::env;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Settings for the generation service, read from the environment (`.env` included).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        // an empty key counts as missing
        let key = |name: &str| {
            lookup(name)
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
        };
        let api_key = key("GEMINI_API_KEY").or_else(|| key("API_KEY"));

        let temperature = match lookup("GEMINI_TEMPERATURE") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid GEMINI_TEMPERATURE, using default");
                defaults.temperature
            }),
            None => defaults.temperature,
        };

        Self {
            api_key,
            model: lookup("GEMINI_MODEL").unwrap_or(defaults.model),
            api_base: lookup("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn falls_back_to_plain_api_key() {
        let config = Config::from_lookup(lookup(&[("API_KEY", " AIzaTest ")]));
        assert_eq!(config.api_key.as_deref(), Some("AIzaTest"));
    }

    #[test]
    fn blank_key_is_missing() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")]));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn blank_gemini_key_falls_back_to_plain_key() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "   "),
            ("API_KEY", "AIzaFallback"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("AIzaFallback"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("GEMINI_API_BASE", "http://localhost:9000/"),
            ("GEMINI_TEMPERATURE", "0.2"),
        ]));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.api_base, "http://localhost:9000");
        assert_eq!(config.temperature, 0.2);
    }
}
