//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default model used for every stage.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Helper configuration, resolved from the process environment.
#[derive(Debug, Clone)]
pub struct HelperConfig {
    /// API credential. `None` is allowed at load time; the stage client
    /// refuses to make calls without it.
    pub api_key: Option<SecretString>,
    /// Model identifier sent with every request.
    pub model: String,
    /// Base URL of the model service.
    pub base_url: String,
    /// Display name of the student.
    pub student_name: String,
    /// Learning-style tag shown on the profile.
    pub learning_style: String,
    /// Directory for rolling log files. Console-only logging when unset.
    pub log_dir: Option<std::path::PathBuf>,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            student_name: "Alex".to_string(),
            learning_style: "Visual".to_string(),
            log_dir: None,
        }
    }
}

impl HelperConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|var| lookup(var))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
            .map(SecretString::from);

        let model = lookup("HOMEWORK_HELPER_MODEL")
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or(defaults.model);

        let base_url = match lookup("HOMEWORK_HELPER_BASE_URL") {
            Some(url) => {
                let url = url.trim().trim_end_matches('/').to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidValue {
                        key: "HOMEWORK_HELPER_BASE_URL".into(),
                        message: format!("expected an http(s) URL, got '{url}'"),
                    });
                }
                url
            }
            None => defaults.base_url,
        };

        let student_name = lookup("HOMEWORK_HELPER_STUDENT_NAME")
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(defaults.student_name);

        let learning_style = lookup("HOMEWORK_HELPER_LEARNING_STYLE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.learning_style);

        let log_dir = lookup("HOMEWORK_HELPER_LOG_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(std::path::PathBuf::from);

        Ok(Self {
            api_key,
            model,
            base_url,
            student_name,
            learning_style,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = HelperConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.student_name, "Alex");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn gemini_key_takes_precedence() {
        let config = HelperConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "primary"),
            ("API_KEY", "fallback"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.unwrap().expose_secret(), "primary");
    }

    #[test]
    fn blank_key_falls_through_to_next_var() {
        let config = HelperConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "   "),
            ("API_KEY", "fallback"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.unwrap().expose_secret(), "fallback");
    }

    #[test]
    fn base_url_trailing_slash_stripped() {
        let config = HelperConfig::from_lookup(lookup_from(&[(
            "HOMEWORK_HELPER_BASE_URL",
            "http://localhost:9000/",
        )]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err = HelperConfig::from_lookup(lookup_from(&[(
            "HOMEWORK_HELPER_BASE_URL",
            "localhost:9000",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let config =
            HelperConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "super-secret")])).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
    }
}
