//! AI provider configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration.
///
/// When `api_key` is absent the binary runs with the mock AI service, which
/// keeps development and CI off the network.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// API key. Absent means "use the mock service".
    pub api_key: Option<Secret<String>>,

    /// Chat-completions base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Per-call timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// True when a real provider is configured.
    pub fn has_provider(&self) -> bool {
        self.api_key.is_some()
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidAiTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_mock_backed() {
        let config = AiConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.has_provider());
    }

    #[test]
    fn oversized_timeout_fails_validation() {
        let config = AiConfig {
            timeout_secs: 120,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
