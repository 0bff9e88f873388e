//! Chat orchestration configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Chat orchestration tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Session idle TTL in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Flow state max age in seconds
    #[serde(default = "default_flow_max_age_secs")]
    pub flow_max_age_secs: u64,

    /// Background sweep interval in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Failed-call confidence threshold that enters the callback flow
    #[serde(default = "default_failed_call_threshold")]
    pub failed_call_threshold: f32,

    /// How many recent messages feed detection context and the responder
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

impl ChatConfig {
    /// Validate chat configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if self.flow_max_age_secs == 0 {
            return Err(ValidationError::InvalidFlowMaxAge);
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            flow_max_age_secs: default_flow_max_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            failed_call_threshold: default_failed_call_threshold(),
            history_turns: default_history_turns(),
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    60 * 60
}

fn default_flow_max_age_secs() -> u64 {
    30 * 60
}

fn default_sweep_interval_secs() -> u64 {
    10 * 60
}

fn default_failed_call_threshold() -> f32 {
    0.6
}

fn default_history_turns() -> usize {
    6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ChatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.flow_max_age_secs, 1800);
        assert_eq!(config.sweep_interval_secs, 600);
    }

    #[test]
    fn zero_ttl_fails_validation() {
        let config = ChatConfig {
            session_ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
