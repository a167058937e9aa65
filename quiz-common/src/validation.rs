//! Configuration validation.
//!
//! Checks that values loaded from disk or the environment are usable
//! before any service is started.

use thiserror::Error;

use crate::config::{
    Config, DataConfig, LeaderboardConfig, ObservabilityConfig, QuizConfig, ServerConfig,
};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "pretty"];
const LEADERBOARD_BACKENDS: &[&str] = &["sqlite", "memory"];

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let sections: [&dyn Validate; 5] = [
            &self.server,
            &self.observability,
            &self.quiz,
            &self.data,
            &self.leaderboard,
        ];

        let mut errors: Vec<ValidationError> = sections
            .iter()
            .filter_map(|section| section.validate().err())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load (with environment overrides) and validate configuration.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load_with_env()?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort {
                port: self.port,
                field: "server.port".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "server.request_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of {:?}", LOG_LEVELS),
            });
        }
        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of {:?}", LOG_FORMATS),
            });
        }
        Ok(())
    }
}

impl Validate for QuizConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.lookback_periods == 0 {
            return Err(ValidationError::InvalidValue {
                field: "quiz.lookback_periods".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.horizon_periods == 0 || self.horizon_periods > self.lookback_periods {
            return Err(ValidationError::InvalidValue {
                field: "quiz.horizon_periods".into(),
                reason: format!("must be between 1 and {}", self.lookback_periods),
            });
        }
        Ok(())
    }
}

impl Validate for DataConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.cache_ttl_hours == 0 {
            return Err(ValidationError::InvalidValue {
                field: "data.cache_ttl_hours".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "data.request_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

impl Validate for LeaderboardConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LEADERBOARD_BACKENDS.contains(&self.backend.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "leaderboard.backend".into(),
                reason: format!("must be one of {:?}", LEADERBOARD_BACKENDS),
            });
        }
        Ok(())
    }
}
