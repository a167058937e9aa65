//! Quiz Common - Shared configuration, errors, and logging for the chart quiz services.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Error types with HTTP status mapping
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{
    Config, DataConfig, LeaderboardConfig, NetworkConfig, ObservabilityConfig, QuizConfig,
    ServerConfig,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::logging::init_logging;
    pub use crate::validation::{Validate, ValidationError};
}
