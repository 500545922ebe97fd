//! # Error Types
//!
//! Errors raised while loading or validating host configuration.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Token secret is empty or still the development default.
    #[error(
        "SECURITY VIOLATION: token secret is unset or the development default. \
         Set APP_TOKEN_SECRET before running in production."
    )]
    InsecureTokenSecret,

    /// A well-known key carried a value that could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}
