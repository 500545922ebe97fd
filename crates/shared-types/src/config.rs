//! # Host Configuration
//!
//! Flat configuration record handed to every micro-app through the shared
//! context. Well-known keys are typed; anything else under the `APP_EXT_`
//! prefix is passed through untouched as an extension key.
//!
//! ## Environment Variables
//!
//! | Variable               | Field             | Default                      |
//! |------------------------|-------------------|------------------------------|
//! | `APP_ENV`              | `environment`     | `development`                |
//! | `APP_PORT`             | `port`            | `3000`                       |
//! | `APP_DATABASE_URI`     | `database_uri`    | `mongodb://localhost:27017`  |
//! | `APP_DATABASE_NAME`    | `database_name`   | `marketplace`                |
//! | `APP_TOKEN_SECRET`     | `token_secret`    | development default          |
//! | `APP_TOKEN_TTL_SECS`   | `token_ttl_secs`  | `604800` (7 days)            |
//! | `APP_PUBLIC_URL`       | `public_url`      | `http://localhost:3000`      |
//! | `APP_EXTERNAL_API_KEY` | `external_api_key`| unset                        |
//! | `APP_EXT_<KEY>`        | `extensions[key]` | -                            |

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ConfigError;

/// Prefix shared by every recognized environment variable.
pub const ENV_PREFIX: &str = "APP_";

/// Prefix for pass-through extension keys.
pub const EXTENSION_PREFIX: &str = "APP_EXT_";

/// Token secret used when none is configured. Rejected in production.
pub const DEFAULT_TOKEN_SECRET: &str = "development-secret";

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidValue {
                key: "APP_ENV".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Complete host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment.
    pub environment: Environment,
    /// HTTP listening port of the consuming web layer.
    pub port: u16,
    /// Connection URI of the persistence layer.
    pub database_uri: String,
    /// Database name inside the persistence layer.
    pub database_name: String,
    /// Signing secret for issued tokens. Never serialized.
    #[serde(skip_serializing, default = "default_token_secret")]
    pub token_secret: String,
    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: u64,
    /// Public base URL used when building absolute links.
    pub public_url: String,
    /// Key for the external (third-party) API, if any.
    pub external_api_key: Option<String>,
    /// Arbitrary extension keys, passed through unvalidated.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_token_secret() -> String {
    DEFAULT_TOKEN_SECRET.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            port: 3000,
            database_uri: "mongodb://localhost:27017".to_string(),
            database_name: "marketplace".to_string(),
            token_secret: default_token_secret(),
            token_ttl_secs: 7 * 24 * 60 * 60,
            public_url: "http://localhost:3000".to_string(),
            external_api_key: None,
            extensions: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from key/value pairs.
    ///
    /// Unknown keys without the `APP_` prefix are ignored. Unknown keys with
    /// the `APP_EXT_` prefix become lower-cased extension keys.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();

        for (key, value) in vars {
            let key = key.as_ref();
            if !key.starts_with(ENV_PREFIX) {
                continue;
            }
            let value: String = value.into();

            match key {
                "APP_ENV" => config.environment = value.parse()?,
                "APP_PORT" => config.port = parse_number(key, &value)?,
                "APP_DATABASE_URI" => config.database_uri = value,
                "APP_DATABASE_NAME" => config.database_name = value,
                "APP_TOKEN_SECRET" => config.token_secret = value,
                "APP_TOKEN_TTL_SECS" => config.token_ttl_secs = parse_number(key, &value)?,
                "APP_PUBLIC_URL" => config.public_url = value,
                "APP_EXTERNAL_API_KEY" => {
                    config.external_api_key = (!value.is_empty()).then_some(value);
                }
                _ => {
                    if let Some(ext) = key.strip_prefix(EXTENSION_PREFIX) {
                        if !ext.is_empty() {
                            config.extensions.insert(ext.to_lowercase(), value);
                        }
                    } else {
                        debug!(key, "Ignoring unrecognized configuration key");
                    }
                }
            }
        }

        Ok(config)
    }

    /// Look up an extension key.
    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` in production if the token secret is empty or still
    /// the development default. Other environments always pass.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.is_production()
            && (self.token_secret.trim().is_empty() || self.token_secret == DEFAULT_TOKEN_SECRET)
        {
            return Err(ConfigError::InsecureTokenSecret);
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
