//! Configuration for the schema insight service.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file, and are validated once at startup into an immutable
//! [`ServiceConfig`] that is handed to the service.

#![warn(missing_docs, clippy::pedantic)]

use std::path::PathBuf;
use std::time::Duration;

use insight_adapters::huggingface::{
    DEFAULT_BASE_URL, DEFAULT_MAX_NEW_TOKENS, DEFAULT_MODEL, HF_API_KEY_ENV, HuggingFaceConfig,
};
use thiserror::Error;
use tracing::debug;

/// Model identifier variable.
pub const HF_MODEL_ENV: &str = "HF_MODEL";
/// Provider base URL variable.
pub const HF_BASE_URL_ENV: &str = "HF_BASE_URL";
/// Listen address variable.
pub const HOST_ENV: &str = "INSIGHT_HOST";
/// Listen port variable.
pub const PORT_ENV: &str = "INSIGHT_PORT";
/// Generation budget variable.
pub const MAX_NEW_TOKENS_ENV: &str = "INSIGHT_MAX_NEW_TOKENS";
/// Provider timeout variable, in seconds.
pub const TIMEOUT_SECS_ENV: &str = "INSIGHT_TIMEOUT_SECS";

/// Default listen address.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default provider timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set to a value that could not be used.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A `.env` file exists but could not be read or parsed.
    #[error("failed to load environment file: {source}")]
    EnvFile {
        /// Underlying loader failure.
        #[source]
        source: dotenvy::Error,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }
}

/// Address the HTTP listener binds to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenConfig {
    host: String,
    port: u16,
}

impl ListenConfig {
    /// Returns the bind host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the bind port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns `host:port`, suitable for binding.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

/// Validated service configuration.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    listen: ListenConfig,
    provider: HuggingFaceConfig,
}

impl ServiceConfig {
    /// Loads a `.env` file from the working directory or its parents, if any.
    ///
    /// Variables already present in the environment win over the file.
    /// Returns the path that was loaded, or `None` when there is no file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvFile`] when a file exists but cannot be read.
    pub fn load_dotenv() -> ConfigResult<Option<PathBuf>> {
        env_file_outcome(dotenvy::dotenv())
    }

    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is malformed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    ///
    /// The provider credential is optional; a missing key surfaces on the
    /// first provider call instead.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let listen = ListenConfig {
            host: value(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port: parse_or(value(PORT_ENV), PORT_ENV, DEFAULT_PORT)?,
        };

        let max_new_tokens = parse_or(
            value(MAX_NEW_TOKENS_ENV),
            MAX_NEW_TOKENS_ENV,
            DEFAULT_MAX_NEW_TOKENS,
        )?;
        if max_new_tokens == 0 {
            return Err(ConfigError::invalid(MAX_NEW_TOKENS_ENV, "must be positive"));
        }

        let timeout = parse_or(
            value(TIMEOUT_SECS_ENV),
            TIMEOUT_SECS_ENV,
            DEFAULT_TIMEOUT.as_secs(),
        )?;
        if timeout == 0 {
            return Err(ConfigError::invalid(TIMEOUT_SECS_ENV, "must be positive"));
        }

        let model = value(HF_MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_owned());
        let base_url = value(HF_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        let mut provider = HuggingFaceConfig::new(model)
            .with_base_url(&base_url)
            .map_err(|err| ConfigError::invalid(HF_BASE_URL_ENV, err.to_string()))?
            .with_timeout(Duration::from_secs(timeout))
            .with_default_max_new_tokens(max_new_tokens);
        if let Some(key) = value(HF_API_KEY_ENV) {
            provider = provider.with_api_key(key);
        }

        debug!(
            address = %listen.address(),
            model = provider.model(),
            max_new_tokens,
            "configuration loaded"
        );
        Ok(Self { listen, provider })
    }

    /// Overrides the listen host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.listen.host = host.into();
        self
    }

    /// Overrides the listen port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.listen.port = port;
        self
    }

    /// Overrides the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.provider = self.provider.with_model(model);
        self
    }

    /// Returns the listener configuration.
    #[must_use]
    pub fn listen(&self) -> &ListenConfig {
        &self.listen
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn provider(&self) -> &HuggingFaceConfig {
        &self.provider
    }

    /// Returns the per-request generation budget.
    #[must_use]
    pub const fn max_new_tokens(&self) -> u32 {
        self.provider.default_max_new_tokens()
    }
}

fn env_file_outcome(result: dotenvy::Result<PathBuf>) -> ConfigResult<Option<PathBuf>> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(source) => Err(ConfigError::EnvFile { source }),
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|err: T::Err| ConfigError::invalid(key, format!("`{raw}`: {err}")))
    })
}
