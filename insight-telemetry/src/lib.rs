//! Logging setup for the schema insight service.
//!
//! Installs a `tracing` fmt subscriber filtered by `RUST_LOG`, or by an
//! explicit directive string when one is configured.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter applied when neither the configuration nor `RUST_LOG` sets one.
pub const DEFAULT_FILTER: &str = "info";

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directives could not be parsed.
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter {
        /// The rejected directive string.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {reason}")]
    Install {
        /// Underlying failure.
        reason: String,
    },
}

/// Subscriber options.
#[derive(Clone, Debug, Default)]
pub struct TelemetryConfig {
    filter: Option<String>,
    with_target: bool,
}

impl TelemetryConfig {
    /// Creates the default configuration: `RUST_LOG` or `info`, no targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses explicit filter directives instead of `RUST_LOG`.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Includes the event target (module path) in each line.
    #[must_use]
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Resolves the effective filter.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidFilter`] for malformed explicit directives.
    pub fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        match &self.filter {
            Some(filter) => {
                EnvFilter::try_new(filter).map_err(|err| TelemetryError::InvalidFilter {
                    filter: filter.clone(),
                    reason: err.to_string(),
                })
            }
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init(config: &TelemetryConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .try_init()
        .map_err(|err| TelemetryError::Install {
            reason: err.to_string(),
        })?;

    tracing::debug!("tracing subscriber installed");
    Ok(())
}
