//! LLM-assisted suggestions for JSON events.
//!
//! Bundles the workspace crates behind feature flags: the prompt and adapter
//! layers are always available, while the HTTP service and its configuration
//! and logging support sit behind `service` (enabled by default).

#![warn(missing_docs, clippy::pedantic)]

/// Text-generation adapters.
pub use insight_adapters as adapters;

/// Task prompts and reply extraction.
pub use insight_prompts as prompts;

/// Environment configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use insight_config as config;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use insight_telemetry as telemetry;

/// HTTP service (enabled by `service` feature).
#[cfg(feature = "service")]
pub use insight_service as service;
