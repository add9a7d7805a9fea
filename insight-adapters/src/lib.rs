//! Text-generation adapters used by the schema insight service.
//!
//! Providers implement the [`traits::TextGenerator`] interface so the service
//! can be driven by any hosted model, or by an in-process double in tests.

#![warn(missing_docs, clippy::pedantic)]

pub mod huggingface;
pub mod traits;

mod http_client;
