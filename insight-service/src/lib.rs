//! HTTP service suggesting field roles, dataset names and Druid rollups for
//! JSON events.
//!
//! Each request renders a task prompt, sends it to a [`TextGenerator`], and
//! recovers a JSON object from the reply. Input problems are answered with
//! `400`; provider and extraction failures degrade to a `200` JSON body.
//!
//! [`TextGenerator`]: insight_adapters::traits::TextGenerator

#![warn(missing_docs, clippy::pedantic)]

mod analyzer;
mod error;
mod routes;
mod server;

pub use analyzer::{AnalysisOutcome, Analyzer};
pub use error::{ServiceError, ServiceResult};
pub use routes::{AppState, router};
pub use server::{analyzer_from_config, serve, serve_on};
