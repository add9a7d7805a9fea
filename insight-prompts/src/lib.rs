//! Prompt orchestration for schema insight tasks.
//!
//! [`build_prompt`] renders the natural-language prompt for a [`TaskKind`],
//! and [`extract_json`] recovers the structured reply from whatever text the
//! model produced.

#![warn(missing_docs, clippy::pedantic)]

pub mod error;
pub mod extract;
pub mod task;
pub mod template;

pub use error::{PromptError, PromptResult};
pub use extract::{extract_json, try_extract_json};
pub use task::{TaskKind, build_prompt};
pub use template::{PromptTemplate, TemplateError, TemplateResult};
