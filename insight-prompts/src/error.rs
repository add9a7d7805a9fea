//! Errors raised while turning a payload into a prompt.

use thiserror::Error;

use crate::template::TemplateError;

/// Result alias for prompt construction.
pub type PromptResult<T> = Result<T, PromptError>;

/// Errors emitted by [`build_prompt`](crate::build_prompt).
#[derive(Debug, Error)]
pub enum PromptError {
    /// The payload could not be serialized into the prompt.
    #[error("failed to serialize payload: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },

    /// The task template failed to render.
    #[error(transparent)]
    Template(#[from] TemplateError),
}
