//! Prompt → generation → extraction pipeline shared by every task.

use std::fmt;
use std::sync::Arc;

use insight_adapters::huggingface::DEFAULT_MAX_NEW_TOKENS;
use insight_adapters::traits::{AdapterError, AdapterResult, GenerationRequest, TextGenerator};
use insight_prompts::{TaskKind, build_prompt, try_extract_json};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};

/// What a task run produced once the input was accepted.
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// The reply contained a parseable JSON object.
    Extracted(Map<String, Value>),
    /// The provider answered but no JSON object could be recovered.
    ExtractionFailure {
        /// Raw provider text.
        raw: String,
    },
    /// The provider call failed.
    ProviderFailure(AdapterError),
}

impl AnalysisOutcome {
    /// Converts the outcome into the response body for `task`.
    ///
    /// Empty results are replaced by the task fallback when it has one;
    /// provider failures become `{"error": "..."}`.
    #[must_use]
    pub fn into_body(self, task: TaskKind) -> Value {
        let object = match self {
            Self::Extracted(object) => object,
            Self::ExtractionFailure { .. } => Map::new(),
            Self::ProviderFailure(err) => return json!({ "error": err.to_string() }),
        };

        match task.fallback() {
            Some(fallback) if object.is_empty() => Value::Object(fallback),
            _ => Value::Object(object),
        }
    }

    /// Returns a short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Extracted(_) => "extracted",
            Self::ExtractionFailure { .. } => "extraction_failure",
            Self::ProviderFailure(_) => "provider_failure",
        }
    }
}

/// Runs schema insight tasks against a text generator.
#[derive(Clone)]
pub struct Analyzer {
    generator: Arc<dyn TextGenerator>,
    max_new_tokens: u32,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.generator.metadata();
        f.debug_struct("Analyzer")
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .field("max_new_tokens", &self.max_new_tokens)
            .finish()
    }
}

impl Analyzer {
    /// Creates an analyzer that sends prompts to `generator`.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }

    /// Sets the generation budget attached to every request.
    #[must_use]
    pub fn with_max_new_tokens(mut self, tokens: u32) -> Self {
        self.max_new_tokens = tokens;
        self
    }

    /// Returns the model identifier of the underlying generator.
    #[must_use]
    pub fn model(&self) -> &str {
        self.generator.metadata().model()
    }

    /// Validates `payload`, prompts the model and extracts its reply.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] only for caller input problems. Provider and
    /// extraction failures are reported through [`AnalysisOutcome`].
    pub async fn analyze(&self, task: TaskKind, payload: &Value) -> ServiceResult<AnalysisOutcome> {
        if task.requires_object() && !payload.is_object() {
            return Err(ServiceError::NotAnObject { task });
        }

        let prompt = build_prompt(task, payload)?;
        debug!(%task, prompt_len = prompt.len(), "prompt rendered");

        let outcome = match self.generate(prompt).await {
            Ok(text) => {
                debug!(%task, raw = %text, "provider reply");
                match try_extract_json(&text) {
                    Some(object) => AnalysisOutcome::Extracted(object),
                    None => AnalysisOutcome::ExtractionFailure { raw: text },
                }
            }
            Err(err) => {
                warn!(%task, %err, "text generation failed");
                AnalysisOutcome::ProviderFailure(err)
            }
        };

        info!(%task, outcome = outcome.kind(), "analysis finished");
        Ok(outcome)
    }

    async fn generate(&self, prompt: String) -> AdapterResult<String> {
        let request = GenerationRequest::new(prompt)?.with_max_new_tokens(self.max_new_tokens);
        self.generator.generate(request).await
    }
}
