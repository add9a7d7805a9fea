//! Hugging Face Inference API text-generation adapter.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use hyper::{Body, HeaderMap, Request, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;

use crate::http_client::{HyperClient, build_https_client};
use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, GenerationRequest, TextGenerator,
};

/// Environment variable holding the Inference API token.
pub const HF_API_KEY_ENV: &str = "HF_API_KEY";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.1";

/// Public Inference API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/";

/// Generation budget used when a request does not set one.
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 500;

/// Configuration for the Hugging Face adapter.
#[derive(Clone)]
pub struct HuggingFaceConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    default_max_new_tokens: u32,
}

impl fmt::Debug for HuggingFaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("default_max_new_tokens", &self.default_max_new_tokens)
            .finish()
    }
}

impl HuggingFaceConfig {
    /// Creates a configuration for the supplied model identifier.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(60),
            default_max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AdapterResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Replaces the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Supplies an explicit API token.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the generation budget used when a request omits one.
    #[must_use]
    pub fn with_default_max_new_tokens(mut self, tokens: u32) -> Self {
        self.default_max_new_tokens = tokens;
        self
    }

    /// Returns the configured model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the generation budget used when a request omits one.
    #[must_use]
    pub const fn default_max_new_tokens(&self) -> u32 {
        self.default_max_new_tokens
    }
}

/// Adapter that calls the hosted text-generation task over HTTPS.
pub struct HuggingFaceAdapter {
    client: HyperClient,
    endpoint: Uri,
    metadata: AdapterMetadata,
    api_key: Option<String>,
    timeout: Duration,
    default_max_new_tokens: u32,
}

impl fmt::Debug for HuggingFaceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceAdapter")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HuggingFaceAdapter {
    /// Constructs a new adapter with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the model endpoint cannot be
    /// formed into a valid URI.
    pub fn new(config: HuggingFaceConfig) -> AdapterResult<Self> {
        let model = config.model.trim();
        if model.is_empty() {
            return Err(AdapterError::configuration(
                "Hugging Face adapter requires a model identifier",
            ));
        }

        let endpoint = format!("{}models/{model}", config.base_url)
            .parse::<Uri>()
            .map_err(|err| {
                AdapterError::configuration(format!("invalid Hugging Face endpoint: {err}"))
            })?;

        let metadata = AdapterMetadata::new("huggingface", model);
        let client = build_https_client()?;

        Ok(Self {
            client,
            endpoint,
            metadata,
            api_key: config.api_key,
            timeout: config.timeout,
            default_max_new_tokens: config.default_max_new_tokens,
        })
    }

    /// Returns the resolved model endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    fn build_request(&self, request: &GenerationRequest) -> TextGenerationRequest {
        TextGenerationRequest {
            inputs: request.prompt().to_owned(),
            parameters: TextGenerationParameters {
                max_new_tokens: request
                    .max_new_tokens()
                    .unwrap_or(self.default_max_new_tokens),
                return_full_text: false,
            },
        }
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn generate(&self, request: GenerationRequest) -> AdapterResult<String> {
        let payload = self.build_request(&request);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode Hugging Face request: {err}"))
        })?;

        let mut builder = Request::post(self.endpoint.clone());
        builder = builder.header(CONTENT_TYPE, "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        let request = builder.body(Body::from(body)).map_err(|err| {
            AdapterError::transport(format!("failed to build Hugging Face request: {err}"))
        })?;

        debug!(
            model = self.metadata.model(),
            max_new_tokens = payload.parameters.max_new_tokens,
            "sending text-generation request"
        );

        let exchange = async {
            let response = self.client.request(request).await.map_err(|err| {
                AdapterError::transport(format!("Hugging Face request failed: {err}"))
            })?;

            let status = response.status();
            let retry_after = parse_retry_after(response.headers());
            let bytes = to_bytes(response.into_body()).await.map_err(|err| {
                AdapterError::transport(format!("failed to read Hugging Face response: {err}"))
            })?;
            Ok::<_, AdapterError>((status, retry_after, bytes))
        };

        let (status, retry_after, bytes) = timeout(self.timeout, exchange)
            .await
            .map_err(|_| AdapterError::transport("Hugging Face request timed out"))??;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AdapterError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let reason = serde_json::from_slice::<ProviderFailure>(&bytes)
                .map_or_else(|_| String::from_utf8_lossy(&bytes).to_string(), |f| f.error);
            return Err(AdapterError::response(format!(
                "Hugging Face returned {status}: {reason}"
            )));
        }

        decode_generated_text(&bytes)
    }
}

#[derive(Debug, Serialize)]
struct TextGenerationRequest {
    inputs: String,
    parameters: TextGenerationParameters,
}

#[derive(Debug, Serialize)]
struct TextGenerationParameters {
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct ProviderFailure {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextGenerationResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
    Failure(ProviderFailure),
}

fn decode_generated_text(bytes: &[u8]) -> AdapterResult<String> {
    let response: TextGenerationResponse = serde_json::from_slice(bytes).map_err(|err| {
        AdapterError::response(format!("failed to decode Hugging Face response: {err}"))
    })?;

    match response {
        TextGenerationResponse::Batch(items) => items
            .into_iter()
            .next()
            .map(|item| item.generated_text)
            .ok_or_else(|| AdapterError::response("Hugging Face returned no generations")),
        TextGenerationResponse::Single(item) => Ok(item.generated_text),
        TextGenerationResponse::Failure(failure) => Err(AdapterError::response(failure.error)),
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn sanitize_base_url(input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(
            "Hugging Face base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>().map_err(|err| {
        AdapterError::configuration(format!("invalid Hugging Face base URL: {err}"))
    })?;
    Ok(base)
}
