//! The generative-backend client: builder-constructed, retried, and
//! validated against a caller-supplied JSON Schema when structured output
//! is requested.

use crate::error::{map_http_status, map_reqwest_error};
use crate::types::{extract_visible_text, GenerativeRequest, GenerativeResponse, RequestMessage};
use scout_errors::ScoutError;
use scout_retry::{with_retry, RetryPolicy};
use scout_types::ThinkingLevel;

/// Default base URL for the generative backend.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.example/v1";

/// A client for the process's generative backend.
///
/// Construction mirrors the Anthropic provider's builder: an API key plus
/// optional `model`/`base_url` overrides, backed by one shared
/// [`reqwest::Client`].
#[derive(Clone)]
pub struct GenerativeClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl GenerativeClient {
    /// Build a client with the given API key and sensible defaults.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        GenerativeClient {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Override the base URL (tests, proxies).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// The shared HTTP client, for other modules in this crate that speak
    /// to the same backend over a different path (e.g. [`crate::upload`]).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The configured base URL.
    pub(crate) fn base_url_str(&self) -> &str {
        &self.base_url
    }

    /// The configured API key.
    pub(crate) fn api_key_str(&self) -> &str {
        &self.api_key
    }

    fn generate_url(&self) -> String {
        format!("{}/generate", self.base_url)
    }

    /// Generate text for `messages`, under the given `model`/`thinking_level`/
    /// `temperature`, stripping any thinking parts from the response before
    /// returning. Runs under [`with_retry`].
    pub async fn generate(
        &self,
        messages: Vec<RequestMessage>,
        model: &str,
        thinking_level: ThinkingLevel,
        temperature: f64,
        system_instruction: Option<&str>,
        response_schema: Option<serde_json::Value>,
        tools: Vec<serde_json::Value>,
    ) -> Result<String, ScoutError> {
        let temperature = temperature.clamp(0.0, 2.0);
        let request = GenerativeRequest {
            model: model.to_string(),
            messages,
            temperature,
            system_instruction: system_instruction.map(|s| s.to_string()),
            thinking_level,
            response_schema,
            tools,
        };

        let response = with_retry(self.retry_policy, || self.send(&request)).await?;
        Ok(extract_visible_text(&response))
    }

    /// Generate and validate a structured response against `schema`.
    ///
    /// Delegates to [`GenerativeClient::generate`] with the schema attached
    /// as `response_schema`, then validates the result against `schema`
    /// before returning it — a malformed or hallucinated response never
    /// reaches the caller as if it were valid.
    pub async fn generate_structured(
        &self,
        messages: Vec<RequestMessage>,
        model: &str,
        thinking_level: ThinkingLevel,
        temperature: f64,
        system_instruction: Option<&str>,
        schema: &serde_json::Value,
        tools: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, ScoutError> {
        let text = self
            .generate(messages, model, thinking_level, temperature, system_instruction, Some(schema.clone()), tools)
            .await?;

        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ScoutError::ApiInvalidArgument(format!("backend returned non-JSON structured output: {e}")))?;

        let validator = jsonschema::validator_for(schema)
            .map_err(|e| ScoutError::ApiInvalidArgument(format!("invalid output_schema: {e}")))?;
        if let Err(errors) = validator.validate(&value) {
            return Err(ScoutError::ApiInvalidArgument(format!(
                "structured response failed schema validation: {errors}"
            )));
        }

        Ok(value)
    }

    async fn send(&self, request: &GenerativeRequest) -> Result<GenerativeResponse, ScoutError> {
        tracing::debug!(model = %request.model, url = %self.generate_url(), "generative: sending request");

        let response = self
            .http
            .post(self.generate_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(map_http_status(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ScoutError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_set() {
        let client = GenerativeClient::new("key");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_overrides_base_url() {
        let client = GenerativeClient::new("key").base_url("http://localhost:9999");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn generate_url_includes_path() {
        let client = GenerativeClient::new("key").base_url("http://localhost:9999");
        assert_eq!(client.generate_url(), "http://localhost:9999/generate");
    }
}
