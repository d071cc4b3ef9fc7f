//! Non-streaming `generateContent` calls.

use std::error::Error as _;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde_json::{Value, json};
use tokio::time::timeout;
use url::Url;

use inksolve_types::{ApiKey, EmptyInputKind, FlowError, ModelName};

use crate::{
    DEFAULT_REQUEST_TIMEOUT, GEMINI_API_BASE_URL, extract_error_message, http_client_for,
    prompts, read_capped_error_body, wire,
};

/// Where and how to reach Gemini.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: Url,
    pub model: ModelName,
    pub timeout: Duration,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(GEMINI_API_BASE_URL)
                .expect("GEMINI_API_BASE_URL is a valid URL"),
            model: ModelName::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self, reqwest::Error> {
        let http = http_client_for(&settings.base_url)?;
        Ok(Self { http, settings })
    }

    #[must_use]
    pub fn model(&self) -> &ModelName {
        &self.settings.model
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    /// Recognize the expression drawn in `png`. Returns trimmed LaTeX.
    pub async fn recognize(&self, key: &ApiKey, png: &[u8]) -> Result<String, FlowError> {
        let data = BASE64_STANDARD.encode(png);
        let parts = vec![text_part(prompts::RECOGNIZE_PROMPT), inline_png_part(&data)];
        tracing::debug!(model = %self.settings.model, png_bytes = png.len(), "Sending recognition request");

        let text = self.generate(key, parts).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(FlowError::MalformedResponse(
                "recognition returned empty text".to_string(),
            ));
        }
        Ok(text.to_string())
    }

    /// Ask for a step-by-step solution. Returns the raw response text; use
    /// `inksolve_core::parse_solution` to interpret it.
    pub async fn solve(&self, key: &ApiKey, expression: &str) -> Result<String, FlowError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(FlowError::EmptyInput(EmptyInputKind::Expression));
        }
        tracing::debug!(model = %self.settings.model, "Sending solve request");
        self.generate(key, vec![text_part(&prompts::solve_prompt(expression))])
            .await
    }

    async fn generate(&self, key: &ApiKey, parts: Vec<Value>) -> Result<String, FlowError> {
        let url = self.endpoint(key)?;
        let body = build_request_body(parts);
        let limit = self.settings.timeout;

        let exchange = async {
            let response = self
                .http
                .post(url)
                .json(&body)
                .send()
                .await
                .map_err(|e| request_error(e, limit))?;

            let status = response.status();
            if !status.is_success() {
                let raw = read_capped_error_body(response).await;
                let message = extract_error_message(&raw).unwrap_or_else(|| {
                    let raw = raw.trim();
                    if raw.is_empty() {
                        status.canonical_reason().unwrap_or("no details").to_string()
                    } else {
                        raw.to_string()
                    }
                });
                tracing::warn!(status = status.as_u16(), %message, "Gemini request failed");
                return Err(FlowError::transport(Some(status.as_u16()), message));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| request_error(e, limit))?;
            let parsed: wire::Response = serde_json::from_slice(&bytes).map_err(|e| {
                FlowError::MalformedResponse(format!("response is not valid JSON: {e}"))
            })?;
            parsed.into_text()
        };

        timeout(limit, exchange)
            .await
            .map_err(|_| FlowError::Timeout(limit))?
    }

    /// `{base_url}/models/{model}:generateContent?key=...`
    fn endpoint(&self, key: &ApiKey) -> Result<Url, FlowError> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FlowError::transport(None, "base URL cannot carry a path"))?
            .pop_if_empty()
            .push("models")
            .push(&format!("{}:generateContent", self.settings.model));
        url.query_pairs_mut()
            .append_pair("key", key.expose_secret());
        Ok(url)
    }
}

fn text_part(text: &str) -> Value {
    json!({ "text": text })
}

/// REST accepts both `inline_data` and `inlineData`.
fn inline_png_part(data: &str) -> Value {
    json!({
        "inline_data": {
            "mime_type": "image/png",
            "data": data
        }
    })
}

fn build_request_body(parts: Vec<Value>) -> Value {
    json!({
        "contents": [{ "parts": parts }]
    })
}

/// The URL is stripped so the credential in the query string never reaches
/// a message.
fn request_error(error: reqwest::Error, limit: Duration) -> FlowError {
    if error.is_timeout() {
        return FlowError::Timeout(limit);
    }
    let error = error.without_url();
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    FlowError::transport(None, message)
}
