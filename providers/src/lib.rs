//! Gemini client for the recognize and solve calls.
//!
//! # Architecture
//!
//! - [`gemini::GeminiClient`] - one non-streaming `generateContent` call per
//!   operation, with a client-enforced timeout
//! - [`prompts`] - instruction text sent with each call
//! - [`wire`] - typed view of the `generateContent` response
//!
//! # Error Handling
//!
//! Every failure is reported as an [`inksolve_types::FlowError`]. Remote
//! error bodies of the form `{"error":{"message":...}}` are unwrapped so the
//! user sees the service's own message next to the HTTP status.

pub mod gemini;
pub mod prompts;
pub mod wire;

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use serde_json::Value;
use url::Url;

pub use gemini::{GeminiClient, GeminiSettings};
pub use inksolve_types;

/// Canonical Gemini API base URL.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default end-to-end limit for one call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const CONNECT_TIMEOUT_SECS: u64 = 30;

// reqwest only exposes tcp_keepalive (idle time); interval/retries use platform defaults.
const TCP_KEEPALIVE_SECS: u64 = 60;

const POOL_MAX_IDLE_PER_HOST: usize = 8;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Hardened client for `base_url`.
///
/// Redirects are never followed. HTTPS base URLs also pin the client to
/// HTTPS so a credential-bearing query string cannot leak over plain HTTP.
pub fn http_client_for(base_url: &Url) -> Result<reqwest::Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert("content-type", HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(Policy::none())
        .https_only(base_url.scheme() == "https")
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
        .build()
}

/// Read an error response body, capping it at 32 KiB.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Pull a human-readable message out of a JSON error body.
#[must_use]
pub fn extract_error_message(raw: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(raw.trim()).ok()?;
    payload
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| payload.pointer("/message").and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}
