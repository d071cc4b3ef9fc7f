//! Shared test utilities and fixtures
//!
//! A wiremock server stands in for the Gemini API.

#![allow(dead_code)]

use std::time::Duration;

use ratatui::{Terminal, backend::TestBackend};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inksolve_engine::{ApiKey, App, GeminiClient, GeminiSettings, ModelName};

pub const TEST_KEY: &str = "test-key";

/// A two-step solution wrapped in a fence, as the model usually replies.
pub const FENCED_SOLUTION: &str = "Here is the solution:\n```json\n{\"steps\":[{\"step\":1,\"description\":\"Subtract 3\",\"equation\":\"2x = 10\",\"supplement\":\"Subtract 3 from both sides.\"},{\"step\":2,\"description\":\"Divide by 2\",\"equation\":\"x = 5\"}],\"finalAnswer\":\"x=5\"}\n```";

#[must_use]
pub fn generate_path(model: &str) -> String {
    format!("/models/{model}:generateContent")
}

/// A successful `generateContent` reply carrying `text`.
#[must_use]
pub fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    }))
}

/// Recognition requests are the ones carrying an image.
pub async fn mount_recognition(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(generate_path(ModelName::DEFAULT)))
        .and(query_param("key", TEST_KEY))
        .and(body_string_contains("inline_data"))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_solution(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(generate_path(ModelName::DEFAULT)))
        .and(query_param("key", TEST_KEY))
        .and(body_string_contains("step by step"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[must_use]
pub fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(GeminiSettings {
        base_url: Url::parse(&server.uri()).expect("mock server uri"),
        model: ModelName::default(),
        timeout: Duration::from_secs(5),
    })
    .expect("client builds")
}

#[must_use]
pub fn app_for(server: &MockServer) -> App {
    App::new(client_for(server), ApiKey::new(TEST_KEY))
}

/// Tick until the in-flight call lands.
pub async fn settle(app: &mut App) {
    for _ in 0..500 {
        app.tick();
        if !app.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("pending call did not finish");
}

/// Draw one frame into a test backend and return the screen as text.
pub fn render(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
    terminal
        .draw(|frame| inksolve_tui::draw(frame, app))
        .expect("draw");
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}
