//! Config file to running app.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer};

use inksolve_engine::{
    App, Command, ConfigError, GeminiClient, InkConfig, Point, StrokeInput, WorkflowStep,
    resolve_api_key,
};

use crate::common::{generate_path, settle, text_response};

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn app_from(config: &InkConfig) -> App {
    let client = GeminiClient::new(config.gemini_settings().unwrap()).unwrap();
    App::new(client, resolve_api_key(Some(config)))
        .with_ui_options(config.ui_options())
        .with_stroke_style(config.stroke_style())
}

#[tokio::test]
async fn configured_model_and_key_reach_the_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path("gemini-2.0-flash")))
        .and(query_param("key", "from-config"))
        .respond_with(text_response("x^2"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config_path) = write_config(&format!(
        r#"
[app]
ascii_only = true
reduced_motion = true

[google]
api_key = "from-config"
model = "models/gemini-2.0-flash"
base_url = "{}"
request_timeout_secs = 5

[canvas]
stroke_width = 6.5
"#,
        server.uri()
    ));
    let config = InkConfig::load_from(&config_path).unwrap().unwrap();
    let mut app = app_from(&config);

    assert!(app.ui_options().ascii_only);
    assert!(app.ui_options().reduced_motion);
    assert!((app.stroke_style().width - 6.5).abs() < f64::EPSILON);
    assert_eq!(app.model().as_str(), "gemini-2.0-flash");

    app.dispatch(Command::Stroke(StrokeInput::PointerDown(Point::new(5.0, 5.0))));
    app.dispatch(Command::Stroke(StrokeInput::PointerMove(Point::new(50.0, 40.0))));
    app.dispatch(Command::Stroke(StrokeInput::PointerUp));
    app.dispatch(Command::Recognize);
    settle(&mut app).await;

    assert_eq!(app.current_step(), WorkflowStep::Edit);
    assert_eq!(app.recognized_text(), Some("x^2"));
}

#[test]
fn missing_file_means_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = InkConfig::load_from(&dir.path().join("absent.toml")).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn broken_toml_reports_the_path() {
    let (_dir, config_path) = write_config("[google\napi_key = ");
    let err = InkConfig::load_from(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "{err:?}");
    assert_eq!(err.path(), Some(config_path.as_path()));
}

#[test]
fn non_http_base_url_is_rejected() {
    let (_dir, config_path) = write_config("[google]\nbase_url = \"ftp://example.com/v1\"\n");
    let config = InkConfig::load_from(&config_path).unwrap().unwrap();
    let err = config.gemini_settings().unwrap_err();
    assert!(
        matches!(err, ConfigError::Invalid { field: "google.base_url", .. }),
        "{err:?}"
    );
}

#[test]
fn config_debug_never_shows_the_key() {
    let (_dir, config_path) = write_config("[google]\napi_key = \"AIzaVerySecret\"\n");
    let config = InkConfig::load_from(&config_path).unwrap().unwrap();
    let debug = format!("{config:?}");
    assert!(!debug.contains("AIzaVerySecret"), "{debug}");
    assert!(debug.contains("[REDACTED]"), "{debug}");
}
