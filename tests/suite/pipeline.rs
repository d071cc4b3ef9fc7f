//! Raster export, Gemini calls and solution parsing wired together without the app.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer};

use inksolve_core::{parse_solution, render_png};
use inksolve_engine::{ApiKey, Drawing, FlowError, ModelName, Point, StrokeStyle, SurfaceSize};

use crate::common::{TEST_KEY, client_for, generate_path, mount_solution, text_response};

fn key() -> ApiKey {
    ApiKey::new(TEST_KEY).unwrap()
}

fn sample_drawing() -> Drawing {
    let mut drawing = Drawing::new();
    drawing.begin_stroke(Point::new(20.0, 20.0));
    drawing.extend_stroke(Point::new(120.0, 80.0));
    drawing.commit_stroke();
    drawing.begin_stroke(Point::new(200.0, 40.0));
    drawing.commit_stroke();
    drawing
}

#[tokio::test]
async fn recognition_uploads_the_rendered_png() {
    let png = render_png(
        &sample_drawing(),
        SurfaceSize::new(320, 160),
        &StrokeStyle::default(),
    )
    .unwrap();
    let encoded = BASE64_STANDARD.encode(&png);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path(ModelName::DEFAULT)))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [
                {},
                { "inline_data": { "mime_type": "image/png", "data": encoded } }
            ]}]
        })))
        .respond_with(text_response("\\sqrt{x}"))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server).recognize(&key(), &png).await.unwrap();
    assert_eq!(text, "\\sqrt{x}");
}

#[tokio::test]
async fn prose_around_the_object_is_tolerated() {
    let server = MockServer::start().await;
    mount_solution(
        &server,
        text_response(
            "Sure! {\"steps\":[{\"description\":\"Add\",\"equation\":\"2\"}],\"finalAnswer\":\"\\\\(2\\\\)\"} Hope this helps.",
        ),
    )
    .await;

    let raw = client_for(&server).solve(&key(), "1+1").await.unwrap();
    let view = parse_solution(&raw).unwrap();
    assert_eq!(view.steps.len(), 1);
    assert_eq!(view.steps[0].number, 1);
    assert_eq!(view.steps[0].title, "Add");
    assert_eq!(view.final_answer, "$$2$$");
    assert!(view.chart.is_none());
}

#[tokio::test]
async fn two_objects_in_prose_fail_to_parse() {
    let server = MockServer::start().await;
    mount_solution(&server, text_response("noise{\"a\":1}more{\"b\":2}")).await;

    let raw = client_for(&server).solve(&key(), "1+1").await.unwrap();
    assert!(matches!(
        parse_solution(&raw),
        Err(FlowError::SolutionParse(_))
    ));
}

#[tokio::test]
async fn reply_without_braces_has_no_json() {
    let server = MockServer::start().await;
    mount_solution(&server, text_response("I cannot solve this.")).await;

    let raw = client_for(&server).solve(&key(), "1+1").await.unwrap();
    assert_eq!(parse_solution(&raw), Err(FlowError::NoJsonFound));
}

#[tokio::test]
async fn plottable_graph_becomes_a_chart() {
    let server = MockServer::start().await;
    let payload = json!({
        "steps": [{ "step": 1, "description": "Tabulate", "equation": "y = x^2" }],
        "finalAnswer": "y = x^2",
        "graphData": {
            "isPlottable": true,
            "type": "line",
            "labels": ["-1", "0", "1"],
            "datasets": [{ "label": "y = x^2", "data": [1, 0, "1"] }]
        }
    });
    mount_solution(&server, text_response(&payload.to_string())).await;

    let raw = client_for(&server).solve(&key(), "y = x^2").await.unwrap();
    let chart = parse_solution(&raw).unwrap().chart.expect("chart");
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.series[0].points, [(-1.0, 1.0), (0.0, 0.0), (1.0, 1.0)]);
    assert_eq!(chart.bounds(), Some(([-1.0, 1.0], [0.0, 1.0])));
}
