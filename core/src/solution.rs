//! Turning the raw solve response into a [`SolutionView`].

use serde_json::Value;

use inksolve_types::{FlowError, SolutionPayload, SolutionView};

use crate::extract::extract_json_candidate;

/// Longest prefix of a failed response kept in the log.
const LOGGED_RESPONSE_CHARS: usize = 4_000;

/// Extract, validate and render a solve response.
///
/// JSON syntax errors and schema mismatches both map to
/// [`FlowError::SolutionParse`]. Every failure logs the raw response at
/// `warn`.
pub fn parse_solution(raw: &str) -> Result<SolutionView, FlowError> {
    parse_payload(raw)
        .map(SolutionView::from_payload)
        .inspect_err(|error| {
            let logged: String = raw.chars().take(LOGGED_RESPONSE_CHARS).collect();
            tracing::warn!(%error, response = %logged, "Failed to parse solution response");
        })
}

fn parse_payload(raw: &str) -> Result<SolutionPayload, FlowError> {
    let candidate = extract_json_candidate(raw)?;
    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| FlowError::SolutionParse(format!("invalid JSON: {e}")))?;
    serde_json::from_value(value)
        .map_err(|e| FlowError::SolutionParse(format!("unexpected shape: {e}")))
}

#[cfg(test)]
mod tests {
    use super::parse_solution;
    use inksolve_types::FlowError;

    #[test]
    fn fenced_payload_parses() {
        let view =
            parse_solution("```json\n{\"finalAnswer\":\"x=1\",\"steps\":[]}\n```").unwrap();
        assert!(view.steps.is_empty());
        assert_eq!(view.final_answer, "$$x=1$$");
        assert!(view.chart.is_none());
    }

    #[test]
    fn sibling_objects_fail_to_parse() {
        let err = parse_solution("noise{\"a\":1}more{\"b\":2}").unwrap_err();
        assert!(matches!(err, FlowError::SolutionParse(_)), "{err:?}");
    }

    #[test]
    fn wrong_shape_is_a_parse_error() {
        let err = parse_solution("{\"steps\": \"not a list\", \"finalAnswer\": \"1\"}").unwrap_err();
        assert!(matches!(err, FlowError::SolutionParse(ref m) if m.starts_with("unexpected shape")));
    }

    #[test]
    fn prose_only_is_no_json() {
        assert_eq!(
            parse_solution("The answer is 4."),
            Err(FlowError::NoJsonFound)
        );
    }

    #[test]
    fn one_step_payload_renders() {
        let raw = r#"{"steps":[{"step":1,"description":"Subtract 3","equation":"2x = 10"}],"finalAnswer":"x=5"}"#;
        let view = parse_solution(raw).unwrap();
        assert_eq!(view.steps.len(), 1);
        let step = &view.steps[0];
        insta::assert_snapshot!(
            format!("{} | {} | {}", step.number, step.title, step.equation.as_deref().unwrap_or("")),
            @"1 | Subtract 3 | 2x = 10"
        );
        assert!(view.final_answer.contains("x=5"));
    }

    #[test]
    fn plottable_graph_builds_chart() {
        let raw = r#"```json
{
  "steps": [{"step": 1, "description": "Plot", "equation": "y = x^2"}],
  "finalAnswer": "y = x^2",
  "graphData": {
    "isPlottable": true,
    "type": "line",
    "labels": ["-2", "-1", "0", "1", "2"],
    "datasets": [{"label": "y = x^2", "data": [4, 1, 0, 1, 4], "borderColor": "rgb(75, 192, 192)"}]
  }
}
```"#;
        let chart = parse_solution(raw).unwrap().chart.unwrap();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].points.len(), 5);
        assert_eq!(chart.series[0].points[0], (-2.0, 4.0));
        assert_eq!(
            chart.series[0].border_color.as_deref(),
            Some("rgb(75, 192, 192)")
        );
        assert_eq!(chart.bounds(), Some(([-2.0, 2.0], [0.0, 4.0])));
    }
}
