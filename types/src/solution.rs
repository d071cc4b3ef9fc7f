//! Solve-response payload (as requested from the model) and its display form.
//!
//! The payload types mirror the JSON shape the solve prompt asks for. The
//! model does not always honor it, so scalar fields accept strings, numbers
//! or booleans and collapse them to text.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Top-level object the solve prompt asks the model to return.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionPayload {
    #[serde(default)]
    pub steps: Vec<StepPayload>,
    #[serde(deserialize_with = "required_text")]
    pub final_answer: String,
    #[serde(default)]
    pub graph_data: Option<GraphData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepPayload {
    /// Model-supplied step number. Display numbering ignores it.
    #[serde(default, deserialize_with = "loose_text")]
    pub step: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub equation: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub supplement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    #[serde(default)]
    pub is_plottable: bool,
    #[serde(default, rename = "type", deserialize_with = "loose_text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<DatasetPayload>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetPayload {
    #[serde(default, deserialize_with = "loose_text")]
    pub label: Option<String>,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default, deserialize_with = "loose_text")]
    pub border_color: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub background_color: Option<String>,
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    value_text(Value::deserialize(deserializer)?)
        .ok_or_else(|| D::Error::custom("expected finalAnswer to be text"))
}

fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|value| value_text(value).unwrap_or_default())
        .collect())
}

// ============================================================================
// Display model
// ============================================================================

/// One step as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    /// 1-based position in the step list.
    pub number: usize,
    pub title: String,
    pub equation: Option<String>,
    pub supplement: Option<String>,
}

impl StepView {
    #[must_use]
    pub fn is_expandable(&self) -> bool {
        self.supplement.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Line,
    Scatter,
    Bar,
}

impl ChartKind {
    /// Unknown chart types fall back to a line chart.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("scatter") => ChartKind::Scatter,
            Some("bar") => ChartKind::Bar,
            _ => ChartKind::Line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub border_color: Option<String>,
    pub background_color: Option<String>,
}

/// Plot built from `graphData`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    /// Combined `(x, y)` ranges over all series, or `None` if there are no points.
    #[must_use]
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut points = self.series.iter().flat_map(|s| s.points.iter().copied());
        let (x0, y0) = points.next()?;
        let mut x = [x0, x0];
        let mut y = [y0, y0];
        for (px, py) in points {
            x = [x[0].min(px), x[1].max(px)];
            y = [y[0].min(py), y[1].max(py)];
        }
        Some((x, y))
    }
}

/// Everything the solution view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionView {
    pub steps: Vec<StepView>,
    /// Final answer wrapped as one display-math expression.
    pub final_answer: String,
    pub chart: Option<ChartSpec>,
}

impl SolutionView {
    /// Build the display model. Step numbers come from list position; the
    /// payload's own `step` field is ignored.
    #[must_use]
    pub fn from_payload(payload: SolutionPayload) -> Self {
        let steps = payload
            .steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| {
                let number = index + 1;
                StepView {
                    number,
                    title: non_blank(step.description).unwrap_or_else(|| format!("Step {number}")),
                    equation: non_blank(step.equation),
                    supplement: non_blank(step.supplement),
                }
            })
            .collect();

        Self {
            steps,
            final_answer: wrap_display_math(&payload.final_answer),
            chart: payload.graph_data.and_then(ChartSpec::from_graph),
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// Wrap `answer` as `$$...$$`, dropping any math delimiters already around it.
#[must_use]
pub fn wrap_display_math(answer: &str) -> String {
    let mut inner = answer.trim();
    loop {
        let stripped = strip_pair(inner, "$$", "$$")
            .or_else(|| strip_pair(inner, "\\[", "\\]"))
            .or_else(|| strip_pair(inner, "\\(", "\\)"))
            .or_else(|| strip_pair(inner, "$", "$"));
        match stripped {
            Some(next) => inner = next.trim(),
            None => break,
        }
    }
    format!("$${inner}$$")
}

fn strip_pair<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    if text.len() < open.len() + close.len() {
        return None;
    }
    text.strip_prefix(open)?
        .strip_suffix(close)
        .filter(|inner| !inner.contains(close))
}

impl ChartSpec {
    /// `None` unless the graph is plottable and some dataset has a numeric point.
    #[must_use]
    pub fn from_graph(graph: GraphData) -> Option<Self> {
        if !graph.is_plottable || graph.datasets.is_empty() {
            return None;
        }
        let xs: Vec<Option<f64>> = graph
            .labels
            .iter()
            .map(|label| label.trim().parse::<f64>().ok().filter(|x| x.is_finite()))
            .collect();

        let series = graph
            .datasets
            .into_iter()
            .enumerate()
            .map(|(index, dataset)| ChartSeries {
                label: dataset
                    .label
                    .unwrap_or_else(|| format!("Series {}", index + 1)),
                points: dataset
                    .data
                    .iter()
                    .enumerate()
                    .filter_map(|(i, value)| {
                        let y = numeric(value)?;
                        let x = xs.get(i).copied().flatten().unwrap_or(i as f64);
                        Some((x, y))
                    })
                    .collect(),
                border_color: dataset.border_color,
                background_color: dataset.background_color,
            })
            .collect::<Vec<_>>();
        if series.iter().all(|s| s.points.is_empty()) {
            return None;
        }

        Some(Self {
            kind: ChartKind::parse(graph.kind.as_deref()),
            labels: graph.labels,
            series,
        })
    }
}

fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::{ChartKind, ChartSeries, ChartSpec, SolutionPayload, SolutionView, wrap_display_math};

    #[test]
    fn accepts_numeric_scalars() {
        let payload: SolutionPayload = serde_json::from_str(
            r#"{"steps":[{"step":1,"description":"d","equation":42}],"finalAnswer":7}"#,
        )
        .unwrap();
        assert_eq!(payload.final_answer, "7");
        assert_eq!(payload.steps[0].step.as_deref(), Some("1"));
        assert_eq!(payload.steps[0].equation.as_deref(), Some("42"));
    }

    #[test]
    fn missing_steps_default_to_empty() {
        let payload: SolutionPayload = serde_json::from_str(r#"{"finalAnswer":"x"}"#).unwrap();
        assert!(payload.steps.is_empty());
        assert!(payload.graph_data.is_none());
    }

    #[test]
    fn rejects_missing_final_answer() {
        assert!(serde_json::from_str::<SolutionPayload>(r#"{"steps":[]}"#).is_err());
        assert!(serde_json::from_str::<SolutionPayload>(r#"{"finalAnswer":null}"#).is_err());
    }

    #[test]
    fn null_fields_become_none() {
        let payload: SolutionPayload = serde_json::from_str(
            r#"{"steps":[{"description":null,"equation":null}],"finalAnswer":"a"}"#,
        )
        .unwrap();
        assert!(payload.steps[0].description.is_none());
        assert!(payload.steps[0].equation.is_none());
    }

    #[test]
    fn graph_labels_accept_numbers() {
        let payload: SolutionPayload = serde_json::from_str(
            r#"{"finalAnswer":"y","graphData":{"isPlottable":true,"type":"line","labels":[-1,0,"1"],"datasets":[]}}"#,
        )
        .unwrap();
        let graph = payload.graph_data.unwrap();
        assert!(graph.is_plottable);
        assert_eq!(graph.labels, vec!["-1", "0", "1"]);
    }

    #[test]
    fn chart_kind_falls_back_to_line() {
        assert_eq!(ChartKind::parse(Some("Bar")), ChartKind::Bar);
        assert_eq!(ChartKind::parse(Some("radar")), ChartKind::Line);
        assert_eq!(ChartKind::parse(None), ChartKind::Line);
    }

    #[test]
    fn chart_bounds_span_all_series() {
        let chart = ChartSpec {
            kind: ChartKind::Line,
            labels: Vec::new(),
            series: vec![
                ChartSeries {
                    label: "a".into(),
                    points: vec![(0.0, 1.0), (2.0, -3.0)],
                    border_color: None,
                    background_color: None,
                },
                ChartSeries {
                    label: "b".into(),
                    points: vec![(-1.0, 5.0)],
                    border_color: None,
                    background_color: None,
                },
            ],
        };
        assert_eq!(chart.bounds(), Some(([-1.0, 2.0], [-3.0, 5.0])));
    }

    #[test]
    fn steps_are_numbered_by_position() {
        let payload: SolutionPayload = serde_json::from_str(
            r#"{"steps":[{"step":7,"description":"  ","equation":""},{"description":"Add","equation":"x+1","supplement":"why"}],"finalAnswer":"x"}"#,
        )
        .unwrap();
        let view = SolutionView::from_payload(payload);
        assert_eq!(view.steps[0].number, 1);
        assert_eq!(view.steps[0].title, "Step 1");
        assert!(view.steps[0].equation.is_none());
        assert!(!view.steps[0].is_expandable());
        assert_eq!(view.steps[1].number, 2);
        assert_eq!(view.steps[1].equation.as_deref(), Some("x+1"));
        assert!(view.steps[1].is_expandable());
    }

    #[test]
    fn final_answer_is_wrapped_once() {
        assert_eq!(wrap_display_math("x=5"), "$$x=5$$");
        assert_eq!(wrap_display_math("$x=5$"), "$$x=5$$");
        assert_eq!(wrap_display_math(" $$x=5$$ "), "$$x=5$$");
        assert_eq!(wrap_display_math("\\[x=5\\]"), "$$x=5$$");
        assert_eq!(wrap_display_math("\\(x=5\\)"), "$$x=5$$");
        assert_eq!(wrap_display_math("$"), "$$$$$");
        assert_eq!(wrap_display_math("$a$ + $b$"), "$$$a$ + $b$$$");
    }

    #[test]
    fn chart_needs_plottable_data() {
        let payload: SolutionPayload = serde_json::from_str(
            r#"{"finalAnswer":"y","graphData":{"isPlottable":false,"labels":["0"],"datasets":[{"data":[1]}]}}"#,
        )
        .unwrap();
        assert!(SolutionView::from_payload(payload).chart.is_none());

        let payload: SolutionPayload = serde_json::from_str(
            r#"{"finalAnswer":"y","graphData":{"isPlottable":true,"labels":[],"datasets":[]}}"#,
        )
        .unwrap();
        assert!(SolutionView::from_payload(payload).chart.is_none());
    }

    #[test]
    fn chart_without_numeric_points_is_hidden() {
        let payload: SolutionPayload = serde_json::from_str(
            r#"{"finalAnswer":"y","graphData":{"isPlottable":true,"type":"bar","labels":["a","b"],"datasets":[{"data":["n/a",null]},{"data":[]}]}}"#,
        )
        .unwrap();
        assert!(SolutionView::from_payload(payload).chart.is_none());
    }

    #[test]
    fn chart_skips_non_numeric_points() {
        let payload: SolutionPayload = serde_json::from_str(
            r#"{"finalAnswer":"y","graphData":{"isPlottable":true,"type":"line","labels":["-1","a","1"],"datasets":[{"label":"y = x^2","data":[1,"n/a","1"]}]}}"#,
        )
        .unwrap();
        let chart = SolutionView::from_payload(payload).chart.unwrap();
        assert_eq!(chart.series[0].label, "y = x^2");
        assert_eq!(chart.series[0].points, vec![(-1.0, 1.0), (1.0, 1.0)]);
    }

    #[test]
    fn chart_uses_index_for_non_numeric_labels() {
        let payload: SolutionPayload = serde_json::from_str(
            r#"{"finalAnswer":"y","graphData":{"isPlottable":true,"labels":["a","b"],"datasets":[{"data":[3,4]}]}}"#,
        )
        .unwrap();
        let chart = SolutionView::from_payload(payload).chart.unwrap();
        assert_eq!(chart.series[0].label, "Series 1");
        assert_eq!(chart.series[0].points, vec![(0.0, 3.0), (1.0, 4.0)]);
    }
}
