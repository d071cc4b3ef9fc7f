//! Plot of a solution's `graphData`.

use std::str::FromStr;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Chart, Dataset, GraphType, LegendPosition},
};

use inksolve_engine::{ChartKind, ChartSpec, sanitize_terminal_text};

use crate::theme::Palette;

pub fn render_chart(
    frame: &mut Frame,
    area: Rect,
    block: Block<'_>,
    spec: &ChartSpec,
    palette: &Palette,
) {
    let Some((x, y)) = spec.bounds() else {
        return;
    };
    let x = padded(x);
    let y = if spec.kind == ChartKind::Bar {
        padded([y[0].min(0.0), y[1].max(0.0)])
    } else {
        padded(y)
    };

    let (graph_type, marker) = match spec.kind {
        ChartKind::Line => (GraphType::Line, Marker::Braille),
        ChartKind::Scatter => (GraphType::Scatter, Marker::Dot),
        ChartKind::Bar => (GraphType::Bar, Marker::HalfBlock),
    };

    let datasets = spec
        .series
        .iter()
        .enumerate()
        .map(|(index, series)| {
            let color = series
                .border_color
                .as_deref()
                .and_then(css_color)
                .unwrap_or_else(|| palette.series_color(index));
            Dataset::default()
                .name(sanitize_terminal_text(&series.label).into_owned())
                .marker(marker)
                .graph_type(graph_type)
                .style(Style::default().fg(color))
                .data(&series.points)
        })
        .collect::<Vec<_>>();

    let axis_style = Style::default().fg(palette.text_muted);
    let chart = Chart::new(datasets)
        .block(block)
        .style(Style::default().fg(palette.text_secondary))
        .legend_position(Some(LegendPosition::TopLeft))
        .x_axis(
            Axis::default()
                .style(axis_style)
                .bounds(x)
                .labels(axis_labels(x)),
        )
        .y_axis(
            Axis::default()
                .style(axis_style)
                .bounds(y)
                .labels(axis_labels(y)),
        );
    frame.render_widget(chart, area);
}

/// Widen a range by 5% on each side; a zero-width range grows by 1.
fn padded([min, max]: [f64; 2]) -> [f64; 2] {
    let span = max - min;
    if span.abs() < f64::EPSILON {
        [min - 1.0, max + 1.0]
    } else {
        let pad = span * 0.05;
        [min - pad, max + pad]
    }
}

fn axis_labels([min, max]: [f64; 2]) -> Vec<Span<'static>> {
    [min, (min + max) / 2.0, max]
        .into_iter()
        .map(|v| Span::raw(format_tick(v)))
        .collect()
}

fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Parse `rgb(r, g, b)`, `rgba(r, g, b, a)` or anything ratatui's own
/// colour parser accepts (`#rrggbb`, names). Alpha is ignored.
fn css_color(raw: &str) -> Option<Color> {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    let args = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'));
    match args {
        Some(args) => {
            let mut channels = args.split(',').map(|c| c.trim().parse::<u8>());
            let r = channels.next()?.ok()?;
            let g = channels.next()?.ok()?;
            let b = channels.next()?.ok()?;
            Some(Color::Rgb(r, g, b))
        }
        None => Color::from_str(raw).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::{css_color, format_tick, padded};
    use ratatui::style::Color;

    #[test]
    fn parses_dataset_colors() {
        assert_eq!(css_color("rgb(75, 192, 192)"), Some(Color::Rgb(75, 192, 192)));
        assert_eq!(
            css_color("rgba(75, 192, 192, 0.2)"),
            Some(Color::Rgb(75, 192, 192))
        );
        assert_eq!(css_color("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(css_color("red"), Some(Color::Red));
        assert_eq!(css_color("rgb(300, 0, 0)"), None);
        assert_eq!(css_color("not a colour"), None);
    }

    #[test]
    fn degenerate_ranges_are_widened() {
        assert_eq!(padded([2.0, 2.0]), [1.0, 3.0]);
        assert_eq!(padded([0.0, 10.0]), [-0.5, 10.5]);
    }

    #[test]
    fn ticks_drop_trailing_zeros_for_integers() {
        assert_eq!(format_tick(4.0), "4");
        assert_eq!(format_tick(-0.5), "-0.50");
    }
}
