//! Terminal rendition of the drawing surface.
//!
//! Strokes are replayed through the same [`StrokeSurface`] contract the PNG
//! export uses, collected as line segments, and painted with braille dots.

use ratatui::{
    Frame,
    layout::Rect,
    symbols::Marker,
    widgets::{
        Block,
        canvas::{Canvas, Line as CanvasLine, Points},
    },
};

use inksolve_core::{StrokeSurface, render_live};
use inksolve_engine::{App, Point, StrokeStyle, SurfaceSize};

use crate::theme::Palette;

/// Segment list built from replayed strokes, in canvas coordinates
/// (origin bottom-left, y up).
#[derive(Debug, Default)]
pub struct SegmentSurface {
    height: f64,
    segments: Vec<(Point, Point)>,
    dots: Vec<(f64, f64)>,
}

impl SegmentSurface {
    #[must_use]
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            height: f64::from(size.height),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[(Point, Point)] {
        &self.segments
    }

    #[must_use]
    pub fn dots(&self) -> &[(f64, f64)] {
        &self.dots
    }

    fn flip(&self, point: Point) -> Point {
        Point::new(point.x, self.height - point.y)
    }
}

impl StrokeSurface for SegmentSurface {
    fn clear(&mut self) {
        self.segments.clear();
        self.dots.clear();
    }

    fn stroke_polyline(&mut self, points: &[Point], _style: &StrokeStyle) {
        match points {
            [] => {}
            [only] => {
                let p = self.flip(*only);
                self.dots.push((p.x, p.y));
            }
            _ => {
                for pair in points.windows(2) {
                    let segment = (self.flip(pair[0]), self.flip(pair[1]));
                    self.segments.push(segment);
                }
            }
        }
    }
}

/// Paint the app's drawing, including the stroke in progress, into `area`.
///
/// The surface size comes from the app's viewport, so `area` must be the
/// region whose inner cells were registered with `App::set_viewport`.
pub fn render_drawing(
    frame: &mut Frame,
    area: Rect,
    block: Block<'_>,
    app: &App,
    palette: &Palette,
) {
    let size = app.surface_size();
    let mut surface = SegmentSurface::new(size);
    render_live(&mut surface, app.drawing(), app.stroke_style());

    let ink = palette.ink;
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .background_color(palette.bg_panel)
        .x_bounds([0.0, f64::from(size.width)])
        .y_bounds([0.0, f64::from(size.height)])
        .paint(|ctx| {
            for (from, to) in surface.segments() {
                ctx.draw(&CanvasLine::new(from.x, from.y, to.x, to.y, ink));
            }
            if !surface.dots().is_empty() {
                ctx.draw(&Points {
                    coords: surface.dots(),
                    color: ink,
                });
            }
        });
    frame.render_widget(canvas, area);
}
