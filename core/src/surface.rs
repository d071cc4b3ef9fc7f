//! Replaying strokes onto a drawing surface.

use inksolve_types::{Drawing, Point};

/// Pen parameters shared by every surface. Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    /// Ink colour as RGB.
    pub color: [u8; 3],
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 3.0,
            color: [0x33, 0x33, 0x33],
        }
    }
}

/// Something strokes can be painted on.
pub trait StrokeSurface {
    /// Reset every pixel to the background.
    fn clear(&mut self);

    /// Paint one connected polyline. A single point paints a dot.
    fn stroke_polyline(&mut self, points: &[Point], style: &StrokeStyle);
}

/// Clear the surface and replay every committed stroke in order.
pub fn redraw<S: StrokeSurface + ?Sized>(surface: &mut S, drawing: &Drawing, style: &StrokeStyle) {
    surface.clear();
    for stroke in drawing.strokes() {
        surface.stroke_polyline(stroke.points(), style);
    }
}

/// [`redraw`] plus the stroke currently being drawn.
pub fn render_live<S: StrokeSurface + ?Sized>(
    surface: &mut S,
    drawing: &Drawing,
    style: &StrokeStyle,
) {
    redraw(surface, drawing, style);
    if let Some(stroke) = drawing.in_progress() {
        surface.stroke_polyline(stroke.points(), style);
    }
}
