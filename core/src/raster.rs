//! Off-screen raster used for recognition uploads.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use inksolve_types::{Drawing, FlowError, Point, SurfaceSize};

use crate::surface::{StrokeStyle, StrokeSurface, redraw};

const BACKGROUND: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

/// Smallest pen radius that still marks at least one pixel per stamp.
const MIN_RADIUS: f64 = 0.6;

/// RGBA image with a white background.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    image: RgbaImage,
}

impl RasterCanvas {
    #[must_use]
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.width, size.height, BACKGROUND),
        }
    }

    #[must_use]
    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.image.width(), self.image.height())
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// True when every pixel is background.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| *p == BACKGROUND)
    }

    pub fn to_png(&self) -> Result<Vec<u8>, FlowError> {
        if self.size().is_empty() {
            return Err(FlowError::Encode("drawing surface has no area".to_string()));
        }
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| FlowError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    fn stamp(&mut self, center: Point, radius: f64, ink: Rgba<u8>) {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let max_x = f64::from(width - 1);
        let max_y = f64::from(height - 1);
        let x0 = (center.x - radius).floor().clamp(0.0, max_x) as u32;
        let x1 = (center.x + radius).ceil().clamp(0.0, max_x) as u32;
        let y0 = (center.y - radius).floor().clamp(0.0, max_y) as u32;
        let y1 = (center.y + radius).ceil().clamp(0.0, max_y) as u32;
        let r2 = radius * radius;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = f64::from(x) - center.x;
                let dy = f64::from(y) - center.y;
                if dx * dx + dy * dy <= r2 {
                    self.image.put_pixel(x, y, ink);
                }
            }
        }
    }
}

impl StrokeSurface for RasterCanvas {
    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], style: &StrokeStyle) {
        let [r, g, b] = style.color;
        let ink = Rgba([r, g, b, 0xff]);
        let radius = (style.width / 2.0).max(MIN_RADIUS);

        let Some(&first) = points.first() else {
            return;
        };
        // Stamping discs along every segment yields round caps and joins.
        self.stamp(first, radius, ink);
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let steps = dx.hypot(dy).max(1.0).ceil() as u32;
            for step in 1..=steps {
                let t = f64::from(step) / f64::from(steps);
                self.stamp(Point::new(a.x + dx * t, a.y + dy * t), radius, ink);
            }
        }
    }
}

/// Render the committed strokes of `drawing` and encode them as PNG.
pub fn render_png(
    drawing: &Drawing,
    size: SurfaceSize,
    style: &StrokeStyle,
) -> Result<Vec<u8>, FlowError> {
    let mut canvas = RasterCanvas::new(size);
    redraw(&mut canvas, drawing, style);
    canvas.to_png()
}

#[cfg(test)]
mod tests {
    use super::{BACKGROUND, RasterCanvas, render_png};
    use crate::surface::{StrokeStyle, StrokeSurface, redraw};
    use inksolve_types::{Drawing, FlowError, Point, SurfaceSize};

    fn line_drawing() -> Drawing {
        let mut drawing = Drawing::new();
        drawing.begin_stroke(Point::new(10.0, 10.0));
        drawing.extend_stroke(Point::new(50.0, 10.0));
        drawing.commit_stroke();
        drawing
    }

    #[test]
    fn clear_then_redraw_empty_drawing_is_blank() {
        let mut canvas = RasterCanvas::new(SurfaceSize::new(64, 32));
        let style = StrokeStyle::default();
        redraw(&mut canvas, &line_drawing(), &style);
        assert!(!canvas.is_blank());

        canvas.clear();
        redraw(&mut canvas, &Drawing::new(), &style);
        assert!(canvas.is_blank());
    }

    #[test]
    fn segment_is_continuous_with_round_caps() {
        let mut canvas = RasterCanvas::new(SurfaceSize::new(64, 32));
        redraw(&mut canvas, &line_drawing(), &StrokeStyle::default());
        let ink = image::Rgba([0x33, 0x33, 0x33, 0xff]);
        for x in 10..=50 {
            assert_eq!(*canvas.image().get_pixel(x, 10), ink, "gap at x={x}");
        }
        // Cap extends past the endpoint by the pen radius.
        assert_eq!(*canvas.image().get_pixel(51, 10), ink);
        assert_eq!(*canvas.image().get_pixel(60, 10), BACKGROUND);
    }

    #[test]
    fn single_point_stroke_renders_a_dot() {
        let mut canvas = RasterCanvas::new(SurfaceSize::new(16, 16));
        canvas.stroke_polyline(&[Point::new(8.0, 8.0)], &StrokeStyle::default());
        assert!(!canvas.is_blank());
    }

    #[test]
    fn out_of_bounds_points_are_clipped() {
        let mut canvas = RasterCanvas::new(SurfaceSize::new(8, 8));
        canvas.stroke_polyline(
            &[Point::new(-20.0, -20.0), Point::new(100.0, 100.0)],
            &StrokeStyle::default(),
        );
        assert!(!canvas.is_blank());
    }

    #[test]
    fn png_round_trips_dimensions() {
        let png = render_png(
            &line_drawing(),
            SurfaceSize::new(64, 32),
            &StrokeStyle::default(),
        )
        .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[test]
    fn zero_area_surface_fails_to_encode() {
        let err = render_png(&line_drawing(), SurfaceSize::new(0, 10), &StrokeStyle::default())
            .unwrap_err();
        assert!(matches!(err, FlowError::Encode(_)));
    }
}
