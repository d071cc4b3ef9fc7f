//! Stroke capture model.
//!
//! A [`Drawing`] is an append-only list of committed [`Stroke`]s plus at most
//! one stroke that is still being drawn. Pointer and touch input both funnel
//! into the same begin/extend/commit vocabulary through [`StrokeInput`].

/// A position on the drawing surface, relative to its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the drawing surface in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(640, 320)
    }
}

/// Axis-aligned bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    fn include(&mut self, point: Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// One continuous pointer-down-to-up path.
///
/// A stroke always holds at least one point; the only way to build one is
/// from the point that started it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
}

impl Stroke {
    #[must_use]
    pub fn starting_at(point: Point) -> Self {
        Self {
            points: vec![point],
        }
    }

    fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A single active touch point, as reported by a touch device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub id: u64,
    pub position: Point,
}

/// Raw input that drives stroke capture.
///
/// Touch variants carry every active touch; only the first one is used.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeInput {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    /// Pointer left the surface mid-stroke.
    PointerLeave,
    TouchStart(Vec<Touch>),
    TouchMove(Vec<Touch>),
    TouchEnd,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drawing {
    committed: Vec<Stroke>,
    in_progress: Option<Stroke>,
}

impl Drawing {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new stroke. A no-op while another stroke is in progress.
    pub fn begin_stroke(&mut self, point: Point) {
        if self.in_progress.is_some() {
            return;
        }
        self.in_progress = Some(Stroke::starting_at(point));
    }

    /// Append to the in-progress stroke. A no-op when nothing is being drawn.
    pub fn extend_stroke(&mut self, point: Point) {
        if let Some(stroke) = self.in_progress.as_mut() {
            stroke.push(point);
        }
    }

    /// Move the in-progress stroke to the end of the committed list.
    ///
    /// Returns `true` when a stroke was committed. Empty strokes are dropped.
    pub fn commit_stroke(&mut self) -> bool {
        match self.in_progress.take() {
            Some(stroke) if !stroke.is_empty() => {
                self.committed.push(stroke);
                true
            }
            _ => false,
        }
    }

    /// Remove the most recently committed stroke, if any.
    pub fn undo_last(&mut self) -> Option<Stroke> {
        self.committed.pop()
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.in_progress = None;
    }

    /// Feed one raw input event through the stroke vocabulary.
    pub fn apply(&mut self, input: StrokeInput) {
        match input {
            StrokeInput::PointerDown(point) => self.begin_stroke(point),
            StrokeInput::PointerMove(point) => self.extend_stroke(point),
            StrokeInput::PointerUp | StrokeInput::PointerLeave | StrokeInput::TouchEnd => {
                self.commit_stroke();
            }
            StrokeInput::TouchStart(touches) => {
                if let Some(first) = touches.first() {
                    self.begin_stroke(first.position);
                }
            }
            StrokeInput::TouchMove(touches) => {
                if let Some(first) = touches.first() {
                    self.extend_stroke(first.position);
                }
            }
        }
    }

    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.committed
    }

    #[must_use]
    pub fn in_progress(&self) -> Option<&Stroke> {
        self.in_progress.as_ref()
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.in_progress.is_some()
    }

    #[must_use]
    pub fn stroke_count(&self) -> usize {
        self.committed.len()
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.committed.iter().map(Stroke::len).sum()
    }

    /// True when nothing has been committed. An in-progress stroke does not count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Bounding box over all committed points.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.committed.iter().flat_map(|s| s.points().iter().copied());
        let first = points.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for point in points {
            bounds.include(point);
        }
        Some(bounds)
    }
}
