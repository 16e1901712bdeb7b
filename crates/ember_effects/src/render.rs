//! Render command lists.
//!
//! Effects never touch pixels. Each tick they append [`RenderCommand`]s to a
//! reusable [`Frame`]; a [`DrawSurface`](crate::surface::DrawSurface) then
//! rasterizes or forwards the list. Coordinates are logical surface pixels.

use ember_core::{Color, Vec2};

/// Flattening resolution for quadratic segments.
pub const CURVE_STEPS: usize = 8;

/// One quadratic Bézier segment, continuing from the previous end point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadSegment {
    /// Off-curve control point.
    pub control: Vec2,
    /// On-curve end point.
    pub end: Vec2,
}

/// Open path made of quadratic segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// First on-curve point.
    start: Vec2,
    /// Segments in drawing order.
    segments: Vec<QuadSegment>,
}

impl Path {
    /// Starts a path at `start`.
    #[must_use]
    pub fn new(start: Vec2) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    /// Smoothed curve through `points`.
    ///
    /// Midpoints between consecutive samples lie on the curve and the samples
    /// themselves act as control points; the curve starts at the first sample
    /// and ends at the last. Returns `None` for fewer than two points.
    #[must_use]
    pub fn through_points(points: &[Vec2]) -> Option<Self> {
        let mut path = Self::new(Vec2::ZERO);
        path.segments.reserve(points.len());
        path.rebuild_through(points.iter().copied()).then_some(path)
    }

    /// Rebuilds this path in place as the curve [`Path::through_points`]
    /// would produce, reusing the segment storage.
    ///
    /// Returns `false` and leaves an empty path at the first sample (or at
    /// the old start) when fewer than two points are given.
    pub fn rebuild_through<I>(&mut self, points: I) -> bool
    where
        I: IntoIterator<Item = Vec2>,
    {
        self.segments.clear();
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return false;
        };
        self.start = first;
        let Some(mut previous) = points.next() else {
            return false;
        };
        for point in points {
            self.quad_to(previous, previous.midpoint(point));
            previous = point;
        }
        self.line_to(previous);
        true
    }

    /// Makes this path a copy of `other` without giving up its storage.
    pub fn copy_from(&mut self, other: &Self) {
        self.start = other.start;
        self.segments.clear();
        self.segments.extend_from_slice(&other.segments);
    }

    /// Appends a quadratic segment.
    pub fn quad_to(&mut self, control: Vec2, end: Vec2) {
        self.segments.push(QuadSegment { control, end });
    }

    /// Appends a straight segment.
    pub fn line_to(&mut self, end: Vec2) {
        let from = self.end();
        self.quad_to(from.midpoint(end), end);
    }

    /// First point.
    #[must_use]
    pub const fn start(&self) -> Vec2 {
        self.start
    }

    /// Last on-curve point.
    #[must_use]
    pub fn end(&self) -> Vec2 {
        self.segments.last().map_or(self.start, |s| s.end)
    }

    /// Segments in drawing order.
    #[must_use]
    pub fn segments(&self) -> &[QuadSegment] {
        &self.segments
    }

    /// True when every point is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.start.is_finite()
            && self
                .segments
                .iter()
                .all(|s| s.control.is_finite() && s.end.is_finite())
    }

    /// Polyline approximation with `steps` samples per segment.
    #[must_use]
    pub fn flatten(&self, steps: usize) -> Vec<Vec2> {
        let mut points = Vec::new();
        self.flatten_into(steps, &mut points);
        points
    }

    /// [`Path::flatten`] into a caller-owned buffer, replacing its contents.
    pub fn flatten_into(&self, steps: usize, points: &mut Vec<Vec2>) {
        let steps = steps.max(1);
        points.clear();
        points.reserve(1 + self.segments.len() * steps);
        points.push(self.start);

        let mut from = self.start;
        for segment in &self.segments {
            for i in 1..=steps {
                let t = i as f32 / steps as f32;
                let a = from.lerp(segment.control, t);
                let b = segment.control.lerp(segment.end, t);
                points.push(a.lerp(b, t));
            }
            from = segment.end;
        }
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

/// Linear color ramp from `start` to `end` in surface space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeGradient {
    /// Where `from` applies.
    pub start: Vec2,
    /// Where `to` applies.
    pub end: Vec2,
    /// Color at `start`.
    pub from: Color,
    /// Color at `end`.
    pub to: Color,
}

impl StrokeGradient {
    /// Single-color gradient.
    #[must_use]
    pub const fn solid(color: Color) -> Self {
        Self {
            start: Vec2::ZERO,
            end: Vec2::ZERO,
            from: color,
            to: color,
        }
    }

    /// Color at `point`, projected onto the ramp and clamped to its ends.
    #[must_use]
    pub fn sample(&self, point: Vec2) -> Color {
        let axis = self.end - self.start;
        let len_sq = axis.length_squared();
        if len_sq <= f32::EPSILON {
            return self.from;
        }
        let t = ((point - self.start).dot(axis) / len_sq).clamp(0.0, 1.0);
        self.from.lerp(self.to, t)
    }

    /// Scales both ends' alpha.
    #[must_use]
    pub fn fade(self, factor: f32) -> Self {
        Self {
            from: self.from.fade(factor),
            to: self.to.fade(factor),
            ..self
        }
    }

    fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.from.is_finite() && self.to.is_finite()
    }
}

/// A draw command for one primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Soft disc whose alpha falls off quadratically toward the rim.
    Glow {
        /// Center.
        center: Vec2,
        /// Outer radius.
        radius: f32,
        /// Color at the center.
        color: Color,
    },
    /// Solid anti-aliased disc.
    Circle {
        /// Center.
        center: Vec2,
        /// Radius.
        radius: f32,
        /// Fill color.
        color: Color,
    },
    /// Filled axis-aligned rectangle.
    Rect {
        /// Top-left corner.
        origin: Vec2,
        /// Width and height.
        size: Vec2,
        /// Fill color.
        color: Color,
    },
    /// Stroked path with round caps.
    Stroke {
        /// Centerline.
        path: Path,
        /// Stroke width.
        width: f32,
        /// Color ramp.
        gradient: StrokeGradient,
    },
}

impl RenderCommand {
    /// True when every coordinate, size, and color channel is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Glow { center, radius, color } | Self::Circle { center, radius, color } => {
                center.is_finite() && radius.is_finite() && color.is_finite()
            }
            Self::Rect { origin, size, color } => {
                origin.is_finite() && size.is_finite() && color.is_finite()
            }
            Self::Stroke { path, width, gradient } => {
                path.is_finite() && width.is_finite() && gradient.is_finite()
            }
        }
    }
}

/// Everything one tick draws, in painter's order.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Fill applied before the first command.
    clear_color: Color,
    /// Commands, back to front.
    commands: Vec<RenderCommand>,
    /// Stroke paths from earlier frames, emptied and ready for reuse.
    spare_paths: Vec<Path>,
}

impl Frame {
    /// Creates an empty frame with a transparent background.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clear_color: Color::TRANSPARENT,
            commands: Vec::with_capacity(256),
            spare_paths: Vec::new(),
        }
    }

    /// Empties the command list (keeping its storage) and sets the background.
    ///
    /// Stroke paths are kept aside and handed out again by
    /// [`Frame::take_path`].
    pub fn reset(&mut self, clear_color: Color) {
        self.clear_color = clear_color;
        for command in self.commands.drain(..) {
            if let RenderCommand::Stroke { path, .. } = command {
                self.spare_paths.push(path);
            }
        }
    }

    /// An empty path, reusing storage from a previous frame when available.
    #[must_use]
    pub fn take_path(&mut self) -> Path {
        let mut path = self.spare_paths.pop().unwrap_or_default();
        path.segments.clear();
        path
    }

    /// Returns a path that was taken but not drawn.
    pub fn recycle_path(&mut self, path: Path) {
        self.spare_paths.push(path);
    }

    /// Background fill.
    #[must_use]
    pub const fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Appends a command.
    #[inline]
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Appends a glow disc.
    pub fn glow(&mut self, center: Vec2, radius: f32, color: Color) {
        self.push(RenderCommand::Glow { center, radius, color });
    }

    /// Appends a solid disc.
    pub fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.push(RenderCommand::Circle { center, radius, color });
    }

    /// Appends a filled rectangle.
    pub fn rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        self.push(RenderCommand::Rect { origin, size, color });
    }

    /// Appends a stroked path.
    pub fn stroke(&mut self, path: Path, width: f32, gradient: StrokeGradient) {
        self.push(RenderCommand::Stroke { path, width, gradient });
    }

    /// Commands in painter's order.
    #[must_use]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing will be drawn besides the background.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// True when no command carries a NaN or infinity.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.clear_color.is_finite() && self.commands.iter().all(RenderCommand::is_finite)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
