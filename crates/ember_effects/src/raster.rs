//! CPU raster backend.
//!
//! RGBA8 pixels with straight (non-premultiplied) alpha, row-major, at the
//! surface's backing resolution. Commands arrive in logical pixels and are
//! scaled by the device pixel ratio. Every primitive is blended source-over.

use ember_core::{Color, Vec2};

use crate::render::{Frame, Path, RenderCommand, StrokeGradient, CURVE_STEPS};
use crate::surface::{DrawSurface, SurfaceConfig};

/// Bytes per pixel.
const CHANNELS: usize = 4;

/// CPU-side RGBA8 drawing surface.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    /// Backing width in physical pixels.
    width: u32,
    /// Backing height in physical pixels.
    height: u32,
    /// Logical to physical scale.
    scale: f32,
    /// RGBA8, straight alpha.
    pixels: Vec<u8>,
    /// Frames drawn since the last configure.
    frames: u64,
    /// Flattened stroke centerline, reused across strokes.
    stroke_points: Vec<Vec2>,
    /// Per-pixel stroke coverage, reused across strokes.
    stroke_coverage: Vec<f32>,
}

impl RasterSurface {
    /// Creates an unconfigured (0×0) surface.
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            scale: 1.0,
            pixels: Vec::new(),
            frames: 0,
            stroke_points: Vec::new(),
            stroke_coverage: Vec::new(),
        }
    }

    /// Backing width in physical pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Backing height in physical pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Frames drawn since the last configure.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Raw RGBA8 bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Raw RGBA8 bytes, mutably.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// One pixel, or `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x as usize, y as usize);
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Fills every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        let rgba = to_rgba8(color);
        bytemuck::cast_slice_mut::<u8, [u8; CHANNELS]>(&mut self.pixels).fill(rgba);
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * CHANNELS
    }

    /// Source-over blend of `color` scaled by `coverage` into one pixel.
    fn blend(&mut self, x: usize, y: usize, color: Color, coverage: f32) {
        let src_a = (color.a * coverage).clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }
        let i = self.offset(x, y);
        let px = &mut self.pixels[i..i + CHANNELS];
        let dst_a = f32::from(px[3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        let mix = |src: f32, dst: u8| {
            let dst = f32::from(dst) / 255.0;
            (src.clamp(0.0, 1.0) * src_a + dst * dst_a * (1.0 - src_a)) / out_a
        };
        let rgb = [mix(color.r, px[0]), mix(color.g, px[1]), mix(color.b, px[2])];
        px[0] = unit_to_u8(rgb[0]);
        px[1] = unit_to_u8(rgb[1]);
        px[2] = unit_to_u8(rgb[2]);
        px[3] = unit_to_u8(out_a);
    }

    /// Pixel-center range covered by `[min, max]` in physical space.
    fn span(&self, min: Vec2, max: Vec2) -> Option<(usize, usize, usize, usize)> {
        let clamp_x = |v: f32| v.clamp(0.0, self.width as f32) as usize;
        let clamp_y = |v: f32| v.clamp(0.0, self.height as f32) as usize;
        let (x0, x1) = (clamp_x(min.x.floor()), clamp_x(max.x.ceil()));
        let (y0, y1) = (clamp_y(min.y.floor()), clamp_y(max.y.ceil()));
        (x0 < x1 && y0 < y1).then_some((x0, x1, y0, y1))
    }

    fn draw_disc(&mut self, center: Vec2, radius: f32, color: Color, soft: bool) {
        let center = center * self.scale;
        let radius = radius * self.scale;
        if radius <= 0.0 {
            return;
        }
        let reach = Vec2::new(radius + 1.0, radius + 1.0);
        let Some((x0, x1, y0, y1)) = self.span(center - reach, center + reach) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                let coverage = if soft {
                    let falloff = (1.0 - d / radius).max(0.0);
                    falloff * falloff
                } else {
                    (radius - d + 0.5).clamp(0.0, 1.0)
                };
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    fn draw_rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        let min = origin * self.scale;
        let max = (origin + size) * self.scale;
        let (min, max) = (
            Vec2::new(min.x.min(max.x), min.y.min(max.y)),
            Vec2::new(min.x.max(max.x), min.y.max(max.y)),
        );
        let Some((x0, x1, y0, y1)) = self.span(min, max) else {
            return;
        };
        for y in y0..y1 {
            let cover_y = overlap(y as f32, min.y, max.y);
            for x in x0..x1 {
                let coverage = overlap(x as f32, min.x, max.x) * cover_y;
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    fn draw_stroke(&mut self, path: &Path, width: f32, gradient: &StrokeGradient) {
        let half = width * self.scale * 0.5;
        if half <= 0.0 {
            return;
        }
        // Scratch buffers leave `self` while pixels are blended.
        let mut points = std::mem::take(&mut self.stroke_points);
        let mut coverage = std::mem::take(&mut self.stroke_coverage);
        path.flatten_into(CURVE_STEPS, &mut points);
        for point in &mut points {
            *point = *point * self.scale;
        }
        self.stamp_capsules(&points, half, gradient, &mut coverage);
        self.stroke_points = points;
        self.stroke_coverage = coverage;
    }

    /// Stamps a physical-space polyline as round-capped capsules.
    ///
    /// Coverage is accumulated with `max` first so overlapping capsules at
    /// joints do not double the alpha.
    fn stamp_capsules(&mut self, points: &[Vec2], half: f32, gradient: &StrokeGradient, coverage: &mut Vec<f32>) {
        let Some(&first) = points.first() else {
            return;
        };
        let mut min = first;
        let mut max = first;
        for p in points {
            min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
            max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
        }
        let reach = Vec2::new(half + 1.0, half + 1.0);
        let Some((x0, x1, y0, y1)) = self.span(min - reach, max + reach) else {
            return;
        };

        let cols = x1 - x0;
        coverage.clear();
        coverage.resize(cols * (y1 - y0), 0.0);
        let dot = [first, first];
        let polyline = if points.len() == 1 { &dot[..] } else { points };
        for pair in polyline.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let lo = Vec2::new(a.x.min(b.x), a.y.min(b.y)) - reach;
            let hi = Vec2::new(a.x.max(b.x), a.y.max(b.y)) + reach;
            let Some((sx0, sx1, sy0, sy1)) = self.span(lo, hi) else {
                continue;
            };
            for y in sy0..sy1 {
                for x in sx0..sx1 {
                    let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let c = (half - segment_distance(p, a, b) + 0.5).clamp(0.0, 1.0);
                    let cell = &mut coverage[(y - y0) * cols + (x - x0)];
                    *cell = cell.max(c);
                }
            }
        }

        let scale = self.scale;
        for y in y0..y1 {
            for x in x0..x1 {
                let c = coverage[(y - y0) * cols + (x - x0)];
                if c > 0.0 {
                    let logical = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * (1.0 / scale);
                    self.blend(x, y, gradient.sample(logical), c);
                }
            }
        }
    }

    fn draw(&mut self, command: &RenderCommand) {
        if !command.is_finite() {
            return;
        }
        match command {
            RenderCommand::Glow { center, radius, color } => self.draw_disc(*center, *radius, *color, true),
            RenderCommand::Circle { center, radius, color } => {
                self.draw_disc(*center, *radius, *color, false);
            }
            RenderCommand::Rect { origin, size, color } => self.draw_rect(*origin, *size, *color),
            RenderCommand::Stroke { path, width, gradient } => self.draw_stroke(path, *width, gradient),
        }
    }
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawSurface for RasterSurface {
    fn configure(&mut self, config: &SurfaceConfig) {
        let (width, height) = config.backing_size();
        self.width = width;
        self.height = height;
        self.scale = config.device_pixel_ratio;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize * CHANNELS, 0);
        self.frames = 0;
    }

    fn present(&mut self, frame: &Frame) {
        self.clear(frame.clear_color());
        for command in frame.commands() {
            self.draw(command);
        }
        self.frames += 1;
    }

    fn release(&mut self) {
        self.width = 0;
        self.height = 0;
        self.pixels = Vec::new();
        self.stroke_points = Vec::new();
        self.stroke_coverage = Vec::new();
    }
}

/// Fraction of pixel `[i, i+1)` inside `[min, max]`.
#[inline]
fn overlap(i: f32, min: f32, max: f32) -> f32 {
    ((i + 1.0).min(max) - i.max(min)).clamp(0.0, 1.0)
}

/// Distance from `p` to segment `a..b`.
fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn to_rgba8(color: Color) -> [u8; CHANNELS] {
    [unit_to_u8(color.r), unit_to_u8(color.g), unit_to_u8(color.b), unit_to_u8(color.a)]
}
