//! Post-processing stages.
//!
//! A stage runs after a frame is fully drawn and may read and rewrite the
//! surface in place. Stages are opaque to effects; an effect only decides
//! whether its frames want one.
//!
//! ## Bloom
//!
//! 1. Bright pass: keep pixels whose luminance exceeds the threshold
//! 2. Blur: separable box blur, horizontal then vertical
//! 3. Composite: add the blurred glow back onto the frame

use crate::raster::RasterSurface;

/// A stage fed the fully drawn surface.
pub trait PostProcess<S: ?Sized> {
    /// Rewrites `surface` in place.
    fn apply(&mut self, surface: &mut S);
}

/// Rec. 709 luma weights.
const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Bright-pass + blur + additive composite glow for [`RasterSurface`].
#[derive(Debug, Clone)]
pub struct Bloom {
    /// Luminance (0-1) below which pixels contribute nothing.
    pub threshold: f32,
    /// Box blur radius in physical pixels.
    pub radius: usize,
    /// Composite strength.
    pub intensity: f32,
    /// Scratch: bright pass, then blur output.
    bright: Vec<[f32; 3]>,
    /// Scratch: horizontal blur output.
    scratch: Vec<[f32; 3]>,
}

impl Bloom {
    /// Creates a bloom stage.
    #[must_use]
    pub fn new(threshold: f32, radius: usize, intensity: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            radius,
            intensity: intensity.max(0.0),
            bright: Vec::new(),
            scratch: Vec::new(),
        }
    }

    fn bright_pass(&mut self, pixels: &[u8]) {
        let threshold = self.threshold;
        self.bright.clear();
        self.bright.extend(pixels.chunks_exact(4).map(|px| {
            let a = f32::from(px[3]) / 255.0;
            let rgb = [
                f32::from(px[0]) / 255.0 * a,
                f32::from(px[1]) / 255.0 * a,
                f32::from(px[2]) / 255.0 * a,
            ];
            let luma = rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2];
            if luma > threshold {
                rgb
            } else {
                [0.0; 3]
            }
        }));
    }
}

impl Default for Bloom {
    fn default() -> Self {
        Self::new(0.6, 4, 0.8)
    }
}

impl PostProcess<RasterSurface> for Bloom {
    fn apply(&mut self, surface: &mut RasterSurface) {
        let width = surface.width() as usize;
        let height = surface.height() as usize;
        if width == 0 || height == 0 || self.intensity <= 0.0 {
            return;
        }

        self.bright_pass(surface.pixels());
        self.scratch.clear();
        self.scratch.resize(width * height, [0.0; 3]);
        box_blur(&self.bright, &mut self.scratch, width, height, self.radius, Axis::Horizontal);
        box_blur(&self.scratch, &mut self.bright, width, height, self.radius, Axis::Vertical);

        let intensity = self.intensity;
        for (px, glow) in surface.pixels_mut().chunks_exact_mut(4).zip(&self.bright) {
            let glow = [glow[0] * intensity, glow[1] * intensity, glow[2] * intensity];
            let peak = glow[0].max(glow[1]).max(glow[2]);
            if peak <= 0.0 {
                continue;
            }
            let a = f32::from(px[3]) / 255.0;
            let out_a = a.max(peak.min(1.0));
            for c in 0..3 {
                // Straight alpha: add in premultiplied space, then divide back out.
                let premul = f32::from(px[c]) / 255.0 * a + glow[c];
                px[c] = ((premul / out_a).clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            px[3] = (out_a * 255.0).round() as u8;
        }
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Running-sum box blur along one axis, clamping at the edges.
fn box_blur(src: &[[f32; 3]], dst: &mut [[f32; 3]], width: usize, height: usize, radius: usize, axis: Axis) {
    let (lines, len) = match axis {
        Axis::Horizontal => (height, width),
        Axis::Vertical => (width, height),
    };
    let index = |line: usize, i: usize| match axis {
        Axis::Horizontal => line * width + i,
        Axis::Vertical => i * width + line,
    };
    let norm = 1.0 / (2 * radius + 1) as f32;

    for line in 0..lines {
        let at = |i: isize| src[index(line, i.clamp(0, len as isize - 1) as usize)];
        let mut sum = [0.0_f32; 3];
        for i in -(radius as isize)..=(radius as isize) {
            let s = at(i);
            for c in 0..3 {
                sum[c] += s[c];
            }
        }
        for i in 0..len {
            dst[index(line, i)] = [sum[0] * norm, sum[1] * norm, sum[2] * norm];
            let enter = at(i as isize + radius as isize + 1);
            let leave = at(i as isize - radius as isize);
            for c in 0..3 {
                sum[c] += enter[c] - leave[c];
            }
        }
    }
}
