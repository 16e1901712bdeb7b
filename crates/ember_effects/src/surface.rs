//! # Surface Binding
//!
//! Attaches a simulation to a host drawing surface sized to its container.
//!
//! ```text
//!   HostContainer ──content size──► SurfaceConfig ──configure──► DrawSurface
//!   Effect::render ──► Frame ─────────────────────present──────► DrawSurface
//!   dispose ──────────────────────────────────────release──────► DrawSurface
//! ```
//!
//! The binding only forwards a frame while it holds a drawable config and
//! has not been released, so a surface never sees a draw call with stale or
//! zero dimensions.

use crate::render::Frame;

/// Logical size and pixel density of a host surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    /// Content-box width in logical pixels.
    pub width: f32,
    /// Content-box height in logical pixels.
    pub height: f32,
    /// Physical pixels per logical pixel; at least 1.
    pub device_pixel_ratio: f32,
}

impl SurfaceConfig {
    /// Builds a config, clamping bad inputs.
    ///
    /// Negative or non-finite dimensions become 0. A ratio below 1 or
    /// non-finite becomes 1.
    #[must_use]
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width: dimension(width),
            height: dimension(height),
            device_pixel_ratio: if device_pixel_ratio.is_finite() {
                device_pixel_ratio.max(1.0)
            } else {
                1.0
            },
        }
    }

    /// True when both dimensions are positive.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Physical pixel size, `round(dimension * ratio)`.
    #[must_use]
    pub fn backing_size(&self) -> (u32, u32) {
        let scale = |v: f32| (v * self.device_pixel_ratio).round().clamp(0.0, u32::MAX as f32) as u32;
        (scale(self.width), scale(self.height))
    }
}

fn dimension(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// A drawing backend: CPU raster, GPU context, or a recorder.
pub trait DrawSurface {
    /// (Re)allocates backing storage for `config`.
    fn configure(&mut self, config: &SurfaceConfig);

    /// Draws one complete frame.
    fn present(&mut self, frame: &Frame);

    /// Frees backing storage. Called once, at dispose.
    fn release(&mut self);
}

/// Owns one surface for one effect instance.
#[derive(Debug)]
pub struct SurfaceBinding<S> {
    /// The backend.
    surface: S,
    /// Latest config pushed to the backend.
    config: Option<SurfaceConfig>,
    /// Set once `release` ran.
    released: bool,
}

impl<S: DrawSurface> SurfaceBinding<S> {
    /// Wraps an unconfigured surface.
    #[must_use]
    pub const fn new(surface: S) -> Self {
        Self {
            surface,
            config: None,
            released: false,
        }
    }

    /// Pushes `config` to the backend when it differs from the current one.
    ///
    /// Returns whether the backend was reconfigured.
    pub fn resize(&mut self, config: SurfaceConfig) -> bool {
        if self.released || self.config == Some(config) {
            return false;
        }
        self.surface.configure(&config);
        self.config = Some(config);
        true
    }

    /// Latest config pushed to the backend.
    #[must_use]
    pub const fn config(&self) -> Option<SurfaceConfig> {
        self.config
    }

    /// Forwards `frame` when the surface is live and drawable.
    ///
    /// Returns whether the backend received it.
    pub fn present(&mut self, frame: &Frame) -> bool {
        let drawable = self.config.is_some_and(|c| c.is_drawable());
        if self.released || !drawable {
            return false;
        }
        self.surface.present(frame);
        true
    }

    /// Releases the backend. Idempotent.
    pub fn release(&mut self) {
        if !self.released {
            self.surface.release();
            self.released = true;
            self.config = None;
        }
    }

    /// True once released.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    /// The backend.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The backend, mutably (post-processing reads back pixels).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

/// Surface that keeps the last presented frame instead of drawing it.
///
/// Stands in for an external GPU or scene-graph backend.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    /// Latest config.
    config: Option<SurfaceConfig>,
    /// Latest presented frame.
    last_frame: Option<Frame>,
    /// Number of `configure` calls.
    configures: u32,
    /// Number of `present` calls.
    presents: u64,
    /// Number of `release` calls.
    releases: u32,
}

impl RecordingSurface {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest config.
    #[must_use]
    pub const fn config(&self) -> Option<SurfaceConfig> {
        self.config
    }

    /// Latest presented frame.
    #[must_use]
    pub const fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Number of `configure` calls.
    #[must_use]
    pub const fn configures(&self) -> u32 {
        self.configures
    }

    /// Number of `present` calls.
    #[must_use]
    pub const fn presents(&self) -> u64 {
        self.presents
    }

    /// Number of `release` calls.
    #[must_use]
    pub const fn releases(&self) -> u32 {
        self.releases
    }
}

impl DrawSurface for RecordingSurface {
    fn configure(&mut self, config: &SurfaceConfig) {
        self.config = Some(*config);
        self.configures += 1;
    }

    fn present(&mut self, frame: &Frame) {
        match &mut self.last_frame {
            Some(last) => last.clone_from(frame),
            None => self.last_frame = Some(frame.clone()),
        }
        self.presents += 1;
    }

    fn release(&mut self) {
        self.config = None;
        self.last_frame = None;
        self.releases += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{Color, Vec2};

    #[test]
    fn test_config_clamps() {
        let config = SurfaceConfig::new(-5.0, f32::NAN, 0.5);
        assert_eq!(config.width, 0.0);
        assert_eq!(config.height, 0.0);
        assert_eq!(config.device_pixel_ratio, 1.0);
        assert!(!config.is_drawable());
    }

    #[test]
    fn test_backing_size() {
        let config = SurfaceConfig::new(200.0, 100.5, 2.0);
        assert_eq!(config.backing_size(), (400, 201));
    }

    #[test]
    fn test_binding_skips_zero_size() {
        let mut binding = SurfaceBinding::new(RecordingSurface::new());
        assert!(binding.resize(SurfaceConfig::new(0.0, 100.0, 1.0)));
        assert!(!binding.present(&Frame::new()));
        assert_eq!(binding.surface().presents(), 0);
    }

    #[test]
    fn test_binding_reconfigures_only_on_change() {
        let mut binding = SurfaceBinding::new(RecordingSurface::new());
        let config = SurfaceConfig::new(200.0, 100.0, 1.0);
        assert!(binding.resize(config));
        assert!(!binding.resize(config));
        assert!(binding.resize(SurfaceConfig::new(300.0, 100.0, 1.0)));
        assert_eq!(binding.surface().configures(), 2);
    }

    #[test]
    fn test_release_is_idempotent_and_final() {
        let mut binding = SurfaceBinding::new(RecordingSurface::new());
        binding.resize(SurfaceConfig::new(10.0, 10.0, 1.0));
        binding.release();
        binding.release();
        assert_eq!(binding.surface().releases(), 1);

        let mut frame = Frame::new();
        frame.circle(Vec2::new(5.0, 5.0), 1.0, Color::BLACK);
        assert!(!binding.present(&frame));
        assert!(!binding.resize(SurfaceConfig::new(20.0, 20.0, 1.0)));
    }
}
