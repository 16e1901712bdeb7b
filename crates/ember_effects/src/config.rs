//! # Effect Configuration
//!
//! One strongly typed parameter set per effect variant, tagged by `kind`:
//!
//! ```toml
//! seed = 7
//! background = [8, 8, 16]
//!
//! [effect]
//! kind = "ribbon_trail"
//! trail_count = 8
//! colors = [[255, 120, 80], [255, 200, 120]]
//! max_age = 500
//! ```
//!
//! Every field is optional. After parsing, [`EngineConfig::sanitized`] clamps
//! values into ranges the simulation can always run: negative counts become 0,
//! inverted ranges collapse to their lower bound, non-finite numbers fall back
//! to defaults. A config is immutable for the lifetime of one mounted
//! instance; changing it means a full reseed.

use std::path::Path;

use ember_core::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::{EmberError, EmberResult};

/// Largest population any single count may request.
pub const MAX_POPULATION: usize = 100_000;

/// Largest number of history samples all Ribbon Trail trails may hold
/// together.
pub const MAX_TRAIL_SAMPLES: usize = 1_000_000;

/// Smallest perimeter spacing for Border Glow, in pixels per particle.
const MIN_SPACING: f32 = 1.0;
/// Fewest history samples that still describe a segment.
const MIN_SEGMENTS: usize = 2;
/// Smallest gap between the Radial Field rings, as a fraction of the
/// smaller surface dimension.
const MIN_RING_GAP: f32 = 0.02;

/// Top-level config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the instance's random generator.
    pub seed: u64,
    /// Opaque fill behind the effect; transparent when absent.
    pub background: Option<Rgb>,
    /// The effect to mount.
    pub effect: EffectConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            background: None,
            effect: EffectConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document and sanitizes it.
    ///
    /// # Errors
    ///
    /// Returns [`EmberError::Parse`] when the text is not a valid config.
    pub fn from_toml_str(text: &str) -> EmberResult<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Reads, parses, and sanitizes a config file.
    ///
    /// # Errors
    ///
    /// Returns [`EmberError::Io`] when the file cannot be read and
    /// [`EmberError::Parse`] when its contents are not a valid config.
    pub fn load(path: impl AsRef<Path>) -> EmberResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EmberError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Returns a copy with every value clamped into a runnable range.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            seed: self.seed,
            background: self.background,
            effect: self.effect.sanitized(),
        }
    }
}

/// Per-variant parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectConfig {
    /// Particles tracking the container's border.
    BorderGlow(BorderGlowConfig),
    /// Rising, fading ribbons.
    RibbonTrail(RibbonTrailConfig),
    /// Two counter-rotating rings with simulated depth.
    RadialField(RadialFieldConfig),
    /// Oscillating vertical and horizontal beams.
    BeamOscillator(BeamOscillatorConfig),
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self::BorderGlow(BorderGlowConfig::default())
    }
}

impl EffectConfig {
    /// Stable variant name, as written in config files.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BorderGlow(_) => "border_glow",
            Self::RibbonTrail(_) => "ribbon_trail",
            Self::RadialField(_) => "radial_field",
            Self::BeamOscillator(_) => "beam_oscillator",
        }
    }

    /// Whether the bloom-style stage should run after drawing.
    #[must_use]
    pub const fn post_process(&self) -> bool {
        match self {
            Self::BorderGlow(c) => c.post_process,
            Self::RibbonTrail(c) => c.post_process,
            Self::RadialField(c) => c.post_process,
            Self::BeamOscillator(c) => c.post_process,
        }
    }

    /// Returns a copy with every value clamped into a runnable range.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        match self {
            Self::BorderGlow(c) => Self::BorderGlow(c.sanitized()),
            Self::RibbonTrail(c) => Self::RibbonTrail(c.sanitized()),
            Self::RadialField(c) => Self::RadialField(c.sanitized()),
            Self::BeamOscillator(c) => Self::BeamOscillator(c.sanitized()),
        }
    }
}

/// Border Glow parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderGlowConfig {
    /// Perimeter pixels per particle; count is `floor(perimeter / spacing)`.
    pub spacing: f32,
    /// Particle color.
    pub color: Rgb,
    /// Speed multiplier.
    pub speed: f32,
    /// Amplitude of the along-border jitter, in pixels.
    pub jitter: f32,
    /// Smallest particle radius.
    pub size_min: f32,
    /// Largest particle radius.
    pub size_max: f32,
    /// Run the bloom stage.
    pub post_process: bool,
}

impl Default for BorderGlowConfig {
    fn default() -> Self {
        Self {
            spacing: 10.0,
            color: Rgb::hex(0x7D_F9_FF),
            speed: 1.0,
            jitter: 3.0,
            size_min: 1.0,
            size_max: 2.5,
            post_process: false,
        }
    }
}

impl BorderGlowConfig {
    /// Returns a copy with every value clamped into a runnable range.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let size_min = positive_or(self.size_min, d.size_min);
        Self {
            spacing: finite_or(self.spacing, d.spacing).max(MIN_SPACING),
            color: self.color,
            speed: non_negative(self.speed, d.speed),
            jitter: non_negative(self.jitter, d.jitter),
            size_min,
            size_max: finite_or(self.size_max, d.size_max).max(size_min),
            post_process: self.post_process,
        }
    }
}

/// Ribbon Trail parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonTrailConfig {
    /// Number of simultaneous trails.
    pub trail_count: i64,
    /// Stroke palette; each trail picks one.
    pub colors: Vec<Rgb>,
    /// Speed multiplier.
    pub speed: f32,
    /// Sideways wave amplitude, in pixels per tick.
    pub chaos: f32,
    /// Lifespan in ticks.
    pub max_age: i64,
    /// Alpha decays linearly with age.
    pub fade: bool,
    /// Core stroke width in pixels.
    pub thickness: f32,
    /// Samples kept per trail.
    pub segment_cap: i64,
    /// Slowest upward speed, in pixels per tick.
    pub rise_min: f32,
    /// Fastest upward speed, in pixels per tick.
    pub rise_max: f32,
    /// Run the bloom stage.
    pub post_process: bool,
}

impl Default for RibbonTrailConfig {
    fn default() -> Self {
        Self {
            trail_count: 8,
            colors: vec![
                Rgb::hex(0xFF_6B_6B),
                Rgb::hex(0xFF_D9_3D),
                Rgb::hex(0x6B_CB_77),
                Rgb::hex(0x4D_96_FF),
            ],
            speed: 1.0,
            chaos: 1.5,
            max_age: 500,
            fade: true,
            thickness: 2.0,
            segment_cap: 40,
            rise_min: 1.0,
            rise_max: 2.5,
            post_process: false,
        }
    }
}

impl RibbonTrailConfig {
    /// Returns a copy with every value clamped into a runnable range.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let rise_min = non_negative(self.rise_min, d.rise_min);
        Self {
            trail_count: clamp_count(self.trail_count),
            colors: palette_or(&self.colors, &d.colors),
            speed: non_negative(self.speed, d.speed),
            chaos: non_negative(self.chaos, d.chaos),
            max_age: clamp_age(self.max_age),
            fade: self.fade,
            thickness: positive_or(self.thickness, d.thickness),
            segment_cap: i64::try_from(self.segment_cap()).unwrap_or(i64::MAX),
            rise_min,
            rise_max: finite_or(self.rise_max, d.rise_max).max(rise_min),
            post_process: self.post_process,
        }
    }

    /// Trail population.
    #[must_use]
    pub fn trail_count(&self) -> usize {
        count_of(self.trail_count)
    }

    /// History samples kept per trail, at least 2.
    ///
    /// Also bounded so every trail together holds at most
    /// [`MAX_TRAIL_SAMPLES`] samples.
    #[must_use]
    pub fn segment_cap(&self) -> usize {
        let budget = MAX_TRAIL_SAMPLES / self.trail_count().max(1);
        count_of(self.segment_cap).min(budget).max(MIN_SEGMENTS)
    }
}

/// Radial Particle Field parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialFieldConfig {
    /// Particles on the inner ring.
    pub inner_count: i64,
    /// Particles on the outer ring.
    pub outer_count: i64,
    /// Inner ring color.
    pub inner_color: Rgb,
    /// Outer ring color.
    pub outer_color: Rgb,
    /// Speed multiplier.
    pub speed: f32,
    /// Depth oscillation amplitude, in simulated pixels.
    pub depth_jitter: f32,
    /// Lifespan in ticks before a particle respawns in place.
    pub max_age: i64,
    /// Alpha decays linearly with age.
    pub fade: bool,
    /// Inner radius as a fraction of the smaller surface dimension.
    pub inner_radius: f32,
    /// Outer radius as a fraction of the smaller surface dimension.
    pub outer_radius: f32,
    /// Base particle radius at zero depth.
    pub particle_size: f32,
    /// Run the bloom stage.
    pub post_process: bool,
}

impl Default for RadialFieldConfig {
    fn default() -> Self {
        Self {
            inner_count: 48,
            outer_count: 72,
            inner_color: Rgb::hex(0xC0_84_FC),
            outer_color: Rgb::hex(0x60_A5_FA),
            speed: 1.0,
            depth_jitter: 60.0,
            max_age: 900,
            fade: true,
            inner_radius: 0.22,
            outer_radius: 0.38,
            particle_size: 2.5,
            post_process: false,
        }
    }
}

impl RadialFieldConfig {
    /// Returns a copy with every value clamped into a runnable range.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let (inner_radius, outer_radius) = ordered_rings(
            non_negative(self.inner_radius, d.inner_radius),
            non_negative(self.outer_radius, d.outer_radius),
        );
        Self {
            inner_count: clamp_count(self.inner_count),
            outer_count: clamp_count(self.outer_count),
            inner_color: self.inner_color,
            outer_color: self.outer_color,
            speed: non_negative(self.speed, d.speed),
            depth_jitter: non_negative(self.depth_jitter, d.depth_jitter),
            max_age: clamp_age(self.max_age),
            fade: self.fade,
            inner_radius,
            outer_radius,
            particle_size: positive_or(self.particle_size, d.particle_size),
            post_process: self.post_process,
        }
    }

    /// Inner ring population.
    #[must_use]
    pub fn inner_count(&self) -> usize {
        count_of(self.inner_count)
    }

    /// Outer ring population.
    #[must_use]
    pub fn outer_count(&self) -> usize {
        count_of(self.outer_count)
    }
}

/// Multi-Beam Oscillator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamOscillatorConfig {
    /// Vertical beams.
    pub vertical_count: i64,
    /// Horizontal beams.
    pub horizontal_count: i64,
    /// Beam palette; each beam picks one.
    pub colors: Vec<Rgb>,
    /// Speed multiplier.
    pub speed: f32,
    /// Positional oscillation amplitude, in pixels.
    pub amplitude: f32,
    /// Lifespan in ticks before a beam is removed and re-emitted.
    pub max_age: i64,
    /// Alpha decays linearly with age.
    pub fade: bool,
    /// Thinnest beam, in pixels.
    pub thickness_min: f32,
    /// Thickest beam, in pixels.
    pub thickness_max: f32,
    /// Run the bloom stage.
    pub post_process: bool,
}

impl Default for BeamOscillatorConfig {
    fn default() -> Self {
        Self {
            vertical_count: 8,
            horizontal_count: 6,
            colors: vec![Rgb::hex(0x22_D3_EE), Rgb::hex(0xA7_8B_FA), Rgb::hex(0xF4_72_B6)],
            speed: 1.0,
            amplitude: 24.0,
            max_age: 1200,
            fade: true,
            thickness_min: 1.0,
            thickness_max: 3.0,
            post_process: true,
        }
    }
}

impl BeamOscillatorConfig {
    /// Returns a copy with every value clamped into a runnable range.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let thickness_min = positive_or(self.thickness_min, d.thickness_min);
        Self {
            vertical_count: clamp_count(self.vertical_count),
            horizontal_count: clamp_count(self.horizontal_count),
            colors: palette_or(&self.colors, &d.colors),
            speed: non_negative(self.speed, d.speed),
            amplitude: non_negative(self.amplitude, d.amplitude),
            max_age: clamp_age(self.max_age),
            fade: self.fade,
            thickness_min,
            thickness_max: finite_or(self.thickness_max, d.thickness_max).max(thickness_min),
            post_process: self.post_process,
        }
    }

    /// Vertical population.
    #[must_use]
    pub fn vertical_count(&self) -> usize {
        count_of(self.vertical_count)
    }

    /// Horizontal population.
    #[must_use]
    pub fn horizontal_count(&self) -> usize {
        count_of(self.horizontal_count)
    }
}

/// Converts a (possibly unsanitized) count into a population.
pub(crate) fn count_of(count: i64) -> usize {
    usize::try_from(clamp_count(count)).unwrap_or(0)
}

/// Converts a (possibly unsanitized) age into a tick lifespan.
pub(crate) fn age_of(max_age: i64) -> u32 {
    u32::try_from(clamp_age(max_age)).unwrap_or(u32::MAX)
}

fn clamp_count(count: i64) -> i64 {
    count.clamp(0, MAX_POPULATION as i64)
}

fn clamp_age(max_age: i64) -> i64 {
    max_age.clamp(1, i64::from(u32::MAX))
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn non_negative(value: f32, fallback: f32) -> f32 {
    finite_or(value, fallback).max(0.0)
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    let value = finite_or(value, fallback);
    if value > 0.0 {
        value
    } else {
        fallback
    }
}

/// Puts the smaller radius inside and keeps the rings at least
/// [`MIN_RING_GAP`] apart.
fn ordered_rings(inner: f32, outer: f32) -> (f32, f32) {
    let (inner, outer) = if inner > outer { (outer, inner) } else { (inner, outer) };
    (inner, outer.max(inner + MIN_RING_GAP))
}

fn palette_or(colors: &[Rgb], fallback: &[Rgb]) -> Vec<Rgb> {
    if colors.is_empty() {
        fallback.to_vec()
    } else {
        colors.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config = EngineConfig::from_toml_str("[effect]\nkind = \"ribbon_trail\"\n").unwrap();
        assert_eq!(config.effect, EffectConfig::RibbonTrail(RibbonTrailConfig::default()));
        assert_eq!(config.seed, EngineConfig::default().seed);
    }

    #[test]
    fn test_full_ribbon_document() {
        let text = r#"
            seed = 7
            background = [0, 0, 16]

            [effect]
            kind = "ribbon_trail"
            trail_count = 3
            colors = [[255, 0, 0], [0, 0, 255]]
            max_age = 250
            fade = false
        "#;
        let config = EngineConfig::from_toml_str(text).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.background, Some(Rgb::new(0, 0, 16)));
        let EffectConfig::RibbonTrail(ribbon) = config.effect else {
            panic!("expected ribbon trail");
        };
        assert_eq!(ribbon.trail_count(), 3);
        assert_eq!(ribbon.colors, vec![Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)]);
        assert_eq!(ribbon.max_age, 250);
        assert!(!ribbon.fade);
    }

    #[test]
    fn test_negative_counts_clamp_to_zero() {
        let text = "[effect]\nkind = \"beam_oscillator\"\nvertical_count = -4\nmax_age = -1\n";
        let config = EngineConfig::from_toml_str(text).unwrap();
        let EffectConfig::BeamOscillator(beams) = config.effect else {
            panic!("expected beams");
        };
        assert_eq!(beams.vertical_count(), 0);
        assert_eq!(beams.max_age, 1);
    }

    #[test]
    fn test_inverted_ranges_collapse() {
        let raw = BorderGlowConfig {
            spacing: 0.0,
            size_min: 3.0,
            size_max: 1.0,
            jitter: -2.0,
            speed: f32::NAN,
            ..BorderGlowConfig::default()
        };
        let clean = raw.sanitized();
        assert_eq!(clean.spacing, MIN_SPACING);
        assert_eq!(clean.size_max, 3.0);
        assert_eq!(clean.jitter, 0.0);
        assert_eq!(clean.speed, 1.0);
    }

    #[test]
    fn test_trail_samples_bounded_at_extremes() {
        let raw = RibbonTrailConfig {
            trail_count: i64::MAX,
            segment_cap: i64::MAX,
            ..RibbonTrailConfig::default()
        };
        assert_eq!(raw.trail_count(), MAX_POPULATION);
        assert_eq!(raw.segment_cap(), MAX_TRAIL_SAMPLES / MAX_POPULATION);
        assert!(raw.trail_count() * raw.segment_cap() <= MAX_TRAIL_SAMPLES);

        let clean = raw.sanitized();
        assert_eq!(clean.trail_count, MAX_POPULATION as i64);
        assert_eq!(clean.segment_cap, (MAX_TRAIL_SAMPLES / MAX_POPULATION) as i64);

        let single = RibbonTrailConfig {
            trail_count: 1,
            segment_cap: i64::MAX,
            ..RibbonTrailConfig::default()
        };
        assert_eq!(single.segment_cap(), MAX_POPULATION);

        let tiny = RibbonTrailConfig {
            segment_cap: -5,
            ..RibbonTrailConfig::default()
        };
        assert_eq!(tiny.segment_cap(), MIN_SEGMENTS);
        assert_eq!(RibbonTrailConfig::default().sanitized().segment_cap, 40);
    }

    #[test]
    fn test_ring_radii_ordered_and_apart() {
        let swapped = RadialFieldConfig {
            inner_radius: 0.4,
            outer_radius: 0.1,
            ..RadialFieldConfig::default()
        }
        .sanitized();
        assert_eq!((swapped.inner_radius, swapped.outer_radius), (0.1, 0.4));

        let equal = RadialFieldConfig {
            inner_radius: 0.3,
            outer_radius: 0.3,
            ..RadialFieldConfig::default()
        }
        .sanitized();
        assert_eq!(equal.inner_radius, 0.3);
        assert!(equal.outer_radius >= equal.inner_radius + MIN_RING_GAP);

        let defaults = RadialFieldConfig::default();
        assert_eq!(defaults.sanitized(), defaults);
    }

    #[test]
    fn test_empty_palette_falls_back() {
        let raw = RibbonTrailConfig {
            colors: Vec::new(),
            ..RibbonTrailConfig::default()
        };
        assert_eq!(raw.sanitized().colors, RibbonTrailConfig::default().colors);
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let err = EngineConfig::from_toml_str("[effect]\nkind = \"fireworks\"\n").unwrap_err();
        assert!(matches!(err, EmberError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, EmberError::Io { .. }));
    }

    #[test]
    fn test_post_process_defaults() {
        assert!(!EffectConfig::default().post_process());
        assert!(EffectConfig::BeamOscillator(BeamOscillatorConfig::default()).post_process());
    }
}
