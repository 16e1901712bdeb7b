//! # Effect Variants
//!
//! Each variant is a particle pool, a geometry mapper, and a
//! spawn/step/render policy, parameterized by its config.
//!
//! | Variant | Mapper | Expiry | Ordering |
//! |---|---|---|---|
//! | [`BorderGlow`] | `perimeter_point` | never, wraps | slot order |
//! | [`RibbonTrail`] | `wave_point` | remove + re-emit | slot order |
//! | [`RadialField`] | `orbit_point` | respawn in place | back to front |
//! | [`BeamOscillator`] | `wave_point` | remove + re-emit | slot order |
//!
//! Every variant treats a zero-sized surface as "nothing to seed yet".

pub mod beam_oscillator;
pub mod border_glow;
pub mod radial_field;
pub mod ribbon_trail;

pub use beam_oscillator::BeamOscillator;
pub use border_glow::BorderGlow;
pub use radial_field::RadialField;
pub use ribbon_trail::RibbonTrail;

use ember_core::{EffectRng, FrameTime, Rgb};
use rand::Rng;

use crate::config::EffectConfig;
use crate::render::Frame;
use crate::surface::SurfaceConfig;

/// Milliseconds per tick at the reference 60 Hz refresh rate.
pub const REFERENCE_TICK_MS: f32 = 1000.0 / 60.0;

/// Simulation state of one effect.
pub trait Effect {
    /// Discards all particles and seeds a fresh population for `surface`.
    ///
    /// A non-drawable surface leaves the effect empty.
    fn seed(&mut self, surface: &SurfaceConfig, rng: &mut EffectRng);

    /// Advances the simulation by one tick.
    fn step(&mut self, time: FrameTime, rng: &mut EffectRng);

    /// Appends this tick's draw commands.
    fn render(&self, frame: &mut Frame);

    /// Live particles (or trails, or beams).
    fn population(&self) -> usize;

    /// Drops every particle.
    fn clear(&mut self);
}

/// One of the four built-in effects.
#[derive(Debug, Clone)]
pub enum EffectVariant {
    /// Perimeter-tracking glow.
    BorderGlow(BorderGlow),
    /// Rising ribbons.
    RibbonTrail(RibbonTrail),
    /// Counter-rotating depth rings.
    RadialField(RadialField),
    /// Oscillating beams.
    BeamOscillator(BeamOscillator),
}

impl EffectVariant {
    /// Builds an unseeded effect from its config.
    #[must_use]
    pub fn from_config(config: &EffectConfig) -> Self {
        match config {
            EffectConfig::BorderGlow(c) => Self::BorderGlow(BorderGlow::new(c.clone())),
            EffectConfig::RibbonTrail(c) => Self::RibbonTrail(RibbonTrail::new(c.clone())),
            EffectConfig::RadialField(c) => Self::RadialField(RadialField::new(c.clone())),
            EffectConfig::BeamOscillator(c) => Self::BeamOscillator(BeamOscillator::new(c.clone())),
        }
    }

    fn as_effect(&self) -> &dyn Effect {
        match self {
            Self::BorderGlow(e) => e,
            Self::RibbonTrail(e) => e,
            Self::RadialField(e) => e,
            Self::BeamOscillator(e) => e,
        }
    }

    fn as_effect_mut(&mut self) -> &mut dyn Effect {
        match self {
            Self::BorderGlow(e) => e,
            Self::RibbonTrail(e) => e,
            Self::RadialField(e) => e,
            Self::BeamOscillator(e) => e,
        }
    }
}

impl Effect for EffectVariant {
    fn seed(&mut self, surface: &SurfaceConfig, rng: &mut EffectRng) {
        self.as_effect_mut().seed(surface, rng);
    }

    fn step(&mut self, time: FrameTime, rng: &mut EffectRng) {
        self.as_effect_mut().step(time, rng);
    }

    fn render(&self, frame: &mut Frame) {
        self.as_effect().render(frame);
    }

    fn population(&self) -> usize {
        self.as_effect().population()
    }

    fn clear(&mut self) {
        self.as_effect_mut().clear();
    }
}

/// Alpha multiplier for a particle `age` ticks into a `max_age` life.
///
/// `1 - age/max_age` when `fade` is on, `1.0` otherwise.
#[inline]
#[must_use]
pub fn age_opacity(age: u32, max_age: u32, fade: bool) -> f32 {
    if !fade {
        return 1.0;
    }
    (1.0 - age as f32 / max_age.max(1) as f32).clamp(0.0, 1.0)
}

/// Uniformly random palette entry; white for an empty palette.
pub(crate) fn pick_color(palette: &[Rgb], rng: &mut EffectRng) -> Rgb {
    if palette.is_empty() {
        return Rgb::WHITE;
    }
    palette[rng.gen_range(0..palette.len())]
}

/// Frame delta scaled by a speed multiplier, in reference ticks.
#[inline]
pub(crate) fn scaled_ticks(time: FrameTime, speed: f32) -> f32 {
    time.delta_ms / REFERENCE_TICK_MS * speed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BeamOscillatorConfig, RibbonTrailConfig};

    #[test]
    fn test_age_opacity() {
        assert_eq!(age_opacity(250, 500, true), 0.5);
        assert_eq!(age_opacity(250, 500, false), 1.0);
        assert_eq!(age_opacity(0, 500, true), 1.0);
        assert_eq!(age_opacity(600, 500, true), 0.0);
    }

    #[test]
    fn test_variant_from_config() {
        let ribbon = EffectVariant::from_config(&EffectConfig::RibbonTrail(RibbonTrailConfig::default()));
        assert!(matches!(ribbon, EffectVariant::RibbonTrail(_)));
        assert_eq!(ribbon.population(), 0);

        let beams = EffectVariant::from_config(&EffectConfig::BeamOscillator(BeamOscillatorConfig::default()));
        assert!(matches!(beams, EffectVariant::BeamOscillator(_)));
    }

    #[test]
    fn test_pick_color_stays_in_palette() {
        let mut rng = ember_core::seeded_rng(5);
        let palette = [Rgb::hex(0x11_22_33), Rgb::hex(0x44_55_66)];
        for _ in 0..50 {
            assert!(palette.contains(&pick_color(&palette, &mut rng)));
        }
        assert_eq!(pick_color(&[], &mut rng), Rgb::WHITE);
    }

    #[test]
    fn test_scaled_ticks() {
        let time = FrameTime {
            delta_ms: REFERENCE_TICK_MS * 2.0,
            elapsed_ms: 0.0,
            frame: 1,
        };
        assert!((scaled_ticks(time, 0.5) - 1.0).abs() < 1e-6);
    }
}
