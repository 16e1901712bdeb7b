//! Multi-Beam Oscillator: vertical and horizontal beams whose position and
//! opacity oscillate on per-beam sinusoids.
//!
//! Each orientation lives in its own pool so re-emission after expiry
//! always refills the orientation that lost a beam. Frames from this effect
//! usually go through the bloom stage.

use std::f32::consts::TAU;

use ember_core::{
    range, wave_point, wrap_phase, EffectRng, ExpiryPolicy, FrameTime, Particle, ParticlePool,
    Vec2,
};

use super::{age_opacity, pick_color, scaled_ticks, Effect};
use crate::config::{age_of, BeamOscillatorConfig};
use crate::render::Frame;
use crate::surface::SurfaceConfig;

/// Oscillator phase advance per reference tick at speed 1, in radians.
const WAVE_PER_TICK: f32 = 0.04;
/// Opacity clock rate relative to the position clock.
const OPACITY_RATE: f32 = 0.7;
/// Mean beam opacity.
const OPACITY_MEAN: f32 = 0.6;
/// Opacity swing around the mean.
const OPACITY_SWING: f32 = 0.4;
/// Glow rectangle width relative to the core.
pub const GLOW_WIDTH: f32 = 4.0;
/// Glow rectangle alpha relative to the core.
pub const GLOW_ALPHA: f32 = 0.25;

/// Beam orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Spans the full height; oscillates along x.
    Vertical,
    /// Spans the full width; oscillates along y.
    Horizontal,
}

/// Per-beam oscillator state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beam {
    /// Orientation.
    pub orientation: Orientation,
    /// Rest coordinate across the beam (x for vertical, y for horizontal).
    pub anchor: f32,
    /// Oscillator phase offset.
    pub phase: f32,
    /// Oscillator rate multiplier.
    pub rate: f32,
    /// Position oscillator clock, radians.
    pub time: f32,
    /// Opacity oscillator clock, radians.
    pub pulse: f32,
    /// Current opacity from the opacity oscillator.
    pub opacity: f32,
}

/// Multi-Beam Oscillator effect state.
#[derive(Debug, Clone)]
pub struct BeamOscillator {
    config: BeamOscillatorConfig,
    vertical: ParticlePool<Beam>,
    horizontal: ParticlePool<Beam>,
    width: f32,
    height: f32,
}

impl BeamOscillator {
    /// Creates an unseeded effect.
    #[must_use]
    pub fn new(config: BeamOscillatorConfig) -> Self {
        Self {
            config: config.sanitized(),
            vertical: ParticlePool::new(ExpiryPolicy::Remove),
            horizontal: ParticlePool::new(ExpiryPolicy::Remove),
            width: 0.0,
            height: 0.0,
        }
    }

    /// Live beams of one orientation.
    #[must_use]
    pub fn beams(&self, orientation: Orientation) -> &[Particle<Beam>] {
        match orientation {
            Orientation::Vertical => self.vertical.as_slice(),
            Orientation::Horizontal => self.horizontal.as_slice(),
        }
    }

    fn emit(&mut self, rng: &mut EffectRng) {
        let vertical = spawn_rule(&self.config, Orientation::Vertical, self.width, self.height);
        self.vertical.emit_until(self.config.vertical_count(), &vertical, rng);
        let horizontal = spawn_rule(&self.config, Orientation::Horizontal, self.width, self.height);
        self.horizontal.emit_until(self.config.horizontal_count(), &horizontal, rng);
    }
}

/// Beam opacity for opacity clock `pulse` and phase.
#[inline]
fn beam_opacity(pulse: f32, phase: f32) -> f32 {
    wave_point(OPACITY_MEAN, pulse, phase, OPACITY_SWING)
}

/// Beam position for its current oscillator clock; the unused axis is 0.
fn beam_position(beam: &Beam, amplitude: f32) -> Vec2 {
    let across = beam.anchor + wave_point(0.0, beam.time, beam.phase, amplitude);
    match beam.orientation {
        Orientation::Vertical => Vec2::new(across, 0.0),
        Orientation::Horizontal => Vec2::new(0.0, across),
    }
}

/// New beam at a random rest coordinate.
fn spawn_rule(
    config: &BeamOscillatorConfig,
    orientation: Orientation,
    width: f32,
    height: f32,
) -> impl Fn(usize, &mut EffectRng) -> Particle<Beam> + '_ {
    move |_slot, rng| {
        let span = match orientation {
            Orientation::Vertical => width,
            Orientation::Horizontal => height,
        };
        let phase = range(rng, 0.0, TAU);
        let beam = Beam {
            orientation,
            anchor: range(rng, 0.0, span),
            phase,
            rate: range(rng, 0.5, 1.5),
            time: 0.0,
            pulse: 0.0,
            opacity: beam_opacity(0.0, phase),
        };
        let thickness = range(rng, config.thickness_min, config.thickness_max);
        let color = pick_color(&config.colors, rng);
        let max_age = (age_of(config.max_age) as f32 * range(rng, 0.5, 1.0)) as u32;
        // Start on the oscillator curve so the first step does not jump.
        let position = beam_position(&beam, config.amplitude);
        Particle::new(position, max_age, thickness, color, beam)
    }
}

fn step_pool(
    pool: &mut ParticlePool<Beam>,
    rule: &impl Fn(usize, &mut EffectRng) -> Particle<Beam>,
    time: FrameTime,
    ticks: f32,
    amplitude: f32,
    rng: &mut EffectRng,
) {
    pool.step(time.delta_ms, rule, rng, |p, _| {
        let beam = &mut p.extra;
        let advance = WAVE_PER_TICK * beam.rate * ticks;
        beam.time = wrap_phase(beam.time + advance);
        beam.pulse = wrap_phase(beam.pulse + advance * OPACITY_RATE);
        beam.opacity = beam_opacity(beam.pulse, beam.phase);
        p.position = beam_position(beam, amplitude);
    });
    pool.cull();
}

impl Effect for BeamOscillator {
    fn seed(&mut self, surface: &SurfaceConfig, rng: &mut EffectRng) {
        self.clear();
        self.width = surface.width;
        self.height = surface.height;
        if surface.is_drawable() {
            self.emit(rng);
        }
    }

    fn step(&mut self, time: FrameTime, rng: &mut EffectRng) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }
        let ticks = scaled_ticks(time, self.config.speed);
        let amplitude = self.config.amplitude;

        // The spawn rules borrow the config; they must be gone before `emit`.
        {
            let vertical = spawn_rule(&self.config, Orientation::Vertical, self.width, self.height);
            step_pool(&mut self.vertical, &vertical, time, ticks, amplitude, rng);
            let horizontal = spawn_rule(&self.config, Orientation::Horizontal, self.width, self.height);
            step_pool(&mut self.horizontal, &horizontal, time, ticks, amplitude, rng);
        }
        self.emit(rng);
    }

    fn render(&self, frame: &mut Frame) {
        for p in self.vertical.iter().chain(self.horizontal.iter()) {
            let alpha = p.extra.opacity * age_opacity(p.age, p.max_age, self.config.fade);
            let core = p.color.with_alpha(alpha);
            let glow = core.fade(GLOW_ALPHA);
            let (thin, wide) = (p.size, p.size * GLOW_WIDTH);
            match p.extra.orientation {
                Orientation::Vertical => {
                    let x = p.position.x;
                    frame.rect(Vec2::new(x - wide * 0.5, 0.0), Vec2::new(wide, self.height), glow);
                    frame.rect(Vec2::new(x - thin * 0.5, 0.0), Vec2::new(thin, self.height), core);
                }
                Orientation::Horizontal => {
                    let y = p.position.y;
                    frame.rect(Vec2::new(0.0, y - wide * 0.5), Vec2::new(self.width, wide), glow);
                    frame.rect(Vec2::new(0.0, y - thin * 0.5), Vec2::new(self.width, thin), core);
                }
            }
        }
    }

    fn population(&self) -> usize {
        self.vertical.len() + self.horizontal.len()
    }

    fn clear(&mut self) {
        self.vertical.clear();
        self.horizontal.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::REFERENCE_TICK_MS;
    use ember_core::seeded_rng;

    fn tick() -> FrameTime {
        FrameTime {
            delta_ms: 16.0,
            elapsed_ms: 0.0,
            frame: 1,
        }
    }

    fn seeded(config: BeamOscillatorConfig) -> (BeamOscillator, EffectRng) {
        let mut rng = seeded_rng(21);
        let mut effect = BeamOscillator::new(config);
        effect.seed(&SurfaceConfig::new(320.0, 180.0, 1.0), &mut rng);
        (effect, rng)
    }

    #[test]
    fn test_seed_both_orientations() {
        let (effect, _) = seeded(BeamOscillatorConfig::default());
        assert_eq!(effect.beams(Orientation::Vertical).len(), 8);
        assert_eq!(effect.beams(Orientation::Horizontal).len(), 6);
        assert_eq!(effect.population(), 14);
    }

    #[test]
    fn test_oscillation_bounded_by_amplitude() {
        let (mut effect, mut rng) = seeded(BeamOscillatorConfig::default());
        for _ in 0..200 {
            effect.step(tick(), &mut rng);
            for beam in effect.beams(Orientation::Vertical) {
                assert!((beam.position.x - beam.extra.anchor).abs() <= 24.0 + 1e-3);
                assert!((0.2 - 1e-3..=1.0 + 1e-3).contains(&beam.extra.opacity));
            }
        }
    }

    #[test]
    fn test_position_and_opacity_move_continuously() {
        let (mut effect, mut rng) = seeded(BeamOscillatorConfig {
            vertical_count: 1,
            horizontal_count: 1,
            max_age: 1_000_000,
            ..BeamOscillatorConfig::default()
        });
        let amplitude = BeamOscillatorConfig::default().amplitude;
        let clock_step = WAVE_PER_TICK * 1.5 * 16.0 / REFERENCE_TICK_MS;
        let orientations = [Orientation::Vertical, Orientation::Horizontal];
        let across = |p: &Particle<Beam>| match p.extra.orientation {
            Orientation::Vertical => p.position.x,
            Orientation::Horizontal => p.position.y,
        };

        let mut previous: Vec<Particle<Beam>> = orientations.iter().map(|&o| effect.beams(o)[0].clone()).collect();
        for _ in 0..300 {
            effect.step(tick(), &mut rng);
            for (&orientation, before) in orientations.iter().zip(previous.iter_mut()) {
                let beam = &effect.beams(orientation)[0];
                assert_eq!(beam.age, before.age + 1);

                let offset = wave_point(0.0, beam.extra.time, beam.extra.phase, amplitude);
                assert_eq!(across(beam), beam.extra.anchor + offset);
                assert_eq!(beam.extra.opacity, beam_opacity(beam.extra.pulse, beam.extra.phase));

                let moved = (across(beam) - across(before)).abs();
                assert!(moved > 0.0 && moved <= amplitude * clock_step + 1e-4, "{orientation:?} jumped {moved}");
                let faded = (beam.extra.opacity - before.extra.opacity).abs();
                assert!(faded <= OPACITY_SWING * OPACITY_RATE * clock_step + 1e-5, "{orientation:?} flickered {faded}");
                *before = beam.clone();
            }
        }
    }

    #[test]
    fn test_expiry_refills_same_orientation() {
        let (mut effect, mut rng) = seeded(BeamOscillatorConfig {
            max_age: 4,
            ..BeamOscillatorConfig::default()
        });
        for _ in 0..50 {
            effect.step(tick(), &mut rng);
            assert_eq!(effect.beams(Orientation::Vertical).len(), 8);
            assert_eq!(effect.beams(Orientation::Horizontal).len(), 6);
            assert!(effect
                .beams(Orientation::Horizontal)
                .iter()
                .all(|b| b.extra.orientation == Orientation::Horizontal && b.age <= b.max_age));
        }
    }

    #[test]
    fn test_render_glow_and_core_rects() {
        let (effect, _) = seeded(BeamOscillatorConfig::default());
        let mut frame = Frame::new();
        effect.render(&mut frame);
        assert_eq!(frame.len(), 28);
        assert!(frame.is_finite());
    }

    #[test]
    fn test_zero_size_defers() {
        let mut rng = seeded_rng(0);
        let mut effect = BeamOscillator::new(BeamOscillatorConfig::default());
        effect.seed(&SurfaceConfig::new(0.0, 0.0, 1.0), &mut rng);
        effect.step(tick(), &mut rng);
        assert_eq!(effect.population(), 0);
    }
}
