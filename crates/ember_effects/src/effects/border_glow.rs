//! Border Glow: particles circling the container's border.
//!
//! One particle per `spacing` pixels of perimeter. Each particle keeps a
//! progress in `[0, 1)` that only moves forward and wraps at the starting
//! corner, plus a jitter along the border driven by a shared clock and the
//! particle's slot, so neighbors ripple out of step.

use std::f32::consts::TAU;

use ember_core::{
    perimeter_length, perimeter_point, range, wrap_phase, EffectRng, ExpiryPolicy, FrameTime,
    Particle, ParticlePool, NEVER_EXPIRES,
};

use super::{scaled_ticks, Effect};
use crate::config::{BorderGlowConfig, MAX_POPULATION};
use crate::render::Frame;
use crate::surface::SurfaceConfig;

/// Perimeter fraction travelled per reference tick at speed 1.
const PROGRESS_PER_TICK: f32 = 0.0004;
/// Shared clock advance per reference tick at speed 1, in radians.
const CLOCK_PER_TICK: f32 = 0.05;
/// Jitter phase difference between neighboring slots.
const SLOT_PHASE: f32 = 0.5;
/// Glow disc radius relative to the core.
const GLOW_SIZE: f32 = 3.0;
/// Glow disc alpha relative to the core.
const GLOW_ALPHA: f32 = 0.3;

/// Per-particle border state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderMote {
    /// Slot at seeding time, keys the jitter phase.
    pub slot: usize,
    /// Position along the perimeter, `[0, 1)`.
    pub progress: f32,
    /// Phase of the opacity pulse.
    pub pulse_phase: f32,
}

/// Border Glow effect state.
#[derive(Debug, Clone)]
pub struct BorderGlow {
    config: BorderGlowConfig,
    pool: ParticlePool<BorderMote>,
    width: f32,
    height: f32,
    /// Shared jitter/pulse clock, radians.
    clock: f32,
}

impl BorderGlow {
    /// Creates an unseeded effect.
    #[must_use]
    pub fn new(config: BorderGlowConfig) -> Self {
        Self {
            config: config.sanitized(),
            pool: ParticlePool::new(ExpiryPolicy::RespawnInPlace),
            width: 0.0,
            height: 0.0,
            clock: 0.0,
        }
    }

    /// Population for a `width` × `height` surface: `floor(perimeter / spacing)`.
    #[must_use]
    pub fn particle_count(&self, width: f32, height: f32) -> usize {
        let count = (perimeter_length(width, height) / self.config.spacing).floor();
        if count.is_finite() && count > 0.0 {
            (count as usize).min(MAX_POPULATION)
        } else {
            0
        }
    }

    /// Live particles.
    #[must_use]
    pub fn particles(&self) -> &[Particle<BorderMote>] {
        self.pool.as_slice()
    }
}

/// Along-border displacement of `slot` at `clock`.
#[inline]
fn jitter_offset(clock: f32, slot: usize, jitter: f32) -> f32 {
    (clock + slot as f32 * SLOT_PHASE).sin() * jitter
}

impl Effect for BorderGlow {
    fn seed(&mut self, surface: &SurfaceConfig, rng: &mut EffectRng) {
        self.pool.clear();
        self.clock = 0.0;
        self.width = surface.width;
        self.height = surface.height;
        if !surface.is_drawable() {
            return;
        }

        let count = self.particle_count(self.width, self.height);
        let (width, height) = (self.width, self.height);
        let config = &self.config;
        let rule = |slot: usize, rng: &mut EffectRng| {
            let progress = slot as f32 / count as f32;
            let mote = BorderMote {
                slot,
                progress,
                pulse_phase: range(rng, 0.0, TAU),
            };
            let size = range(rng, config.size_min, config.size_max);
            let position = perimeter_point(width, height, progress, 0.0);
            Particle::new(position, NEVER_EXPIRES, size, config.color, mote)
        };
        self.pool.emit_until(count, &rule, rng);
    }

    fn step(&mut self, time: FrameTime, rng: &mut EffectRng) {
        if self.pool.is_empty() {
            return;
        }
        let ticks = scaled_ticks(time, self.config.speed);
        self.clock = wrap_phase(self.clock + CLOCK_PER_TICK * ticks);

        let advance = PROGRESS_PER_TICK * ticks;
        let (width, height) = (self.width, self.height);
        let clock = self.clock;
        let jitter = self.config.jitter;
        let color = self.config.color;

        // Border particles never reach their max age; the rule only exists
        // to satisfy the pool contract.
        let rule = |slot: usize, _: &mut EffectRng| {
            let mote = BorderMote {
                slot,
                progress: 0.0,
                pulse_phase: 0.0,
            };
            Particle::new(perimeter_point(width, height, 0.0, 0.0), NEVER_EXPIRES, 1.0, color, mote)
        };
        self.pool.step(time.delta_ms, &rule, rng, |p, _| {
            let progress = (p.extra.progress + advance).fract();
            p.extra.progress = if progress >= 1.0 { 0.0 } else { progress };
            let offset = jitter_offset(clock, p.extra.slot, jitter);
            p.position = perimeter_point(width, height, p.extra.progress, offset);
        });
        self.pool.cull();
    }

    fn render(&self, frame: &mut Frame) {
        for p in self.pool.iter() {
            let pulse = 0.6 + 0.4 * (self.clock * 2.0 + p.extra.pulse_phase).sin();
            let core = p.color.with_alpha(pulse);
            frame.glow(p.position, p.size * GLOW_SIZE, core.fade(GLOW_ALPHA));
            frame.circle(p.position, p.size, core);
        }
    }

    fn population(&self) -> usize {
        self.pool.len()
    }

    fn clear(&mut self) {
        self.pool.clear();
    }
}
