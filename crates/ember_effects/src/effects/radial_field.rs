//! Radial Particle Field: two concentric rings orbiting in opposite
//! directions, with a simulated depth per particle.
//!
//! Depth oscillates on a per-particle sinusoid and feeds `orbit_point`; the
//! resulting perspective scale drives on-screen radius, particle size, and
//! opacity together. The pool is sorted back to front every tick.

use std::f32::consts::TAU;

use ember_core::{
    orbit_point, range, wrap_phase, DepthCue, EffectRng, ExpiryPolicy, FrameTime, Particle,
    ParticlePool, SpawnRule, Vec2,
};

use super::{age_opacity, scaled_ticks, Effect};
use crate::config::{age_of, RadialFieldConfig};
use crate::render::Frame;
use crate::surface::SurfaceConfig;

/// Orbit angle advance per reference tick at speed 1, in radians.
const ORBIT_PER_TICK: f32 = 0.01;
/// Depth phase advance per reference tick at speed 1, in radians.
const DEPTH_PER_TICK: f32 = 0.03;
/// Glow disc radius relative to the core.
const GLOW_SIZE: f32 = 2.5;
/// Glow disc alpha relative to the core.
const GLOW_ALPHA: f32 = 0.35;

/// Which ring a particle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ring {
    /// Smaller radius, clockwise.
    Inner,
    /// Larger radius, counter-clockwise.
    Outer,
}

impl Ring {
    /// Angular direction: +1 or -1.
    #[must_use]
    pub const fn direction(self) -> f32 {
        match self {
            Self::Inner => 1.0,
            Self::Outer => -1.0,
        }
    }
}

/// Per-particle orbit state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbiter {
    /// Owning ring.
    pub ring: Ring,
    /// Orbit angle, radians.
    pub angle: f32,
    /// Angular rate multiplier, signed by ring direction.
    pub angular_rate: f32,
    /// Depth oscillator phase, radians.
    pub depth_phase: f32,
    /// Depth oscillator rate multiplier.
    pub depth_rate: f32,
    /// Ring radius at zero depth.
    pub base_radius: f32,
    /// Simulated distance from the focal plane (positive is farther).
    pub depth_z: f32,
}

/// Geometry shared by every particle for one surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RingLayout {
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
}

impl RingLayout {
    fn for_surface(surface: &SurfaceConfig, config: &RadialFieldConfig) -> Self {
        let min_dim = surface.width.min(surface.height);
        Self {
            center: Vec2::new(surface.width * 0.5, surface.height * 0.5),
            inner_radius: min_dim * config.inner_radius,
            outer_radius: min_dim * config.outer_radius,
        }
    }

    const fn radius(&self, ring: Ring) -> f32 {
        match ring {
            Ring::Inner => self.inner_radius,
            Ring::Outer => self.outer_radius,
        }
    }
}

/// Spawns ring members. Seeding fills the inner ring's slots first; a
/// respawn keeps the ring of the particle it replaces.
struct OrbitRule<'a> {
    config: &'a RadialFieldConfig,
    layout: RingLayout,
}

impl OrbitRule<'_> {
    fn build(&self, ring: Ring, rng: &mut EffectRng) -> Particle<Orbiter> {
        let mut orbiter = Orbiter {
            ring,
            angle: range(rng, 0.0, TAU),
            angular_rate: ring.direction() * range(rng, 0.8, 1.2),
            depth_phase: range(rng, 0.0, TAU),
            depth_rate: range(rng, 0.5, 1.5),
            base_radius: self.layout.radius(ring),
            depth_z: 0.0,
        };
        orbiter.depth_z = self.config.depth_jitter * orbiter.depth_phase.sin();
        let projection = orbit_point(orbiter.angle, orbiter.base_radius, orbiter.depth_z);
        let color = match ring {
            Ring::Inner => self.config.inner_color,
            Ring::Outer => self.config.outer_color,
        };
        // Stagger lifetimes so respawns do not happen in waves.
        let max_age = age_of(self.config.max_age);
        let age = (range(rng, 0.0, 1.0) * max_age as f32) as u32;
        let mut particle = Particle::new(
            self.layout.center + projection.offset,
            max_age,
            self.config.particle_size,
            color,
            orbiter,
        )
        .with_depth(projection.scale);
        particle.age = age.min(max_age);
        particle
    }
}

impl SpawnRule<Orbiter> for OrbitRule<'_> {
    fn spawn(&self, index: usize, rng: &mut EffectRng) -> Particle<Orbiter> {
        let ring = if index < self.config.inner_count() {
            Ring::Inner
        } else {
            Ring::Outer
        };
        self.build(ring, rng)
    }

    fn respawn(&self, _index: usize, previous: &Particle<Orbiter>, rng: &mut EffectRng) -> Particle<Orbiter> {
        let mut particle = self.build(previous.extra.ring, rng);
        particle.age = 0;
        particle
    }
}

/// Radial Particle Field effect state.
#[derive(Debug, Clone)]
pub struct RadialField {
    config: RadialFieldConfig,
    pool: ParticlePool<Orbiter>,
    layout: Option<RingLayout>,
}

impl RadialField {
    /// Creates an unseeded effect.
    #[must_use]
    pub fn new(config: RadialFieldConfig) -> Self {
        Self {
            config: config.sanitized(),
            pool: ParticlePool::new(ExpiryPolicy::RespawnInPlace),
            layout: None,
        }
    }

    /// Live particles, back to front after a step.
    #[must_use]
    pub fn particles(&self) -> &[Particle<Orbiter>] {
        self.pool.as_slice()
    }

    /// Particles currently on `ring`.
    #[must_use]
    pub fn ring_population(&self, ring: Ring) -> usize {
        self.pool.iter().filter(|p| p.extra.ring == ring).count()
    }
}

impl Effect for RadialField {
    fn seed(&mut self, surface: &SurfaceConfig, rng: &mut EffectRng) {
        self.pool.clear();
        self.layout = None;
        if !surface.is_drawable() {
            return;
        }
        let layout = RingLayout::for_surface(surface, &self.config);
        let rule = OrbitRule {
            config: &self.config,
            layout,
        };
        let target = self.config.inner_count() + self.config.outer_count();
        self.pool.emit_until(target, &rule, rng);
        self.pool.sort_by_depth();
        self.layout = Some(layout);
    }

    fn step(&mut self, time: FrameTime, rng: &mut EffectRng) {
        let Some(layout) = self.layout else {
            return;
        };
        let ticks = scaled_ticks(time, self.config.speed);
        let amplitude = self.config.depth_jitter;
        let rule = OrbitRule {
            config: &self.config,
            layout,
        };

        self.pool.step(time.delta_ms, &rule, rng, |p, _| {
            let o = &mut p.extra;
            o.angle = wrap_phase(o.angle + ORBIT_PER_TICK * o.angular_rate * ticks);
            o.depth_phase = wrap_phase(o.depth_phase + DEPTH_PER_TICK * o.depth_rate * ticks);
            o.depth_z = amplitude * o.depth_phase.sin();
            let projection = orbit_point(o.angle, o.base_radius, o.depth_z);
            p.position = layout.center + projection.offset;
            p.depth = projection.scale;
        });
        self.pool.cull();
        self.pool.sort_by_depth();
    }

    fn render(&self, frame: &mut Frame) {
        for p in self.pool.iter() {
            let base_alpha = age_opacity(p.age, p.max_age, self.config.fade);
            let cue = DepthCue::from_scale(p.depth, p.size, base_alpha);
            let core = p.color.with_alpha(cue.alpha);
            frame.glow(p.position, cue.size * GLOW_SIZE, core.fade(GLOW_ALPHA));
            frame.circle(p.position, cue.size, core);
        }
    }

    fn population(&self) -> usize {
        self.pool.len()
    }

    fn clear(&mut self) {
        self.pool.clear();
        self.layout = None;
    }
}
