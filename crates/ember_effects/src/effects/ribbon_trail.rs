//! Ribbon Trail: ribbons rising from the bottom edge and fading out.
//!
//! The head of each ribbon moves up by its velocity and sideways by a
//! sinusoidal wave; every tick pushes the new head into the ribbon's
//! bounded history, which is drawn as a smoothed stroke. A ribbon that
//! leaves the top edge or outlives `max_age` is removed and a new one is
//! emitted at the bottom with a random horizontal offset.

use std::f32::consts::TAU;

use ember_core::{
    range, wave_point, wrap_phase, CullBounds, EffectRng, ExpiryPolicy, FrameTime, Particle,
    ParticlePool, PathSegmentBuffer, Vec2,
};

use super::{age_opacity, pick_color, scaled_ticks, Effect};
use crate::config::{age_of, RibbonTrailConfig};
use crate::render::{Frame, StrokeGradient};
use crate::surface::SurfaceConfig;

/// Glow pass width relative to the core stroke.
pub const GLOW_WIDTH: f32 = 2.0;
/// Glow pass alpha relative to the core stroke.
pub const GLOW_ALPHA: f32 = 0.3;
/// Wave angle advance per reference tick at frequency 1.
const WAVE_PER_TICK: f32 = 0.08;

/// Per-ribbon state.
#[derive(Debug, Clone, PartialEq)]
pub struct Ribbon {
    /// Current wave angle, radians.
    pub phase: f32,
    /// Wave angle multiplier.
    pub frequency: f32,
    /// Head positions, newest first.
    pub history: PathSegmentBuffer,
}

/// Ribbon Trail effect state.
#[derive(Debug, Clone)]
pub struct RibbonTrail {
    config: RibbonTrailConfig,
    pool: ParticlePool<Ribbon>,
    width: f32,
    height: f32,
}

impl RibbonTrail {
    /// Creates an unseeded effect.
    #[must_use]
    pub fn new(config: RibbonTrailConfig) -> Self {
        let mut pool = ParticlePool::new(ExpiryPolicy::Remove);
        // Only the top edge removes ribbons; sideways drift is allowed.
        pool.set_bounds(Some(CullBounds::new(
            Vec2::new(f32::NEG_INFINITY, 0.0),
            Vec2::new(f32::INFINITY, f32::INFINITY),
        )));
        Self {
            config: config.sanitized(),
            pool,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Live ribbons.
    #[must_use]
    pub fn ribbons(&self) -> &[Particle<Ribbon>] {
        self.pool.as_slice()
    }

    /// Alpha of `ribbon` this tick.
    #[must_use]
    pub fn opacity(&self, ribbon: &Particle<Ribbon>) -> f32 {
        age_opacity(ribbon.age, ribbon.max_age, self.config.fade)
    }

    fn emit(&mut self, rng: &mut EffectRng) -> usize {
        let target = self.config.trail_count();
        let rule = spawn_rule(&self.config, self.width, self.height);
        self.pool.emit_until(target, &rule, rng)
    }
}

/// New ribbon at the bottom edge with a random horizontal offset.
fn spawn_rule(
    config: &RibbonTrailConfig,
    width: f32,
    height: f32,
) -> impl Fn(usize, &mut EffectRng) -> Particle<Ribbon> + '_ {
    move |_slot, rng| {
        let start = Vec2::new(range(rng, 0.0, width), height);
        let rise = range(rng, config.rise_min, config.rise_max);
        let mut history = PathSegmentBuffer::new(config.segment_cap());
        history.push(start);
        let ribbon = Ribbon {
            phase: range(rng, 0.0, TAU),
            frequency: range(rng, 0.5, 1.5),
            history,
        };
        let color = pick_color(&config.colors, rng);
        Particle::new(start, age_of(config.max_age), config.thickness, color, ribbon)
            .with_velocity(Vec2::new(0.0, -rise))
    }
}

impl Effect for RibbonTrail {
    fn seed(&mut self, surface: &SurfaceConfig, rng: &mut EffectRng) {
        self.pool.clear();
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
        let speed = self.config.speed;
        let chaos = self.config.chaos;

        // The spawn rule borrows the config; it must be gone before `emit`.
        {
            let rule = spawn_rule(&self.config, self.width, self.height);
            self.pool.step(time.delta_ms, &rule, rng, |p, _| {
                p.extra.phase = wrap_phase(p.extra.phase + WAVE_PER_TICK * p.extra.frequency * ticks);
                let sway = wave_point(p.velocity.x, 0.0, p.extra.phase, chaos);
                p.position += Vec2::new(sway * speed, p.velocity.y * speed);
                p.extra.history.push(p.position);
            });
        }
        self.pool.cull();
        self.emit(rng);
    }

    fn render(&self, frame: &mut Frame) {
        for ribbon in self.pool.iter() {
            let history = &ribbon.extra.history;
            let (Some(head), Some(tail)) = (history.head(), history.tail()) else {
                continue;
            };
            let mut core = frame.take_path();
            if !core.rebuild_through(history.iter()) {
                frame.recycle_path(core);
                continue;
            }
            let mut glow = frame.take_path();
            glow.copy_from(&core);

            let gradient = StrokeGradient {
                start: head,
                end: tail,
                from: ribbon.color.with_alpha(self.opacity(ribbon)),
                to: ribbon.color.with_alpha(0.0),
            };
            frame.stroke(glow, ribbon.size * GLOW_WIDTH, gradient.fade(GLOW_ALPHA));
            frame.stroke(core, ribbon.size, gradient);
        }
    }

    fn population(&self) -> usize {
        self.pool.len()
    }

    fn clear(&mut self) {
        self.pool.clear();
    }
}
