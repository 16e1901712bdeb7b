//! Per-particle simulation state.

use crate::color::Rgb;
use crate::math::Vec2;

/// `max_age` for particles that only wrap and never expire.
pub const NEVER_EXPIRES: u32 = u32::MAX;

/// A single simulated particle.
///
/// `E` carries effect-specific fields (orbit angle, wave phase, trail
/// history). Age counts ticks, not milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle<E> {
    /// Position in surface pixel space.
    pub position: Vec2,
    /// Velocity in pixels per tick.
    pub velocity: Vec2,
    /// Ticks lived so far.
    pub age: u32,
    /// Ticks this particle may live; always at least 1.
    pub max_age: u32,
    /// Base rendered size in pixels.
    pub size: f32,
    /// Base color.
    pub color: Rgb,
    /// Render-order key: larger is nearer the viewer.
    pub depth: f32,
    /// Effect-specific state.
    pub extra: E,
    /// Set by the pool when a `Remove`-policy particle outlives `max_age`.
    expired: bool,
}

impl<E> Particle<E> {
    /// Creates a particle at rest with age 0.
    ///
    /// `max_age` below 1 is raised to 1 and a non-positive size to the
    /// smallest positive value, so the invariants hold for any input.
    #[must_use]
    pub fn new(position: Vec2, max_age: u32, size: f32, color: Rgb, extra: E) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            age: 0,
            max_age: max_age.max(1),
            size: if size > 0.0 { size } else { f32::MIN_POSITIVE },
            color,
            depth: 0.0,
            extra,
            expired: false,
        }
    }

    /// Sets the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the initial depth key.
    #[must_use]
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    /// Fraction of life used, `age / max_age`.
    #[inline]
    #[must_use]
    pub fn life_fraction(&self) -> f32 {
        if self.max_age == NEVER_EXPIRES {
            return 0.0;
        }
        self.age as f32 / self.max_age as f32
    }

    /// True once `age > max_age`.
    #[inline]
    #[must_use]
    pub fn is_over_age(&self) -> bool {
        self.age > self.max_age
    }

    /// True when the pool marked this particle for removal.
    #[inline]
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Marks the particle for removal at the next cull.
    pub fn mark_expired(&mut self) {
        self.expired = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_enforces_invariants() {
        let p = Particle::new(Vec2::ZERO, 0, -3.0, Rgb::WHITE, ());
        assert_eq!(p.max_age, 1);
        assert!(p.size > 0.0);
        assert_eq!(p.age, 0);
        assert!(!p.is_expired());
    }

    #[test]
    fn test_life_fraction() {
        let mut p = Particle::new(Vec2::ZERO, 500, 1.0, Rgb::WHITE, ());
        p.age = 250;
        assert_eq!(p.life_fraction(), 0.5);

        let forever = Particle::new(Vec2::ZERO, NEVER_EXPIRES, 1.0, Rgb::WHITE, ());
        assert_eq!(forever.life_fraction(), 0.0);
    }
}
