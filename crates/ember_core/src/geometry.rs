//! Geometry mappers.
//!
//! Pure functions from a scalar parameter (progress, angle, time) to a point
//! in a target geometry. No state, no allocation; safe to call per particle
//! per frame.

use std::f32::consts::TAU;

use crate::math::Vec2;

/// Perspective divisor used by [`orbit_point`].
pub const FOCAL_DISTANCE: f32 = 300.0;

/// Closest a particle may get to the eye, as a fraction of the focal distance.
const MIN_DEPTH_FRACTION: f32 = -0.9;

/// Total length of a `width × height` rectangle's perimeter.
#[inline]
#[must_use]
pub fn perimeter_length(width: f32, height: f32) -> f32 {
    2.0 * (width.max(0.0) + height.max(0.0))
}

/// Maps normalized `progress` around the rectangle's perimeter to a boundary
/// point.
///
/// Edges are walked top (left→right), right (top→bottom), bottom
/// (right→left), left (bottom→top), starting at the top-left corner for
/// progress 0. `offset` is added to the raw distance in pixels and the sum is
/// reduced modulo the perimeter before mapping, so any offset lands on the
/// boundary.
///
/// A degenerate rectangle (zero perimeter) or non-finite input maps to the
/// origin.
#[must_use]
pub fn perimeter_point(width: f32, height: f32, progress: f32, offset: f32) -> Vec2 {
    let w = width.max(0.0);
    let h = height.max(0.0);
    let total = perimeter_length(w, h);
    if !total.is_finite() || total <= 0.0 {
        return Vec2::ZERO;
    }

    let raw = progress * total + offset;
    if !raw.is_finite() {
        return Vec2::ZERO;
    }

    let mut distance = raw.rem_euclid(total);
    // rem_euclid can round up to `total` for tiny negative inputs
    if distance >= total {
        distance = 0.0;
    }

    if distance < w {
        Vec2::new(distance, 0.0)
    } else if distance < w + h {
        Vec2::new(w, distance - w)
    } else if distance < 2.0 * w + h {
        Vec2::new(w - (distance - w - h), h)
    } else {
        Vec2::new(0.0, h - (distance - 2.0 * w - h))
    }
}

/// Result of projecting an orbiting particle onto the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitProjection {
    /// Offset from the orbit center in surface pixels.
    pub offset: Vec2,
    /// Perspective scale; 1.0 at `depth_z == 0`, below 1 farther away.
    pub scale: f32,
}

/// Projects a particle orbiting at `base_radius` with simulated depth
/// `depth_z` onto the surface plane.
///
/// `scale = FOCAL_DISTANCE / (FOCAL_DISTANCE + depth_z)`. Positive depth is
/// away from the viewer. Depth is clamped so the divisor stays positive.
#[must_use]
pub fn orbit_point(angle: f32, base_radius: f32, depth_z: f32) -> OrbitProjection {
    let depth = depth_z.max(FOCAL_DISTANCE * MIN_DEPTH_FRACTION);
    let scale = FOCAL_DISTANCE / (FOCAL_DISTANCE + depth);
    let radius = base_radius * scale;
    OrbitProjection {
        offset: Vec2::new(angle.cos() * radius, angle.sin() * radius),
        scale,
    }
}

/// Size and opacity derived from one perspective scale.
///
/// Position, size, and transparency of a depth-simulated particle all come
/// from the same `scale` so the depth cues never disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthCue {
    /// Rendered radius in pixels.
    pub size: f32,
    /// Rendered opacity (0-1).
    pub alpha: f32,
}

impl DepthCue {
    /// Derives size and opacity from a perspective scale.
    #[must_use]
    pub fn from_scale(scale: f32, base_size: f32, base_alpha: f32) -> Self {
        Self {
            size: (base_size * scale).max(0.0),
            alpha: (base_alpha * scale).clamp(0.0, 1.0),
        }
    }
}

/// Sinusoidal displacement: `base_velocity + amplitude * sin(time + phase)`.
///
/// Continuous in `time`.
#[inline]
#[must_use]
pub fn wave_point(base_velocity: f32, time: f32, phase: f32, amplitude: f32) -> f32 {
    base_velocity + amplitude * (time + phase).sin()
}

/// Reduces an angle accumulator to `[0, 2π)`.
///
/// Sine and cosine are periodic, so wrapping never introduces a visible jump,
/// while it keeps `f32` accumulators from losing precision over long runs.
#[inline]
#[must_use]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
