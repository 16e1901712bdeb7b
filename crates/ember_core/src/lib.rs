//! # EMBER Core
//!
//! Host-independent simulation kernel for real-time canvas effects:
//! - Particle pools with frame-counted aging and depth ordering
//! - Pure geometry mappers (rectangle perimeter, perspective orbit, wave)
//! - Bounded path history for ribbon-style trails
//! - A frame scheduler that a host display link drives
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       ONE TICK                           │
//! ├──────────────────────────────────────────────────────────┤
//! │  DisplayLink → FrameScheduler::dispatch → FrameTime      │
//! │       ↓                                                  │
//! │  ParticlePool::step (age + integrate) → cull → sort      │
//! │       ↓                                                  │
//! │  Geometry mappers → positions / scales → render          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_core::{perimeter_point, Vec2};
//!
//! let p = perimeter_point(200.0, 100.0, 0.25, 0.0);
//! assert_eq!(p, Vec2::new(150.0, 0.0));
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod color;
pub mod geometry;
pub mod math;
pub mod particle;
pub mod pool;
pub mod random;
pub mod scheduler;
pub mod trail;

pub use color::{Color, Rgb};
pub use geometry::{
    orbit_point, perimeter_length, perimeter_point, wave_point, wrap_phase, DepthCue, OrbitProjection,
    FOCAL_DISTANCE,
};
pub use math::Vec2;
pub use particle::{Particle, NEVER_EXPIRES};
pub use pool::{CullBounds, ExpiryPolicy, ParticlePool, PoolStats, SpawnRule};
pub use random::{range, seeded_rng, EffectRng};
pub use scheduler::{
    DisplayLink, FrameScheduler, FrameTime, FrameToken, ManualDisplayLink, SchedulerState,
    MAX_FRAME_DELTA_MS,
};
pub use trail::PathSegmentBuffer;
