//! # EMBER Effects
//!
//! Canvas effect variants and the machinery that mounts them on a host:
//! - Surface binding, host container, and resize channel
//! - Render command lists, a CPU raster backend, and a bloom stage
//! - Border Glow, Ribbon Trail, Radial Particle Field, Multi-Beam Oscillator
//! - TOML effect configuration
//! - [`EffectInstance`], the mount / resize / dispose state machine
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        EffectInstance                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ResizeSubscription ◄── ResizeChannel (shared with the host)  │
//! │  FrameScheduler     ◄── DisplayLink   (host refresh source)   │
//! │  EffectVariant      ──► Frame ──► SurfaceBinding ──► surface  │
//! │                                        └──► PostProcess       │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_core::ManualDisplayLink;
//! use ember_effects::{EffectInstance, EngineConfig, RasterSurface, ResizeChannel, SharedContainer};
//!
//! let config = EngineConfig::load("data/effects/border_glow.toml")?;
//! let mut link = ManualDisplayLink::new();
//! let channel = ResizeChannel::new();
//! let mut instance = EffectInstance::new(SharedContainer::new(640.0, 360.0), RasterSurface::new(), config);
//! instance.mount(&mut link, &channel);
//!
//! let mut due = Vec::new();
//! link.drain_due_into(&mut due);
//! for &token in &due {
//!     instance.on_frame(&mut link, token, 16.0);
//! }
//! instance.dispose(&mut link);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod effects;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod postprocess;
pub mod raster;
pub mod render;
pub mod surface;

pub use config::{
    BeamOscillatorConfig, BorderGlowConfig, EffectConfig, EngineConfig, RadialFieldConfig,
    RibbonTrailConfig, MAX_POPULATION, MAX_TRAIL_SAMPLES,
};
pub use effects::{
    age_opacity, BeamOscillator, BorderGlow, Effect, EffectVariant, RadialField, RibbonTrail,
};
pub use error::{EmberError, EmberResult};
pub use host::{HostContainer, ResizeChannel, ResizeSubscription, SharedContainer};
pub use lifecycle::{EffectInstance, FrameOutcome, InstanceStats, LifecycleState};
pub use postprocess::{Bloom, PostProcess};
pub use raster::RasterSurface;
pub use render::{Frame, Path, QuadSegment, RenderCommand, StrokeGradient};
pub use surface::{DrawSurface, RecordingSurface, SurfaceBinding, SurfaceConfig};
