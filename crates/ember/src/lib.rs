//! # EMBER
//!
//! Headless preview driver for EMBER effect files.
//!
//! ```text
//!   effect.toml ──► EngineConfig ──► EffectInstance<SharedContainer, RasterSurface>
//!                                          │  ManualDisplayLink pumped at 60 Hz
//!                                          │  (container resized mid-run on request)
//!                                          ▼
//!                                   RasterSurface + Bloom ──► PNG
//! ```
//!
//! The `ember_preview` binary is a thin wrapper around [`Invocation::parse`]
//! and [`run`].

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod options;
pub mod preview;

pub use options::{Invocation, PreviewOptions, USAGE};
pub use preview::{export_png, run, PreviewError, PreviewReport, FRAME_INTERVAL_MS};
