//! Runs one effect headlessly and exports the last frame.

use std::path::{Path, PathBuf};

use ember_core::ManualDisplayLink;
use ember_effects::{
    Bloom, EffectInstance, EmberError, EngineConfig, FrameOutcome, RasterSurface, ResizeChannel,
    SharedContainer,
};
use thiserror::Error;

use crate::options::PreviewOptions;

/// Simulated display refresh interval, in milliseconds.
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Errors from a preview run.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// Loading or parsing the effect file failed.
    #[error(transparent)]
    Engine(#[from] EmberError),

    /// Nothing was ever drawn, so there is no image to write.
    #[error("surface is empty; the container never had a drawable size")]
    EmptySurface,

    /// The raster buffer does not match its reported dimensions.
    #[error("pixel buffer does not match {width}x{height}")]
    BufferSize {
        /// Reported width.
        width: u32,
        /// Reported height.
        height: u32,
    },

    /// Encoding or writing the image failed.
    #[error("failed to write {path}: {source}")]
    Export {
        /// Output path.
        path: PathBuf,
        /// Encoder error.
        #[source]
        source: image::ImageError,
    },
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewReport {
    /// Effect kind that ran.
    pub kind: &'static str,
    /// Ticks the scheduler accepted.
    pub ticks: u64,
    /// Frames presented with content.
    pub drawn: u64,
    /// Frames replaced by an empty frame.
    pub dropped: u64,
    /// Ticks spent without a drawable size.
    pub deferred: u64,
    /// Reseeds from size or config changes.
    pub reseeds: u64,
    /// Population at the end of the run.
    pub population: usize,
    /// Exported image width in physical pixels.
    pub width: u32,
    /// Exported image height in physical pixels.
    pub height: u32,
}

/// Loads, mounts, and pumps one effect, then writes the final frame.
///
/// # Errors
///
/// Fails when the config cannot be loaded, when the surface never became
/// drawable, or when the image cannot be written.
pub fn run(options: &PreviewOptions) -> Result<PreviewReport, PreviewError> {
    let mut config = match &options.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    let kind = config.effect.kind();
    tracing::info!("Preview: {} for {} frames", kind, options.frames);

    let (width, height) = options.size;
    let container = SharedContainer::new(width, height).with_device_pixel_ratio(options.device_pixel_ratio);
    let channel = ResizeChannel::new();
    let mut link = ManualDisplayLink::new();
    let mut instance =
        EffectInstance::new(container.clone(), RasterSurface::new(), config).with_post_process(Bloom::default());
    instance.mount(&mut link, &channel);

    let resize_at = options.frames / 2;
    let mut due = Vec::with_capacity(1);
    for frame in 0..options.frames {
        if frame == resize_at {
            if let Some((w, h)) = options.resize {
                tracing::info!("Preview: resizing container to {}x{}", w, h);
                container.set_size(w, h);
                channel.notify();
            }
        }
        let now_ms = f64::from(frame) * FRAME_INTERVAL_MS;
        link.drain_due_into(&mut due);
        for &token in &due {
            if let FrameOutcome::Dropped = instance.on_frame(&mut link, token, now_ms) {
                tracing::warn!("Preview: frame {} dropped", frame);
            }
        }
    }

    let stats = instance.stats();
    let surface = instance.surface();
    let report = PreviewReport {
        kind,
        ticks: stats.ticks,
        drawn: stats.drawn,
        dropped: stats.dropped,
        deferred: stats.deferred,
        reseeds: stats.reseeds,
        population: instance.population(),
        width: surface.width(),
        height: surface.height(),
    };
    let exported = export_png(surface, &options.out);
    instance.dispose(&mut link);
    exported?;

    tracing::info!("Preview: wrote {}", options.out.display());
    Ok(report)
}

/// Writes the surface's pixels as an RGBA PNG.
///
/// # Errors
///
/// Fails on an empty surface or when the image cannot be encoded or written.
pub fn export_png(surface: &RasterSurface, path: &Path) -> Result<(), PreviewError> {
    let (width, height) = (surface.width(), surface.height());
    if width == 0 || height == 0 {
        return Err(PreviewError::EmptySurface);
    }
    let image = image::RgbaImage::from_raw(width, height, surface.pixels().to_vec())
        .ok_or(PreviewError::BufferSize { width, height })?;
    image.save(path).map_err(|source| PreviewError::Export {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_png(name: &str) -> PathBuf {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("ember_{name}_{id}.png"))
    }

    #[test]
    fn test_run_default_effect() {
        let out = temp_png("default");
        let options = PreviewOptions {
            size: (64.0, 48.0),
            frames: 6,
            out: out.clone(),
            ..PreviewOptions::default()
        };
        let report = run(&options).unwrap();

        assert_eq!(report.kind, "border_glow");
        assert_eq!(report.ticks, 6);
        assert_eq!(report.drawn, 6);
        assert_eq!(report.population, 22);
        assert_eq!((report.width, report.height), (64, 48));

        let decoded = image::open(&out).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (64, 48));
        std::fs::remove_file(&out).ok();
    }

    #[test]
    fn test_run_with_resize() {
        let out = temp_png("resize");
        let options = PreviewOptions {
            size: (64.0, 48.0),
            device_pixel_ratio: 2.0,
            frames: 4,
            resize: Some((100.0, 50.0)),
            out: out.clone(),
            ..PreviewOptions::default()
        };
        let report = run(&options).unwrap();

        assert_eq!(report.reseeds, 1);
        assert_eq!(report.population, 30);
        assert_eq!((report.width, report.height), (200, 100));
        std::fs::remove_file(&out).ok();
    }

    #[test]
    fn test_zero_size_has_nothing_to_export() {
        let options = PreviewOptions {
            size: (0.0, 0.0),
            frames: 3,
            out: temp_png("empty"),
            ..PreviewOptions::default()
        };
        assert!(matches!(run(&options), Err(PreviewError::EmptySurface)));
    }

    #[test]
    fn test_missing_config_file() {
        let options = PreviewOptions {
            config: Some(PathBuf::from("/nonexistent/effect.toml")),
            ..PreviewOptions::default()
        };
        assert!(matches!(run(&options), Err(PreviewError::Engine(EmberError::Io { .. }))));
    }
}
