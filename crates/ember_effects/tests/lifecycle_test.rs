//! Integration tests for the effect lifecycle: mount, resize, reconfigure,
//! degradation, and teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ember_core::ManualDisplayLink;
use ember_effects::{
    BeamOscillatorConfig, Bloom, BorderGlowConfig, DrawSurface, EffectConfig, EffectInstance,
    EngineConfig, FrameOutcome, LifecycleState, PostProcess, RasterSurface, RecordingSurface,
    ResizeChannel, RibbonTrailConfig, SharedContainer,
};

type Recorded = EffectInstance<SharedContainer, RecordingSurface>;

fn border(seed: u64) -> EngineConfig {
    EngineConfig {
        seed,
        background: None,
        effect: EffectConfig::BorderGlow(BorderGlowConfig::default()),
    }
}

fn pump<S: DrawSurface>(
    instance: &mut EffectInstance<SharedContainer, S>,
    link: &mut ManualDisplayLink,
    now_ms: f64,
) -> Vec<FrameOutcome> {
    let mut due = Vec::new();
    link.drain_due_into(&mut due);
    due.into_iter().map(|token| instance.on_frame(link, token, now_ms)).collect()
}

/// Counts how often it was applied.
struct CountingStage(Arc<AtomicUsize>);

impl PostProcess<RecordingSurface> for CountingStage {
    fn apply(&mut self, _surface: &mut RecordingSurface) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn test_resize_reseeds_population() {
    let container = SharedContainer::new(200.0, 100.0);
    let channel = ResizeChannel::new();
    let mut link = ManualDisplayLink::new();
    let mut instance = Recorded::new(container.clone(), RecordingSurface::new(), border(1));

    instance.mount(&mut link, &channel);
    assert_eq!(instance.population(), 60);
    assert_eq!(pump(&mut instance, &mut link, 0.0), vec![FrameOutcome::Drawn { commands: 120 }]);

    container.set_size(300.0, 100.0);
    channel.notify();
    assert_eq!(pump(&mut instance, &mut link, 16.0), vec![FrameOutcome::Drawn { commands: 160 }]);

    assert_eq!(instance.population(), 80);
    assert_eq!(instance.state(), LifecycleState::Running);
    assert_eq!(instance.stats().reseeds, 1);
    assert_eq!(instance.surface().configures(), 2);
    let surface = instance.surface_config().unwrap();
    assert_eq!((surface.width, surface.height), (300.0, 100.0));
}

#[test]
fn test_notification_without_size_change_keeps_population() {
    let channel = ResizeChannel::new();
    let mut link = ManualDisplayLink::new();
    let mut instance = Recorded::new(SharedContainer::new(200.0, 100.0), RecordingSurface::new(), border(2));
    instance.mount(&mut link, &channel);

    channel.notify();
    pump(&mut instance, &mut link, 0.0);
    assert_eq!(instance.stats().reseeds, 0);
    assert_eq!(instance.surface().configures(), 1);
}

#[test]
fn test_dispose_is_idempotent_and_final() {
    let channel = ResizeChannel::new();
    let mut link = ManualDisplayLink::new();
    let mut instance = Recorded::new(SharedContainer::new(200.0, 100.0), RecordingSurface::new(), border(3));
    instance.mount(&mut link, &channel);
    pump(&mut instance, &mut link, 0.0);

    // The next frame is already queued when teardown starts.
    let mut late = Vec::new();
    link.drain_due_into(&mut late);
    assert_eq!(late.len(), 1);

    instance.dispose(&mut link);
    instance.dispose(&mut link);

    assert_eq!(instance.state(), LifecycleState::Disposed);
    assert_eq!(instance.population(), 0);
    assert_eq!(instance.surface().releases(), 1);
    assert!(instance.surface().last_frame().is_none());
    assert_eq!(channel.subscriber_count(), 0);
    assert!(!instance.scheduler().is_running());

    let presents = instance.surface().presents();
    assert_eq!(instance.on_frame(&mut link, late[0], 32.0), FrameOutcome::Skipped);
    assert_eq!(instance.surface().presents(), presents);
    assert_eq!(link.pending_count(), 0);
}

#[test]
fn test_drop_without_dispose_unsubscribes() {
    let channel = ResizeChannel::new();
    let mut link = ManualDisplayLink::new();
    {
        let mut instance = Recorded::new(SharedContainer::new(50.0, 50.0), RecordingSurface::new(), border(4));
        instance.mount(&mut link, &channel);
        assert_eq!(channel.subscriber_count(), 1);
    }
    assert_eq!(channel.subscriber_count(), 0);
    channel.notify();
}

#[test]
fn test_zero_size_defers_until_laid_out() {
    let container = SharedContainer::new(0.0, 0.0);
    let channel = ResizeChannel::new();
    let mut link = ManualDisplayLink::new();
    let mut instance = Recorded::new(container.clone(), RecordingSurface::new(), border(5));

    assert!(instance.mount(&mut link, &channel));
    assert_eq!(instance.state(), LifecycleState::Initializing);
    assert_eq!(pump(&mut instance, &mut link, 0.0), vec![FrameOutcome::Deferred]);
    assert_eq!(instance.population(), 0);
    assert_eq!(instance.surface().presents(), 0);

    container.set_size(200.0, 100.0);
    channel.notify();
    assert_eq!(pump(&mut instance, &mut link, 16.0), vec![FrameOutcome::Drawn { commands: 120 }]);
    assert_eq!(instance.state(), LifecycleState::Running);
    assert_eq!(instance.stats().deferred, 1);
}

#[test]
fn test_container_unmount_clears_population() {
    let container = SharedContainer::new(200.0, 100.0);
    let mut link = ManualDisplayLink::new();
    let mut instance = Recorded::new(container.clone(), RecordingSurface::new(), border(6));
    instance.mount(&mut link, &ResizeChannel::new());
    assert_eq!(instance.population(), 60);

    container.unmount();
    assert_eq!(pump(&mut instance, &mut link, 0.0), vec![FrameOutcome::Deferred]);
    assert_eq!(instance.population(), 0);
    assert_eq!(instance.state(), LifecycleState::Initializing);
}

#[test]
fn test_unavailable_link_starts_later() {
    let mut link = ManualDisplayLink::new();
    link.set_available(false);
    let mut instance = Recorded::new(SharedContainer::new(200.0, 100.0), RecordingSurface::new(), border(7));

    assert!(!instance.mount(&mut link, &ResizeChannel::new()));
    assert!(!instance.scheduler().is_running());
    assert_eq!(link.pending_count(), 0);
    assert_eq!(instance.population(), 60);

    link.set_available(true);
    assert!(instance.ensure_running(&mut link));
    assert!(instance.ensure_running(&mut link));
    assert_eq!(link.pending_count(), 1);
    assert_eq!(pump(&mut instance, &mut link, 0.0), vec![FrameOutcome::Drawn { commands: 120 }]);
}

#[test]
fn test_reconfigure_reseeds_and_keeps_scheduler() {
    let mut link = ManualDisplayLink::new();
    let mut instance = Recorded::new(SharedContainer::new(200.0, 100.0), RecordingSurface::new(), border(8));
    instance.mount(&mut link, &ResizeChannel::new());
    pump(&mut instance, &mut link, 0.0);

    instance.reconfigure(EngineConfig {
        seed: 8,
        background: None,
        effect: EffectConfig::RibbonTrail(RibbonTrailConfig::default()),
    });

    assert_eq!(instance.config().effect.kind(), "ribbon_trail");
    assert_eq!(instance.population(), 8);
    assert_eq!(instance.state(), LifecycleState::Running);
    assert_eq!(instance.stats().reseeds, 1);
    assert!(instance.scheduler().is_running());

    let outcomes = pump(&mut instance, &mut link, 16.0);
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], FrameOutcome::Drawn { .. }));
}

#[test]
fn test_non_finite_frame_is_dropped() {
    let mut link = ManualDisplayLink::new();
    let config = EngineConfig {
        seed: 9,
        background: None,
        effect: EffectConfig::BorderGlow(BorderGlowConfig {
            size_min: f32::MAX,
            size_max: f32::MAX,
            ..BorderGlowConfig::default()
        }),
    };
    let mut instance = Recorded::new(SharedContainer::new(200.0, 100.0), RecordingSurface::new(), config);
    instance.mount(&mut link, &ResizeChannel::new());

    assert_eq!(pump(&mut instance, &mut link, 0.0), vec![FrameOutcome::Dropped]);
    assert!(instance.surface().last_frame().is_some_and(|f| f.is_empty()));
    assert_eq!(instance.stats().dropped, 1);
    assert_eq!(instance.stats().drawn, 0);

    // The instance keeps ticking after a dropped frame.
    assert_eq!(pump(&mut instance, &mut link, 16.0), vec![FrameOutcome::Dropped]);
    assert_eq!(instance.state(), LifecycleState::Running);
}

#[test]
fn test_post_process_follows_config_toggle() {
    let applied = Arc::new(AtomicUsize::new(0));
    let mut link = ManualDisplayLink::new();

    let mut off = Recorded::new(SharedContainer::new(80.0, 40.0), RecordingSurface::new(), border(10))
        .with_post_process(CountingStage(Arc::clone(&applied)));
    off.mount(&mut link, &ResizeChannel::new());
    pump(&mut off, &mut link, 0.0);
    off.dispose(&mut link);
    assert_eq!(applied.load(Ordering::Relaxed), 0);

    let config = EngineConfig {
        effect: EffectConfig::BorderGlow(BorderGlowConfig {
            post_process: true,
            ..BorderGlowConfig::default()
        }),
        ..border(10)
    };
    let mut on = Recorded::new(SharedContainer::new(80.0, 40.0), RecordingSurface::new(), config)
        .with_post_process(CountingStage(Arc::clone(&applied)));
    on.mount(&mut link, &ResizeChannel::new());
    pump(&mut on, &mut link, 0.0);
    pump(&mut on, &mut link, 16.0);
    assert_eq!(applied.load(Ordering::Relaxed), 2);
}

#[test]
fn test_raster_beams_with_bloom() {
    let mut link = ManualDisplayLink::new();
    let config = EngineConfig {
        seed: 11,
        background: Some(ember_core::Rgb::new(0, 0, 0)),
        effect: EffectConfig::BeamOscillator(BeamOscillatorConfig::default()),
    };
    let mut instance = EffectInstance::new(SharedContainer::new(64.0, 48.0), RasterSurface::new(), config)
        .with_post_process(Bloom::default());
    instance.mount(&mut link, &ResizeChannel::new());

    let outcomes = pump(&mut instance, &mut link, 0.0);
    assert_eq!(outcomes, vec![FrameOutcome::Drawn { commands: 28 }]);

    let surface = instance.surface();
    assert_eq!((surface.width(), surface.height()), (64, 48));
    assert_eq!(surface.frames(), 1);
    assert!(surface.pixels().chunks_exact(4).all(|px| px[3] == 255));
    assert!(surface.pixels().chunks_exact(4).any(|px| px[0] > 0 || px[1] > 0 || px[2] > 0));
}

#[test]
fn test_same_seed_same_frames() {
    let mut frames = Vec::new();
    for _ in 0..2 {
        let mut link = ManualDisplayLink::new();
        let mut instance = Recorded::new(SharedContainer::new(120.0, 90.0), RecordingSurface::new(), border(12));
        instance.mount(&mut link, &ResizeChannel::new());
        for tick in 0..10 {
            pump(&mut instance, &mut link, f64::from(tick) * 16.0);
        }
        frames.push(instance.last_frame().commands().to_vec());
    }
    assert_eq!(frames[0], frames[1]);
}

#[test]
fn test_device_pixel_ratio_scales_backing_store() {
    let mut link = ManualDisplayLink::new();
    let container = SharedContainer::new(100.0, 50.0).with_device_pixel_ratio(2.0);
    let mut instance = EffectInstance::new(container, RasterSurface::new(), border(13));
    instance.mount(&mut link, &ResizeChannel::new());

    assert_eq!((instance.surface().width(), instance.surface().height()), (200, 100));
    // Population follows logical size.
    assert_eq!(instance.population(), 30);
}
