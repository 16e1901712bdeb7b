//! # Effect Lifecycle
//!
//! [`EffectInstance`] owns everything one mounted effect needs: the surface
//! binding, the frame scheduler, the resize subscription, the simulation
//! state, and its random generator. It is the only thing allowed to stop
//! the scheduler.
//!
//! ## States
//!
//! ```text
//!   Unmounted ──mount──► Initializing ──size known, seeded──► Running
//!                             ▲                               │    ▲
//!                             └──── container gone / 0×0 ─────┤    │
//!                                                  size change▼    │ reseeded
//!                                                          Resizing┘
//!   any ──dispose──► Disposed (terminal)
//! ```
//!
//! ## One tick
//!
//! 1. The scheduler validates the frame token and requests the next frame
//! 2. The container size is re-read; a change reseeds the effect
//! 3. `step` then `render` into a reusable command list
//! 4. A list carrying NaN or infinity is replaced by an empty frame
//! 5. The surface presents it; the post-process stage runs if enabled

use ember_core::{seeded_rng, Color, DisplayLink, EffectRng, FrameScheduler, FrameToken};

use crate::config::EngineConfig;
use crate::effects::{Effect, EffectVariant};
use crate::host::{HostContainer, ResizeChannel, ResizeSubscription};
use crate::postprocess::PostProcess;
use crate::render::Frame;
use crate::surface::{DrawSurface, SurfaceBinding, SurfaceConfig};

/// Lifecycle state of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, not yet attached to a host.
    Unmounted,
    /// Attached; waiting for a drawable container size.
    Initializing,
    /// Seeded and ticking.
    Running,
    /// Reseeding for a new container size.
    Resizing,
    /// Torn down. Terminal.
    Disposed,
}

impl LifecycleState {
    /// Human-readable state name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unmounted => "UNMOUNTED",
            Self::Initializing => "INITIALIZING",
            Self::Running => "RUNNING",
            Self::Resizing => "RESIZING",
            Self::Disposed => "DISPOSED",
        }
    }
}

/// What one `on_frame` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Stale token, stopped scheduler, or disposed instance; nothing ran.
    Skipped,
    /// The container has no drawable size yet; nothing was simulated.
    Deferred,
    /// A frame was simulated and presented.
    Drawn {
        /// Commands in the presented frame.
        commands: usize,
    },
    /// The frame held non-finite values; an empty frame was presented.
    Dropped,
}

/// Counters since mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceStats {
    /// Ticks accepted by the scheduler.
    pub ticks: u64,
    /// Frames presented with content.
    pub drawn: u64,
    /// Frames replaced by an empty frame.
    pub dropped: u64,
    /// Ticks spent waiting for a drawable size.
    pub deferred: u64,
    /// Reseeds caused by size or config changes.
    pub reseeds: u64,
}

/// One mounted effect.
pub struct EffectInstance<C, S> {
    /// Current lifecycle state.
    state: LifecycleState,
    /// Host element the effect is sized to.
    container: C,
    /// Drawing backend.
    binding: SurfaceBinding<S>,
    /// Sanitized config.
    config: EngineConfig,
    /// Simulation state.
    effect: EffectVariant,
    /// The instance's animation handle.
    scheduler: FrameScheduler,
    /// Resize listener; `None` before mount and after dispose.
    subscription: Option<ResizeSubscription>,
    /// Optional stage run after each presented frame.
    post_process: Option<Box<dyn PostProcess<S>>>,
    /// Deterministic per-instance randomness.
    rng: EffectRng,
    /// Reused command list.
    frame: Frame,
    /// Surface the current population was seeded for.
    seeded_for: Option<SurfaceConfig>,
    /// Counters.
    stats: InstanceStats,
}

impl<C: HostContainer, S: DrawSurface> EffectInstance<C, S> {
    /// Creates an unmounted instance.
    #[must_use]
    pub fn new(container: C, surface: S, config: EngineConfig) -> Self {
        let config = config.sanitized();
        Self {
            state: LifecycleState::Unmounted,
            container,
            binding: SurfaceBinding::new(surface),
            effect: EffectVariant::from_config(&config.effect),
            rng: seeded_rng(config.seed),
            config,
            scheduler: FrameScheduler::new(),
            subscription: None,
            post_process: None,
            frame: Frame::new(),
            seeded_for: None,
            stats: InstanceStats::default(),
        }
    }

    /// Attaches a post-process stage.
    ///
    /// It only runs while the config's `post_process` toggle is on.
    #[must_use]
    pub fn with_post_process(mut self, stage: impl PostProcess<S> + 'static) -> Self {
        self.post_process = Some(Box::new(stage));
        self
    }

    /// Attaches to the host: subscribes to resizes, starts the scheduler,
    /// and seeds immediately when the container already has a size.
    ///
    /// Only valid once, from `Unmounted`. Returns whether the scheduler is
    /// running; when the display link was unavailable, call
    /// [`ensure_running`](Self::ensure_running) later.
    pub fn mount<L: DisplayLink + ?Sized>(&mut self, link: &mut L, channel: &ResizeChannel) -> bool {
        if self.state != LifecycleState::Unmounted {
            return self.scheduler.is_running();
        }
        self.transition_to(LifecycleState::Initializing);
        self.subscription = Some(channel.subscribe());

        let started = self.scheduler.start(link);
        if !started {
            tracing::debug!("Effect {}: display link unavailable, start deferred", self.kind());
        }
        self.sync_size();
        started
    }

    /// Starts the scheduler if a previous start was a no-op.
    ///
    /// Returns whether it is running afterwards.
    pub fn ensure_running<L: DisplayLink + ?Sized>(&mut self, link: &mut L) -> bool {
        match self.state {
            LifecycleState::Unmounted | LifecycleState::Disposed => false,
            _ => self.scheduler.start(link),
        }
    }

    /// Handles one fired display frame.
    pub fn on_frame<L: DisplayLink + ?Sized>(
        &mut self,
        link: &mut L,
        token: FrameToken,
        now_ms: f64,
    ) -> FrameOutcome {
        if matches!(self.state, LifecycleState::Unmounted | LifecycleState::Disposed) {
            return FrameOutcome::Skipped;
        }
        let Some(time) = self.scheduler.begin_frame(link, token, now_ms) else {
            return FrameOutcome::Skipped;
        };
        self.stats.ticks += 1;

        if !self.sync_size() {
            self.stats.deferred += 1;
            return FrameOutcome::Deferred;
        }

        self.effect.step(time, &mut self.rng);

        let clear = self.clear_color();
        self.frame.reset(clear);
        self.effect.render(&mut self.frame);

        if !self.frame.is_finite() {
            tracing::warn!(
                "Effect {}: dropped frame {} with non-finite values ({} commands)",
                self.kind(),
                time.frame,
                self.frame.len()
            );
            self.frame.reset(clear);
            self.binding.present(&self.frame);
            self.stats.dropped += 1;
            return FrameOutcome::Dropped;
        }

        self.binding.present(&self.frame);
        if self.config.effect.post_process() {
            if let Some(stage) = self.post_process.as_mut() {
                stage.apply(self.binding.surface_mut());
            }
        }
        self.stats.drawn += 1;
        FrameOutcome::Drawn {
            commands: self.frame.len(),
        }
    }

    /// Swaps in a new config and fully reseeds, keeping the scheduler.
    pub fn reconfigure(&mut self, config: EngineConfig) {
        if matches!(self.state, LifecycleState::Disposed) {
            return;
        }
        let config = config.sanitized();
        tracing::info!(
            "Effect reconfigured: {} -> {} (seed {})",
            self.kind(),
            config.effect.kind(),
            config.seed
        );
        self.effect = EffectVariant::from_config(&config.effect);
        self.rng = seeded_rng(config.seed);
        self.config = config;

        let was_seeded = self.seeded_for.take().is_some();
        if self.state == LifecycleState::Unmounted {
            return;
        }
        if was_seeded {
            self.stats.reseeds += 1;
            self.transition_to(LifecycleState::Initializing);
        }
        self.sync_size();
    }

    /// Tears the instance down: stops the scheduler, unsubscribes, clears
    /// the simulation, and releases the surface. Idempotent.
    pub fn dispose<L: DisplayLink + ?Sized>(&mut self, link: &mut L) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        self.scheduler.stop(link);
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.effect.clear();
        self.seeded_for = None;
        self.binding.release();
        self.transition_to(LifecycleState::Disposed);
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Counters since mount.
    #[must_use]
    pub const fn stats(&self) -> InstanceStats {
        self.stats
    }

    /// Active (sanitized) config.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Simulation state.
    #[must_use]
    pub const fn effect(&self) -> &EffectVariant {
        &self.effect
    }

    /// Live particles in the simulation.
    #[must_use]
    pub fn population(&self) -> usize {
        self.effect.population()
    }

    /// Surface size the current population was seeded for.
    #[must_use]
    pub const fn surface_config(&self) -> Option<SurfaceConfig> {
        self.seeded_for
    }

    /// The drawing backend.
    #[must_use]
    pub const fn surface(&self) -> &S {
        self.binding.surface()
    }

    /// The animation handle.
    #[must_use]
    pub const fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// The host container.
    #[must_use]
    pub const fn container(&self) -> &C {
        &self.container
    }

    /// The most recently rendered command list.
    #[must_use]
    pub const fn last_frame(&self) -> &Frame {
        &self.frame
    }

    fn kind(&self) -> &'static str {
        self.config.effect.kind()
    }

    fn clear_color(&self) -> Color {
        self.config
            .background
            .map_or(Color::TRANSPARENT, |rgb| rgb.with_alpha(1.0))
    }

    fn transition_to(&mut self, new_state: LifecycleState) {
        if self.state == new_state {
            return;
        }
        let old_state = self.state;
        self.state = new_state;
        tracing::info!(
            "Effect {} lifecycle: {} -> {}",
            self.kind(),
            old_state.name(),
            new_state.name()
        );
    }

    /// Brings the simulation in line with the container's current size.
    ///
    /// Returns `true` when the effect is seeded for a drawable surface.
    fn sync_size(&mut self) -> bool {
        let notified = self
            .subscription
            .as_mut()
            .is_some_and(ResizeSubscription::take_notification);

        let surface = self
            .container
            .content_size()
            .map(|(w, h)| SurfaceConfig::new(w, h, self.container.device_pixel_ratio()))
            .filter(SurfaceConfig::is_drawable);

        let Some(surface) = surface else {
            if self.seeded_for.take().is_some() {
                tracing::debug!("Effect {}: container not drawable, population cleared", self.kind());
                self.effect.clear();
                self.transition_to(LifecycleState::Initializing);
            }
            return false;
        };

        match self.seeded_for {
            Some(current) if current == surface => {
                if notified {
                    tracing::debug!("Effect {}: resize notification without size change", self.kind());
                }
                true
            }
            Some(current) => {
                self.transition_to(LifecycleState::Resizing);
                self.reseed(surface);
                self.stats.reseeds += 1;
                tracing::debug!(
                    "Effect {}: reseeded {}x{} -> {}x{}, population {}",
                    self.kind(),
                    current.width,
                    current.height,
                    surface.width,
                    surface.height,
                    self.effect.population()
                );
                self.transition_to(LifecycleState::Running);
                true
            }
            None => {
                self.reseed(surface);
                tracing::debug!(
                    "Effect {}: seeded {}x{}, population {}",
                    self.kind(),
                    surface.width,
                    surface.height,
                    self.effect.population()
                );
                self.transition_to(LifecycleState::Running);
                true
            }
        }
    }

    fn reseed(&mut self, surface: SurfaceConfig) {
        self.binding.resize(surface);
        self.effect.seed(&surface, &mut self.rng);
        self.seeded_for = Some(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BorderGlowConfig, EffectConfig};
    use crate::host::SharedContainer;
    use crate::surface::RecordingSurface;
    use ember_core::ManualDisplayLink;

    type Instance = EffectInstance<SharedContainer, RecordingSurface>;

    fn border_config() -> EngineConfig {
        EngineConfig {
            seed: 3,
            background: None,
            effect: EffectConfig::BorderGlow(BorderGlowConfig::default()),
        }
    }

    fn pump(instance: &mut Instance, link: &mut ManualDisplayLink, now_ms: f64) -> Vec<FrameOutcome> {
        let mut due = Vec::new();
        link.drain_due_into(&mut due);
        due.into_iter().map(|token| instance.on_frame(link, token, now_ms)).collect()
    }

    #[test]
    fn test_mount_seeds_and_runs() {
        let container = SharedContainer::new(200.0, 100.0);
        let channel = ResizeChannel::new();
        let mut link = ManualDisplayLink::new();
        let mut instance = Instance::new(container, RecordingSurface::new(), border_config());

        assert_eq!(instance.state(), LifecycleState::Unmounted);
        assert!(instance.mount(&mut link, &channel));
        assert_eq!(instance.state(), LifecycleState::Running);
        assert_eq!(instance.population(), 60);
        assert_eq!(channel.subscriber_count(), 1);
    }

    #[test]
    fn test_frame_draws_glow_and_core() {
        let mut link = ManualDisplayLink::new();
        let mut instance = Instance::new(SharedContainer::new(200.0, 100.0), RecordingSurface::new(), border_config());
        instance.mount(&mut link, &ResizeChannel::new());

        let outcomes = pump(&mut instance, &mut link, 0.0);
        assert_eq!(outcomes, vec![FrameOutcome::Drawn { commands: 120 }]);
        assert_eq!(instance.surface().presents(), 1);
    }

    #[test]
    fn test_frames_before_mount_are_skipped() {
        let mut link = ManualDisplayLink::new();
        let mut instance = Instance::new(SharedContainer::new(10.0, 10.0), RecordingSurface::new(), border_config());
        assert_eq!(instance.on_frame(&mut link, FrameToken::new(1), 0.0), FrameOutcome::Skipped);
    }

    #[test]
    fn test_reconfigure_unmounted_defers_seed() {
        let mut instance = Instance::new(SharedContainer::new(10.0, 10.0), RecordingSurface::new(), border_config());
        instance.reconfigure(EngineConfig::default());
        assert_eq!(instance.state(), LifecycleState::Unmounted);
        assert_eq!(instance.population(), 0);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(LifecycleState::Resizing.name(), "RESIZING");
        assert_eq!(LifecycleState::Disposed.name(), "DISPOSED");
    }
}
