//! # Frame Scheduler
//!
//! Drives one effect instance at the host's display refresh rate.
//!
//! The host refresh source is abstracted as a [`DisplayLink`]: the scheduler
//! asks it for one frame at a time and receives a [`FrameToken`] per request.
//! When the host fires a frame it hands the token back through
//! [`FrameScheduler::begin_frame`]. Only the single pending token is honored,
//! so a callback that was already queued when [`FrameScheduler::stop`] ran is
//! discarded instead of ticking.
//!
//! ```text
//!   start ──► request(t1) ──► host fires t1 ──► begin_frame(t1)
//!                                                 ├── request(t2)
//!                                                 └── tick(FrameTime)
//!   stop  ──► cancel(t2)    host fires t2 late ──► begin_frame(t2) = None
//! ```

/// Largest delta handed to a tick, in milliseconds.
///
/// A host that was backgrounded resumes with one long gap; integrating it in
/// one step would teleport every particle.
pub const MAX_FRAME_DELTA_MS: f64 = 100.0;

/// Identifier for one requested display frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    /// Creates a token from a host-assigned id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Host-assigned id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// The host's repeating frame source (a browser's animation frame callback,
/// a compositor vsync, a test pump).
pub trait DisplayLink {
    /// Requests one future frame. `None` means the host surface is gone.
    fn request_frame(&mut self) -> Option<FrameToken>;

    /// Withdraws a previously requested frame. Unknown tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Timing handed to a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Milliseconds since the previous tick, clamped to
    /// [`MAX_FRAME_DELTA_MS`]; 0 on the first tick.
    pub delta_ms: f32,
    /// Milliseconds since the first tick after `start`.
    pub elapsed_ms: f64,
    /// Ticks fired since `start`, starting at 1.
    pub frame: u64,
}

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Never started, or the host stopped handing out frames.
    Idle,
    /// A frame is (or will be) requested after every tick.
    Running,
    /// Stopped by its owner.
    Stopped,
}

/// Repeating per-frame callback driver. One per mounted effect.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    /// Current lifecycle state.
    state: SchedulerState,
    /// The only token that may tick.
    pending: Option<FrameToken>,
    /// Host timestamp of the first tick.
    origin_ms: Option<f64>,
    /// Host timestamp of the latest tick.
    last_ms: Option<f64>,
    /// Ticks since start.
    frames: u64,
}

impl FrameScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            pending: None,
            origin_ms: None,
            last_ms: None,
            frames: 0,
        }
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// True while frames are being requested.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Ticks fired since the last `start`.
    #[inline]
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Begins requesting frames.
    ///
    /// Returns `false` without changing state when the link cannot schedule
    /// (host surface unavailable). Starting a running scheduler is a no-op
    /// that returns `true`.
    pub fn start<L: DisplayLink + ?Sized>(&mut self, link: &mut L) -> bool {
        if self.is_running() {
            return true;
        }
        match link.request_frame() {
            Some(token) => {
                self.pending = Some(token);
                self.state = SchedulerState::Running;
                self.origin_ms = None;
                self.last_ms = None;
                self.frames = 0;
                true
            }
            None => false,
        }
    }

    /// Stops requesting frames and cancels the pending one.
    ///
    /// Idempotent; safe before `start`.
    pub fn stop<L: DisplayLink + ?Sized>(&mut self, link: &mut L) {
        if let Some(token) = self.pending.take() {
            link.cancel_frame(token);
        }
        if self.state == SchedulerState::Running {
            self.state = SchedulerState::Stopped;
        }
    }

    /// Accepts a fired frame.
    ///
    /// Returns the frame timing when `token` is the pending one and the
    /// scheduler is running; the next frame has already been requested by
    /// then, so a `stop` issued while handling this tick cancels it. Stale or
    /// foreign tokens return `None`.
    pub fn begin_frame<L: DisplayLink + ?Sized>(
        &mut self,
        link: &mut L,
        token: FrameToken,
        now_ms: f64,
    ) -> Option<FrameTime> {
        if !self.is_running() || self.pending != Some(token) {
            return None;
        }

        self.pending = link.request_frame();
        if self.pending.is_none() {
            // Host went away; a later `start` may resume.
            self.state = SchedulerState::Idle;
        }

        let now = if now_ms.is_finite() { now_ms } else { self.last_ms.unwrap_or(0.0) };
        let delta = match self.last_ms {
            Some(last) if now > last => (now - last).min(MAX_FRAME_DELTA_MS),
            _ => 0.0,
        };
        let origin = *self.origin_ms.get_or_insert(now);
        self.last_ms = Some(self.last_ms.map_or(now, |last| last.max(now)));
        self.frames += 1;

        Some(FrameTime {
            delta_ms: delta as f32,
            elapsed_ms: (now - origin).max(0.0),
            frame: self.frames,
        })
    }

    /// Accepts a fired frame and runs `tick` if it is due.
    ///
    /// Returns whether `tick` ran.
    pub fn dispatch<L, F>(&mut self, link: &mut L, token: FrameToken, now_ms: f64, tick: F) -> bool
    where
        L: DisplayLink + ?Sized,
        F: FnOnce(FrameTime),
    {
        match self.begin_frame(link, token, now_ms) {
            Some(time) => {
                tick(time);
                true
            }
            None => false,
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process display link pumped explicitly by its owner.
///
/// Requested frames queue up until [`drain_due_into`](Self::drain_due_into)
/// hands them to the host loop; cancelled frames are forgotten. Headless previews and
/// tests drive effects with it.
#[derive(Debug, Clone)]
pub struct ManualDisplayLink {
    /// Whether the link hands out frames.
    available: bool,
    /// Next token id.
    next_id: u64,
    /// Requested, not yet fired, not cancelled.
    queued: Vec<FrameToken>,
    /// Total requests granted.
    requests: u64,
    /// Total cancellations received.
    cancellations: u64,
}

impl ManualDisplayLink {
    /// Creates an available link with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: true,
            next_id: 1,
            queued: Vec::with_capacity(4),
            requests: 0,
            cancellations: 0,
        }
    }

    /// Makes the link refuse (or accept) further requests.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Whether the link hands out frames.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    /// Moves the frames due now into `due`, oldest first, replacing its
    /// contents.
    ///
    /// The link and the caller swap buffers, so a host that keeps `due`
    /// across ticks never allocates. Frames requested while the caller
    /// handles `due` wait for the next drain.
    pub fn drain_due_into(&mut self, due: &mut Vec<FrameToken>) {
        due.clear();
        std::mem::swap(&mut self.queued, due);
    }

    /// Frames requested and not yet fired or cancelled.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queued.len()
    }

    /// Total requests granted.
    #[must_use]
    pub const fn requests(&self) -> u64 {
        self.requests
    }

    /// Total cancellations received.
    #[must_use]
    pub const fn cancellations(&self) -> u64 {
        self.cancellations
    }
}

impl Default for ManualDisplayLink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayLink for ManualDisplayLink {
    fn request_frame(&mut self) -> Option<FrameToken> {
        if !self.available {
            return None;
        }
        let token = FrameToken::new(self.next_id);
        self.next_id += 1;
        self.requests += 1;
        self.queued.push(token);
        Some(token)
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.cancellations += 1;
        self.queued.retain(|queued| *queued != token);
    }
}
