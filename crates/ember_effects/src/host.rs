//! # Host Container and Resize Channel
//!
//! The engine's view of the page it is embedded in: a container whose
//! content-box size it reads, and a shared channel the host pokes when
//! layout changes. Both are cloneable handles so a windowing thread may
//! update them while instances poll from the frame callback.
//!
//! ```text
//!   host layout ──notify()──► ResizeChannel ──flag──► ResizeSubscription (per instance)
//!   host layout ──set_size()──► SharedContainer ──content_size()──► EffectInstance
//! ```
//!
//! Every subscription is released exactly once, either through
//! [`ResizeSubscription::unsubscribe`] or when it is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// A sized element an effect is mounted into.
pub trait HostContainer {
    /// Current content-box size in logical pixels, or `None` once the
    /// element has left the document.
    fn content_size(&self) -> Option<(f32, f32)>;

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }
}

#[derive(Debug)]
struct ContainerState {
    size: Option<(f32, f32)>,
    device_pixel_ratio: f32,
}

/// Container whose size the host updates through a shared handle.
#[derive(Debug, Clone)]
pub struct SharedContainer {
    inner: Arc<Mutex<ContainerState>>,
}

impl SharedContainer {
    /// Creates a mounted container of the given logical size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ContainerState {
                size: Some((width, height)),
                device_pixel_ratio: 1.0,
            })),
        }
    }

    /// Sets the pixel density.
    #[must_use]
    pub fn with_device_pixel_ratio(self, ratio: f32) -> Self {
        self.inner.lock().device_pixel_ratio = ratio;
        self
    }

    /// Updates the content-box size (mounting the element if it was gone).
    pub fn set_size(&self, width: f32, height: f32) {
        self.inner.lock().size = Some((width, height));
    }

    /// Removes the element from the document.
    pub fn unmount(&self) {
        self.inner.lock().size = None;
    }
}

impl HostContainer for SharedContainer {
    fn content_size(&self) -> Option<(f32, f32)> {
        self.inner.lock().size
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.inner.lock().device_pixel_ratio
    }
}

#[derive(Debug, Default)]
struct ChannelState {
    next_id: u64,
    /// Subscriber id -> notification pending.
    subscribers: HashMap<u64, bool>,
}

/// Host-wide resize/visibility notification channel.
///
/// The only state effect instances share.
#[derive(Debug, Clone, Default)]
pub struct ResizeChannel {
    inner: Arc<Mutex<ChannelState>>,
}

impl ResizeChannel {
    /// Creates a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags every current subscriber.
    pub fn notify(&self) {
        for pending in self.inner.lock().subscribers.values_mut() {
            *pending = true;
        }
    }

    /// Registers a new listener.
    #[must_use]
    pub fn subscribe(&self) -> ResizeSubscription {
        let id = {
            let mut state = self.inner.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.insert(id, false);
            id
        };
        ResizeSubscription {
            id,
            channel: Arc::clone(&self.inner),
            active: true,
        }
    }

    /// Listeners currently registered.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

/// One instance's registration on a [`ResizeChannel`].
#[derive(Debug)]
pub struct ResizeSubscription {
    id: u64,
    channel: Arc<Mutex<ChannelState>>,
    active: bool,
}

impl ResizeSubscription {
    /// Returns and clears the pending notification flag.
    pub fn take_notification(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.channel
            .lock()
            .subscribers
            .get_mut(&self.id)
            .is_some_and(std::mem::take)
    }

    /// Removes the listener. Idempotent.
    pub fn unsubscribe(&mut self) {
        if self.active {
            self.channel.lock().subscribers.remove(&self.id);
            self.active = false;
        }
    }

    /// True until unsubscribed.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
