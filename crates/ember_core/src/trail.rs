//! Bounded position history for ribbon-style trails.
//!
//! The newest sample sits at the head. Pushing past the cap evicts the
//! oldest sample, so `len() <= cap()` holds after every operation. The
//! history only feeds rendering; simulation never reads it.

use std::collections::VecDeque;

use crate::math::Vec2;

/// Smallest cap that still describes a segment.
const MIN_CAP: usize = 2;
/// Samples reserved up front; longer histories grow on demand.
const INITIAL_CAPACITY: usize = 64;

/// Ordered, bounded sequence of historical positions.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegmentBuffer {
    /// Samples, newest first.
    points: VecDeque<Vec2>,
    /// Maximum number of samples.
    cap: usize,
}

impl PathSegmentBuffer {
    /// Creates an empty buffer. Caps below 2 are raised to 2.
    ///
    /// Storage is not reserved for the whole cap, only for the first
    /// samples; it grows with the history and stops at the cap.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(MIN_CAP);
        Self {
            points: VecDeque::with_capacity(cap.min(INITIAL_CAPACITY)),
            cap,
        }
    }

    /// Maximum number of samples.
    #[inline]
    #[must_use]
    pub const fn cap(&self) -> usize {
        self.cap
    }

    /// Number of stored samples.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no samples are stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inserts the newest sample, evicting the oldest past the cap.
    pub fn push(&mut self, point: Vec2) {
        if self.points.len() >= self.cap {
            self.points.pop_back();
        }
        self.points.push_front(point);
    }

    /// Newest sample.
    #[must_use]
    pub fn head(&self) -> Option<Vec2> {
        self.points.front().copied()
    }

    /// Oldest sample.
    #[must_use]
    pub fn tail(&self) -> Option<Vec2> {
        self.points.back().copied()
    }

    /// Samples from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.points.iter().copied()
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}
