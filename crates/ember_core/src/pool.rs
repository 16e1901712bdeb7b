//! # Particle Pool
//!
//! The live collection of particles for one effect instance.
//!
//! Per tick the owning effect calls, in order:
//! 1. [`ParticlePool::step`] - age every particle by exactly one tick and run
//!    the effect's integration closure with the frame delta
//! 2. [`ParticlePool::cull`] - drop expired and out-of-bounds particles
//! 3. [`ParticlePool::emit_until`] - refill populations kept by emission
//! 4. [`ParticlePool::sort_by_depth`] - only when depth ordering matters
//!
//! # Thread Safety
//!
//! Not thread-safe. A pool belongs to exactly one effect instance.

use crate::math::Vec2;
use crate::particle::Particle;
use crate::random::EffectRng;

/// Stochastic constructor for one particle.
///
/// `index` is the slot the particle will occupy. Seeding fills slots in
/// order, so an effect can split one pool into sub-populations by index.
pub trait SpawnRule<E> {
    /// Builds a fresh particle.
    fn spawn(&self, index: usize, rng: &mut EffectRng) -> Particle<E>;

    /// Builds the replacement for `previous` under
    /// [`ExpiryPolicy::RespawnInPlace`].
    ///
    /// Slots are reordered by [`ParticlePool::sort_by_depth`], so rules that
    /// key sub-populations on `index` override this to carry the
    /// sub-population over from `previous` instead.
    fn respawn(&self, index: usize, _previous: &Particle<E>, rng: &mut EffectRng) -> Particle<E> {
        self.spawn(index, rng)
    }
}

impl<E, F> SpawnRule<E> for F
where
    F: Fn(usize, &mut EffectRng) -> Particle<E>,
{
    fn spawn(&self, index: usize, rng: &mut EffectRng) -> Particle<E> {
        self(index, rng)
    }
}

/// What happens to a particle whose age passes `max_age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Replace it in the same slot (constant population).
    RespawnInPlace,
    /// Mark it for removal; the effect re-emits to keep its population.
    Remove,
}

/// Axis-aligned region a particle must stay inside to survive a cull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullBounds {
    /// Inclusive minimum corner.
    pub min: Vec2,
    /// Inclusive maximum corner.
    pub max: Vec2,
}

impl CullBounds {
    /// Creates bounds from two corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// True when `point` lies inside (edges included).
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Counters for the most recent tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Particles alive after the last operation.
    pub alive: u32,
    /// Particles spawned this tick (seeding and emission).
    pub spawned: u32,
    /// Particles replaced in place this tick.
    pub respawned: u32,
    /// Particles marked for removal by age this tick.
    pub expired: u32,
    /// Particles removed by the last cull.
    pub culled: u32,
}

/// Growable particle collection with an optional hard limit.
#[derive(Debug, Clone)]
pub struct ParticlePool<E> {
    /// Live particles, in render order after `sort_by_depth`.
    particles: Vec<Particle<E>>,
    /// Expiry behavior.
    policy: ExpiryPolicy,
    /// Off-surface region for culling.
    bounds: Option<CullBounds>,
    /// Maximum population, if any.
    limit: Option<usize>,
    /// Counters for the current tick.
    stats: PoolStats,
}

impl<E> ParticlePool<E> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            particles: Vec::new(),
            policy,
            bounds: None,
            limit: None,
            stats: PoolStats::default(),
        }
    }

    /// Creates an empty pool that refuses to grow past `limit` particles.
    ///
    /// Storage for the full limit is reserved upfront.
    #[must_use]
    pub fn with_capacity_limit(policy: ExpiryPolicy, limit: usize) -> Self {
        Self {
            particles: Vec::with_capacity(limit),
            limit: Some(limit),
            ..Self::new(policy)
        }
    }

    /// Returns the expiry policy.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// Sets (or clears) the region used by [`cull`](Self::cull).
    pub fn set_bounds(&mut self, bounds: Option<CullBounds>) {
        self.bounds = bounds;
    }

    /// Returns the cull region.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Option<CullBounds> {
        self.bounds
    }

    /// Number of live particles.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True when the pool holds no particles.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Counters for the current tick.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Live particles as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Particle<E>] {
        &self.particles
    }

    /// Iterates over live particles.
    pub fn iter(&self) -> std::slice::Iter<'_, Particle<E>> {
        self.particles.iter()
    }

    /// Iterates mutably over live particles.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle<E>> {
        self.particles.iter_mut()
    }

    /// Constructs one particle with `rule` and inserts it.
    ///
    /// Returns `None` when the pool is at its limit.
    pub fn spawn<R: SpawnRule<E> + ?Sized>(
        &mut self,
        rule: &R,
        rng: &mut EffectRng,
    ) -> Option<&Particle<E>> {
        if self.limit.is_some_and(|limit| self.particles.len() >= limit) {
            return None;
        }
        let index = self.particles.len();
        self.particles.push(rule.spawn(index, rng));
        self.stats.spawned += 1;
        self.stats.alive = self.particles.len() as u32;
        self.particles.last()
    }

    /// Spawns until the population reaches `target` (or the limit).
    ///
    /// Returns the number of particles spawned.
    pub fn emit_until<R: SpawnRule<E> + ?Sized>(
        &mut self,
        target: usize,
        rule: &R,
        rng: &mut EffectRng,
    ) -> usize {
        let mut spawned = 0;
        while self.particles.len() < target {
            if self.spawn(rule, rng).is_none() {
                break;
            }
            spawned += 1;
        }
        spawned
    }

    /// Advances every particle by one tick.
    ///
    /// Age grows by exactly 1 regardless of `dt_ms`; `integrate` receives the
    /// delta for time-based fields. A particle whose age passes `max_age` is
    /// replaced via `rule` or marked for removal, depending on the policy.
    pub fn step<R, F>(&mut self, dt_ms: f32, rule: &R, rng: &mut EffectRng, mut integrate: F)
    where
        R: SpawnRule<E> + ?Sized,
        F: FnMut(&mut Particle<E>, f32),
    {
        self.stats.spawned = 0;
        self.stats.respawned = 0;
        self.stats.expired = 0;

        for (index, particle) in self.particles.iter_mut().enumerate() {
            if particle.is_expired() {
                continue;
            }

            particle.age = particle.age.saturating_add(1);
            integrate(particle, dt_ms);

            if particle.is_over_age() {
                match self.policy {
                    ExpiryPolicy::RespawnInPlace => {
                        let fresh = rule.respawn(index, particle, rng);
                        *particle = fresh;
                        self.stats.respawned += 1;
                    }
                    ExpiryPolicy::Remove => {
                        particle.mark_expired();
                        self.stats.expired += 1;
                    }
                }
            }
        }
    }

    /// Removes expired, over-age, non-finite, and out-of-bounds particles.
    ///
    /// Returns the number removed.
    pub fn cull(&mut self) -> usize {
        let before = self.particles.len();
        let bounds = self.bounds;
        self.particles.retain(|p| {
            !p.is_expired()
                && !p.is_over_age()
                && p.position.is_finite()
                && bounds.map_or(true, |b| b.contains(p.position))
        });
        let culled = before - self.particles.len();
        self.stats.culled = culled as u32;
        self.stats.alive = self.particles.len() as u32;
        culled
    }

    /// Orders particles back-to-front (non-decreasing `depth`).
    pub fn sort_by_depth(&mut self) {
        self.particles.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    }

    /// Removes every particle and resets the counters.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.stats = PoolStats::default();
    }
}
