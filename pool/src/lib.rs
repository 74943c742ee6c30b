#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-kind recycling storage for adversary entities.
//!
//! The pool owns every [`PooledEntity`] record for the lifetime of the
//! simulation. Acquisition pops a record from the kind's free list (a hit) or
//! grows storage when none is available (a miss); release pushes it back.
//! Callers only ever hold [`EntityHandle`] values, and each acquisition bumps
//! the record's generation so handles from earlier acquisitions are rejected.

mod entity;

pub use entity::{DamageOutcome, PooledEntity, StatusEffects};

use std::{collections::TryReserveError, time::Duration};

use swarm_waves_core::{
    EnemyKind, EntityHandle, KindCounts, KindPoolStats, PoolStats, Position, ENEMY_KIND_COUNT,
};
use thiserror::Error;

/// Failures raised while growing pool storage.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The allocator refused to extend the storage of a kind's pool.
    #[error("failed to grow {kind} pool to {requested} records")]
    Growth {
        /// Kind whose pool could not grow.
        kind: EnemyKind,
        /// Capacity that was requested.
        requested: usize,
        /// Allocator failure.
        #[source]
        source: TryReserveError,
    },
    /// Slot indices for the kind would no longer fit in a handle.
    #[error("{kind} pool cannot address more than {limit} records")]
    Exhausted {
        /// Kind whose pool ran out of addressable slots.
        kind: EnemyKind,
        /// Largest addressable record count.
        limit: usize,
    },
}

/// Largest number of records a single kind's pool can address.
const SLOT_LIMIT: usize = u32::MAX as usize;

/// Storage and free list for one kind.
#[derive(Debug)]
struct KindPool {
    kind: EnemyKind,
    records: Vec<PooledEntity>,
    free: Vec<u32>,
    active: usize,
    high_water: usize,
}

impl KindPool {
    fn new(kind: EnemyKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
            free: Vec::new(),
            active: 0,
            high_water: 0,
        }
    }

    /// Extends storage to at least `target` records, returning how many were added.
    fn reserve(&mut self, target: usize) -> Result<usize, PoolError> {
        if target <= self.records.len() {
            return Ok(0);
        }
        if target > SLOT_LIMIT {
            return Err(PoolError::Exhausted {
                kind: self.kind,
                limit: SLOT_LIMIT,
            });
        }

        let added = target - self.records.len();
        self.records
            .try_reserve_exact(added)
            .and_then(|()| self.free.try_reserve(added))
            .map_err(|source| PoolError::Growth {
                kind: self.kind,
                requested: target,
                source,
            })?;

        let first = self.records.len();
        self.records
            .extend((0..added).map(|_| PooledEntity::dormant(self.kind)));
        // Pushed in reverse so the lowest new slot is popped first.
        self.free.extend((first..target).rev().map(|slot| slot as u32));
        Ok(added)
    }

    fn record(&self, handle: EntityHandle) -> Option<&PooledEntity> {
        self.records
            .get(handle.slot() as usize)
            .filter(|record| record.is_active() && record.generation() == handle.generation())
    }

    fn record_mut(&mut self, handle: EntityHandle) -> Option<&mut PooledEntity> {
        self.records
            .get_mut(handle.slot() as usize)
            .filter(|record| record.is_active() && record.generation() == handle.generation())
    }

    fn stats(&self) -> KindPoolStats {
        KindPoolStats {
            kind: self.kind,
            total: self.records.len(),
            active: self.active,
            inactive: self.records.len() - self.active,
            peak_active: self.high_water,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Counters {
    created: u64,
    reused: u64,
    hits: u64,
    misses: u64,
    growth_events: u64,
}

/// Recycling storage for every adversary kind.
#[derive(Debug)]
pub struct EntityPool {
    pools: [KindPool; ENEMY_KIND_COUNT],
    counters: Counters,
}

impl Default for EntityPool {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityPool {
    /// Creates an empty pool; storage grows on first use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: EnemyKind::ALL.map(KindPool::new),
            counters: Counters::default(),
        }
    }

    /// Creates a pool with the provided number of dormant records per kind.
    pub fn with_warm_sizes(sizes: &KindCounts) -> Result<Self, PoolError> {
        let mut pool = Self::new();
        for (kind, size) in sizes.iter() {
            let added = pool.pools[kind.index()].reserve(size as usize)?;
            pool.counters.created += added as u64;
        }
        tracing::debug!(records = pool.capacity(), "entity pool warmed");
        Ok(pool)
    }

    /// Activates a record of `kind` at `position` with stats for `wave`.
    ///
    /// Storage grows by one fifth when the kind has no inactive record.
    pub fn acquire(
        &mut self,
        kind: EnemyKind,
        position: Position,
        wave: u32,
    ) -> Result<EntityHandle, PoolError> {
        let pool = &mut self.pools[kind.index()];
        let slot = match pool.free.pop() {
            Some(slot) => {
                self.counters.hits += 1;
                self.counters.reused += 1;
                slot
            }
            None => {
                self.counters.misses += 1;
                let target = grown_capacity(pool.records.len() + 1);
                let added = pool.reserve(target)?;
                self.counters.created += added as u64;
                self.counters.growth_events += 1;
                tracing::debug!(%kind, capacity = target, "entity pool grew on demand");
                match pool.free.pop() {
                    Some(slot) => slot,
                    None => {
                        return Err(PoolError::Exhausted {
                            kind,
                            limit: SLOT_LIMIT,
                        })
                    }
                }
            }
        };

        let record = &mut pool.records[slot as usize];
        record.activate(position, wave);
        pool.active += 1;
        pool.high_water = pool.high_water.max(pool.active);
        Ok(EntityHandle::new(kind, slot, record.generation()))
    }

    /// Acquires a record by type tag, substituting the default kind for unknown tags.
    pub fn acquire_tagged(
        &mut self,
        tag: &str,
        position: Position,
        wave: u32,
    ) -> Result<EntityHandle, PoolError> {
        self.acquire(EnemyKind::resolve_tag(tag), position, wave)
    }

    /// Returns the record named by `handle` to its free list.
    ///
    /// Releasing a stale or already released handle does nothing and reports `false`.
    pub fn release(&mut self, handle: EntityHandle) -> bool {
        let pool = &mut self.pools[handle.kind().index()];
        let Some(record) = pool.record_mut(handle) else {
            return false;
        };
        record.deactivate();
        pool.free.push(handle.slot());
        pool.active -= 1;
        true
    }

    /// Releases every active record, appending the invalidated handles to `out`.
    pub fn release_all(&mut self, out: &mut Vec<EntityHandle>) -> usize {
        let before = out.len();
        for pool in &mut self.pools {
            for (slot, record) in pool.records.iter_mut().enumerate() {
                if !record.is_active() {
                    continue;
                }
                out.push(EntityHandle::new(pool.kind, slot as u32, record.generation()));
                record.deactivate();
                pool.free.push(slot as u32);
            }
            pool.active = 0;
        }
        out.len() - before
    }

    /// Sizes the kind's storage to one fifth above `minimum` so a predictable
    /// batch does not grow the pool record by record. Never shrinks.
    ///
    /// Returns the number of records added.
    pub fn grow_to(&mut self, kind: EnemyKind, minimum: usize) -> Result<usize, PoolError> {
        let pool = &mut self.pools[kind.index()];
        let target = grown_capacity(minimum);
        if target <= pool.records.len() {
            return Ok(0);
        }
        let added = pool.reserve(target)?;
        self.counters.created += added as u64;
        self.counters.growth_events += 1;
        tracing::debug!(%kind, capacity = target, "entity pool pre-sized");
        Ok(added)
    }

    /// Advances attack timers and decays status effects of every active record.
    pub fn advance(&mut self, dt: Duration) {
        for pool in &mut self.pools {
            pool.records
                .iter_mut()
                .filter(|record| record.is_active())
                .for_each(|record| record.advance(dt));
        }
    }

    /// Reports whether `handle` still names an active record.
    #[must_use]
    pub fn is_live(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Resolves a live handle to its record.
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&PooledEntity> {
        self.pools[handle.kind().index()].record(handle)
    }

    /// Applies damage to a live record. Stale handles yield `None`.
    ///
    /// A [`DamageOutcome::Killed`] result leaves the record active; the host
    /// reports the kill and the scheduler releases it at the end of the tick.
    pub fn apply_damage(&mut self, handle: EntityHandle, amount: f32) -> Option<DamageOutcome> {
        self.pools[handle.kind().index()]
            .record_mut(handle)
            .map(|record| record.apply_damage(amount))
    }

    /// Points a live record at a new pursuit target.
    pub fn set_target(&mut self, handle: EntityHandle, target: Option<Position>) -> bool {
        match self.pools[handle.kind().index()].record_mut(handle) {
            Some(record) => {
                record.set_target(target);
                true
            }
            None => false,
        }
    }

    /// Extends the status effects of a live record.
    pub fn apply_status(&mut self, handle: EntityHandle, status: StatusEffects) -> bool {
        match self.pools[handle.kind().index()].record_mut(handle) {
            Some(record) => {
                record.apply_status(status);
                true
            }
            None => false,
        }
    }

    /// Active records across every kind.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.pools.iter().map(|pool| pool.active).sum()
    }

    /// Active records of a single kind.
    #[must_use]
    pub fn live_count_of(&self, kind: EnemyKind) -> usize {
        self.pools[kind.index()].active
    }

    /// Records owned by the kind's pool.
    #[must_use]
    pub fn capacity_of(&self, kind: EnemyKind) -> usize {
        self.pools[kind.index()].records.len()
    }

    /// Records owned across every kind.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pools.iter().map(|pool| pool.records.len()).sum()
    }

    /// Handles of every active record in canonical kind and slot order.
    pub fn iter_live(&self) -> impl Iterator<Item = (EntityHandle, &PooledEntity)> + '_ {
        self.pools.iter().flat_map(|pool| {
            pool.records
                .iter()
                .enumerate()
                .filter(|(_, record)| record.is_active())
                .map(move |(slot, record)| {
                    (
                        EntityHandle::new(pool.kind, slot as u32, record.generation()),
                        record,
                    )
                })
        })
    }

    /// Counters and per-kind occupancy.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.counters.created,
            reused: self.counters.reused,
            hits: self.counters.hits,
            misses: self.counters.misses,
            growth_events: self.counters.growth_events,
            kinds: self.pools.iter().map(KindPool::stats).collect(),
        }
    }
}

/// Capacity one fifth above `minimum`, rounded up.
fn grown_capacity(minimum: usize) -> usize {
    minimum.saturating_mul(6).saturating_add(4) / 5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warm(size: u32) -> EntityPool {
        let mut sizes = KindCounts::default();
        sizes.set(EnemyKind::Normal, size);
        EntityPool::with_warm_sizes(&sizes).expect("warm pool")
    }

    #[test]
    fn growth_rounds_up_by_a_fifth() {
        assert_eq!(grown_capacity(1), 2);
        assert_eq!(grown_capacity(5), 6);
        assert_eq!(grown_capacity(100), 120);
        assert_eq!(grown_capacity(101), 122);
    }

    #[test]
    fn lowest_slot_is_handed_out_first() {
        let mut pool = warm(4);
        let first = pool
            .acquire(EnemyKind::Normal, Position::ORIGIN, 1)
            .expect("acquire");
        assert_eq!(first.slot(), 0);
        assert_eq!(first.generation(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let mut pool = warm(2);
        let handle = pool
            .acquire(EnemyKind::Normal, Position::ORIGIN, 1)
            .expect("acquire");
        assert!(pool.release(handle));
        assert!(!pool.release(handle));
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.stats().kinds[0].inactive, 2);
    }

    #[test]
    fn stale_handles_do_not_resolve_after_reuse() {
        let mut pool = warm(1);
        let old = pool
            .acquire(EnemyKind::Normal, Position::ORIGIN, 1)
            .expect("acquire");
        assert!(pool.release(old));
        let new = pool
            .acquire(EnemyKind::Normal, Position::ORIGIN, 1)
            .expect("reacquire");

        assert_eq!(old.slot(), new.slot());
        assert!(!pool.is_live(old));
        assert!(pool.is_live(new));
        assert!(!pool.release(old));
        assert_eq!(pool.apply_damage(old, 5.0), None);
    }

    #[test]
    fn empty_pool_grows_on_demand() {
        let mut pool = EntityPool::new();
        let handle = pool
            .acquire(EnemyKind::Boss, Position::ORIGIN, 10)
            .expect("acquire");
        let stats = pool.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.growth_events, 1);
        assert_eq!(pool.capacity_of(EnemyKind::Boss), 2);
        assert_eq!(pool.get(handle).map(PooledEntity::wave), Some(10));
    }

    #[test]
    fn grow_to_sizes_above_the_request() {
        let mut pool = warm(10);
        assert_eq!(pool.grow_to(EnemyKind::Normal, 5).expect("noop"), 0);
        let added = pool.grow_to(EnemyKind::Normal, 50).expect("grow");
        assert_eq!(added, 50);
        assert_eq!(pool.capacity_of(EnemyKind::Normal), 60);
    }

    #[test]
    fn unknown_tag_acquires_default_kind() {
        let mut pool = EntityPool::new();
        let handle = pool
            .acquire_tagged("dragon", Position::ORIGIN, 1)
            .expect("acquire");
        assert_eq!(handle.kind(), EnemyKind::DEFAULT);
    }

    #[test]
    fn release_all_invalidates_every_handle() {
        let mut pool = EntityPool::new();
        let handles: Vec<_> = EnemyKind::ALL
            .iter()
            .map(|kind| pool.acquire(*kind, Position::ORIGIN, 1).expect("acquire"))
            .collect();
        let mut released = Vec::new();
        assert_eq!(pool.release_all(&mut released), handles.len());
        assert_eq!(released, handles);
        assert_eq!(pool.live_count(), 0);
        assert!(handles.iter().all(|handle| !pool.is_live(*handle)));
    }

    #[test]
    fn advance_decays_status_effects() {
        let mut pool = EntityPool::new();
        let handle = pool
            .acquire(EnemyKind::Shooter, Position::ORIGIN, 1)
            .expect("acquire");
        assert!(pool.apply_status(
            handle,
            StatusEffects {
                stun: Duration::from_millis(500),
                ..StatusEffects::default()
            }
        ));
        pool.advance(Duration::from_millis(200));

        let record = pool.get(handle).expect("live");
        assert_eq!(record.status().stun, Duration::from_millis(300));
        assert_eq!(record.timers().1, Duration::from_millis(200));
    }
}
