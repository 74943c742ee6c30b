#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Admission-controlled population scheduler.
//!
//! A wave's population is split into an initial batch, materialized at once,
//! and a reserve backlog that backfills one entity per reported kill. The
//! number of materialized entities therefore never exceeds the active cap no
//! matter how large the wave grows.
//!
//! Eliminated entities stay in the pool until [`PopulationScheduler::sweep`]
//! runs at the end of the tick, so a batch of kills within one frame can be
//! reported in any order without invalidating handles mid-iteration.

use std::{collections::VecDeque, time::Duration};

use rand::seq::SliceRandom;
use swarm_waves_core::{
    CompositionWeights, EnemyKind, EntityHandle, Event, PopulationCounters, PopulationSnapshot,
    Position, ReserveEntry, SpawnSource, WaveConfig, WaveTarget,
};
use swarm_waves_pool::{DamageOutcome, EntityPool, PoolError, PooledEntity};
use swarm_waves_system_composition::split_population;
use swarm_waves_system_placement::{
    derive_wave_seed, wave_rng, SpawnPlacement, RNG_STREAM_INITIAL, RNG_STREAM_PLACEMENT,
    RNG_STREAM_RESERVE,
};

/// Number of reserve entries included in snapshots.
const RESERVE_SAMPLE_LEN: usize = 5;

/// Effect of a kill notification on the population.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillOutcome {
    /// The kill was counted and a reserve entry took the entity's place.
    Backfilled {
        /// Handle of the replacement entity.
        replacement: EntityHandle,
    },
    /// The kill was counted and the active population shrank by one.
    Retired,
    /// The notification did not match a live entity of the current wave.
    Ignored,
}

/// Owns the active/reserve split of the wave in progress.
#[derive(Debug)]
pub struct PopulationScheduler {
    pool: EntityPool,
    placement: SpawnPlacement,
    global_seed: u64,
    reference: Position,
    target: Option<WaveTarget>,
    active: u32,
    killed: u32,
    reserve: VecDeque<ReserveEntry>,
    live: Vec<EntityHandle>,
    marked: Vec<EntityHandle>,
    positions: Vec<Position>,
}

impl PopulationScheduler {
    /// Creates a scheduler drawing entities from `pool`.
    #[must_use]
    pub fn new(config: &WaveConfig, pool: EntityPool) -> Self {
        Self {
            pool,
            placement: SpawnPlacement::new(config.placement, config.rng_seed),
            global_seed: config.rng_seed,
            reference: Position::ORIGIN,
            target: None,
            active: 0,
            killed: 0,
            reserve: VecDeque::new(),
            live: Vec::new(),
            marked: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Creates a scheduler with a pool warmed to the configured sizes.
    pub fn from_config(config: &WaveConfig) -> Result<Self, PoolError> {
        let pool = EntityPool::with_warm_sizes(&config.warm_sizes())?;
        Ok(Self::new(config, pool))
    }

    /// Moves the point new entities are placed around.
    pub fn set_reference_point(&mut self, reference: Position) {
        self.reference = reference;
    }

    /// Point new entities are placed around.
    #[must_use]
    pub fn reference_point(&self) -> Position {
        self.reference
    }

    /// Starts a wave, materializing its initial batch and queueing the rest.
    ///
    /// Any wave still in progress is reset first.
    pub fn start_wave(
        &mut self,
        target: WaveTarget,
        weights: &CompositionWeights,
        out: &mut Vec<Event>,
    ) -> Result<(), PoolError> {
        if self.target.is_some() || !self.live.is_empty() {
            self.reset(out);
        }

        let wave = target.wave();
        let split = split_population(&target, weights);

        let mut reserve: Vec<ReserveEntry> = expand_kinds(split.reserve.iter())
            .map(|kind| ReserveEntry {
                kind,
                spawn_distance: self.placement.spawn_distance(kind),
            })
            .collect();
        reserve.shuffle(&mut wave_rng(self.global_seed, wave, RNG_STREAM_RESERVE));
        self.reserve = reserve.into();

        let mut initial: Vec<EnemyKind> = expand_kinds(split.initial.iter()).collect();
        initial.shuffle(&mut wave_rng(self.global_seed, wave, RNG_STREAM_INITIAL));

        for (kind, count) in split.initial.iter() {
            if count > 0 {
                let minimum = self.pool.live_count_of(kind) + count as usize;
                let _ = self.pool.grow_to(kind, minimum)?;
            }
        }

        self.placement
            .reseed(derive_wave_seed(self.global_seed, wave, RNG_STREAM_PLACEMENT));
        self.positions.clear();
        self.placement
            .place_batch(initial.len(), self.reference, &mut self.positions);

        self.target = Some(target);
        self.killed = 0;
        self.active = 0;
        self.live.reserve(initial.len());
        for (kind, position) in initial.into_iter().zip(self.positions.iter().copied()) {
            let handle = self.pool.acquire(kind, position, wave)?;
            self.live.push(handle);
            self.active += 1;
            out.push(Event::EntitySpawned {
                handle,
                kind,
                position,
                source: SpawnSource::Initial,
            });
        }

        tracing::info!(
            wave,
            total_target = target.total_target(),
            initial = self.active,
            reserve = self.reserve.len(),
            "wave population started"
        );
        self.enforce_conservation();
        Ok(())
    }

    /// Counts a kill and backfills the entity from the reserve when possible.
    ///
    /// The eliminated entity stays in the pool until the next [`sweep`].
    /// Kills that do not name a live entity of the current wave are ignored
    /// with a warning.
    ///
    /// [`sweep`]: PopulationScheduler::sweep
    pub fn on_entity_killed(
        &mut self,
        handle: EntityHandle,
        out: &mut Vec<Event>,
    ) -> Result<KillOutcome, PoolError> {
        let Some(target) = self.target else {
            tracing::warn!(?handle, "kill reported while no wave is in progress");
            return Ok(KillOutcome::Ignored);
        };
        if !self.pool.is_live(handle) || self.marked.contains(&handle) {
            tracing::warn!(?handle, "kill reported for stale or already eliminated entity");
            return Ok(KillOutcome::Ignored);
        }
        if self.active == 0 && self.reserve.is_empty() {
            tracing::warn!(
                ?handle,
                killed = self.killed,
                "kill reported with no active or reserve population left"
            );
            return Ok(KillOutcome::Ignored);
        }

        self.marked.push(handle);
        self.killed += 1;

        let outcome = match self.reserve.pop_front() {
            Some(entry) => {
                let position = self
                    .placement
                    .place_at_distance(entry.spawn_distance, self.reference);
                match self.pool.acquire(entry.kind, position, target.wave()) {
                    Ok(replacement) => {
                        self.live.push(replacement);
                        out.push(Event::EntitySpawned {
                            handle: replacement,
                            kind: entry.kind,
                            position,
                            source: SpawnSource::Reserve,
                        });
                        KillOutcome::Backfilled { replacement }
                    }
                    Err(error) => {
                        self.reserve.push_front(entry);
                        self.active = self.active.saturating_sub(1);
                        self.enforce_conservation();
                        return Err(error);
                    }
                }
            }
            None => {
                self.active -= 1;
                KillOutcome::Retired
            }
        };

        self.enforce_conservation();
        Ok(outcome)
    }

    /// Processes kills observed within one frame, last to first.
    pub fn on_entities_killed(
        &mut self,
        handles: &[EntityHandle],
        out: &mut Vec<Event>,
    ) -> Result<(), PoolError> {
        for handle in handles.iter().rev() {
            let _ = self.on_entity_killed(*handle, out)?;
        }
        Ok(())
    }

    /// Releases entities eliminated since the previous sweep.
    pub fn sweep(&mut self, out: &mut Vec<Event>) {
        if self.marked.is_empty() {
            return;
        }
        for handle in self.marked.drain(..) {
            if self.pool.release(handle) {
                out.push(Event::EntityReleased { handle });
            }
        }
        self.live.retain(|handle| self.pool.is_live(*handle));
    }

    /// Releases every entity, empties the reserve and zeroes the counters.
    pub fn reset(&mut self, out: &mut Vec<Event>) {
        let mut released = Vec::new();
        let count = self.pool.release_all(&mut released);
        out.extend(
            released
                .into_iter()
                .map(|handle| Event::EntityReleased { handle }),
        );
        tracing::debug!(
            released = count,
            discarded_reserve = self.reserve.len(),
            "population reset"
        );

        self.target = None;
        self.active = 0;
        self.killed = 0;
        self.reserve.clear();
        self.live.clear();
        self.marked.clear();
    }

    /// Advances per-entity timers of every materialized entity.
    pub fn advance(&mut self, dt: Duration) {
        self.pool.advance(dt);
    }

    /// Applies damage to a live entity; stale handles yield `None`.
    pub fn apply_damage(&mut self, handle: EntityHandle, amount: f32) -> Option<DamageOutcome> {
        self.pool.apply_damage(handle, amount)
    }

    /// Reports whether every entity of the wave has been eliminated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.target
            .is_some_and(|target| self.killed >= target.total_target())
    }

    /// Reports whether the wave is complete and no entity remains in the world.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.is_complete() && self.marked.is_empty() && self.pool.live_count() == 0
    }

    /// Plan of the wave in progress.
    #[must_use]
    pub fn target(&self) -> Option<WaveTarget> {
        self.target
    }

    /// Current population counters.
    #[must_use]
    pub fn counters(&self) -> PopulationCounters {
        PopulationCounters {
            active: self.active,
            killed: self.killed,
            reserve_remaining: saturating_u32(self.reserve.len()),
        }
    }

    /// Handles of materialized entities, including those eliminated this tick.
    #[must_use]
    pub fn live_handles(&self) -> &[EntityHandle] {
        &self.live
    }

    /// Entries still waiting in the reserve, front first.
    pub fn reserve(&self) -> impl Iterator<Item = &ReserveEntry> + '_ {
        self.reserve.iter()
    }

    /// Resolves a live handle.
    #[must_use]
    pub fn entity(&self, handle: EntityHandle) -> Option<&PooledEntity> {
        self.pool.get(handle)
    }

    /// Pool backing the scheduler.
    #[must_use]
    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    /// Internal state for diagnostics.
    #[must_use]
    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot {
            target: self.target,
            counters: self.counters(),
            pending_removals: self.marked.len(),
            live_entities: self.live.len(),
            reserve_sample: self
                .reserve
                .iter()
                .take(RESERVE_SAMPLE_LEN)
                .copied()
                .collect(),
        }
    }

    fn enforce_conservation(&mut self) {
        let Some(target) = self.target else {
            return;
        };
        let counters = self.counters();
        let consistent = counters.accounted() == target.total_target()
            && counters.active <= target.active_cap();
        debug_assert!(
            consistent,
            "population invariant violated: {counters:?} for {target:?}"
        );
        if consistent {
            return;
        }

        let corrected = target
            .total_target()
            .saturating_sub(counters.killed)
            .saturating_sub(counters.reserve_remaining)
            .min(target.active_cap());
        tracing::error!(
            wave = target.wave(),
            active = counters.active,
            killed = counters.killed,
            reserve = counters.reserve_remaining,
            corrected,
            "population invariant violated, clamping active count"
        );
        self.active = corrected;
    }
}

fn expand_kinds(
    counts: impl Iterator<Item = (EnemyKind, u32)>,
) -> impl Iterator<Item = EnemyKind> {
    counts.flat_map(|(kind, count)| std::iter::repeat(kind).take(count as usize))
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_waves_system_composition::composition;

    fn scheduler() -> PopulationScheduler {
        PopulationScheduler::from_config(&WaveConfig::default()).expect("scheduler")
    }

    #[test]
    fn kill_without_wave_is_ignored() {
        let mut scheduler = scheduler();
        let mut events = Vec::new();
        let handle = EntityHandle::new(EnemyKind::Normal, 0, 1);
        let outcome = scheduler
            .on_entity_killed(handle, &mut events)
            .expect("kill");
        assert_eq!(outcome, KillOutcome::Ignored);
        assert!(events.is_empty());
    }

    #[test]
    fn reserve_entries_carry_kind_standoff() {
        let mut scheduler = scheduler();
        let mut events = Vec::new();
        scheduler
            .start_wave(WaveTarget::new(260, 200), &composition(260), &mut events)
            .expect("start");
        for entry in scheduler.reserve() {
            let expected = 600.0 * entry.kind.standoff_factor();
            assert!((entry.spawn_distance - expected).abs() < 0.01);
        }
        assert_eq!(scheduler.snapshot().reserve_sample.len(), RESERVE_SAMPLE_LEN);
    }

    #[test]
    fn double_kill_in_same_tick_counts_once() {
        let mut scheduler = scheduler();
        let mut events = Vec::new();
        scheduler
            .start_wave(WaveTarget::new(3, 200), &composition(3), &mut events)
            .expect("start");
        let handle = scheduler.live_handles()[0];

        let first = scheduler.on_entity_killed(handle, &mut events).expect("kill");
        let second = scheduler.on_entity_killed(handle, &mut events).expect("kill");
        assert_eq!(first, KillOutcome::Retired);
        assert_eq!(second, KillOutcome::Ignored);
        assert_eq!(scheduler.counters().killed, 1);
    }
}
