#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Swarm Waves engine.
//!
//! This crate defines the message surface that connects host adapters, the
//! wave controller, and the pure systems behind it. Hosts submit [`Command`]
//! values (ticks, kill notifications, enable toggles), the controller executes
//! them against the population scheduler it owns, and broadcasts [`Event`]
//! values describing every entity that was materialized or released and every
//! wave lifecycle transition. Read-only projections ([`WaveInfo`],
//! [`DebugSnapshot`]) are exposed for HUD and diagnostics collaborators.

mod config;

pub use config::{PlacementConfig, WaveConfig};

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Default number of entities allowed to be materialized simultaneously.
pub const DEFAULT_ACTIVE_CAP: u32 = 200;
/// Default final wave of the progression.
pub const DEFAULT_MAX_WAVE: u32 = 999;
/// Default duration of the post-wave clearing display.
pub const DEFAULT_CLEAR_DURATION: Duration = Duration::from_millis(3_000);
/// Number of distinct [`EnemyKind`] variants.
pub const ENEMY_KIND_COUNT: usize = 5;

/// Kinds of adversary entities scheduled by the wave system.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline melee chaser; absorbs rounding remainders during composition.
    Normal,
    /// Light, quick chaser.
    Fast,
    /// Heavy, slow melee brute.
    Tank,
    /// Ranged attacker that keeps its distance.
    Shooter,
    /// High-value entity that appears on boss waves and in the final tier.
    Boss,
}

impl EnemyKind {
    /// Every kind in canonical order. Per-kind tables are indexed in this order.
    pub const ALL: [EnemyKind; ENEMY_KIND_COUNT] = [
        EnemyKind::Normal,
        EnemyKind::Fast,
        EnemyKind::Tank,
        EnemyKind::Shooter,
        EnemyKind::Boss,
    ];

    /// Kind substituted whenever an unknown type tag is requested.
    pub const DEFAULT: EnemyKind = EnemyKind::Normal;

    /// Position of the kind inside per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Normal => 0,
            Self::Fast => 1,
            Self::Tank => 2,
            Self::Shooter => 3,
            Self::Boss => 4,
        }
    }

    /// Canonical lowercase tag used in configuration files and logs.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fast => "fast",
            Self::Tank => "tank",
            Self::Shooter => "shooter",
            Self::Boss => "boss",
        }
    }

    /// Parses a type tag, accepting the canonical tags and their role aliases
    /// (`common`, `heavy`, `ranged`).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "normal" | "common" => Some(Self::Normal),
            "fast" => Some(Self::Fast),
            "tank" | "heavy" => Some(Self::Tank),
            "shooter" | "ranged" => Some(Self::Shooter),
            "boss" => Some(Self::Boss),
            _ => None,
        }
    }

    /// Parses a type tag, substituting [`EnemyKind::DEFAULT`] for unknown tags.
    ///
    /// Unknown tags are a recoverable fault: a warning is logged and the caller
    /// always receives a usable kind.
    #[must_use]
    pub fn resolve_tag(tag: &str) -> Self {
        match Self::from_tag(tag) {
            Some(kind) => kind,
            None => {
                tracing::warn!(
                    tag,
                    fallback = Self::DEFAULT.tag(),
                    "unknown enemy type tag, substituting default kind"
                );
                Self::DEFAULT
            }
        }
    }

    /// Multiplier applied to the base ring radius for individual spawns.
    ///
    /// Heavy melee kinds close in from nearer, fast and ranged kinds start
    /// farther out. With the default 600 unit radius this yields 600 (normal),
    /// 700 (fast), 400 (tank), 650 (shooter) and 300 (boss).
    #[must_use]
    pub fn standoff_factor(self) -> f32 {
        match self {
            Self::Normal => 1.0,
            Self::Fast => 7.0 / 6.0,
            Self::Tank => 2.0 / 3.0,
            Self::Shooter => 13.0 / 12.0,
            Self::Boss => 0.5,
        }
    }

    /// Gameplay stats for the kind at the provided wave tier.
    #[must_use]
    pub fn profile(self, wave: u32) -> EnemyProfile {
        let wave = wave as f32;
        let base_health = 50.0 + wave * 10.0;
        let base_speed = 60.0 + wave * 5.0;
        let base_damage = 10.0 + wave * 2.0;

        match self {
            Self::Normal => EnemyProfile {
                health: base_health,
                speed: base_speed,
                damage: base_damage,
                attack_interval: Duration::from_millis(1_000),
                fire_interval: None,
                special_interval: None,
                size: 15.0,
            },
            Self::Fast => EnemyProfile {
                health: base_health * 0.6,
                speed: base_speed * 1.8,
                damage: base_damage * 0.7,
                attack_interval: Duration::from_millis(800),
                fire_interval: None,
                special_interval: None,
                size: 12.0,
            },
            Self::Tank => EnemyProfile {
                health: base_health * 2.5,
                speed: base_speed * 0.4,
                damage: base_damage * 1.8,
                attack_interval: Duration::from_millis(1_500),
                fire_interval: None,
                special_interval: None,
                size: 25.0,
            },
            Self::Shooter => EnemyProfile {
                health: base_health * 1.2,
                speed: base_speed * 0.7,
                damage: base_damage * 0.8,
                attack_interval: Duration::from_millis(1_200),
                fire_interval: Some(Duration::from_millis(2_000)),
                special_interval: None,
                size: 18.0,
            },
            Self::Boss => EnemyProfile {
                health: 800.0 + wave * 200.0,
                speed: 40.0 + wave * 3.0,
                damage: 25.0 + wave * 5.0,
                attack_interval: Duration::from_millis(1_000),
                fire_interval: Some(Duration::from_millis(1_500)),
                special_interval: Some(Duration::from_millis(8_000)),
                size: 60.0,
            },
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Wave-scaled gameplay stats applied to a pooled entity on acquisition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    /// Starting and maximum health.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Contact damage per attack.
    pub damage: f32,
    /// Minimum time between melee attacks.
    pub attack_interval: Duration,
    /// Time between ranged volleys, for kinds that fire projectiles.
    pub fire_interval: Option<Duration>,
    /// Time between special attacks, for kinds that have one.
    pub special_interval: Option<Duration>,
    /// Collision extent in world units.
    pub size: f32,
}

/// Location in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// World origin.
    pub const ORIGIN: Position = Position::new(0.0, 0.0);

    /// Creates a new position from world coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal world coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical world coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Position reached by travelling `radius` units from `self` at `angle` radians.
    #[must_use]
    pub fn offset_polar(self, angle: f32, radius: f32) -> Self {
        Self::new(self.x + angle.cos() * radius, self.y + angle.sin() * radius)
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Non-owning reference to a pooled entity record.
///
/// A handle is valid only while the record it names is active and still
/// carries the same generation. Releasing or resetting invalidates it; the
/// pool reports such handles as stale rather than resolving them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityHandle {
    kind: EnemyKind,
    slot: u32,
    generation: u32,
}

impl EntityHandle {
    /// Creates a handle for the provided pool slot.
    #[must_use]
    pub const fn new(kind: EnemyKind, slot: u32, generation: u32) -> Self {
        Self {
            kind,
            slot,
            generation,
        }
    }

    /// Kind of the pool the record lives in.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Index of the record inside its kind's pool.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Acquisition generation the handle was issued for.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Immutable sizing plan for a single wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveTarget {
    wave: u32,
    total_target: u32,
    active_cap: u32,
}

impl WaveTarget {
    /// Plans the provided wave. The elimination target equals the wave number.
    ///
    /// A zero cap would leave the wave unable to materialize anything, so the
    /// cap is raised to one.
    #[must_use]
    pub fn new(wave: u32, active_cap: u32) -> Self {
        Self {
            wave,
            total_target: wave,
            active_cap: active_cap.max(1),
        }
    }

    /// Wave number the plan describes.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Number of entities that must be eliminated to clear the wave.
    #[must_use]
    pub const fn total_target(&self) -> u32 {
        self.total_target
    }

    /// Maximum number of simultaneously materialized entities.
    #[must_use]
    pub const fn active_cap(&self) -> u32 {
        self.active_cap
    }

    /// Number of entities materialized when the wave starts.
    #[must_use]
    pub fn initial_count(&self) -> u32 {
        self.total_target.min(self.active_cap)
    }

    /// Number of entities held back in the reserve queue.
    #[must_use]
    pub fn reserve_count(&self) -> u32 {
        self.total_target.saturating_sub(self.active_cap)
    }
}

/// Fractional share of a wave's population assigned to each kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositionWeights {
    shares: [f64; ENEMY_KIND_COUNT],
}

impl CompositionWeights {
    /// Builds weights from explicit `(kind, share)` pairs. Shares are clamped
    /// to `0.0..=1.0`; kinds not listed receive zero.
    #[must_use]
    pub fn from_shares(shares: &[(EnemyKind, f64)]) -> Self {
        let mut weights = Self::default();
        for &(kind, share) in shares {
            weights.shares[kind.index()] = share.clamp(0.0, 1.0);
        }
        weights
    }

    /// Share assigned to the provided kind.
    #[must_use]
    pub fn share(&self, kind: EnemyKind) -> f64 {
        self.shares[kind.index()]
    }

    /// Returns a copy with the share of `kind` replaced.
    #[must_use]
    pub fn with_share(mut self, kind: EnemyKind, share: f64) -> Self {
        self.shares[kind.index()] = share.clamp(0.0, 1.0);
        self
    }

    /// Reports whether the kind receives a non-zero share.
    #[must_use]
    pub fn contains(&self, kind: EnemyKind) -> bool {
        self.share(kind) > 0.0
    }

    /// Sum of all shares; 1.0 for well-formed weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.shares.iter().sum()
    }

    /// Iterates `(kind, share)` pairs in canonical kind order.
    pub fn iter(&self) -> impl Iterator<Item = (EnemyKind, f64)> + '_ {
        EnemyKind::ALL
            .iter()
            .map(move |kind| (*kind, self.shares[kind.index()]))
    }
}

/// Integer entity counts per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindCounts {
    counts: [u32; ENEMY_KIND_COUNT],
}

impl KindCounts {
    /// Count recorded for the provided kind.
    #[must_use]
    pub fn get(&self, kind: EnemyKind) -> u32 {
        self.counts[kind.index()]
    }

    /// Overwrites the count recorded for the provided kind.
    pub fn set(&mut self, kind: EnemyKind, count: u32) {
        self.counts[kind.index()] = count;
    }

    /// Adds to the count recorded for the provided kind.
    pub fn add(&mut self, kind: EnemyKind, count: u32) {
        let slot = &mut self.counts[kind.index()];
        *slot = slot.saturating_add(count);
    }

    /// Sum of all per-kind counts.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts
            .iter()
            .fold(0u32, |sum, count| sum.saturating_add(*count))
    }

    /// Per-kind difference `self - other`, floored at zero.
    #[must_use]
    pub fn saturating_sub(&self, other: &KindCounts) -> KindCounts {
        let mut result = KindCounts::default();
        for kind in EnemyKind::ALL {
            result.set(kind, self.get(kind).saturating_sub(other.get(kind)));
        }
        result
    }

    /// Iterates `(kind, count)` pairs in canonical kind order.
    pub fn iter(&self) -> impl Iterator<Item = (EnemyKind, u32)> + '_ {
        EnemyKind::ALL
            .iter()
            .map(move |kind| (*kind, self.counts[kind.index()]))
    }
}

/// Descriptor of an entity that has not been materialized yet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReserveEntry {
    /// Kind the entity will be spawned as.
    pub kind: EnemyKind,
    /// Distance from the reference point at which the entity will appear.
    pub spawn_distance: f32,
}

/// Population counters of the wave in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationCounters {
    /// Entities currently materialized (or replaced within the current tick).
    pub active: u32,
    /// Entities eliminated since the wave started.
    pub killed: u32,
    /// Entities still waiting in the reserve queue.
    pub reserve_remaining: u32,
}

impl PopulationCounters {
    /// Sum of every population bucket; equals the wave's total target while a
    /// wave is in progress.
    #[must_use]
    pub fn accounted(&self) -> u32 {
        self.active
            .saturating_add(self.killed)
            .saturating_add(self.reserve_remaining)
    }
}

/// Origin of a materialized entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnSource {
    /// Part of the batch materialized when the wave started.
    Initial,
    /// Promoted from the reserve queue to backfill an eliminated entity.
    Reserve,
}

/// Whether the wave controller drives the progression at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerMode {
    /// Wave progression is active.
    Wave,
    /// The host runs its own non-wave mode; the controller stays idle.
    Legacy,
}

/// Lifecycle phase of the wave controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Waiting to start the current wave.
    Idle,
    /// Materializing the initial population.
    Populating,
    /// Wave running; kills are being counted.
    InProgress,
    /// Wave cleared; holding the completion display before advancing.
    Clearing,
    /// The final wave has been cleared.
    Finished,
}

/// Commands that express all permissible mutations of the wave system.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reports that a pooled entity was eliminated.
    EntityKilled {
        /// Handle of the eliminated entity.
        handle: EntityHandle,
    },
    /// Reports several eliminations observed within the same frame.
    ///
    /// Handles are processed back-to-front so reserve promotion is
    /// reproducible regardless of how the host compacts its own arrays.
    EntitiesKilled {
        /// Handles of the eliminated entities in host iteration order.
        handles: Vec<EntityHandle>,
    },
    /// Toggles whether the wave progression runs.
    SetEnabled {
        /// `true` activates wave mode, `false` aborts any wave and enters legacy mode.
        enabled: bool,
    },
    /// Moves the point new entities are placed around.
    SetReferencePoint {
        /// New reference point, typically the player's position.
        position: Position,
    },
    /// Aborts any wave in progress and rewinds to the starting wave.
    Restart,
}

/// Events broadcast by the wave controller after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// An entity was materialized and should be added to the world.
    EntitySpawned {
        /// Handle identifying the pooled record.
        handle: EntityHandle,
        /// Kind of the entity.
        kind: EnemyKind,
        /// Spawn location in world space.
        position: Position,
        /// Whether the entity belongs to the initial batch or the reserve.
        source: SpawnSource,
    },
    /// An entity was returned to the pool and must be removed from the world.
    EntityReleased {
        /// Handle that is no longer valid.
        handle: EntityHandle,
    },
    /// A wave started and its initial population was materialized.
    WaveStarted {
        /// Wave number.
        wave: u32,
        /// Entities to eliminate in the wave.
        total_target: u32,
        /// Entities materialized immediately.
        initial: u32,
        /// Entities held in reserve.
        reserve: u32,
    },
    /// Every entity of the wave was eliminated; the clearing display begins.
    WaveCompleted {
        /// Wave number that was cleared.
        wave: u32,
    },
    /// The clearing display finished and the next wave is ready to start.
    ClearingFinished {
        /// Wave that starts on the next tick.
        next_wave: u32,
    },
    /// The final wave was cleared.
    CampaignCompleted {
        /// Number of the final wave.
        final_wave: u32,
    },
    /// A wave was abandoned before completion.
    WaveAborted {
        /// Wave that was abandoned.
        wave: u32,
        /// Eliminations counted before the abort.
        killed: u32,
    },
    /// The controller switched between wave and legacy modes.
    ModeChanged {
        /// Mode that became active.
        mode: ControllerMode,
    },
}

/// Wave progress projection consumed by HUD collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveInfo {
    /// Current wave number.
    pub wave: u32,
    /// Final wave of the progression.
    pub max_wave: u32,
    /// Eliminations required to clear the current wave; zero before it starts.
    pub total_target: u32,
    /// Eliminations counted so far.
    pub killed: u32,
    /// Entities currently materialized.
    pub active: u32,
    /// Entities waiting in the reserve queue.
    pub reserve_remaining: u32,
    /// Whether the clearing display is running.
    pub is_clearing: bool,
    /// Fraction of the progression completed, `(wave - 1) / max_wave`.
    pub progress: f32,
}

/// Pool occupancy for a single kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindPoolStats {
    /// Kind the pool stores.
    pub kind: EnemyKind,
    /// Records owned by the pool.
    pub total: usize,
    /// Records currently acquired.
    pub active: usize,
    /// Records available for reuse.
    pub inactive: usize,
    /// Highest number of simultaneously acquired records observed.
    pub peak_active: usize,
}

impl KindPoolStats {
    /// Fraction of records currently acquired; zero for an empty pool.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.active as f64 / self.total as f64
    }
}

/// Pool performance counters and per-kind occupancy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Records constructed, including warm-up and growth.
    pub created: u64,
    /// Acquisitions satisfied by an existing record.
    pub reused: u64,
    /// Acquisitions that found an inactive record.
    pub hits: u64,
    /// Acquisitions that had to construct a record.
    pub misses: u64,
    /// Number of times a pool's storage was extended.
    pub growth_events: u64,
    /// Occupancy of every kind's pool in canonical kind order.
    pub kinds: Vec<KindPoolStats>,
}

impl PoolStats {
    /// Share of acquisitions served from the free list, if any happened.
    #[must_use]
    pub fn hit_rate(&self) -> Option<f64> {
        let lookups = self.hits + self.misses;
        (lookups > 0).then(|| self.hits as f64 / lookups as f64)
    }

    /// Share of handed-out records that were recycled rather than constructed.
    #[must_use]
    pub fn reuse_rate(&self) -> Option<f64> {
        let total = self.reused + self.created;
        (total > 0).then(|| self.reused as f64 / total as f64)
    }

    /// Records currently acquired across every kind.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.kinds.iter().map(|kind| kind.active).sum()
    }
}

/// Internal population state of the scheduler.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    /// Plan of the wave in progress, if any.
    pub target: Option<WaveTarget>,
    /// Population counters.
    pub counters: PopulationCounters,
    /// Eliminated handles waiting for the end-of-tick sweep.
    pub pending_removals: usize,
    /// Handles currently tracked as materialized.
    pub live_entities: usize,
    /// First few entries at the front of the reserve queue.
    pub reserve_sample: Vec<ReserveEntry>,
}

/// Full diagnostic view of the wave system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebugSnapshot {
    /// Active controller mode.
    pub mode: ControllerMode,
    /// Lifecycle phase.
    pub phase: WavePhase,
    /// Current wave number.
    pub wave: u32,
    /// Time spent in the current clearing display.
    pub clear_elapsed: Duration,
    /// Plan the following wave will use, absent once the final wave is reached.
    pub next_wave_target: Option<WaveTarget>,
    /// Scheduler state.
    pub population: PopulationSnapshot,
    /// Pool counters.
    pub pool: PoolStats,
}

#[cfg(test)]
mod tests {
    use super::{CompositionWeights, EnemyKind, KindCounts, PopulationCounters, WaveTarget};

    #[test]
    fn wave_target_splits_initial_and_reserve() {
        let small = WaveTarget::new(50, 200);
        assert_eq!(small.total_target(), 50);
        assert_eq!(small.initial_count(), 50);
        assert_eq!(small.reserve_count(), 0);

        let large = WaveTarget::new(250, 200);
        assert_eq!(large.initial_count(), 200);
        assert_eq!(large.reserve_count(), 50);
    }

    #[test]
    fn zero_cap_is_raised_to_one() {
        let target = WaveTarget::new(5, 0);
        assert_eq!(target.active_cap(), 1);
        assert_eq!(target.initial_count(), 1);
        assert_eq!(target.reserve_count(), 4);
    }

    #[test]
    fn tags_accept_role_aliases() {
        assert_eq!(EnemyKind::from_tag("common"), Some(EnemyKind::Normal));
        assert_eq!(EnemyKind::from_tag(" Heavy "), Some(EnemyKind::Tank));
        assert_eq!(EnemyKind::from_tag("ranged"), Some(EnemyKind::Shooter));
        assert_eq!(EnemyKind::from_tag("dragon"), None);
    }

    #[test]
    fn unknown_tag_resolves_to_default_kind() {
        assert_eq!(EnemyKind::resolve_tag("dragon"), EnemyKind::DEFAULT);
        assert_eq!(EnemyKind::resolve_tag("boss"), EnemyKind::Boss);
    }

    #[test]
    fn kind_indices_follow_canonical_order() {
        for (position, kind) in EnemyKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), position);
            assert_eq!(EnemyKind::from_tag(kind.tag()), Some(*kind));
        }
    }

    #[test]
    fn standoff_matches_reference_distances() {
        let expected = [
            (EnemyKind::Normal, 600.0),
            (EnemyKind::Fast, 700.0),
            (EnemyKind::Tank, 400.0),
            (EnemyKind::Shooter, 650.0),
            (EnemyKind::Boss, 300.0),
        ];
        for (kind, distance) in expected {
            let scaled = 600.0 * kind.standoff_factor();
            assert!((scaled - distance).abs() < 0.01, "{kind}: {scaled}");
        }
    }

    #[test]
    fn profiles_scale_with_wave() {
        let early = EnemyKind::Tank.profile(1);
        let late = EnemyKind::Tank.profile(100);
        assert!((early.health - 150.0).abs() < f32::EPSILON);
        assert!(late.health > early.health);
        assert!(EnemyKind::Boss.profile(1).special_interval.is_some());
        assert!(EnemyKind::Normal.profile(1).fire_interval.is_none());
    }

    #[test]
    fn weights_clamp_and_sum() {
        let weights = CompositionWeights::from_shares(&[
            (EnemyKind::Normal, 0.7),
            (EnemyKind::Fast, 0.2),
            (EnemyKind::Tank, 0.1),
            (EnemyKind::Boss, -1.0),
        ]);
        assert!((weights.total() - 1.0).abs() < 1e-9);
        assert!(!weights.contains(EnemyKind::Boss));
        assert!(!weights.contains(EnemyKind::Shooter));
    }

    #[test]
    fn kind_counts_saturate() {
        let mut larger = KindCounts::default();
        larger.set(EnemyKind::Normal, 5);
        larger.add(EnemyKind::Fast, 2);
        let mut smaller = KindCounts::default();
        smaller.set(EnemyKind::Normal, 7);
        smaller.set(EnemyKind::Fast, 1);

        let diff = larger.saturating_sub(&smaller);
        assert_eq!(diff.get(EnemyKind::Normal), 0);
        assert_eq!(diff.get(EnemyKind::Fast), 1);
        assert_eq!(larger.total(), 7);
    }

    #[test]
    fn counters_account_for_every_bucket() {
        let counters = PopulationCounters {
            active: 200,
            killed: 1,
            reserve_remaining: 49,
        };
        assert_eq!(counters.accounted(), 250);
    }
}
