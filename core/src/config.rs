//! Tuning surface shared by the wave controller and its systems.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{EnemyKind, KindCounts, DEFAULT_ACTIVE_CAP, DEFAULT_CLEAR_DURATION, DEFAULT_MAX_WAVE};

const DEFAULT_BASE_RADIUS: f32 = 600.0;
const DEFAULT_RING_STEP: f32 = 60.0;
const DEFAULT_RING_CAPACITY: u32 = 12;
const DEFAULT_RNG_SEED: u64 = 0x5eed_57a6_e0f1_a4c3;

/// Aggregated knobs controlling every adjustable aspect of the wave system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Maximum number of simultaneously materialized entities.
    pub active_cap: u32,
    /// Final wave; clearing it ends the progression.
    pub max_wave: u32,
    /// Wave the progression starts from and rewinds to on restart.
    pub starting_wave: u32,
    /// Length of the post-wave clearing display in milliseconds of simulated time.
    pub clear_duration_ms: u64,
    /// Global seed from which every per-wave random stream is derived.
    pub rng_seed: u64,
    /// Spawn ring geometry.
    pub placement: PlacementConfig,
    /// Records pre-allocated per kind tag when the pool is created.
    ///
    /// Unknown tags fall back to the default kind.
    pub pool_warm_sizes: BTreeMap<String, u32>,
}

impl Default for WaveConfig {
    fn default() -> Self {
        let pool_warm_sizes = [
            (EnemyKind::Normal, 100),
            (EnemyKind::Fast, 60),
            (EnemyKind::Tank, 40),
            (EnemyKind::Shooter, 40),
            (EnemyKind::Boss, 10),
        ]
        .into_iter()
        .map(|(kind, size)| (kind.tag().to_owned(), size))
        .collect();

        Self {
            active_cap: DEFAULT_ACTIVE_CAP,
            max_wave: DEFAULT_MAX_WAVE,
            starting_wave: 1,
            clear_duration_ms: DEFAULT_CLEAR_DURATION.as_millis() as u64,
            rng_seed: DEFAULT_RNG_SEED,
            placement: PlacementConfig::default(),
            pool_warm_sizes,
        }
    }
}

impl WaveConfig {
    /// Clearing display length as a [`Duration`].
    #[must_use]
    pub fn clear_duration(&self) -> Duration {
        Duration::from_millis(self.clear_duration_ms)
    }

    /// Resolves the tag-keyed warm-up table into per-kind counts.
    ///
    /// Entries whose tags resolve to the same kind are summed.
    #[must_use]
    pub fn warm_sizes(&self) -> KindCounts {
        let mut sizes = KindCounts::default();
        for (tag, size) in &self.pool_warm_sizes {
            sizes.add(EnemyKind::resolve_tag(tag), *size);
        }
        sizes
    }
}

/// Geometry of the concentric spawn rings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Radius of the innermost ring and the reference distance for individual spawns.
    pub base_radius: f32,
    /// Radius added for every additional ring.
    pub ring_step: f32,
    /// Maximum number of entities placed on a single ring.
    pub ring_capacity: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            base_radius: DEFAULT_BASE_RADIUS,
            ring_step: DEFAULT_RING_STEP,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WaveConfig;
    use crate::EnemyKind;

    #[test]
    fn default_warm_sizes_cover_every_kind() {
        let sizes = WaveConfig::default().warm_sizes();
        assert_eq!(sizes.get(EnemyKind::Normal), 100);
        assert_eq!(sizes.get(EnemyKind::Boss), 10);
        assert_eq!(sizes.total(), 250);
    }

    #[test]
    fn unknown_warm_tags_fold_into_default_kind() {
        let mut config = WaveConfig::default();
        let _ = config.pool_warm_sizes.insert("dragon".to_owned(), 5);
        assert_eq!(config.warm_sizes().get(EnemyKind::DEFAULT), 105);
    }

    #[test]
    fn config_round_trips_through_bincode() {
        let mut config = WaveConfig::default();
        config.active_cap = 64;
        config.placement.ring_capacity = 8;
        let bytes = bincode::serialize(&config).expect("serialize");
        let restored: WaveConfig = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, config);
    }
}
