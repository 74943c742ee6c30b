#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave composition curve.
//!
//! Maps a wave number to the fractional share of every [`EnemyKind`] and turns
//! those shares into exact integer counts. Every function here is pure; the
//! same wave always yields the same composition.

use swarm_waves_core::{CompositionWeights, EnemyKind, KindCounts, WaveTarget};

/// Every n-th wave is a boss wave.
pub const BOSS_WAVE_INTERVAL: u32 = 10;
/// Upper bound for the boss share of a wave's population.
pub const MAX_BOSS_SHARE: f64 = 0.3;

/// Absorbs float error so products such as `(1/30) * 30` floor to the intended integer.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Last wave (inclusive) of each tier and the base shares it assigns, in
/// canonical kind order. Waves beyond the last bound use [`FINAL_TIER`].
const TIERS: [(u32, [f64; 5]); 4] = [
    (10, [0.7, 0.2, 0.1, 0.0, 0.0]),
    (50, [0.5, 0.25, 0.15, 0.1, 0.0]),
    (100, [0.4, 0.25, 0.2, 0.15, 0.0]),
    (300, [0.3, 0.25, 0.25, 0.2, 0.0]),
];
const FINAL_TIER: [f64; 5] = [0.25, 0.25, 0.25, 0.2, 0.05];

/// Reports whether `wave` carries the boss override.
#[must_use]
pub const fn is_boss_wave(wave: u32) -> bool {
    wave > 0 && wave % BOSS_WAVE_INTERVAL == 0
}

/// Number of bosses spawned on a boss wave.
#[must_use]
pub fn boss_count(wave: u32) -> u32 {
    match wave {
        0..=50 => 1,
        51..=100 => 2,
        101..=200 => 3,
        201..=500 => (wave / 50).min(5),
        _ => (wave / 100).min(10),
    }
}

/// Tiered shares for `wave` before any boss override.
#[must_use]
pub fn base_weights(wave: u32) -> CompositionWeights {
    let shares = TIERS
        .iter()
        .find(|(last, _)| wave <= *last)
        .map_or(FINAL_TIER, |(_, shares)| *shares);
    let pairs: Vec<(EnemyKind, f64)> = EnemyKind::ALL.iter().copied().zip(shares).collect();
    CompositionWeights::from_shares(&pairs)
}

/// Injects `bosses` bosses into a population of `total`, rescaling every
/// other share so the result still sums to one.
///
/// The boss share is `bosses / total`, capped at [`MAX_BOSS_SHARE`]. It
/// replaces any boss share already present in `base`.
#[must_use]
pub fn rescale_for_bosses(base: CompositionWeights, bosses: u32, total: u32) -> CompositionWeights {
    if total == 0 {
        return base;
    }
    let boss_share = (f64::from(bosses) / f64::from(total)).min(MAX_BOSS_SHARE);
    let others: f64 = base
        .iter()
        .filter(|(kind, _)| *kind != EnemyKind::Boss)
        .map(|(_, share)| share)
        .sum();
    if others <= 0.0 {
        return CompositionWeights::from_shares(&[(EnemyKind::Boss, 1.0)]);
    }

    let scale = (1.0 - boss_share) / others;
    let mut adjusted = base.with_share(EnemyKind::Boss, boss_share);
    for (kind, share) in base.iter() {
        if kind != EnemyKind::Boss {
            adjusted = adjusted.with_share(kind, share * scale);
        }
    }
    adjusted
}

/// Composition of `wave`, including the boss override on boss waves.
///
/// The wave's population equals its number, which is also the denominator of
/// the boss share.
#[must_use]
pub fn composition(wave: u32) -> CompositionWeights {
    let base = base_weights(wave);
    if !is_boss_wave(wave) {
        return base;
    }
    let weights = rescale_for_bosses(base, boss_count(wave), wave);
    tracing::debug!(
        wave,
        boss_share = weights.share(EnemyKind::Boss),
        "boss wave composition"
    );
    weights
}

/// Converts shares into integer counts summing exactly to `total`.
///
/// Every kind except [`EnemyKind::DEFAULT`] receives the floor of its share;
/// the rounding remainder goes to the default kind.
#[must_use]
pub fn distribute(weights: &CompositionWeights, total: u32) -> KindCounts {
    let mut counts = KindCounts::default();
    let mut assigned = 0u32;
    for (kind, share) in weights.iter() {
        if kind == EnemyKind::DEFAULT {
            continue;
        }
        let count = (share * f64::from(total) + ROUNDING_EPSILON).floor() as u32;
        let count = count.min(total - assigned);
        counts.set(kind, count);
        assigned += count;
    }
    counts.set(EnemyKind::DEFAULT, total - assigned);
    counts
}

/// Per-kind counts materialized at wave start and held back in reserve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulationSplit {
    /// Counts spawned immediately; sums to the target's initial count.
    pub initial: KindCounts,
    /// Counts queued for backfill; sums to the target's reserve count.
    pub reserve: KindCounts,
}

/// Reserve trimming order when the per-kind differences overshoot.
const TRIM_ORDER: [EnemyKind; 5] = [
    EnemyKind::Fast,
    EnemyKind::Tank,
    EnemyKind::Shooter,
    EnemyKind::Boss,
    EnemyKind::Normal,
];

/// Splits a wave's population into its initial batch and reserve backlog.
///
/// Both the total and the initial count are distributed independently; the
/// reserve is their per-kind difference. Rounding can make that difference
/// negative for the remainder kind, in which case it is floored at zero and
/// the overshoot is trimmed from the other kinds so the reserve sums exactly
/// to [`WaveTarget::reserve_count`].
#[must_use]
pub fn split_population(target: &WaveTarget, weights: &CompositionWeights) -> PopulationSplit {
    let total = distribute(weights, target.total_target());
    let initial = distribute(weights, target.initial_count());
    let mut reserve = total.saturating_sub(&initial);

    let expected = target.reserve_count();
    let mut excess = reserve.total().saturating_sub(expected);
    for kind in TRIM_ORDER {
        if excess == 0 {
            break;
        }
        let available = reserve.get(kind);
        let trimmed = available.min(excess);
        reserve.set(kind, available - trimmed);
        excess -= trimmed;
    }
    let deficit = expected.saturating_sub(reserve.total());
    reserve.add(EnemyKind::DEFAULT, deficit);

    PopulationSplit { initial, reserve }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boss_waves_repeat_every_ten() {
        assert!(!is_boss_wave(0));
        assert!(!is_boss_wave(9));
        assert!(is_boss_wave(10));
        assert!(is_boss_wave(990));
        assert!(!is_boss_wave(999));
    }

    #[test]
    fn boss_count_steps_with_wave() {
        assert_eq!(boss_count(10), 1);
        assert_eq!(boss_count(50), 1);
        assert_eq!(boss_count(60), 2);
        assert_eq!(boss_count(150), 3);
        assert_eq!(boss_count(250), 5);
        assert_eq!(boss_count(500), 5);
        assert_eq!(boss_count(700), 7);
        assert_eq!(boss_count(990), 9);
    }

    #[test]
    fn tiers_switch_at_their_bounds() {
        assert_eq!(base_weights(10).share(EnemyKind::Shooter), 0.0);
        assert_eq!(base_weights(11).share(EnemyKind::Shooter), 0.1);
        assert_eq!(base_weights(300).share(EnemyKind::Boss), 0.0);
        assert_eq!(base_weights(301).share(EnemyKind::Boss), 0.05);
        for wave in [1, 11, 51, 101, 301] {
            assert!((base_weights(wave).total() - 1.0).abs() < 1e-9, "wave {wave}");
        }
    }

    #[test]
    fn boss_share_is_capped() {
        let weights = rescale_for_bosses(base_weights(1), 5, 5);
        assert!((weights.share(EnemyKind::Boss) - MAX_BOSS_SHARE).abs() < 1e-9);
        assert!((weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn remainder_goes_to_default_kind() {
        let counts = distribute(&base_weights(1), 7);
        assert_eq!(counts.get(EnemyKind::Fast), 1);
        assert_eq!(counts.get(EnemyKind::Tank), 0);
        assert_eq!(counts.get(EnemyKind::Normal), 6);
    }

    #[test]
    fn zero_total_distributes_nothing() {
        assert_eq!(distribute(&composition(5), 0), KindCounts::default());
    }
}
