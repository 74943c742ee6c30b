//! Recyclable entity records stored by the pool.

use std::time::Duration;

use swarm_waves_core::{EnemyKind, Position};

/// Health fraction below which a boss enters its second phase.
const BOSS_ENRAGE_THRESHOLD: f32 = 0.5;
const BOSS_ENRAGE_SPEED_SCALE: f32 = 1.5;
const BOSS_ENRAGE_FIRE_PERCENT: u32 = 70;

/// Result of applying damage to a pooled entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DamageOutcome {
    /// The entity is still standing.
    Survived {
        /// Health left after the hit.
        remaining: f32,
    },
    /// Health reached zero; the kill must be reported to the scheduler.
    Killed,
}

/// Timed status effects carried by an entity between acquisition and release.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusEffects {
    /// Remaining stun time.
    pub stun: Duration,
    /// Remaining slow time.
    pub slow: Duration,
    /// Remaining burn time.
    pub burn: Duration,
}

/// Storage slot for one adversary entity.
///
/// Records never leave the pool. While active the world refers to a record
/// through an [`swarm_waves_core::EntityHandle`]; the generation counter lets
/// the pool recognise handles that outlived the acquisition they were issued for.
#[derive(Clone, Debug, PartialEq)]
pub struct PooledEntity {
    kind: EnemyKind,
    generation: u32,
    active: bool,
    wave: u32,
    position: Position,
    health: f32,
    max_health: f32,
    speed: f32,
    damage: f32,
    size: f32,
    phase: u8,
    attack_interval: Duration,
    fire_interval: Option<Duration>,
    special_interval: Option<Duration>,
    since_attack: Duration,
    since_fire: Duration,
    since_special: Duration,
    status: StatusEffects,
    target: Option<Position>,
}

impl PooledEntity {
    pub(crate) fn dormant(kind: EnemyKind) -> Self {
        let mut record = Self {
            kind,
            generation: 0,
            active: false,
            wave: 1,
            position: Position::ORIGIN,
            health: 0.0,
            max_health: 0.0,
            speed: 0.0,
            damage: 0.0,
            size: 0.0,
            phase: 1,
            attack_interval: Duration::ZERO,
            fire_interval: None,
            special_interval: None,
            since_attack: Duration::ZERO,
            since_fire: Duration::ZERO,
            since_special: Duration::ZERO,
            status: StatusEffects::default(),
            target: None,
        };
        record.apply_profile(1);
        record
    }

    pub(crate) fn activate(&mut self, position: Position, wave: u32) {
        self.generation = self.generation.wrapping_add(1);
        self.active = true;
        self.position = position;
        self.apply_profile(wave);
        self.clear_transient();
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.clear_transient();
    }

    fn apply_profile(&mut self, wave: u32) {
        let profile = self.kind.profile(wave);
        self.wave = wave;
        self.health = profile.health;
        self.max_health = profile.health;
        self.speed = profile.speed;
        self.damage = profile.damage;
        self.size = profile.size;
        self.attack_interval = profile.attack_interval;
        self.fire_interval = profile.fire_interval;
        self.special_interval = profile.special_interval;
        self.phase = 1;
    }

    fn clear_transient(&mut self) {
        self.since_attack = Duration::ZERO;
        self.since_fire = Duration::ZERO;
        self.since_special = Duration::ZERO;
        self.status = StatusEffects::default();
        self.target = None;
    }

    pub(crate) fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        self.health = (self.health - amount.max(0.0)).max(0.0);
        if self.health <= 0.0 {
            return DamageOutcome::Killed;
        }

        if self.kind == EnemyKind::Boss
            && self.phase == 1
            && self.health < self.max_health * BOSS_ENRAGE_THRESHOLD
        {
            self.phase = 2;
            self.speed *= BOSS_ENRAGE_SPEED_SCALE;
            self.fire_interval = self
                .fire_interval
                .map(|interval| interval * BOSS_ENRAGE_FIRE_PERCENT / 100);
        }

        DamageOutcome::Survived {
            remaining: self.health,
        }
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        self.since_attack = self.since_attack.saturating_add(dt);
        self.since_fire = self.since_fire.saturating_add(dt);
        self.since_special = self.since_special.saturating_add(dt);
        self.status.stun = self.status.stun.saturating_sub(dt);
        self.status.slow = self.status.slow.saturating_sub(dt);
        self.status.burn = self.status.burn.saturating_sub(dt);
    }

    pub(crate) fn set_target(&mut self, target: Option<Position>) {
        self.target = target;
    }

    pub(crate) fn apply_status(&mut self, status: StatusEffects) {
        self.status.stun = self.status.stun.max(status.stun);
        self.status.slow = self.status.slow.max(status.slow);
        self.status.burn = self.status.burn.max(status.burn);
    }

    /// Kind of the record.
    #[must_use]
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Number of times the record has been acquired.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Whether the record is currently handed out.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Wave tier the stats were computed for.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Spawn position assigned on acquisition.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Remaining health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Health the record was initialized with.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Movement speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Contact damage.
    #[must_use]
    pub fn damage(&self) -> f32 {
        self.damage
    }

    /// Collision extent.
    #[must_use]
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Behaviour phase; bosses switch to phase 2 below half health.
    #[must_use]
    pub fn phase(&self) -> u8 {
        self.phase
    }

    /// Minimum time between melee attacks.
    #[must_use]
    pub fn attack_interval(&self) -> Duration {
        self.attack_interval
    }

    /// Time between ranged volleys, if the kind fires.
    #[must_use]
    pub fn fire_interval(&self) -> Option<Duration> {
        self.fire_interval
    }

    /// Time between special attacks, if the kind has one.
    #[must_use]
    pub fn special_interval(&self) -> Option<Duration> {
        self.special_interval
    }

    /// Time accumulated toward the next melee attack, ranged volley and special attack.
    #[must_use]
    pub fn timers(&self) -> (Duration, Duration, Duration) {
        (self.since_attack, self.since_fire, self.since_special)
    }

    /// Active status effects.
    #[must_use]
    pub fn status(&self) -> StatusEffects {
        self.status
    }

    /// Location the entity is currently pursuing, if any.
    #[must_use]
    pub fn target(&self) -> Option<Position> {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boss_enrages_below_half_health() {
        let mut boss = PooledEntity::dormant(EnemyKind::Boss);
        boss.activate(Position::ORIGIN, 1);
        let max = boss.max_health();
        let base_speed = boss.speed();

        let outcome = boss.apply_damage(max * 0.6);
        assert!(matches!(outcome, DamageOutcome::Survived { .. }));
        assert_eq!(boss.phase(), 2);
        assert!(boss.speed() > base_speed);
        assert_eq!(boss.fire_interval(), Some(Duration::from_millis(1_050)));
    }

    #[test]
    fn damage_floors_at_zero() {
        let mut normal = PooledEntity::dormant(EnemyKind::Normal);
        normal.activate(Position::ORIGIN, 1);
        assert_eq!(normal.apply_damage(10_000.0), DamageOutcome::Killed);
        assert_eq!(normal.health(), 0.0);
    }

    #[test]
    fn negative_damage_does_not_heal() {
        let mut normal = PooledEntity::dormant(EnemyKind::Normal);
        normal.activate(Position::ORIGIN, 1);
        let before = normal.health();
        let _ = normal.apply_damage(-50.0);
        assert_eq!(normal.health(), before);
    }

    #[test]
    fn activation_restores_profile_and_bumps_generation() {
        let mut fast = PooledEntity::dormant(EnemyKind::Fast);
        fast.activate(Position::new(1.0, 2.0), 3);
        let _ = fast.apply_damage(5.0);
        fast.set_target(Some(Position::new(9.0, 9.0)));
        fast.deactivate();
        fast.activate(Position::ORIGIN, 3);

        assert_eq!(fast.generation(), 2);
        assert_eq!(fast.health(), fast.max_health());
        assert_eq!(fast.target(), None);
        assert_eq!(fast.position(), Position::ORIGIN);
    }
}
