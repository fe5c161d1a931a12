//! Health model: damage, healing, death and resurrection.
//!
//! Every operation that does not apply in the current state (damaging the
//! dead, healing a corpse, resurrecting the living) is a no-op reported as
//! `Err(HealthRejection)` so callers can tell it apart from a real change.
//! None of them are failures of the simulation.

use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

/// Which notices a lethal hit publishes.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LethalHitPolicy {
    /// A lethal hit only reports the kill.
    #[default]
    KilledOnly,
    /// A lethal hit reports both the damage and the kill.
    DamagedAndKilled,
}

/// Why a health operation was absorbed without effect.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HealthRejection {
    #[error("target is dead")]
    Dead,
    #[error("target is invulnerable")]
    Invulnerable,
    #[error("target is not dead")]
    NotDead,
}

/// Result of a damage call that went through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageApplied {
    /// Health actually removed (never more than what was left)
    pub dealt: f32,
    /// Entity credited with the hit
    pub source: Entity,
    /// Health reached zero on this hit
    pub killed: bool,
    /// Whether a `Damaged` notice should go out
    pub notify_damaged: bool,
}

/// Component for entities that can take damage.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Health {
    current: f32,
    maximum: f32,
    invulnerability_timer: f32,
    invulnerability_window: f32,
    resurrect_grants_invulnerability: bool,
    lethal_policy: LethalHitPolicy,
}

impl Health {
    pub fn new(max: f32) -> Self {
        let maximum = max.max(0.0);
        Self {
            current: maximum,
            maximum,
            invulnerability_timer: 0.0,
            invulnerability_window: 0.02,
            resurrect_grants_invulnerability: true,
            lethal_policy: LethalHitPolicy::default(),
        }
    }

    /// Set how long hits are ignored after one lands, and whether a
    /// resurrection grants the same window.
    pub fn with_invulnerability(mut self, window: f32, on_resurrect: bool) -> Self {
        self.invulnerability_window = window.max(0.0);
        self.resurrect_grants_invulnerability = on_resurrect;
        self
    }

    pub fn with_lethal_policy(mut self, policy: LethalHitPolicy) -> Self {
        self.lethal_policy = policy;
        self
    }

    /// Start at zero health, e.g. for corpses placed in the arena.
    pub fn slain(mut self) -> Self {
        self.current = 0.0;
        self
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn maximum(&self) -> f32 {
        self.maximum
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerability_timer > 0.0
    }

    pub fn percentage(&self) -> f32 {
        if self.maximum <= 0.0 {
            return 0.0;
        }
        self.current / self.maximum
    }

    /// Apply a hit. Negative amounts count as zero.
    pub fn damage(&mut self, amount: f32, source: Entity) -> Result<DamageApplied, HealthRejection> {
        if self.is_dead() {
            return Err(HealthRejection::Dead);
        }
        if self.is_invulnerable() {
            return Err(HealthRejection::Invulnerable);
        }

        self.invulnerability_timer = self.invulnerability_window;

        let dealt = amount.max(0.0).min(self.current);
        self.current -= dealt;
        if self.current <= 0.0 {
            self.current = 0.0;
        }

        let killed = self.is_dead();
        Ok(DamageApplied {
            dealt,
            source,
            killed,
            notify_damaged: !killed || self.lethal_policy == LethalHitPolicy::DamagedAndKilled,
        })
    }

    /// Restore health, capped at the maximum. Returns the amount restored.
    pub fn heal(&mut self, amount: f32) -> Result<f32, HealthRejection> {
        if self.is_dead() {
            return Err(HealthRejection::Dead);
        }

        let restored = amount.max(0.0).min(self.maximum - self.current);
        self.current += restored;
        Ok(restored)
    }

    /// Bring a dead entity back at full health.
    pub fn resurrect(&mut self) -> Result<(), HealthRejection> {
        if !self.is_dead() {
            return Err(HealthRejection::NotDead);
        }

        self.current = self.maximum;
        if self.resurrect_grants_invulnerability {
            self.invulnerability_timer = self.invulnerability_window;
        }
        Ok(())
    }

    /// Count down the invulnerability window. Runs whether or not the
    /// entity is alive.
    pub fn tick(&mut self, delta: f32) {
        self.invulnerability_timer -= delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn source() -> Entity {
        Entity::from_raw(99)
    }

    #[rstest]
    #[case(0.0)]
    #[case(3.5)]
    #[case(10.0)]
    #[case(250.0)]
    fn damage_never_leaves_bounds(#[case] amount: f32) {
        let mut health = Health::new(10.0);
        let before = health.current();
        let applied = health.damage(amount, source()).expect("alive and vulnerable");

        assert!(health.current() >= 0.0 && health.current() <= before);
        assert_relative_eq!(applied.dealt, before - health.current());
    }

    #[test]
    fn lethal_hit_reports_kill_only_by_default() {
        let mut health = Health::new(10.0);
        let applied = health.damage(15.0, source()).expect("first hit lands");

        assert!(applied.killed);
        assert!(!applied.notify_damaged);
        assert!(health.is_dead());
        assert_eq!(health.current(), 0.0);
    }

    #[test]
    fn lethal_hit_can_report_both() {
        let mut health = Health::new(10.0).with_lethal_policy(LethalHitPolicy::DamagedAndKilled);
        let applied = health.damage(15.0, source()).expect("first hit lands");

        assert!(applied.killed);
        assert!(applied.notify_damaged);
    }

    #[test]
    fn non_lethal_hit_reports_damage() {
        let mut health = Health::new(10.0);
        let applied = health.damage(4.0, source()).expect("first hit lands");

        assert!(!applied.killed);
        assert!(applied.notify_damaged);
        assert_eq!(applied.source, source());
    }

    #[test]
    fn kill_is_reported_exactly_once() {
        let mut health = Health::new(10.0).with_invulnerability(0.0, false);
        let kills = (0..5)
            .filter_map(|_| health.damage(6.0, source()).ok())
            .filter(|applied| applied.killed)
            .count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn second_hit_inside_window_is_absorbed() {
        let mut health = Health::new(10.0).with_invulnerability(0.5, true);
        health.damage(2.0, source()).expect("first hit lands");

        health.tick(0.3);
        assert_eq!(health.damage(2.0, source()), Err(HealthRejection::Invulnerable));
        assert_eq!(health.current(), 8.0);

        health.tick(0.3);
        health.damage(2.0, source()).expect("window has passed");
        assert_eq!(health.current(), 6.0);
    }

    #[test]
    fn dead_entities_ignore_damage_and_healing() {
        let mut health = Health::new(10.0).slain();
        assert_eq!(health.damage(1.0, source()), Err(HealthRejection::Dead));
        assert_eq!(health.heal(5.0), Err(HealthRejection::Dead));
        assert_eq!(health.current(), 0.0);
    }

    #[rstest]
    #[case(1.0, 1.0)]
    #[case(5.0, 4.0)]
    #[case(-2.0, 0.0)]
    fn heal_is_capped_at_maximum(#[case] amount: f32, #[case] expected: f32) {
        let mut health = Health::new(10.0);
        health.damage(4.0, source()).expect("first hit lands");

        let restored = health.heal(amount).expect("alive");
        assert_relative_eq!(restored, expected);
        assert!(health.current() <= health.maximum());
    }

    #[test]
    fn resurrect_only_works_on_the_dead() {
        let mut health = Health::new(10.0);
        assert_eq!(health.resurrect(), Err(HealthRejection::NotDead));

        health.damage(10.0, source()).expect("first hit lands");
        health.resurrect().expect("dead entities can be raised");
        assert_eq!(health.current(), 10.0);
        assert!(!health.is_dead());
    }

    #[test]
    fn resurrect_grants_invulnerability_when_configured() {
        let mut granted = Health::new(10.0).with_invulnerability(0.5, true).slain();
        granted.resurrect().expect("dead");
        assert!(granted.is_invulnerable());

        let mut plain = Health::new(10.0).with_invulnerability(0.5, false).slain();
        plain.resurrect().expect("dead");
        assert!(!plain.is_invulnerable());
    }

    #[test]
    fn timer_runs_past_zero() {
        let mut health = Health::new(10.0).with_invulnerability(0.1, true);
        health.damage(1.0, source()).expect("first hit lands");
        health.tick(1.0);
        health.tick(1.0);
        assert!(!health.is_invulnerable());
        health.damage(1.0, source()).expect("window expired");
    }
}
