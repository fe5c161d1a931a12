//! Periodic firing patterns.
//!
//! A [`FiringSchedule`] is the scheduling loop behind a weapon: fire (or
//! fire a burst with randomized gaps), then wait a randomized cooldown that
//! is shortened by the time the burst took, and repeat. Stopping the
//! schedule discards whatever wait was pending, so no shot can be emitted
//! after the owner is disabled.

use bevy::prelude::*;
use rand::Rng;
use serde::Deserialize;

use crate::core::random_between;
use crate::world::Tag;

use super::projectile::{Projectile, ProjectileSpec};

/// Slowest rate the schedule accepts, in shots per second.
const MIN_RATE: f32 = 1.0e-3;

/// Upper bound on shots a single tick can emit after a long frame.
const MAX_SHOTS_PER_TICK: u32 = 32;

/// Weapon definition loaded from `weapons/*.ron`.
///
/// Rates are in shots per second; the intervals between shots are their
/// reciprocals.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct FiringConfig {
    /// Key into the projectile registry
    pub projectile: String,
    pub min_rate_of_fire: f32,
    pub max_rate_of_fire: f32,
    #[serde(default)]
    pub should_burst: bool,
    #[serde(default = "default_burst_amount")]
    pub burst_amount: u32,
    #[serde(default = "default_burst_rate")]
    pub min_rate_of_burst: f32,
    #[serde(default = "default_burst_rate")]
    pub max_rate_of_burst: f32,
    /// Projectiles spawn this far from the firer along the aim
    #[serde(default = "default_muzzle_offset")]
    pub muzzle_offset: f32,
    /// Whether projectiles carry the firer's velocity
    #[serde(default)]
    pub inherit_velocity: bool,
}

fn default_burst_amount() -> u32 {
    1
}

fn default_burst_rate() -> f32 {
    10.0
}

fn default_muzzle_offset() -> f32 {
    0.5
}

fn interval(rate: f32) -> f32 {
    1.0 / rate.max(MIN_RATE)
}

impl FiringConfig {
    /// Time between shots at the slowest and fastest rate of fire.
    pub fn shot_interval_bounds(&self) -> (f32, f32) {
        (interval(self.min_rate_of_fire), interval(self.max_rate_of_fire))
    }

    /// Time between burst shots at the slowest and fastest burst rate.
    pub fn burst_interval_bounds(&self) -> (f32, f32) {
        (interval(self.min_rate_of_burst), interval(self.max_rate_of_burst))
    }

    fn roll_cooldown(&self, rng: &mut impl Rng) -> f32 {
        let (a, b) = self.shot_interval_bounds();
        random_between(rng, a, b)
    }

    fn roll_burst_gap(&self, rng: &mut impl Rng) -> f32 {
        let (a, b) = self.burst_interval_bounds();
        random_between(rng, a, b)
    }
}

impl Default for FiringConfig {
    fn default() -> Self {
        Self {
            projectile: "knife".to_string(),
            min_rate_of_fire: 2.0,
            max_rate_of_fire: 3.0,
            should_burst: false,
            burst_amount: default_burst_amount(),
            min_rate_of_burst: default_burst_rate(),
            max_rate_of_burst: default_burst_rate(),
            muzzle_offset: default_muzzle_offset(),
            inherit_velocity: false,
        }
    }
}

/// Where the scheduling loop currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FiringPhase {
    /// Not scheduling anything
    Stopped,
    /// Fires on the next advance
    Ready,
    /// Waiting between burst shots
    BurstGap { shots_left: u32, wait: f32 },
    /// Waiting out the cooldown after a shot or burst
    Cooldown { wait: f32 },
}

/// The scheduling loop of a firing pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct FiringSchedule {
    phase: FiringPhase,
    burst_elapsed: f32,
}

impl Default for FiringSchedule {
    fn default() -> Self {
        Self {
            phase: FiringPhase::Stopped,
            burst_elapsed: 0.0,
        }
    }
}

impl FiringSchedule {
    pub fn phase(&self) -> FiringPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != FiringPhase::Stopped
    }

    /// Start the loop; the first shot goes out on the next advance. Does
    /// nothing if already running.
    pub fn start(&mut self) {
        if self.phase == FiringPhase::Stopped {
            self.phase = FiringPhase::Ready;
            self.burst_elapsed = 0.0;
        }
    }

    /// Stop the loop and drop any pending wait.
    pub fn stop(&mut self) {
        self.phase = FiringPhase::Stopped;
        self.burst_elapsed = 0.0;
    }

    /// Advance by `delta` seconds and return how many shots to fire.
    pub fn advance(&mut self, config: &FiringConfig, delta: f32, rng: &mut impl Rng) -> u32 {
        let mut budget = delta.max(0.0);
        let mut shots = 0;

        while shots < MAX_SHOTS_PER_TICK {
            match self.phase {
                FiringPhase::Stopped => break,
                FiringPhase::Ready => {
                    if config.should_burst {
                        self.burst_elapsed = 0.0;
                        if config.burst_amount == 0 {
                            self.enter_cooldown(config, rng);
                            continue;
                        }
                        shots += 1;
                        self.enter_burst_gap(config, config.burst_amount - 1, rng);
                    } else {
                        shots += 1;
                        self.phase = FiringPhase::Cooldown {
                            wait: config.roll_cooldown(rng),
                        };
                    }
                }
                FiringPhase::BurstGap { shots_left, wait } => {
                    if wait > budget {
                        self.phase = FiringPhase::BurstGap {
                            shots_left,
                            wait: wait - budget,
                        };
                        break;
                    }
                    budget -= wait;

                    if shots_left == 0 {
                        self.enter_cooldown(config, rng);
                    } else {
                        shots += 1;
                        self.enter_burst_gap(config, shots_left - 1, rng);
                    }
                }
                FiringPhase::Cooldown { wait } => {
                    if wait > budget {
                        self.phase = FiringPhase::Cooldown { wait: wait - budget };
                        break;
                    }
                    budget -= wait;
                    self.phase = FiringPhase::Ready;
                }
            }
        }

        shots
    }

    fn enter_burst_gap(&mut self, config: &FiringConfig, shots_left: u32, rng: &mut impl Rng) {
        let wait = config.roll_burst_gap(rng);
        self.burst_elapsed += wait;
        self.phase = FiringPhase::BurstGap { shots_left, wait };
    }

    /// The cooldown after a burst is shortened by the time the burst took,
    /// so bursting weapons keep the same overall cadence.
    fn enter_cooldown(&mut self, config: &FiringConfig, rng: &mut impl Rng) {
        let wait = (config.roll_cooldown(rng) - self.burst_elapsed).max(0.0);
        self.burst_elapsed = 0.0;
        self.phase = FiringPhase::Cooldown { wait };
    }
}

/// A weapon that fires on its own schedule.
#[derive(Component, Debug, Clone)]
pub struct FiringPattern {
    pub config: FiringConfig,
    pub schedule: FiringSchedule,
}

impl FiringPattern {
    /// A pattern that starts firing immediately.
    pub fn new(config: FiringConfig) -> Self {
        let mut schedule = FiringSchedule::default();
        schedule.start();
        Self { config, schedule }
    }

    pub fn should_fire(&self) -> bool {
        self.schedule.is_active()
    }

    pub fn set_should_fire(&mut self, should_fire: bool) {
        if should_fire {
            self.schedule.start();
        } else {
            self.schedule.stop();
        }
    }
}

/// How a firing pattern picks its direction.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum Aim {
    /// Always fire this way
    Direction(Vec3),
    /// Fire at a specific entity
    AtEntity(Entity),
    /// Fire at the closest entity with `tag` within `radius`
    Nearest { tag: Tag, radius: f32 },
}

/// The pool collaborator: hands out projectile instances and takes them back.
pub trait ProjectileSpawner {
    /// Put `projectile` into play at `position`.
    fn spawn_pooled(&mut self, projectile: Projectile, position: Vec3) -> Entity;

    /// Take a projectile out of play. Returns `false` if it was not live.
    fn release_pooled(&mut self, entity: Entity) -> bool;
}

/// A single shot leaving a weapon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub origin: Vec3,
    pub direction: Vec3,
    pub fired_by: Entity,
    pub target: Option<Entity>,
    pub inherited_velocity: Vec3,
}

/// Spawn one projectile for `shot`, offset from the origin along the aim.
pub fn fire(
    spawner: &mut impl ProjectileSpawner,
    spec: &ProjectileSpec,
    shot: Shot,
    muzzle_offset: f32,
) -> Option<Entity> {
    let direction = shot.direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }

    let projectile = Projectile::new(spec.clone(), direction, shot.fired_by)
        .with_target(shot.target)
        .with_inherited_velocity(shot.inherited_velocity);

    Some(spawner.spawn_pooled(projectile, shot.origin + direction * muzzle_offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimRng;
    use approx::assert_relative_eq;

    fn single_shot(rate: f32) -> FiringConfig {
        FiringConfig {
            min_rate_of_fire: rate,
            max_rate_of_fire: rate,
            ..default()
        }
    }

    fn bursting(amount: u32, rate: f32, burst_rate: f32) -> FiringConfig {
        FiringConfig {
            should_burst: true,
            burst_amount: amount,
            min_rate_of_burst: burst_rate,
            max_rate_of_burst: burst_rate,
            ..single_shot(rate)
        }
    }

    /// Advance in fixed ticks for `seconds`, returning the shot count per tick.
    fn run(schedule: &mut FiringSchedule, config: &FiringConfig, seconds: f32, tick: f32) -> Vec<u32> {
        let mut rng = SimRng::from_seed(11).0;
        let ticks = (seconds / tick).round() as usize;
        (0..ticks).map(|_| schedule.advance(config, tick, &mut rng)).collect()
    }

    #[test]
    fn stopped_schedule_never_fires() {
        let mut schedule = FiringSchedule::default();
        let shots = run(&mut schedule, &single_shot(10.0), 2.0, 0.01);
        assert!(shots.iter().all(|s| *s == 0));
    }

    #[test]
    fn fires_immediately_then_once_per_cooldown() {
        let config = single_shot(2.0);
        let mut schedule = FiringSchedule::default();
        schedule.start();

        let shots = run(&mut schedule, &config, 2.05, 0.01);
        assert_eq!(shots[0], 1);
        // t = 0, 0.5, 1.0, 1.5, 2.0
        assert_eq!(shots.iter().sum::<u32>(), 5);
    }

    #[test]
    fn burst_fires_amount_then_waits_for_remaining_cooldown() {
        // Three shots 0.1s apart; cycle length 1s including the burst.
        let config = bursting(3, 1.0, 10.0);
        let mut schedule = FiringSchedule::default();
        schedule.start();

        let shots = run(&mut schedule, &config, 0.95, 0.01);
        assert_eq!(shots.iter().sum::<u32>(), 3);

        let next = run(&mut schedule, &config, 0.1, 0.01);
        assert_eq!(next.iter().sum::<u32>(), 1, "second cycle starts at t = 1s");
    }

    #[test]
    fn burst_longer_than_cooldown_does_not_go_negative() {
        let config = bursting(5, 10.0, 2.0);
        let mut schedule = FiringSchedule::default();
        schedule.start();

        let shots = run(&mut schedule, &config, 5.0, 0.01);
        // Cooldown collapses to zero, so the weapon fires every 0.5s.
        let total: u32 = shots.iter().sum();
        assert!((9..=11).contains(&total), "fired {total}");
    }

    #[test]
    fn long_tick_catches_up_on_missed_shots() {
        let config = single_shot(10.0);
        let mut schedule = FiringSchedule::default();
        schedule.start();
        let mut rng = SimRng::from_seed(0).0;

        let shots = schedule.advance(&config, 0.55, &mut rng);
        assert_eq!(shots, 6);
    }

    #[test]
    fn zero_interval_is_bounded_per_tick() {
        let config = FiringConfig {
            min_rate_of_fire: f32::INFINITY,
            max_rate_of_fire: f32::INFINITY,
            ..default()
        };
        let mut schedule = FiringSchedule::default();
        schedule.start();
        let mut rng = SimRng::from_seed(0).0;

        assert_eq!(schedule.advance(&config, 0.1, &mut rng), MAX_SHOTS_PER_TICK);
    }

    #[test]
    fn stop_cancels_pending_wait() {
        let config = single_shot(1.0);
        let mut schedule = FiringSchedule::default();
        schedule.start();
        let mut rng = SimRng::from_seed(0).0;

        assert_eq!(schedule.advance(&config, 0.0, &mut rng), 1);
        assert!(matches!(schedule.phase(), FiringPhase::Cooldown { .. }));

        schedule.stop();
        assert_eq!(schedule.advance(&config, 5.0, &mut rng), 0);
        assert_eq!(schedule.phase(), FiringPhase::Stopped);

        // Restarting begins a fresh cycle rather than resuming the old wait.
        schedule.start();
        assert_eq!(schedule.advance(&config, 0.0, &mut rng), 1);
    }

    #[test]
    fn reversed_rate_bounds_are_tolerated() {
        let config = FiringConfig {
            min_rate_of_fire: 4.0,
            max_rate_of_fire: 1.0,
            ..default()
        };
        let (a, b) = config.shot_interval_bounds();
        assert_relative_eq!(a, 0.25);
        assert_relative_eq!(b, 1.0);

        let mut schedule = FiringSchedule::default();
        schedule.start();
        let total: u32 = run(&mut schedule, &config, 4.0, 0.01).iter().sum();
        assert!((4..=17).contains(&total));
    }

    #[test]
    fn set_should_fire_toggles_schedule() {
        let mut pattern = FiringPattern::new(FiringConfig::default());
        assert!(pattern.should_fire());
        pattern.set_should_fire(false);
        assert!(!pattern.should_fire());
        pattern.set_should_fire(true);
        assert_eq!(pattern.schedule.phase(), FiringPhase::Ready);
    }

    #[derive(Default)]
    struct RecordingSpawner {
        spawned: Vec<(Projectile, Vec3)>,
    }

    impl ProjectileSpawner for RecordingSpawner {
        fn spawn_pooled(&mut self, projectile: Projectile, position: Vec3) -> Entity {
            self.spawned.push((projectile, position));
            Entity::from_raw(self.spawned.len() as u32)
        }

        fn release_pooled(&mut self, _entity: Entity) -> bool {
            true
        }
    }

    #[test]
    fn fire_offsets_spawn_along_aim() {
        let mut spawner = RecordingSpawner::default();
        let shooter = Entity::from_raw(7);
        let shot = Shot {
            origin: Vec3::new(1.0, 1.0, 0.0),
            direction: Vec3::new(0.0, 2.0, 0.0),
            fired_by: shooter,
            target: None,
            inherited_velocity: Vec3::ZERO,
        };

        fire(&mut spawner, &ProjectileSpec::default(), shot, 0.5).expect("valid aim");

        let (projectile, position) = &spawner.spawned[0];
        assert_eq!(*position, Vec3::new(1.0, 1.5, 0.0));
        assert_eq!(projectile.direction, Vec3::Y);
        assert_eq!(projectile.fired_by, shooter);
    }

    #[test]
    fn fire_without_direction_spawns_nothing() {
        let mut spawner = RecordingSpawner::default();
        let shot = Shot {
            origin: Vec3::ZERO,
            direction: Vec3::ZERO,
            fired_by: Entity::from_raw(1),
            target: None,
            inherited_velocity: Vec3::ZERO,
        };
        assert!(fire(&mut spawner, &ProjectileSpec::default(), shot, 0.5).is_none());
        assert!(spawner.spawned.is_empty());
    }
}
