//! Mage enemy: keeps its distance, fires bolts and raises corpses.
//!
//! The mage splits its time between two goals. Normally it hovers at a
//! randomized strike range from its target. Whenever the resurrect cooldown
//! is up it looks for a corpse nearby; if it finds one it walks over,
//! refines its position towards the middle of the surrounding corpses for a
//! few passes, then casts a resurrection on every corpse within reach.

use bevy::prelude::*;
use rand::Rng;
use serde::Deserialize;

use crate::core::{random_between, Cooldown, RepeatingTask};
use crate::world::{LayerMask, SpatialQuery, Tag};

use super::brain::{AttackEffect, BrainTiming, EnemyBrain, EnemyState, Perception};
use super::steering::{blend, steer, AvoidanceConfig, SteeringField, SteeringInput, TargetAvoidance};
use super::swing::AttackSwing;

/// Mage tunables, loaded as part of an enemy definition.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MageConfig {
    pub move_speed: f32,
    pub min_strike_range: f32,
    pub max_strike_range: f32,
    pub idle_buffer: f32,
    pub attack_cooldown: f32,
    pub goal_weight: f32,
    pub attack_duration: f32,
    pub hit_fraction: f32,
    pub resurrect_radius: f32,
    pub resurrect_cooldown: f32,
    pub max_resurrects: usize,
    pub min_player_avoidance_radius: f32,
    pub max_player_avoidance_radius: f32,
    /// Avoidance weight of corpses while looking for them
    pub corpse_weight: f32,
    /// Fraction of the resurrect cooldown to wait after a failed search
    pub retry_backoff: f32,
    /// How many corpses a search looks at before giving up
    pub corpse_candidates: usize,
    /// Refinement passes before the resurrection is ready
    pub refinement_passes: u32,
    /// Projectile fired by a normal attack, if any
    pub bolt: Option<String>,
    pub bolt_offset: f32,
    pub avoidance: AvoidanceConfig,
}

impl Default for MageConfig {
    fn default() -> Self {
        Self {
            move_speed: 2.5,
            min_strike_range: 5.0,
            max_strike_range: 8.0,
            idle_buffer: 0.5,
            attack_cooldown: 1.0,
            goal_weight: 0.5,
            attack_duration: 0.8,
            hit_fraction: 0.5,
            resurrect_radius: 3.0,
            resurrect_cooldown: 15.0,
            max_resurrects: 5,
            min_player_avoidance_radius: 3.0,
            max_player_avoidance_radius: 4.5,
            corpse_weight: 0.2,
            retry_backoff: 0.33,
            corpse_candidates: 5,
            refinement_passes: 5,
            bolt: Some("necrotic_bolt".to_string()),
            bolt_offset: 0.5,
            avoidance: AvoidanceConfig {
                near_distance: Some(1.0),
                layers: LayerMask::ALL,
                ..default()
            },
        }
    }
}

/// A corpse the mage is walking towards.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpseSearch {
    /// The corpse that started the search
    pub target: Entity,
    /// Middle of the corpses seen on the last refinement pass
    pub average_position: Vec3,
    pub passes: u32,
    /// Enough passes done to cast
    pub ready: bool,
    refine: RepeatingTask,
}

#[derive(Component, Debug, Clone)]
pub struct MageBrain {
    config: MageConfig,
    state: EnemyState,
    target: Option<Entity>,
    strike_range: f32,
    player_avoidance_radius: f32,
    attack_timer: Cooldown,
    resurrect_timer: Cooldown,
    steering: RepeatingTask,
    refine_interval: f32,
    avoidance: SteeringField,
    search: Option<CorpseSearch>,
    resurrecting: bool,
}

impl MageBrain {
    /// Create a mage, rolling its strike range and player avoidance radius.
    pub fn new(config: MageConfig, rng: &mut impl Rng, timing: BrainTiming) -> Self {
        let strike_range = random_between(rng, config.min_strike_range, config.max_strike_range);
        let player_avoidance_radius = random_between(
            rng,
            config.min_player_avoidance_radius,
            config.max_player_avoidance_radius,
        );

        Self {
            config,
            state: EnemyState::Running,
            target: None,
            strike_range,
            player_avoidance_radius,
            attack_timer: Cooldown::ready(),
            resurrect_timer: Cooldown::ready(),
            steering: RepeatingTask::started(timing.steering_interval),
            refine_interval: timing.corpse_refine_interval,
            avoidance: SteeringField::default(),
            search: None,
            resurrecting: false,
        }
    }

    pub fn with_target(mut self, target: Entity) -> Self {
        self.target = Some(target);
        self
    }

    pub fn config(&self) -> &MageConfig {
        &self.config
    }

    pub fn strike_range(&self) -> f32 {
        self.strike_range
    }

    pub fn player_avoidance_radius(&self) -> f32 {
        self.player_avoidance_radius
    }

    pub fn attack_timer(&self) -> Cooldown {
        self.attack_timer
    }

    pub fn resurrect_timer(&self) -> Cooldown {
        self.resurrect_timer
    }

    pub fn search(&self) -> Option<&CorpseSearch> {
        self.search.as_ref()
    }

    pub fn is_resurrecting(&self) -> bool {
        self.resurrecting
    }

    pub fn avoidance(&self) -> SteeringField {
        self.avoidance
    }

    fn in_range(&self, perception: &Perception, buffer: f32) -> bool {
        match &self.search {
            Some(search) => {
                search.average_position.distance(perception.position) <= self.config.avoidance.min_radius + buffer
            }
            None => perception
                .distance_to_target()
                .is_some_and(|distance| distance <= self.strike_range + buffer),
        }
    }

    fn refresh_steering(&mut self, perception: &Perception, query: &impl SpatialQuery) {
        let searching = self.search.is_some();
        // While searching the target is only kept at arm's length.
        let target_radius = if searching { None } else { Some(self.player_avoidance_radius) };

        let input = SteeringInput {
            me: perception.me,
            position: perception.position,
            target: perception.target,
            near_distance: self.config.avoidance.near_distance.unwrap_or(self.strike_range),
            target_avoidance: TargetAvoidance::Separate(target_radius),
            corpse_weight: searching.then_some(self.config.corpse_weight),
        };
        self.avoidance = steer(&self.config.avoidance, &input, query);
    }

    /// Corpses found by a query around the mage, excluding itself.
    fn corpses_near(&self, perception: &Perception, query: &impl SpatialQuery, radius: f32) -> Vec<(Entity, Vec3)> {
        let mut corpses: Vec<(Entity, Vec3)> = Vec::new();
        for neighbor in query.query_nearby(perception.position, radius, LayerMask::CORPSE) {
            if neighbor.tag != Tag::Corpse || neighbor.entity == perception.me {
                continue;
            }
            if corpses.iter().any(|(entity, _)| *entity == neighbor.entity) {
                continue;
            }
            corpses.push((neighbor.entity, neighbor.position));
        }
        corpses
    }

    fn retry_later(&mut self) {
        self.search = None;
        self.resurrect_timer
            .arm(self.config.resurrect_cooldown * self.config.retry_backoff);
    }

    fn start_search(&mut self, perception: &Perception, query: &impl SpatialQuery) {
        let reach = self.config.resurrect_radius * 3.0;

        let found = self
            .corpses_near(perception, query, reach)
            .into_iter()
            .take(self.config.corpse_candidates)
            .find(|(_, position)| position.distance(perception.position) < reach);

        match found {
            Some((corpse, position)) => {
                debug!("{:?} heading for corpse {:?}", perception.me, corpse);
                self.search = Some(CorpseSearch {
                    target: corpse,
                    average_position: position,
                    passes: 0,
                    ready: false,
                    refine: RepeatingTask::started(self.refine_interval),
                });
            }
            None => self.retry_later(),
        }
    }

    fn refine_search(&mut self, perception: &Perception, query: &impl SpatialQuery) {
        let Some(average) = self.search.as_ref().map(|search| search.average_position) else {
            return;
        };
        if average.distance(perception.position) > self.config.resurrect_radius {
            return;
        }

        let corpses = self.corpses_near(perception, query, self.avoidance.radius);
        if corpses.is_empty() {
            debug!("{:?} lost its corpses, retrying later", perception.me);
            self.retry_later();
            return;
        }

        let passes_needed = self.config.refinement_passes;
        let Some(search) = self.search.as_mut() else {
            return;
        };

        let sum: Vec3 = corpses.iter().map(|(_, position)| *position).sum();
        search.average_position = sum / corpses.len() as f32;
        search.passes += 1;
        if search.passes >= passes_needed {
            search.ready = true;
            search.refine.cancel();
        }
    }

    fn begin_attack(&mut self) -> AttackSwing {
        self.state = EnemyState::Attacking;
        self.attack_timer.arm(self.config.attack_cooldown);
        AttackSwing::new(self.config.attack_duration, self.config.hit_fraction)
    }
}

impl EnemyBrain for MageBrain {
    fn state(&self) -> EnemyState {
        self.state
    }

    fn target(&self) -> Option<Entity> {
        self.target
    }

    fn set_target(&mut self, target: Option<Entity>) {
        self.target = target;
    }

    fn tick(&mut self, perception: &Perception, query: &impl SpatialQuery, delta: f32) -> Option<AttackSwing> {
        self.attack_timer.tick(delta);
        self.resurrect_timer.tick(delta);
        if self.state == EnemyState::Dead {
            return None;
        }

        // Recompute avoidance on its own cadence
        if self.steering.poll(delta) {
            self.refresh_steering(perception, query);
        }

        // Look for a corpse once the resurrect cooldown is up
        if self.state != EnemyState::Attacking && self.search.is_none() && self.resurrect_timer.is_ready() {
            self.start_search(perception, query);
        }

        // Drift the search towards the middle of nearby corpses
        let refine_due = self
            .search
            .as_mut()
            .is_some_and(|search| search.refine.poll(delta));
        if refine_due {
            self.refine_search(perception, query);
        }

        match self.state {
            EnemyState::Idling => {
                // Goal drifted out of reach
                if !self.in_range(perception, self.config.idle_buffer) {
                    self.state = EnemyState::Running;
                    return None;
                }

                // Raise the dead when ready, otherwise throw a bolt
                match &self.search {
                    Some(search) if search.ready && self.resurrect_timer.is_ready() => {
                        debug!("{:?} begins a resurrection", perception.me);
                        self.resurrecting = true;
                        return Some(self.begin_attack());
                    }
                    None if self.attack_timer.is_ready() => return Some(self.begin_attack()),
                    _ => {}
                }
            }
            EnemyState::Running => {
                // Arrived; wait out a full cooldown before the first bolt
                if self.in_range(perception, 0.0) {
                    self.state = EnemyState::Idling;
                    self.attack_timer.arm(self.config.attack_cooldown);
                }
            }
            EnemyState::Attacking | EnemyState::Dead => {}
        }

        None
    }

    fn desired_velocity(&self, perception: &Perception) -> Vec3 {
        let direction = match self.state {
            EnemyState::Running => {
                let goal = match &self.search {
                    Some(search) => (search.average_position - perception.position).normalize_or_zero(),
                    None => perception.direction_to_target(),
                };
                blend(goal, self.config.goal_weight, self.avoidance.vector)
            }
            EnemyState::Idling => self.avoidance.vector.clamp_length_max(1.0),
            EnemyState::Attacking | EnemyState::Dead => Vec3::ZERO,
        };
        direction * self.config.move_speed
    }

    fn do_attack(&mut self, perception: &Perception, query: &impl SpatialQuery) -> Option<AttackEffect> {
        if self.resurrecting {
            let corpses: Vec<Entity> = self
                .corpses_near(perception, query, self.avoidance.radius)
                .into_iter()
                .take(self.config.max_resurrects)
                .map(|(entity, _)| entity)
                .collect();
            return (!corpses.is_empty()).then_some(AttackEffect::Resurrect { corpses });
        }

        let projectile = self.config.bolt.clone()?;
        let (target, position) = perception.target?;
        Some(AttackEffect::Bolt {
            projectile,
            direction: position - perception.position,
            target,
            muzzle_offset: self.config.bolt_offset,
        })
    }

    fn end_attack(&mut self) {
        if self.state == EnemyState::Attacking {
            self.state = EnemyState::Idling;
        }
        self.attack_timer.arm(self.config.attack_cooldown);

        // Any finished attack, bolt or resurrection, restarts the corpse hunt.
        self.resurrecting = false;
        self.search = None;
        self.resurrect_timer.arm(self.config.resurrect_cooldown);
    }

    fn on_killed(&mut self) {
        self.state = EnemyState::Dead;
        self.steering.cancel();
        self.avoidance = SteeringField::default();
        self.search = None;
        self.resurrecting = false;
    }

    fn on_resurrected(&mut self) {
        if self.state == EnemyState::Dead {
            self.state = EnemyState::Idling;
            self.steering.start();
        }
    }
}
