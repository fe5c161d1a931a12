//! Melee enemy: runs at the target and strikes it up close.

use bevy::prelude::*;
use serde::Deserialize;

use crate::core::{Cooldown, RepeatingTask};
use crate::world::SpatialQuery;

use super::brain::{AttackEffect, BrainTiming, EnemyBrain, EnemyState, Perception};
use super::steering::{steer, blend, AvoidanceConfig, SteeringField, SteeringInput, TargetAvoidance};
use super::swing::AttackSwing;

/// Melee enemy tunables, loaded as part of an enemy definition.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MeleeConfig {
    pub move_speed: f32,
    pub strike_range: f32,
    /// Extra distance allowed before an idle enemy starts running again
    pub idle_buffer: f32,
    pub attack_cooldown: f32,
    pub damage: f32,
    /// How strongly the goal direction pulls against avoidance
    pub goal_weight: f32,
    pub attack_duration: f32,
    /// Fraction of the attack after which the hit lands
    pub hit_fraction: f32,
    pub avoidance: AvoidanceConfig,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            strike_range: 1.0,
            idle_buffer: 0.5,
            attack_cooldown: 1.0,
            damage: 10.0,
            goal_weight: 0.5,
            attack_duration: 0.6,
            hit_fraction: 0.5,
            avoidance: AvoidanceConfig::default(),
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct MeleeBrain {
    config: MeleeConfig,
    state: EnemyState,
    target: Option<Entity>,
    attack_timer: Cooldown,
    steering: RepeatingTask,
    avoidance: SteeringField,
}

impl MeleeBrain {
    pub fn new(config: MeleeConfig, timing: BrainTiming) -> Self {
        Self {
            config,
            state: EnemyState::Running,
            target: None,
            attack_timer: Cooldown::ready(),
            steering: RepeatingTask::started(timing.steering_interval),
            avoidance: SteeringField::default(),
        }
    }

    pub fn with_target(mut self, target: Entity) -> Self {
        self.target = Some(target);
        self
    }

    pub fn config(&self) -> &MeleeConfig {
        &self.config
    }

    pub fn attack_timer(&self) -> Cooldown {
        self.attack_timer
    }

    pub fn avoidance(&self) -> SteeringField {
        self.avoidance
    }

    fn in_range(&self, perception: &Perception, buffer: f32) -> bool {
        perception
            .distance_to_target()
            .is_some_and(|distance| distance <= self.config.strike_range + buffer)
    }

    fn refresh_steering(&mut self, perception: &Perception, query: &impl SpatialQuery) {
        let input = SteeringInput {
            me: perception.me,
            position: perception.position,
            target: perception.target,
            near_distance: self.config.avoidance.near_distance.unwrap_or(self.config.strike_range),
            target_avoidance: TargetAvoidance::Capped(self.config.strike_range),
            corpse_weight: None,
        };
        self.avoidance = steer(&self.config.avoidance, &input, query);
    }

    fn begin_attack(&mut self) -> AttackSwing {
        self.state = EnemyState::Attacking;
        self.attack_timer.arm(self.config.attack_cooldown);
        AttackSwing::new(self.config.attack_duration, self.config.hit_fraction)
    }
}

impl EnemyBrain for MeleeBrain {
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
        if self.state == EnemyState::Dead {
            return None;
        }

        if self.steering.poll(delta) {
            self.refresh_steering(perception, query);
        }

        match self.state {
            EnemyState::Idling => {
                if !self.in_range(perception, self.config.idle_buffer) {
                    debug!("{:?} lost its target, running", perception.me);
                    self.state = EnemyState::Running;
                } else if self.attack_timer.is_ready() {
                    return Some(self.begin_attack());
                }
            }
            EnemyState::Running => {
                if self.in_range(perception, 0.0) {
                    self.state = EnemyState::Idling;
                }
            }
            EnemyState::Attacking | EnemyState::Dead => {}
        }

        None
    }

    fn desired_velocity(&self, perception: &Perception) -> Vec3 {
        let direction = match self.state {
            EnemyState::Running => blend(
                perception.direction_to_target(),
                self.config.goal_weight,
                self.avoidance.vector,
            ),
            EnemyState::Idling => self.avoidance.vector.clamp_length_max(1.0),
            EnemyState::Attacking | EnemyState::Dead => Vec3::ZERO,
        };
        direction * self.config.move_speed
    }

    fn do_attack(&mut self, perception: &Perception, _query: &impl SpatialQuery) -> Option<AttackEffect> {
        let (target, _) = perception.target?;
        self.in_range(perception, self.config.idle_buffer)
            .then_some(AttackEffect::Strike {
                target,
                damage: self.config.damage,
            })
    }

    fn end_attack(&mut self) {
        if self.state == EnemyState::Attacking {
            self.state = EnemyState::Idling;
        }
        self.attack_timer.arm(self.config.attack_cooldown);
    }

    fn on_killed(&mut self) {
        self.state = EnemyState::Dead;
        self.steering.cancel();
        self.avoidance = SteeringField::default();
    }

    fn on_resurrected(&mut self) {
        if self.state == EnemyState::Dead {
            self.state = EnemyState::Idling;
            self.steering.start();
        }
    }
}
