//! Projectile flight and hit resolution.
//!
//! A projectile moves along its facing every physics step, ray casts the
//! step for the first blocking body and registers at most one hit per step.
//! It retires when it has hit more entities than its penetration allows or
//! when it has travelled its full range.

use bevy::prelude::*;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;

use crate::core::random_between;
use crate::world::{LayerMask, SpatialQuery};

/// Tuning for one kind of projectile, loaded from `projectiles/*.ron`.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ProjectileSpec {
    /// Units per second along the facing direction
    pub speed: f32,
    /// Visual/hit scale multiplier
    #[serde(default = "default_size_mod")]
    pub size_mod: f32,
    /// Distance after which the projectile retires as a miss
    pub range: f32,
    /// Extra entities the projectile may pass through after its first hit
    #[serde(default)]
    pub penetration: u32,
    pub min_damage: f32,
    pub max_damage: f32,
    /// Layers the projectile can hit
    pub hit_layers: LayerMask,
}

fn default_size_mod() -> f32 {
    1.0
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            speed: 14.0,
            size_mod: 1.0,
            range: 12.0,
            penetration: 0,
            min_damage: 5.0,
            max_damage: 8.0,
            hit_layers: LayerMask::ENEMY | LayerMask::OBSTACLE,
        }
    }
}

/// Why a projectile left play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retirement {
    /// Hit more entities than its penetration allows
    Spent,
    /// Travelled its full range
    OutOfRange,
}

/// A registered hit from one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub entity: Entity,
    pub point: Vec3,
    pub damage: f32,
}

/// What happened during one physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    pub impact: Option<Impact>,
    pub retired: Option<Retirement>,
}

/// A projectile in flight.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub spec: ProjectileSpec,
    /// Normalized facing
    pub direction: Vec3,
    pub fired_by: Entity,
    pub target: Option<Entity>,
    pub inherited_velocity: Vec3,
    elapsed_range: f32,
    impacts: u32,
    hit_set: HashSet<Entity>,
    retired: bool,
}

impl Projectile {
    pub fn new(spec: ProjectileSpec, direction: Vec3, fired_by: Entity) -> Self {
        Self {
            spec,
            direction: direction.normalize_or_zero(),
            fired_by,
            target: None,
            inherited_velocity: Vec3::ZERO,
            elapsed_range: 0.0,
            impacts: 0,
            hit_set: HashSet::new(),
            retired: false,
        }
    }

    pub fn with_target(mut self, target: Option<Entity>) -> Self {
        self.target = target;
        self
    }

    pub fn with_inherited_velocity(mut self, velocity: Vec3) -> Self {
        self.inherited_velocity = velocity;
        self
    }

    pub fn elapsed_range(&self) -> f32 {
        self.elapsed_range
    }

    pub fn impacts(&self) -> u32 {
        self.impacts
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn has_hit(&self, entity: Entity) -> bool {
        self.hit_set.contains(&entity)
    }

    fn should_register(&self, entity: Entity) -> bool {
        entity != self.fired_by && !self.hit_set.contains(&entity)
    }

    /// Advance one physics step of `delta` seconds, moving `position`.
    pub fn step(
        &mut self,
        position: &mut Vec3,
        delta: f32,
        query: &impl SpatialQuery,
        rng: &mut impl Rng,
    ) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if self.retired {
            return outcome;
        }

        let motion = (self.direction * self.spec.speed + self.inherited_velocity) * delta;
        let distance = motion.length();

        let hit = if distance > 0.0 {
            query
                .raycast_first_hit(*position, motion, distance, self.spec.hit_layers)
                .filter(|hit| self.should_register(hit.entity))
        } else {
            None
        };

        match hit {
            Some(hit) => {
                *position = hit.point;

                let damage = random_between(rng, self.spec.min_damage, self.spec.max_damage);
                self.hit_set.insert(hit.entity);
                self.impacts += 1;
                outcome.impact = Some(Impact {
                    entity: hit.entity,
                    point: hit.point,
                    damage,
                });

                if self.impacts > self.spec.penetration {
                    outcome.retired = Some(Retirement::Spent);
                }
            }
            None => *position += motion,
        }

        self.elapsed_range += distance;
        if outcome.retired.is_none() && self.elapsed_range >= self.spec.range {
            outcome.retired = Some(Retirement::OutOfRange);
        }

        self.retired = outcome.retired.is_some();
        outcome
    }
}
