//! The enemy state machine interface shared by every enemy type.

use bevy::prelude::*;

use crate::core::SimConfig;
use crate::world::SpatialQuery;

use super::swing::AttackSwing;

/// Top-level enemy state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EnemyState {
    /// In range of the goal, only avoiding neighbours
    Idling,
    /// Moving towards the goal
    #[default]
    Running,
    /// Mid-attack, not moving
    Attacking,
    /// Dead until resurrected
    Dead,
}

/// What an enemy knows about the world this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    pub me: Entity,
    pub position: Vec3,
    /// The primary target and its position, if it still exists
    pub target: Option<(Entity, Vec3)>,
}

impl Perception {
    pub fn distance_to_target(&self) -> Option<f32> {
        self.target.map(|(_, target)| target.distance(self.position))
    }

    pub fn direction_to_target(&self) -> Vec3 {
        self.target
            .map(|(_, target)| (target - self.position).normalize_or_zero())
            .unwrap_or(Vec3::ZERO)
    }
}

/// What landing an attack does.
#[derive(Debug, Clone, PartialEq)]
pub enum AttackEffect {
    Strike { target: Entity, damage: f32 },
    Bolt {
        projectile: String,
        direction: Vec3,
        target: Entity,
        muzzle_offset: f32,
    },
    Resurrect { corpses: Vec<Entity> },
}

/// Cadence of the background work a brain runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrainTiming {
    pub steering_interval: f32,
    pub corpse_refine_interval: f32,
}

impl Default for BrainTiming {
    fn default() -> Self {
        Self::from(&SimConfig::default())
    }
}

impl From<&SimConfig> for BrainTiming {
    fn from(config: &SimConfig) -> Self {
        Self {
            steering_interval: config.steering_interval,
            corpse_refine_interval: config.corpse_refine_interval,
        }
    }
}

/// An enemy state machine.
///
/// The driver calls `tick` every frame, inserts the returned swing, then
/// calls `do_attack` and `end_attack` at the swing's phase boundaries.
/// `on_killed` and `on_resurrected` are driven by health notices.
pub trait EnemyBrain: Component {
    fn state(&self) -> EnemyState;

    fn target(&self) -> Option<Entity>;

    fn set_target(&mut self, target: Option<Entity>);

    /// Advance timers, background tasks and state transitions. Returns a
    /// swing when an attack begins.
    fn tick(&mut self, perception: &Perception, query: &impl SpatialQuery, delta: f32) -> Option<AttackSwing>;

    /// Velocity the enemy wants this tick.
    fn desired_velocity(&self, perception: &Perception) -> Vec3;

    /// The attack lands.
    fn do_attack(&mut self, perception: &Perception, query: &impl SpatialQuery) -> Option<AttackEffect>;

    /// The attack is over.
    fn end_attack(&mut self);

    fn on_killed(&mut self);

    fn on_resurrected(&mut self);
}
