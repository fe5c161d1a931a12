//! Simulation-wide configuration loaded from `sim.ron`.

use bevy::prelude::*;
use serde::Deserialize;

use crate::combat::LethalHitPolicy;

/// How many of each kind of entity the arena starts with.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ArenaConfig {
    #[serde(default)]
    pub melee_count: u32,
    #[serde(default)]
    pub mage_count: u32,
    /// Corpses lying around at the start, ready to be raised
    #[serde(default)]
    pub corpse_count: u32,
    /// Enemies spawn on a ring of this radius around the player
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f32,
    /// Enemy definition used for melee enemies and corpses
    #[serde(default = "default_melee_kind")]
    pub melee_kind: String,
    #[serde(default = "default_mage_kind")]
    pub mage_kind: String,
}

fn default_spawn_radius() -> f32 {
    10.0
}

fn default_melee_kind() -> String {
    "skeleton".to_string()
}

fn default_mage_kind() -> String {
    "necromancer".to_string()
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            melee_count: 0,
            mage_count: 0,
            corpse_count: 0,
            spawn_radius: default_spawn_radius(),
            melee_kind: default_melee_kind(),
            mage_kind: default_mage_kind(),
        }
    }
}

/// The player's body and weapon.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: f32,
    pub body_radius: f32,
    /// Key into the weapon registry
    pub weapon: String,
    /// The weapon fires at the nearest enemy within this radius
    pub aim_radius: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            body_radius: 0.3,
            weapon: "knife".to_string(),
            aim_radius: 8.0,
        }
    }
}

/// Global simulation settings.
#[derive(Resource, Deserialize, Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Seed for the shared simulation RNG
    #[serde(default)]
    pub seed: u64,
    /// Which notices a lethal hit publishes
    #[serde(default)]
    pub lethal_policy: LethalHitPolicy,
    /// Seconds of invulnerability after taking a hit
    #[serde(default = "default_invulnerability_window")]
    pub invulnerability_window: f32,
    /// Whether a resurrection also grants the invulnerability window
    #[serde(default = "default_true")]
    pub resurrect_grants_invulnerability: bool,
    /// Seconds between avoidance recomputes
    #[serde(default = "default_steering_interval")]
    pub steering_interval: f32,
    /// Seconds between corpse refinement passes
    #[serde(default = "default_corpse_refine_interval")]
    pub corpse_refine_interval: f32,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
}

fn default_invulnerability_window() -> f32 {
    0.02
}

fn default_true() -> bool {
    true
}

fn default_steering_interval() -> f32 {
    0.1
}

fn default_corpse_refine_interval() -> f32 {
    0.2
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            lethal_policy: LethalHitPolicy::default(),
            invulnerability_window: default_invulnerability_window(),
            resurrect_grants_invulnerability: true,
            steering_interval: default_steering_interval(),
            corpse_refine_interval: default_corpse_refine_interval(),
            player: PlayerConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}
