//! Enemies module - enemy brains, steering and attacks.

mod brain;
mod data;
mod mage;
mod melee;
mod plugin;
mod steering;
mod swing;
mod systems;

pub use brain::{AttackEffect, BrainTiming, EnemyBrain, EnemyState, Perception};
pub use data::{load_enemy_definitions, EnemyDefinition, EnemyKind, EnemyRegistry};
pub use mage::{CorpseSearch, MageBrain, MageConfig};
pub use melee::{MeleeBrain, MeleeConfig};
pub use plugin::EnemyPlugin;
pub use steering::{blend, steer, AvoidanceConfig, SteeringField, SteeringInput, TargetAvoidance};
pub use swing::{AttackSwing, SwingProgress};
pub use systems::{acquire_targets, advance_attack_swings, brain_reactions, think, AttackOutlets};
