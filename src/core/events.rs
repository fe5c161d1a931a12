//! Global events used for cross-system communication.
//!
//! Anything that wants to change an entity's health sends a request event.
//! The health pipeline applies requests once per frame and publishes the
//! outcome as notice events, which AI, tagging and presentation systems
//! subscribe to. Nothing outside the pipeline mutates `Health` directly.

use bevy::prelude::*;

/// Asks the health pipeline to damage an entity.
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageRequest {
    /// Entity receiving damage
    pub target: Entity,
    /// Entity that caused the damage
    pub source: Entity,
    /// Damage before clamping; negative values are treated as zero
    pub amount: f32,
}

/// Asks the health pipeline to heal an entity.
#[derive(Event, Debug, Clone, Copy)]
pub struct HealRequest {
    pub target: Entity,
    pub amount: f32,
}

/// Asks the health pipeline to bring a dead entity back.
#[derive(Event, Debug, Clone, Copy)]
pub struct ResurrectRequest {
    pub target: Entity,
    /// Entity casting the resurrection
    pub by: Entity,
}

/// Sent when a non-lethal hit lands (or a lethal one under
/// `LethalHitPolicy::DamagedAndKilled`).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Damaged {
    pub entity: Entity,
    pub source: Entity,
}

/// Sent when an entity's health reaches zero.
///
/// Systems listen for this to stop AI, turn enemies into corpses and end
/// the run when the player falls.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Killed {
    /// Entity that died
    pub entity: Entity,
    /// Entity that dealt the final blow
    pub source: Entity,
}

/// Sent when a heal request was accepted.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Healed {
    pub entity: Entity,
    pub amount: f32,
}

/// Sent when a corpse comes back to life.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Resurrected {
    pub entity: Entity,
}
