//! Simulation state definitions.
//!
//! AI, firing and projectile systems only run while the simulation is
//! `Running`. The player's death flips it to `Defeated`, which freezes the
//! arena but keeps every entity in place.

use bevy::prelude::*;

/// Top-level simulation state.
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum SimState {
    /// Active simulation
    #[default]
    Running,
    /// The player has died
    Defeated,
}
