//! Enemy plugin - registers all enemy systems.

use bevy::app::RunFixedMainLoop;
use bevy::prelude::*;

use super::brain::EnemyBrain;
use super::data::{load_enemy_definitions, EnemyRegistry};
use super::mage::MageBrain;
use super::melee::MeleeBrain;
use super::systems::{acquire_targets, advance_attack_swings, brain_reactions, think};
use crate::core::SimSet;

/// Enemy plugin - handles enemy definitions, AI and attacks.
pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EnemyRegistry>()
            .add_systems(Startup, load_enemy_definitions);

        add_brain::<MeleeBrain>(app);
        add_brain::<MageBrain>(app);
    }
}

/// Register the systems driving one brain type.
fn add_brain<B: EnemyBrain>(app: &mut App) {
    app
        // Decide, then land or finish attacks, before anything moves
        .add_systems(
            RunFixedMainLoop,
            (acquire_targets::<B>, think::<B>, advance_attack_swings::<B>)
                .chain()
                .in_set(SimSet::Think),
        )
        .add_systems(Update, brain_reactions::<B>.in_set(SimSet::React));
}
