//! Combat plugin - health pipeline, firing patterns and projectiles.

use bevy::app::RunFixedMainLoop;
use bevy::prelude::*;

use super::data::{load_projectile_definitions, load_weapon_definitions, ProjectileRegistry, WeaponRegistry};
use super::pool::ProjectilePool;
use super::systems;
use crate::core::SimSet;

/// Combat plugin - handles health, firing and projectile systems.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app
            // Resources
            .init_resource::<ProjectileRegistry>()
            .init_resource::<WeaponRegistry>()
            .init_resource::<ProjectilePool>()

            // Definitions must be loaded before the arena is populated
            .add_systems(
                Startup,
                (load_projectile_definitions, load_weapon_definitions).chain(),
            )

            // Timers and firing schedules, before the fixed loop
            .add_systems(
                RunFixedMainLoop,
                (systems::tick_health, systems::schedule_firing).in_set(SimSet::Think),
            )

            // Projectile flight
            .add_systems(FixedUpdate, systems::advance_projectiles.in_set(SimSet::Motion))

            // Health requests and reactions to them
            .add_systems(Update, systems::apply_health_requests.in_set(SimSet::Resolve))
            .add_systems(Update, systems::toggle_firing.in_set(SimSet::React));
    }
}
