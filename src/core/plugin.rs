//! Core plugin that sets up simulation state, events and configuration.

use bevy::app::{RunFixedMainLoop, RunFixedMainLoopSystem};
use bevy::prelude::*;

use super::config::SimConfig;
use super::events::*;
use super::rng::SimRng;
use super::states::*;
use crate::world::{load_ron, DataDir};

/// Per-frame ordering of the simulation.
///
/// `Think` runs in the variable-rate part of the frame before the fixed
/// loop, so timers and state transitions always precede the movement and
/// projectile integration that run in `FixedUpdate` (`Motion`). `Resolve`
/// runs in `Update`, after the fixed loop, and applies health requests
/// produced by both. `React` follows it and handles the resulting notices.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimSet {
    Think,
    Motion,
    Resolve,
    React,
}

/// Core plugin - must be added first as other plugins depend on it.
///
/// This plugin sets up:
/// - Simulation state (Running, Defeated)
/// - Health request and notice events
/// - `SimConfig` and the seeded `SimRng`
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app
            .init_state::<SimState>()
            .init_resource::<SimConfig>()
            .init_resource::<SimRng>()
            .init_resource::<DataDir>()

            // Health requests and notices
            .add_event::<DamageRequest>()
            .add_event::<HealRequest>()
            .add_event::<ResurrectRequest>()
            .add_event::<Damaged>()
            .add_event::<Killed>()
            .add_event::<Healed>()
            .add_event::<Resurrected>()

            .configure_sets(
                RunFixedMainLoop,
                SimSet::Think
                    .in_set(RunFixedMainLoopSystem::BeforeFixedMainLoop)
                    .run_if(in_state(SimState::Running)),
            )
            .configure_sets(FixedUpdate, SimSet::Motion.run_if(in_state(SimState::Running)))
            .configure_sets(Update, (SimSet::Resolve, SimSet::React).chain())

            // Configuration has to exist before anything spawns
            .add_systems(PreStartup, (load_sim_config, seed_rng).chain());
    }
}

/// Replace the default config with `sim.ron` when a data directory is set.
fn load_sim_config(data_dir: Res<DataDir>, mut config: ResMut<SimConfig>) {
    let Some(dir) = data_dir.0.as_ref() else {
        return;
    };

    let path = dir.join("sim.ron");
    match load_ron::<SimConfig>(&path) {
        Ok(loaded) => {
            info!("Loaded simulation config from {:?}", path);
            *config = loaded;
        }
        Err(e) => warn!("Using default simulation config: {}", e),
    }
}

fn seed_rng(mut commands: Commands, config: Res<SimConfig>) {
    commands.insert_resource(SimRng::from_seed(config.seed));
}
