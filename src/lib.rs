//! Inevitable - a top-down arena of melee enemies and corpse-raising mages.
//!
//! # Architecture
//!
//! The simulation is organized into plugins, each handling a specific aspect:
//!
//! - **Core**: Simulation state, health events, timers, configuration
//! - **World**: Tags and layers, spatial queries, data files, arena setup
//! - **Combat**: Health pipeline, firing patterns, pooled projectiles
//! - **Enemies**: Melee and mage brains, crowd steering, attack swings
//!
//! Rendering is left to the binary, so the library runs headless under
//! `MinimalPlugins` as well.

pub mod combat;
pub mod core;
pub mod enemies;
pub mod world;

use bevy::prelude::*;
use std::path::PathBuf;

use world::DataDir;

/// Main simulation plugin that adds all sub-plugins.
pub struct InevitablePlugin {
    /// Where the RON data files live. `None` runs on built-in defaults.
    pub data_dir: Option<PathBuf>,
}

impl InevitablePlugin {
    /// Run without reading any data files.
    pub fn headless() -> Self {
        Self { data_dir: None }
    }
}

impl Default for InevitablePlugin {
    fn default() -> Self {
        Self {
            data_dir: DataDir::default().0,
        }
    }
}

impl Plugin for InevitablePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DataDir(self.data_dir.clone()))
            // Core systems (must be first)
            .add_plugins(core::CorePlugin)
            .add_plugins(world::WorldPlugin)
            .add_plugins(combat::CombatPlugin)
            .add_plugins(enemies::EnemyPlugin);
    }
}
