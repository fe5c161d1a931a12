//! Core module - simulation state, events, timers and configuration.
//!
//! This module provides the foundation that all other simulation systems build upon.

mod config;
mod events;
mod plugin;
mod rng;
mod states;
mod timers;

pub use config::{ArenaConfig, PlayerConfig, SimConfig};
pub use events::*;
pub use plugin::{CorePlugin, SimSet};
pub use rng::{random_between, SimRng};
pub use states::*;
pub use timers::{Cooldown, RepeatingTask};
