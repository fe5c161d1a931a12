//! Combat module - health, firing patterns and pooled projectiles.

mod data;
mod firing;
mod health;
mod plugin;
mod pool;
mod projectile;
mod systems;

pub use data::{load_projectile_definitions, load_weapon_definitions, ProjectileRegistry, WeaponRegistry};
pub use firing::{fire, Aim, FiringConfig, FiringPattern, FiringPhase, FiringSchedule, ProjectileSpawner, Shot};
pub use health::{DamageApplied, Health, HealthRejection, LethalHitPolicy};
pub use plugin::CombatPlugin;
pub use pool::{PoolCommands, Pooled, ProjectilePool};
pub use projectile::{Impact, Projectile, ProjectileSpec, Retirement, StepOutcome};
pub use systems::{
    advance_projectiles, apply_health_requests, schedule_firing, tick_health, toggle_firing, HealthNotices,
};
