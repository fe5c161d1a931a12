//! World module - tags, spatial queries, data files and arena setup.

mod data;
mod error;
mod index;
mod layers;
mod plugin;
mod query;
mod sensors;
mod spawning;

pub use data::{load_ron, load_ron_dir, DataDir};
pub use error::DataLoadError;
pub use index::{sync_tag_index, TagIndex};
pub use layers::{BodyRadius, LayerMask, Tag, Velocity};
pub use plugin::{integrate_motion, retag_on_notices, WorldPlugin};
pub use query::{Body, Neighbor, RayHit, SnapshotQuery, SpatialQuery};
pub use sensors::{PhysicsQuery, SensorView, Sensors};
pub use spawning::{body_bundle, health_for, player_bundle, spawn_arena, spawn_enemy, EnemySpawn};
