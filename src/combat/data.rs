//! Projectile and weapon definitions loaded from RON files.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::world::{load_ron_dir, DataDir, LayerMask};

use super::firing::FiringConfig;
use super::projectile::ProjectileSpec;

/// Projectile definitions keyed by file stem.
#[derive(Resource, Debug, Clone)]
pub struct ProjectileRegistry {
    pub definitions: HashMap<String, ProjectileSpec>,
}

impl Default for ProjectileRegistry {
    fn default() -> Self {
        let mut definitions = HashMap::new();
        definitions.insert("knife".to_string(), ProjectileSpec::default());
        definitions.insert(
            "necrotic_bolt".to_string(),
            ProjectileSpec {
                speed: 6.0,
                size_mod: 1.5,
                range: 14.0,
                penetration: 0,
                min_damage: 8.0,
                max_damage: 12.0,
                hit_layers: LayerMask::PLAYER | LayerMask::OBSTACLE,
            },
        );
        Self { definitions }
    }
}

impl ProjectileRegistry {
    pub fn get(&self, name: &str) -> Option<&ProjectileSpec> {
        self.definitions.get(name)
    }
}

/// Weapon definitions keyed by file stem.
#[derive(Resource, Debug, Clone)]
pub struct WeaponRegistry {
    pub definitions: HashMap<String, FiringConfig>,
}

impl Default for WeaponRegistry {
    fn default() -> Self {
        let mut definitions = HashMap::new();
        definitions.insert("knife".to_string(), FiringConfig::default());
        Self { definitions }
    }
}

impl WeaponRegistry {
    pub fn get(&self, name: &str) -> Option<&FiringConfig> {
        self.definitions.get(name)
    }
}

/// Load `projectiles/*.ron` over the built-in definitions.
pub fn load_projectile_definitions(data_dir: Res<DataDir>, mut registry: ResMut<ProjectileRegistry>) {
    let Some(dir) = data_dir.0.as_ref() else {
        return;
    };

    match load_ron_dir::<ProjectileSpec>(&dir.join("projectiles")) {
        Ok(loaded) => {
            info!("Loaded {} projectile definitions", loaded.len());
            registry.definitions.extend(loaded);
        }
        Err(e) => warn!("Using built-in projectiles: {}", e),
    }
}

/// Load `weapons/*.ron` over the built-in definitions.
pub fn load_weapon_definitions(
    data_dir: Res<DataDir>,
    projectiles: Res<ProjectileRegistry>,
    mut registry: ResMut<WeaponRegistry>,
) {
    let Some(dir) = data_dir.0.as_ref() else {
        return;
    };

    match load_ron_dir::<FiringConfig>(&dir.join("weapons")) {
        Ok(loaded) => {
            for (name, weapon) in loaded {
                if projectiles.get(&weapon.projectile).is_none() {
                    warn!("Weapon {} fires unknown projectile {}", name, weapon.projectile);
                }
                registry.definitions.insert(name, weapon);
            }
            info!("Loaded {} weapon definitions", registry.definitions.len());
        }
        Err(e) => warn!("Using built-in weapons: {}", e),
    }
}
