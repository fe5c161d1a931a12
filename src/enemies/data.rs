//! Enemy data loading from RON files.

use bevy::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;

use crate::world::{load_ron_dir, DataDir, DataLoadError};

use super::mage::MageConfig;
use super::melee::MeleeConfig;

/// Which brain an enemy runs, with its tunables.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub enum EnemyKind {
    Melee(MeleeConfig),
    Mage(MageConfig),
}

/// Enemy definition loaded from RON file.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct EnemyDefinition {
    pub name: String,
    pub max_health: f32,
    #[serde(default = "default_body_radius")]
    pub body_radius: f32,
    pub kind: EnemyKind,
}

fn default_body_radius() -> f32 {
    0.25
}

impl EnemyDefinition {
    /// Reject definitions the simulation cannot run.
    pub fn validate(&self) -> Result<(), DataLoadError> {
        let invalid = |reason: &str| DataLoadError::InvalidDefinition {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.max_health <= 0.0 {
            return Err(invalid("max_health must be positive"));
        }
        if self.body_radius <= 0.0 {
            return Err(invalid("body_radius must be positive"));
        }
        if let EnemyKind::Mage(mage) = &self.kind {
            if mage.resurrect_radius <= 0.0 {
                return Err(invalid("resurrect_radius must be positive"));
            }
        }
        Ok(())
    }
}

/// Resource holding all loaded enemy definitions.
#[derive(Resource, Debug, Clone)]
pub struct EnemyRegistry {
    pub definitions: HashMap<String, EnemyDefinition>,
}

impl Default for EnemyRegistry {
    fn default() -> Self {
        let mut definitions = HashMap::new();
        definitions.insert(
            "skeleton".to_string(),
            EnemyDefinition {
                name: "Skeleton".to_string(),
                max_health: 20.0,
                body_radius: default_body_radius(),
                kind: EnemyKind::Melee(MeleeConfig::default()),
            },
        );
        definitions.insert(
            "necromancer".to_string(),
            EnemyDefinition {
                name: "Necromancer".to_string(),
                max_health: 30.0,
                body_radius: default_body_radius(),
                kind: EnemyKind::Mage(MageConfig::default()),
            },
        );
        Self { definitions }
    }
}

impl EnemyRegistry {
    /// Get an enemy definition by type name.
    pub fn get(&self, enemy_type: &str) -> Option<&EnemyDefinition> {
        self.definitions.get(enemy_type)
    }
}

/// Load all enemy definitions from the `enemies/` data directory.
pub fn load_enemy_definitions(data_dir: Res<DataDir>, mut registry: ResMut<EnemyRegistry>) {
    let Some(dir) = data_dir.0.as_ref() else {
        return;
    };

    let loaded = match load_ron_dir::<EnemyDefinition>(&dir.join("enemies")) {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!("Using built-in enemy definitions: {}", e);
            return;
        }
    };

    for (enemy_type, definition) in loaded {
        match definition.validate() {
            Ok(()) => {
                info!("Loaded enemy definition: {} ({})", definition.name, enemy_type);
                registry.definitions.insert(enemy_type, definition);
            }
            Err(e) => error!("{}", e),
        }
    }

    info!("Loaded {} enemy definitions", registry.definitions.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_melee_definition() {
        let source = r#"(
            name: "Ghoul",
            max_health: 12.0,
            kind: Melee((
                move_speed: 4.0,
                strike_range: 1.2,
            )),
        )"#;
        let definition: EnemyDefinition = ron::from_str(source).expect("valid ron");

        assert_eq!(definition.body_radius, 0.25);
        let EnemyKind::Melee(melee) = &definition.kind else {
            panic!("expected a melee enemy");
        };
        assert_eq!(melee.move_speed, 4.0);
        assert_eq!(melee.idle_buffer, 0.5);
        assert!(definition.validate().is_ok());
    }

    #[test]
    fn parses_mage_definition() {
        let source = r#"(
            name: "Lich",
            max_health: 40.0,
            body_radius: 0.3,
            kind: Mage((
                min_strike_range: 4.0,
                max_strike_range: 6.0,
                bolt: None,
            )),
        )"#;
        let definition: EnemyDefinition = ron::from_str(source).expect("valid ron");

        let EnemyKind::Mage(mage) = &definition.kind else {
            panic!("expected a mage");
        };
        assert_eq!(mage.bolt, None);
        assert_eq!(mage.max_resurrects, 5);
        assert_eq!(mage.avoidance.near_distance, Some(1.0));
    }

    #[test]
    fn rejects_non_positive_health() {
        let definition = EnemyDefinition {
            max_health: 0.0,
            ..EnemyRegistry::default().get("skeleton").cloned().expect("built-in")
        };
        assert!(matches!(
            definition.validate(),
            Err(DataLoadError::InvalidDefinition { .. })
        ));
    }
}
