//! Entity spawning functions for arena construction.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{Collider, RigidBody};
use rand::Rng;
use std::f32::consts::TAU;

use super::layers::{BodyRadius, Tag, Velocity};
use crate::combat::{Aim, FiringConfig, FiringPattern, Health, WeaponRegistry};
use crate::core::{PlayerConfig, SimConfig, SimRng};
use crate::enemies::{BrainTiming, EnemyBrain, EnemyDefinition, EnemyKind, EnemyRegistry, MageBrain, MeleeBrain};

/// Whether an enemy enters the arena alive or as a corpse waiting to be raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemySpawn {
    Alive,
    Corpse,
}

/// Health configured with the simulation's invulnerability and lethal-hit settings.
pub fn health_for(max_health: f32, config: &SimConfig) -> Health {
    Health::new(max_health)
        .with_invulnerability(config.invulnerability_window, config.resurrect_grants_invulnerability)
        .with_lethal_policy(config.lethal_policy)
}

/// Components every circular body in the arena carries.
pub fn body_bundle(tag: Tag, position: Vec3, radius: f32) -> impl Bundle {
    (
        tag,
        Transform::from_translation(position),
        BodyRadius(radius),
        Velocity::default(),
        RigidBody::KinematicPositionBased,
        Collider::ball(radius),
        tag.collision_groups(),
    )
}

pub fn player_bundle(position: Vec3, player: &PlayerConfig, weapon: FiringConfig, config: &SimConfig) -> impl Bundle {
    (
        Name::new("Player"),
        body_bundle(Tag::Player, position, player.body_radius),
        health_for(player.max_health, config),
        FiringPattern::new(weapon),
        Aim::Nearest {
            tag: Tag::Enemy,
            radius: player.aim_radius,
        },
    )
}

fn prepare<B: EnemyBrain>(mut brain: B, spawn: EnemySpawn, target: Option<Entity>) -> B {
    brain.set_target(target);
    if spawn == EnemySpawn::Corpse {
        brain.on_killed();
    }
    brain
}

/// Spawn an enemy from its definition. Corpses start slain, with their
/// brain already dead.
pub fn spawn_enemy(
    commands: &mut Commands,
    definition: &EnemyDefinition,
    position: Vec3,
    spawn: EnemySpawn,
    target: Option<Entity>,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Entity {
    let (tag, health) = match spawn {
        EnemySpawn::Alive => (Tag::Enemy, health_for(definition.max_health, config)),
        EnemySpawn::Corpse => (Tag::Corpse, health_for(definition.max_health, config).slain()),
    };

    let mut entity = commands.spawn((
        Name::new(definition.name.clone()),
        body_bundle(tag, position, definition.body_radius),
        health,
    ));

    let timing = BrainTiming::from(config);
    match &definition.kind {
        EnemyKind::Melee(melee) => {
            entity.insert(prepare(MeleeBrain::new(melee.clone(), timing), spawn, target));
        }
        EnemyKind::Mage(mage) => {
            entity.insert(prepare(MageBrain::new(mage.clone(), rng, timing), spawn, target));
        }
    }

    entity.id()
}

/// Evenly spaced points on a circle in the play plane.
fn ring(count: u32, radius: f32, phase: f32) -> impl Iterator<Item = Vec3> {
    (0..count).map(move |i| {
        let angle = phase + TAU * i as f32 / count as f32;
        Vec3::new(angle.cos(), angle.sin(), 0.0) * radius
    })
}

/// Populate the arena: the player at the origin, enemies on a ring around
/// it and corpses scattered closer in.
pub fn spawn_arena(
    mut commands: Commands,
    config: Res<SimConfig>,
    mut rng: ResMut<SimRng>,
    enemies: Res<EnemyRegistry>,
    weapons: Res<WeaponRegistry>,
) {
    let weapon = match weapons.get(&config.player.weapon) {
        Some(weapon) => weapon.clone(),
        None => {
            warn!("Unknown player weapon: {}", config.player.weapon);
            FiringConfig::default()
        }
    };

    let player = commands
        .spawn(player_bundle(Vec3::ZERO, &config.player, weapon, &config))
        .id();
    info!("Spawned player with {}", config.player.weapon);

    let arena = &config.arena;
    let waves = [
        (&arena.melee_kind, arena.melee_count, arena.spawn_radius, 0.0, EnemySpawn::Alive),
        (&arena.mage_kind, arena.mage_count, arena.spawn_radius, TAU / 16.0, EnemySpawn::Alive),
        (&arena.melee_kind, arena.corpse_count, arena.spawn_radius * 0.5, TAU / 8.0, EnemySpawn::Corpse),
    ];

    for (kind, count, radius, phase, spawn) in waves {
        if count == 0 {
            continue;
        }
        let Some(definition) = enemies.get(kind) else {
            warn!("Unknown enemy type in arena config: {}", kind);
            continue;
        };

        for position in ring(count, radius, phase) {
            spawn_enemy(&mut commands, definition, position, spawn, Some(player), &config, &mut rng.0);
        }
        info!("Spawned {} x{} ({:?})", definition.name, count, spawn);
    }
}
