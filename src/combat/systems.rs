//! Combat systems: the health pipeline, firing patterns and projectile flight.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::core::{DamageRequest, Damaged, HealRequest, Healed, Killed, ResurrectRequest, Resurrected, SimRng};
use crate::world::{Sensors, SpatialQuery, Tag, Velocity};

use super::data::ProjectileRegistry;
use super::firing::{fire, Aim, FiringPattern, ProjectileSpawner, Shot};
use super::health::Health;
use super::pool::{PoolCommands, Pooled, ProjectilePool};
use super::projectile::Projectile;

/// Count down invulnerability windows.
pub fn tick_health(time: Res<Time>, mut healths: Query<&mut Health>) {
    let delta = time.delta_secs();
    for mut health in &mut healths {
        health.tick(delta);
    }
}

/// Writers for every health notice.
#[derive(SystemParam)]
pub struct HealthNotices<'w> {
    damaged: EventWriter<'w, Damaged>,
    killed: EventWriter<'w, Killed>,
    healed: EventWriter<'w, Healed>,
    resurrected: EventWriter<'w, Resurrected>,
}

/// Apply this frame's health requests and publish what happened.
///
/// Damage is applied before healing, and healing before resurrection, so a
/// corpse raised this frame cannot be hit again until the next one.
pub fn apply_health_requests(
    mut damage_requests: EventReader<DamageRequest>,
    mut heal_requests: EventReader<HealRequest>,
    mut resurrect_requests: EventReader<ResurrectRequest>,
    mut healths: Query<&mut Health>,
    mut notices: HealthNotices,
) {
    for request in damage_requests.read() {
        let Ok(mut health) = healths.get_mut(request.target) else {
            continue;
        };

        match health.damage(request.amount, request.source) {
            Ok(applied) => {
                if applied.notify_damaged {
                    notices.damaged.send(Damaged {
                        entity: request.target,
                        source: applied.source,
                    });
                }
                if applied.killed {
                    info!("{:?} was killed by {:?}", request.target, applied.source);
                    notices.killed.send(Killed {
                        entity: request.target,
                        source: applied.source,
                    });
                }
            }
            Err(rejection) => debug!("Damage to {:?} ignored: {}", request.target, rejection),
        }
    }

    for request in heal_requests.read() {
        let Ok(mut health) = healths.get_mut(request.target) else {
            continue;
        };

        match health.heal(request.amount) {
            Ok(amount) => {
                notices.healed.send(Healed {
                    entity: request.target,
                    amount,
                });
            }
            Err(rejection) => debug!("Heal of {:?} ignored: {}", request.target, rejection),
        }
    }

    for request in resurrect_requests.read() {
        let Ok(mut health) = healths.get_mut(request.target) else {
            continue;
        };

        match health.resurrect() {
            Ok(()) => {
                info!("{:?} was resurrected by {:?}", request.target, request.by);
                notices.resurrected.send(Resurrected { entity: request.target });
            }
            Err(rejection) => debug!("Resurrection of {:?} ignored: {}", request.target, rejection),
        }
    }
}

/// Direction to fire in and the entity aimed at, if any.
fn resolve_aim(
    aim: &Aim,
    me: Entity,
    origin: Vec3,
    sensors: &Sensors,
    view: &impl SpatialQuery,
) -> Option<(Vec3, Option<Entity>)> {
    match *aim {
        Aim::Direction(direction) => Some((direction, None)),
        Aim::AtEntity(target) => sensors
            .body(target)
            .map(|(position, _)| (position - origin, Some(target))),
        Aim::Nearest { tag, radius } => view
            .query_nearby(origin, radius, tag.layer())
            .into_iter()
            .filter(|neighbor| neighbor.entity != me && neighbor.tag == tag)
            .min_by(|a, b| {
                a.position
                    .distance_squared(origin)
                    .total_cmp(&b.position.distance_squared(origin))
            })
            .map(|neighbor| (neighbor.position - origin, Some(neighbor.entity))),
    }
}

/// Advance every firing schedule and spawn the shots that came due.
pub fn schedule_firing(
    mut commands: Commands,
    time: Res<Time>,
    mut rng: ResMut<SimRng>,
    sensors: Sensors,
    projectiles: Res<ProjectileRegistry>,
    mut pool: ResMut<ProjectilePool>,
    mut shooters: Query<(Entity, &Transform, &mut FiringPattern, Option<&Aim>, Option<&Velocity>)>,
) {
    let delta = time.delta_secs();
    let view = sensors.view();

    for (entity, transform, mut pattern, aim, velocity) in &mut shooters {
        let FiringPattern { config, schedule } = &mut *pattern;
        let shots = schedule.advance(config, delta, &mut rng.0);
        if shots == 0 {
            continue;
        }

        let origin = transform.translation;
        let Some((direction, target)) = aim.and_then(|aim| resolve_aim(aim, entity, origin, &sensors, &view)) else {
            continue;
        };

        let Some(spec) = projectiles.get(&config.projectile) else {
            warn_once!("Unknown projectile {}", config.projectile);
            continue;
        };

        let inherited_velocity = match (config.inherit_velocity, velocity) {
            (true, Some(velocity)) => velocity.0,
            _ => Vec3::ZERO,
        };

        let mut spawner = PoolCommands {
            pool: &mut *pool,
            commands: &mut commands,
        };
        for _ in 0..shots {
            let shot = Shot {
                origin,
                direction,
                fired_by: entity,
                target,
                inherited_velocity,
            };
            fire(&mut spawner, spec, shot, config.muzzle_offset);
        }
    }
}

/// Move projectiles one physics step, request damage for hits and return
/// retired projectiles to the pool.
pub fn advance_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut rng: ResMut<SimRng>,
    sensors: Sensors,
    mut pool: ResMut<ProjectilePool>,
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile), (Without<Pooled>, Without<Tag>)>,
    mut damage: EventWriter<DamageRequest>,
) {
    let delta = time.delta_secs();
    let view = sensors.view();

    for (entity, mut transform, mut projectile) in &mut projectiles {
        let outcome = projectile.step(&mut transform.translation, delta, &view, &mut rng.0);

        if let Some(impact) = outcome.impact {
            damage.send(DamageRequest {
                target: impact.entity,
                source: projectile.fired_by,
                amount: impact.damage,
            });
        }

        if let Some(reason) = outcome.retired {
            debug!("Projectile {:?} retired: {:?}", entity, reason);
            PoolCommands {
                pool: &mut *pool,
                commands: &mut commands,
            }
            .release_pooled(entity);
        }
    }
}

/// Dead shooters stop firing; resurrected ones start again.
pub fn toggle_firing(
    mut killed: EventReader<Killed>,
    mut resurrected: EventReader<Resurrected>,
    mut patterns: Query<&mut FiringPattern>,
) {
    for event in killed.read() {
        if let Ok(mut pattern) = patterns.get_mut(event.entity) {
            pattern.set_should_fire(false);
        }
    }

    for event in resurrected.read() {
        if let Ok(mut pattern) = patterns.get_mut(event.entity) {
            pattern.set_should_fire(true);
        }
    }
}
