//! Projectile pool.
//!
//! Released projectiles are parked (hidden and marked [`Pooled`]) instead
//! of despawned, and handed out again by the next spawn.

use bevy::prelude::*;
use std::collections::HashSet;

use super::firing::ProjectileSpawner;
use super::projectile::Projectile;

/// Marks a projectile that is parked in the pool.
#[derive(Component, Debug, Default)]
pub struct Pooled;

/// Bookkeeping of live and parked projectile entities.
#[derive(Resource, Debug, Default)]
pub struct ProjectilePool {
    free: Vec<Entity>,
    live: HashSet<Entity>,
}

impl ProjectilePool {
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn is_live(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    /// Mark `entity` live. Returns `false` if it already was.
    fn track(&mut self, entity: Entity) -> bool {
        self.live.insert(entity)
    }

    /// Move a live entity to the free list. Releasing twice is a no-op.
    fn park(&mut self, entity: Entity) -> bool {
        if !self.live.remove(&entity) {
            return false;
        }
        self.free.push(entity);
        true
    }
}

/// The pool together with the command buffer it spawns through.
pub struct PoolCommands<'a, 'w, 's> {
    pub pool: &'a mut ProjectilePool,
    pub commands: &'a mut Commands<'w, 's>,
}

fn projectile_transform(projectile: &Projectile, position: Vec3) -> Transform {
    let rotation = if projectile.direction == Vec3::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_rotation_arc(Vec3::X, projectile.direction)
    };
    Transform::from_translation(position)
        .with_rotation(rotation)
        .with_scale(Vec3::splat(projectile.spec.size_mod))
}

impl ProjectileSpawner for PoolCommands<'_, '_, '_> {
    fn spawn_pooled(&mut self, projectile: Projectile, position: Vec3) -> Entity {
        let transform = projectile_transform(&projectile, position);

        while let Some(parked) = self.pool.free.pop() {
            // Parked entities can be despawned from outside (scene teardown).
            if let Some(mut entity) = self.commands.get_entity(parked) {
                entity
                    .remove::<Pooled>()
                    .insert((projectile, transform, Visibility::Visible));
                self.pool.track(parked);
                return parked;
            }
        }

        let entity = self
            .commands
            .spawn((Name::new("Projectile"), projectile, transform, Visibility::Visible))
            .id();
        self.pool.track(entity);
        entity
    }

    fn release_pooled(&mut self, entity: Entity) -> bool {
        if !self.pool.park(entity) {
            return false;
        }
        if let Some(mut parked) = self.commands.get_entity(entity) {
            parked.insert((Pooled, Visibility::Hidden));
        }
        true
    }
}
