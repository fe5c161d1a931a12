//! World plugin - tags, motion and arena setup.

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionGroups;

use crate::combat::load_weapon_definitions;
use crate::core::{Killed, Resurrected, SimSet, SimState};
use crate::enemies::load_enemy_definitions;

use super::index::{sync_tag_index, TagIndex};
use super::layers::{Tag, Velocity};
use super::spawning::spawn_arena;

/// World plugin - keeps tags and bodies in step with the simulation.
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TagIndex>()
            // The arena needs every registry loaded
            .add_systems(
                Startup,
                spawn_arena
                    .after(load_enemy_definitions)
                    .after(load_weapon_definitions),
            )
            .add_systems(PreUpdate, sync_tag_index)
            .add_systems(FixedUpdate, integrate_motion.in_set(SimSet::Motion))
            .add_systems(Update, retag_on_notices.in_set(SimSet::React));
    }
}

/// Move every body by its velocity.
pub fn integrate_motion(time: Res<Time>, mut bodies: Query<(&mut Transform, &Velocity)>) {
    let delta = time.delta_secs();
    for (mut transform, velocity) in &mut bodies {
        if velocity.0 != Vec3::ZERO {
            transform.translation += velocity.0 * delta;
        }
    }
}

fn retag(mut tag: Mut<Tag>, groups: Option<Mut<CollisionGroups>>, to: Tag) {
    *tag = to;
    if let Some(mut groups) = groups {
        *groups = to.collision_groups();
    }
}

/// Dead enemies become corpses and raised corpses become enemies again.
/// The player's death ends the run.
pub fn retag_on_notices(
    mut killed: EventReader<Killed>,
    mut resurrected: EventReader<Resurrected>,
    mut bodies: Query<(&mut Tag, Option<&mut CollisionGroups>)>,
    mut next_state: ResMut<NextState<SimState>>,
) {
    for event in killed.read() {
        let Ok((tag, groups)) = bodies.get_mut(event.entity) else {
            continue;
        };
        let current = *tag;
        match current {
            Tag::Player => {
                info!("The player has fallen");
                next_state.set(SimState::Defeated);
            }
            Tag::Enemy => retag(tag, groups, Tag::Corpse),
            Tag::Corpse | Tag::Obstacle => {}
        }
    }

    for event in resurrected.read() {
        let Ok((tag, groups)) = bodies.get_mut(event.entity) else {
            continue;
        };
        if *tag == Tag::Corpse {
            retag(tag, groups, Tag::Enemy);
        }
    }
}
