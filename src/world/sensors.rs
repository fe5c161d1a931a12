//! System parameter that hands systems a [`SpatialQuery`] backed by Rapier,
//! or by a snapshot of tagged bodies when no Rapier context exists.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::layers::{BodyRadius, LayerMask, Tag};
use super::query::{Body, Neighbor, RayHit, SnapshotQuery, SpatialQuery};

type BodyData = (
    Entity,
    &'static Transform,
    &'static Tag,
    Option<&'static BodyRadius>,
);

/// Access to the world's spatial queries from inside a system.
#[derive(SystemParam)]
pub struct Sensors<'w, 's> {
    rapier: Query<'w, 's, &'static RapierContext>,
    bodies: Query<'w, 's, BodyData>,
}

impl<'w, 's> Sensors<'w, 's> {
    /// Build a query view for this system run.
    pub fn view(&self) -> SensorView<'_, 'w, 's> {
        match self.rapier.get_single() {
            Ok(context) => SensorView::Physics(PhysicsQuery {
                context,
                bodies: &self.bodies,
            }),
            Err(_) => SensorView::Snapshot(SnapshotQuery::new(self.bodies.iter().map(
                |(entity, transform, tag, radius)| Body {
                    entity,
                    position: transform.translation,
                    radius: radius.copied().unwrap_or_default().0,
                    tag: *tag,
                },
            ))),
        }
    }

    /// Position and tag of a tagged body.
    pub fn body(&self, entity: Entity) -> Option<(Vec3, Tag)> {
        self.bodies
            .get(entity)
            .ok()
            .map(|(_, transform, tag, _)| (transform.translation, *tag))
    }
}

/// Query view handed out by [`Sensors::view`].
pub enum SensorView<'a, 'w, 's> {
    Physics(PhysicsQuery<'a, 'w, 's>),
    Snapshot(SnapshotQuery),
}

impl SpatialQuery for SensorView<'_, '_, '_> {
    fn query_nearby(&self, center: Vec3, radius: f32, filter: LayerMask) -> Vec<Neighbor> {
        match self {
            SensorView::Physics(query) => query.query_nearby(center, radius, filter),
            SensorView::Snapshot(query) => query.query_nearby(center, radius, filter),
        }
    }

    fn raycast_first_hit(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: LayerMask,
    ) -> Option<RayHit> {
        match self {
            SensorView::Physics(query) => query.raycast_first_hit(origin, direction, max_distance, filter),
            SensorView::Snapshot(query) => query.raycast_first_hit(origin, direction, max_distance, filter),
        }
    }
}

/// Rapier-backed spatial query.
pub struct PhysicsQuery<'a, 'w, 's> {
    context: &'a RapierContext,
    bodies: &'a Query<'w, 's, BodyData>,
}

fn filter_for(mask: LayerMask) -> QueryFilter<'static> {
    QueryFilter::new().groups(CollisionGroups::new(Group::ALL, mask.group()))
}

impl SpatialQuery for PhysicsQuery<'_, '_, '_> {
    fn query_nearby(&self, center: Vec3, radius: f32, filter: LayerMask) -> Vec<Neighbor> {
        let mut found = Vec::new();
        let shape = Collider::ball(radius);

        self.context.intersections_with_shape(
            center,
            Quat::IDENTITY,
            &shape,
            filter_for(filter),
            |hit_entity| {
                if let Ok((entity, transform, tag, _)) = self.bodies.get(hit_entity) {
                    if filter.contains(*tag) {
                        found.push(Neighbor {
                            entity,
                            position: transform.translation,
                            tag: *tag,
                        });
                    }
                }
                true // Keep collecting
            },
        );

        found
    }

    fn raycast_first_hit(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: LayerMask,
    ) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let (entity, distance) =
            self.context
                .cast_ray(origin, direction, max_distance, true, filter_for(filter))?;

        Some(RayHit {
            entity,
            point: origin + direction * distance,
            distance,
        })
    }
}
