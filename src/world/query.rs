//! The spatial query collaborator.
//!
//! AI and projectiles never talk to the physics engine directly. They ask a
//! [`SpatialQuery`] for neighbours and ray hits, which keeps the steering,
//! state machine and hit resolution code testable against a plain list of
//! bodies.

use bevy::prelude::*;

use super::layers::{LayerMask, Tag};

/// An entity returned by a neighbourhood query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub entity: Entity,
    pub position: Vec3,
    pub tag: Tag,
}

/// First blocking hit along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    /// Distance from the ray origin to `point`
    pub distance: f32,
}

/// Read-only view of the world's collision shapes.
pub trait SpatialQuery {
    /// Entities whose bodies overlap the circle. Unordered, and may include
    /// the entity doing the asking; callers exclude themselves.
    fn query_nearby(&self, center: Vec3, radius: f32, filter: LayerMask) -> Vec<Neighbor>;

    /// First body hit by a ray of length `max_distance`. `direction` need
    /// not be normalized.
    fn raycast_first_hit(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: LayerMask,
    ) -> Option<RayHit>;
}

/// A circular body captured for a [`SnapshotQuery`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub entity: Entity,
    pub position: Vec3,
    pub radius: f32,
    pub tag: Tag,
}

/// Brute-force spatial query over a list of bodies.
///
/// Used when no physics context is present (headless tests, tools) and as
/// the reference behaviour for the physics-backed query.
#[derive(Debug, Clone, Default)]
pub struct SnapshotQuery {
    bodies: Vec<Body>,
}

impl SnapshotQuery {
    pub fn new(bodies: impl IntoIterator<Item = Body>) -> Self {
        Self {
            bodies: bodies.into_iter().collect(),
        }
    }

    pub fn push(&mut self, body: Body) {
        self.bodies.push(body);
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl SpatialQuery for SnapshotQuery {
    fn query_nearby(&self, center: Vec3, radius: f32, filter: LayerMask) -> Vec<Neighbor> {
        self.bodies
            .iter()
            .filter(|body| filter.contains(body.tag))
            .filter(|body| body.position.distance(center) <= radius + body.radius)
            .map(|body| Neighbor {
                entity: body.entity,
                position: body.position,
                tag: body.tag,
            })
            .collect()
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

        self.bodies
            .iter()
            .filter(|body| filter.contains(body.tag))
            .filter_map(|body| {
                ray_circle_distance(origin, direction, body.position, body.radius)
                    .filter(|distance| *distance <= max_distance)
                    .map(|distance| RayHit {
                        entity: body.entity,
                        point: origin + direction * distance,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Distance along a normalized ray to the first point inside a circle.
/// A ray starting inside the circle hits at distance zero.
fn ray_circle_distance(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let b = offset.dot(direction);
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let distance = -b - discriminant.sqrt();
    (distance >= 0.0).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn body(id: u32, x: f32, tag: Tag) -> Body {
        Body {
            entity: Entity::from_raw(id),
            position: Vec3::new(x, 0.0, 0.0),
            radius: 0.5,
            tag,
        }
    }

    #[test]
    fn nearby_respects_radius_and_filter() {
        let query = SnapshotQuery::new([
            body(1, 1.0, Tag::Enemy),
            body(2, 3.4, Tag::Enemy),
            body(3, 1.0, Tag::Corpse),
            body(4, 10.0, Tag::Enemy),
        ]);

        let found: Vec<_> = query
            .query_nearby(Vec3::ZERO, 3.0, LayerMask::ENEMY)
            .into_iter()
            .map(|n| n.entity)
            .collect();

        // Body 2 overlaps because its radius reaches into the circle.
        assert_eq!(found, vec![Entity::from_raw(1), Entity::from_raw(2)]);
    }

    #[test]
    fn raycast_returns_closest_hit() {
        let query = SnapshotQuery::new([body(1, 5.0, Tag::Enemy), body(2, 3.0, Tag::Enemy)]);

        let hit = query
            .raycast_first_hit(Vec3::ZERO, Vec3::X * 2.0, 10.0, LayerMask::ENEMY)
            .expect("ray should hit");

        assert_eq!(hit.entity, Entity::from_raw(2));
        assert_relative_eq!(hit.distance, 2.5, epsilon = 1e-5);
        assert_relative_eq!(hit.point.x, 2.5, epsilon = 1e-5);
    }

    #[test]
    fn raycast_stops_at_max_distance() {
        let query = SnapshotQuery::new([body(1, 5.0, Tag::Enemy)]);
        assert!(query
            .raycast_first_hit(Vec3::ZERO, Vec3::X, 4.0, LayerMask::ENEMY)
            .is_none());
    }

    #[test]
    fn raycast_ignores_bodies_behind_origin() {
        let query = SnapshotQuery::new([body(1, -3.0, Tag::Enemy)]);
        assert!(query
            .raycast_first_hit(Vec3::ZERO, Vec3::X, 10.0, LayerMask::ENEMY)
            .is_none());
    }

    #[test]
    fn raycast_from_inside_hits_immediately() {
        let query = SnapshotQuery::new([body(1, 0.2, Tag::Enemy)]);
        let hit = query
            .raycast_first_hit(Vec3::ZERO, Vec3::X, 1.0, LayerMask::ENEMY)
            .expect("origin is inside the body");
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn zero_length_ray_hits_nothing() {
        let query = SnapshotQuery::new([body(1, 0.2, Tag::Enemy)]);
        assert!(query
            .raycast_first_hit(Vec3::ZERO, Vec3::ZERO, 1.0, LayerMask::ALL)
            .is_none());
    }
}
