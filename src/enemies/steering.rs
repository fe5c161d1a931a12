//! Crowd avoidance shared by every enemy type.
//!
//! The avoidance vector is recomputed on a slow cadence and blended with
//! the goal direction every tick. Its radius shrinks as the enemy closes in
//! on its target, so crowds spread out on approach and bunch up around the
//! target once they arrive.

use bevy::prelude::*;
use serde::Deserialize;

use crate::world::{LayerMask, SpatialQuery, Tag};

const EPSILON: f32 = 1.0e-4;

/// Tunables for the avoidance radius and which layers are avoided.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct AvoidanceConfig {
    #[serde(default = "default_min_radius")]
    pub min_radius: f32,
    #[serde(default = "default_max_radius")]
    pub max_radius: f32,
    /// Neighbours touching our collider push with full strength
    #[serde(default = "default_collider_radius")]
    pub collider_radius: f32,
    /// Target distance at which the radius bottoms out. Falls back to the
    /// brain's strike range when unset.
    #[serde(default)]
    pub near_distance: Option<f32>,
    /// Target distance at which the radius peaks
    #[serde(default = "default_far_distance")]
    pub far_distance: f32,
    #[serde(default = "default_layers")]
    pub layers: LayerMask,
}

fn default_min_radius() -> f32 {
    0.5
}

fn default_max_radius() -> f32 {
    3.0
}

fn default_collider_radius() -> f32 {
    0.25
}

fn default_far_distance() -> f32 {
    5.0
}

fn default_layers() -> LayerMask {
    LayerMask::ENEMY | LayerMask::PLAYER | LayerMask::OBSTACLE
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            min_radius: default_min_radius(),
            max_radius: default_max_radius(),
            collider_radius: default_collider_radius(),
            near_distance: None,
            far_distance: default_far_distance(),
            layers: default_layers(),
        }
    }
}

impl AvoidanceConfig {
    /// Avoidance radius for the given distance to the target. Without a
    /// target the radius stays at its maximum.
    pub fn radius_for(&self, near_distance: f32, target_distance: Option<f32>) -> f32 {
        let t = target_distance
            .map(|d| inverse_lerp(near_distance, self.far_distance, d).clamp(0.0, 1.0))
            .unwrap_or(1.0);
        self.min_radius + (self.max_radius - self.min_radius) * t
    }
}

/// How the primary target takes part in avoidance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetAvoidance {
    /// Avoided like any neighbour, but never over more than this radius.
    Capped(f32),
    /// Avoided on its own over this radius (the current avoidance radius
    /// when `None`) and skipped among the neighbours.
    Separate(Option<f32>),
}

/// Everything the avoidance pass needs to know about the enemy.
#[derive(Debug, Clone, Copy)]
pub struct SteeringInput {
    pub me: Entity,
    pub position: Vec3,
    pub target: Option<(Entity, Vec3)>,
    pub near_distance: f32,
    pub target_avoidance: TargetAvoidance,
    /// Weight applied to corpses; `None` ignores them entirely
    pub corpse_weight: Option<f32>,
}

/// Result of an avoidance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringField {
    pub vector: Vec3,
    /// Radius the pass used, kept for corpse queries until the next pass
    pub radius: f32,
}

fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= EPSILON {
        return if value >= b { 1.0 } else { 0.0 };
    }
    (value - a) / (b - a)
}

/// 1 at the collider surface, 0 at the edge of the radius.
fn repulsion(distance: f32, radius: f32, collider_radius: f32) -> f32 {
    let span = radius - collider_radius;
    if span <= EPSILON {
        return 1.0;
    }
    1.0 - (distance - collider_radius) / span
}

/// Compute the avoidance vector from the enemy's surroundings.
pub fn steer(config: &AvoidanceConfig, input: &SteeringInput, query: &impl SpatialQuery) -> SteeringField {
    let position = input.position;
    let target_distance = input.target.map(|(_, target)| target.distance(position));
    let radius = config.radius_for(input.near_distance, target_distance);

    let mut sum = Vec3::ZERO;
    let mut count = 0u32;

    // Keep clear of the target on its own radius
    if let (TargetAvoidance::Separate(own_radius), Some((_, target))) = (input.target_avoidance, input.target) {
        let chosen = own_radius.unwrap_or(radius);
        let distance = target.distance(position);
        if distance < chosen {
            sum -= (target - position).normalize_or_zero() * repulsion(distance, chosen, config.collider_radius);
            count += 1;
        }
    }

    for neighbor in query.query_nearby(position, radius, config.layers) {
        // Skip ourselves
        if neighbor.entity == input.me {
            continue;
        }

        let mut effective = radius;
        if input.target.is_some_and(|(target, _)| target == neighbor.entity) {
            match input.target_avoidance {
                TargetAvoidance::Separate(_) => continue,
                TargetAvoidance::Capped(cap) => effective = effective.min(cap),
            }
        }

        // Corpses only count while looking for them
        let weight = match (neighbor.tag, input.corpse_weight) {
            (Tag::Corpse, Some(weight)) => weight,
            (Tag::Corpse, None) => continue,
            _ => 1.0,
        };

        // The query matches overlapping bodies; only centres inside count.
        let offset = neighbor.position - position;
        let distance = offset.length();
        if distance > effective {
            continue;
        }

        sum -= offset.normalize_or_zero() * repulsion(distance, effective, config.collider_radius) * weight;
        count += 1;
    }

    // Average over everything that pushed
    if count > 1 {
        sum /= count as f32;
    }

    SteeringField { vector: sum, radius }
}

/// Blend a goal direction with the avoidance vector, capped at unit length.
pub fn blend(goal: Vec3, goal_weight: f32, avoidance: Vec3) -> Vec3 {
    (goal.normalize_or_zero() * goal_weight + avoidance).clamp_length_max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Body, SnapshotQuery};
    use approx::assert_relative_eq;
    use rstest::rstest;

    const ME: Entity = Entity::from_raw(1);
    const PLAYER: Entity = Entity::from_raw(2);

    fn body(id: u32, x: f32, y: f32, tag: Tag) -> Body {
        Body {
            entity: Entity::from_raw(id),
            position: Vec3::new(x, y, 0.0),
            radius: 0.25,
            tag,
        }
    }

    fn input(target: Option<Vec3>, avoidance: TargetAvoidance) -> SteeringInput {
        SteeringInput {
            me: ME,
            position: Vec3::ZERO,
            target: target.map(|position| (PLAYER, position)),
            near_distance: 1.0,
            target_avoidance: avoidance,
            corpse_weight: None,
        }
    }

    fn far_target() -> Option<Vec3> {
        Some(Vec3::new(-20.0, 0.0, 0.0))
    }

    fn mage_layers() -> AvoidanceConfig {
        AvoidanceConfig {
            layers: LayerMask::ALL,
            ..default()
        }
    }

    #[rstest]
    #[case(Some(0.0), 0.5)]
    #[case(Some(1.0), 0.5)]
    #[case(Some(3.0), 1.75)]
    #[case(Some(5.0), 3.0)]
    #[case(Some(12.0), 3.0)]
    #[case(None, 3.0)]
    fn radius_shrinks_with_target_distance(#[case] distance: Option<f32>, #[case] expected: f32) {
        let config = AvoidanceConfig::default();
        assert_relative_eq!(config.radius_for(1.0, distance), expected, epsilon = 1e-5);
    }

    #[test]
    fn alone_means_no_avoidance() {
        let query = SnapshotQuery::new([body(1, 0.0, 0.0, Tag::Enemy)]);
        let field = steer(&AvoidanceConfig::default(), &input(far_target(), TargetAvoidance::Capped(1.0)), &query);
        assert_eq!(field.vector, Vec3::ZERO);
        assert_relative_eq!(field.radius, 3.0);
    }

    #[test]
    fn single_neighbour_is_not_averaged() {
        let query = SnapshotQuery::new([body(1, 0.0, 0.0, Tag::Enemy), body(3, 1.0, 0.0, Tag::Enemy)]);
        let field = steer(&AvoidanceConfig::default(), &input(far_target(), TargetAvoidance::Capped(1.0)), &query);

        let strength = 1.0 - (1.0 - 0.25) / (3.0 - 0.25);
        assert_relative_eq!(field.vector.x, -strength, epsilon = 1e-5);
        assert_relative_eq!(field.vector.y, 0.0);
    }

    #[test]
    fn several_neighbours_are_averaged() {
        let query = SnapshotQuery::new([body(3, 1.0, 0.0, Tag::Enemy), body(4, 0.0, 1.0, Tag::Enemy)]);
        let field = steer(&AvoidanceConfig::default(), &input(far_target(), TargetAvoidance::Capped(1.0)), &query);

        let strength = 1.0 - (1.0 - 0.25) / (3.0 - 0.25);
        assert_relative_eq!(field.vector.x, -strength / 2.0, epsilon = 1e-5);
        assert_relative_eq!(field.vector.y, -strength / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn overlapping_body_with_centre_outside_radius_is_ignored() {
        let mut query = SnapshotQuery::default();
        query.push(Body {
            radius: 0.5,
            ..body(3, 3.2, 0.0, Tag::Enemy)
        });
        let field = steer(&AvoidanceConfig::default(), &input(far_target(), TargetAvoidance::Capped(1.0)), &query);
        assert_eq!(field.vector, Vec3::ZERO);
    }

    #[test]
    fn corpses_ignored_unless_weighted() {
        let query = SnapshotQuery::new([body(3, 1.0, 0.0, Tag::Corpse)]);
        let config = mage_layers();

        let ignoring = steer(&config, &input(far_target(), TargetAvoidance::Separate(Some(3.0))), &query);
        assert_eq!(ignoring.vector, Vec3::ZERO);

        let seeking = SteeringInput {
            corpse_weight: Some(0.2),
            ..input(far_target(), TargetAvoidance::Separate(Some(3.0)))
        };
        let field = steer(&config, &seeking, &query);
        let strength = 1.0 - (1.0 - 0.25) / (3.0 - 0.25);
        assert_relative_eq!(field.vector.x, -strength * 0.2, epsilon = 1e-5);
    }

    #[test]
    fn capped_target_uses_strike_range() {
        // Target at 2 gives a radius of 1.125; the target only counts within 1.
        let query = SnapshotQuery::new([
            body(2, 2.0, 0.0, Tag::Player),
            body(3, 0.0, 1.05, Tag::Enemy),
        ]);
        let field = steer(
            &AvoidanceConfig::default(),
            &input(Some(Vec3::new(2.0, 0.0, 0.0)), TargetAvoidance::Capped(1.0)),
            &query,
        );

        assert_relative_eq!(field.radius, 1.125, epsilon = 1e-5);
        assert_relative_eq!(field.vector.x, 0.0);
        assert!(field.vector.y < 0.0, "only the enemy pushes");
    }

    #[test]
    fn separate_target_counted_once() {
        let query = SnapshotQuery::new([body(2, 2.0, 0.0, Tag::Player)]);
        let field = steer(
            &mage_layers(),
            &input(Some(Vec3::new(2.0, 0.0, 0.0)), TargetAvoidance::Separate(Some(3.5))),
            &query,
        );

        let strength = 1.0 - (2.0 - 0.25) / (3.5 - 0.25);
        assert_relative_eq!(field.vector.x, -strength, epsilon = 1e-5);
    }

    #[test]
    fn separate_target_outside_own_radius_is_ignored() {
        let query = SnapshotQuery::new([body(2, 4.0, 0.0, Tag::Player)]);
        let field = steer(
            &mage_layers(),
            &input(Some(Vec3::new(4.0, 0.0, 0.0)), TargetAvoidance::Separate(Some(3.5))),
            &query,
        );
        assert_eq!(field.vector, Vec3::ZERO);
    }

    #[test]
    fn blend_is_capped_at_unit_length() {
        let blended = blend(Vec3::X * 4.0, 0.5, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(blended.length(), 1.0, epsilon = 1e-6);

        let gentle = blend(Vec3::X, 0.5, Vec3::ZERO);
        assert_relative_eq!(gentle.x, 0.5);
    }
}
