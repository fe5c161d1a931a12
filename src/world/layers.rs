//! Collision layers and entity tags.
//!
//! `Tag` is the single source of truth for what an entity is to the rest of
//! the simulation (player, living enemy, corpse, obstacle). Its layer bit is
//! what spatial queries filter on, and the Rapier collision groups are
//! derived from it.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{CollisionGroups, Group};
use serde::Deserialize;
use std::ops::BitOr;

/// What an entity is, as far as queries and AI are concerned.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Tag {
    Player,
    Enemy,
    Corpse,
    Obstacle,
}

impl Tag {
    pub const fn layer(self) -> LayerMask {
        match self {
            Tag::Player => LayerMask::PLAYER,
            Tag::Enemy => LayerMask::ENEMY,
            Tag::Corpse => LayerMask::CORPSE,
            Tag::Obstacle => LayerMask::OBSTACLE,
        }
    }

    /// Rapier groups for a body carrying this tag: it belongs to its own
    /// layer and can be found by any query.
    pub fn collision_groups(self) -> CollisionGroups {
        CollisionGroups::new(self.layer().group(), Group::ALL)
    }
}

/// Bit set of tags a query is interested in.
///
/// Deserializes from a list of tags, e.g. `[Enemy, Obstacle]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "Vec<Tag>")]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const PLAYER: Self = Self(1 << 0);
    pub const ENEMY: Self = Self(1 << 1);
    pub const CORPSE: Self = Self(1 << 2);
    pub const OBSTACLE: Self = Self(1 << 3);
    pub const ALL: Self = Self(0b1111);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn contains(self, tag: Tag) -> bool {
        self.intersects(tag.layer())
    }

    pub fn group(self) -> Group {
        Group::from_bits_truncate(self.0)
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl From<Vec<Tag>> for LayerMask {
    fn from(tags: Vec<Tag>) -> Self {
        tags.into_iter()
            .fold(LayerMask::NONE, |mask, tag| mask | tag.layer())
    }
}

/// Radius of an entity's circular body on the play plane.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BodyRadius(pub f32);

impl Default for BodyRadius {
    fn default() -> Self {
        Self(0.25)
    }
}

/// Velocity integrated into `Transform` on every fixed step.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec3);
