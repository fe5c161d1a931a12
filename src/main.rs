//! Inevitable - Entry Point
//!
//! Top-down arena: the player's knives fly at the nearest enemy while
//! skeletons close in and necromancers raise the fallen.
//!
//! Arena population and tuning live in `assets/data/`.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use inevitable::combat::Projectile;
use inevitable::world::{BodyRadius, Tag};

fn main() {
    App::new()
        // Bevy default plugins
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Inevitable".to_string(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))

        // Physics backs the spatial queries; the debug render stands in for gizmos
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .add_plugins(RapierDebugRenderPlugin::default())

        // Our simulation plugin
        .add_plugins(inevitable::InevitablePlugin::default())

        .add_systems(Startup, spawn_camera)
        .add_systems(Update, (dress_bodies, dress_projectiles, tint_bodies))
        .run();
}

fn spawn_camera(mut commands: Commands) {
    // Gameplay is on the XY plane, so look straight down the Z axis.
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 0.0, 30.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            ..default()
        },
        Transform::from_xyz(5.0, 5.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn tag_color(tag: Tag) -> Color {
    match tag {
        Tag::Player => Color::srgb(0.3, 0.6, 1.0),
        Tag::Enemy => Color::srgb(0.9, 0.2, 0.2),
        Tag::Corpse => Color::srgb(0.35, 0.35, 0.35),
        Tag::Obstacle => Color::srgb(0.6, 0.5, 0.3),
    }
}

/// Give newly spawned bodies something to look at.
fn dress_bodies(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    bodies: Query<(Entity, &Tag, Option<&BodyRadius>), Added<Tag>>,
) {
    for (entity, tag, radius) in bodies.iter() {
        let radius = radius.copied().unwrap_or_default().0;
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Sphere::new(radius))),
            MeshMaterial3d(materials.add(tag_color(*tag))),
        ));
    }
}

/// Projectiles are reused, so only the first spawn needs a mesh.
fn dress_projectiles(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    projectiles: Query<Entity, (Added<Projectile>, Without<Mesh3d>)>,
) {
    for entity in projectiles.iter() {
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Cuboid::new(0.4, 0.08, 0.08))),
            MeshMaterial3d(materials.add(Color::srgb(0.9, 0.9, 0.7))),
        ));
    }
}

/// Recolor bodies when they die or come back.
fn tint_bodies(
    mut materials: ResMut<Assets<StandardMaterial>>,
    bodies: Query<(&Tag, &MeshMaterial3d<StandardMaterial>), Changed<Tag>>,
) {
    for (tag, material) in bodies.iter() {
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color = tag_color(*tag);
        }
    }
}
