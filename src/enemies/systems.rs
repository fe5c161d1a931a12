//! Systems that drive enemy brains.
//!
//! Every system is generic over the brain type; `EnemyPlugin` registers one
//! copy per brain.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::combat::{fire, PoolCommands, ProjectilePool, ProjectileRegistry, Shot};
use crate::core::{DamageRequest, Killed, ResurrectRequest, Resurrected};
use crate::world::{Sensors, Tag, TagIndex, Velocity};

use super::brain::{AttackEffect, EnemyBrain, EnemyState, Perception};
use super::swing::AttackSwing;

/// Where `me` is and where its target is, if both still exist.
fn perceive(sensors: &Sensors, me: Entity, target: Option<Entity>) -> Option<Perception> {
    let (position, _) = sensors.body(me)?;
    let target = target.and_then(|target| sensors.body(target).map(|(position, _)| (target, position)));
    Some(Perception {
        me,
        position,
        target,
    })
}

/// Point brains without a live target at the player.
pub fn acquire_targets<B: EnemyBrain>(index: Res<TagIndex>, sensors: Sensors, mut brains: Query<&mut B>) {
    let player = index.find_tagged(Tag::Player);

    for mut brain in &mut brains {
        let current = brain.target();
        if current.is_some_and(|target| sensors.body(target).is_some()) {
            continue;
        }
        if current != player {
            brain.set_target(player);
        }
    }
}

/// Tick every brain, start the attacks it decides on and steer its body.
pub fn think<B: EnemyBrain>(
    mut commands: Commands,
    time: Res<Time>,
    sensors: Sensors,
    mut brains: Query<(Entity, &mut B, &mut Velocity)>,
) {
    let delta = time.delta_secs();
    let view = sensors.view();

    for (entity, mut brain, mut velocity) in &mut brains {
        let Some(perception) = perceive(&sensors, entity, brain.target()) else {
            continue;
        };

        let before = brain.state();
        if let Some(swing) = brain.tick(&perception, &view, delta) {
            commands.entity(entity).insert(swing);
        }
        if brain.state() != before {
            debug!("{:?}: {:?} -> {:?}", entity, before, brain.state());
        }

        velocity.0 = brain.desired_velocity(&perception);
    }
}

/// Everything a landed attack can touch.
#[derive(SystemParam)]
pub struct AttackOutlets<'w, 's> {
    commands: Commands<'w, 's>,
    pool: ResMut<'w, ProjectilePool>,
    projectiles: Res<'w, ProjectileRegistry>,
    damage: EventWriter<'w, DamageRequest>,
    resurrect: EventWriter<'w, ResurrectRequest>,
}

impl AttackOutlets<'_, '_> {
    fn apply(&mut self, me: Entity, origin: Vec3, effect: AttackEffect) {
        match effect {
            AttackEffect::Strike { target, damage } => {
                self.damage.send(DamageRequest {
                    target,
                    source: me,
                    amount: damage,
                });
            }
            AttackEffect::Bolt {
                projectile,
                direction,
                target,
                muzzle_offset,
            } => {
                let Some(spec) = self.projectiles.get(&projectile) else {
                    warn_once!("Unknown projectile {}", projectile);
                    return;
                };
                let mut spawner = PoolCommands {
                    pool: &mut *self.pool,
                    commands: &mut self.commands,
                };
                let shot = Shot {
                    origin,
                    direction,
                    fired_by: me,
                    target: Some(target),
                    inherited_velocity: Vec3::ZERO,
                };
                fire(&mut spawner, spec, shot, muzzle_offset);
            }
            AttackEffect::Resurrect { corpses } => {
                info!("{:?} raises {} corpses", me, corpses.len());
                for corpse in corpses {
                    self.resurrect.send(ResurrectRequest { target: corpse, by: me });
                }
            }
        }
    }
}

/// Advance attack swings, landing and ending attacks at their phase
/// boundaries. Swings on brains that are no longer attacking are dropped.
pub fn advance_attack_swings<B: EnemyBrain>(
    time: Res<Time>,
    sensors: Sensors,
    mut outlets: AttackOutlets,
    mut swings: Query<(Entity, &mut B, &mut AttackSwing)>,
) {
    let delta = time.delta_secs();
    let view = sensors.view();

    for (entity, mut brain, mut swing) in &mut swings {
        if brain.state() != EnemyState::Attacking {
            outlets.commands.entity(entity).remove::<AttackSwing>();
            continue;
        }

        let progress = swing.advance(delta);

        if progress.resolve {
            if let Some(perception) = perceive(&sensors, entity, brain.target()) {
                if let Some(effect) = brain.do_attack(&perception, &view) {
                    outlets.apply(entity, perception.position, effect);
                }
            }
        }

        if progress.finished {
            brain.end_attack();
            outlets.commands.entity(entity).remove::<AttackSwing>();
        }
    }
}

/// Forward death and resurrection notices to the brains.
pub fn brain_reactions<B: EnemyBrain>(
    mut commands: Commands,
    mut killed: EventReader<Killed>,
    mut resurrected: EventReader<Resurrected>,
    mut brains: Query<(&mut B, &mut Velocity)>,
) {
    for event in killed.read() {
        let Ok((mut brain, mut velocity)) = brains.get_mut(event.entity) else {
            continue;
        };
        brain.on_killed();
        velocity.0 = Vec3::ZERO;
        commands.entity(event.entity).remove::<AttackSwing>();
    }

    for event in resurrected.read() {
        if let Ok((mut brain, _)) = brains.get_mut(event.entity) {
            brain.on_resurrected();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Projectile;
    use crate::enemies::{BrainTiming, MageBrain, MageConfig, MeleeBrain, MeleeConfig};
    use crate::world::sync_tag_index;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    #[derive(Resource, Default)]
    struct Strikes(Vec<DamageRequest>);

    fn record_strikes(mut requests: EventReader<DamageRequest>, mut strikes: ResMut<Strikes>) {
        strikes.0.extend(requests.read().copied());
    }

    fn brain_app<B: EnemyBrain>() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(1.0 / 60.0)))
            .init_resource::<TagIndex>()
            .init_resource::<ProjectilePool>()
            .init_resource::<ProjectileRegistry>()
            .init_resource::<Strikes>()
            .add_event::<DamageRequest>()
            .add_event::<ResurrectRequest>()
            .add_event::<Killed>()
            .add_event::<Resurrected>()
            .add_systems(
                Update,
                (
                    sync_tag_index,
                    acquire_targets::<B>,
                    think::<B>,
                    advance_attack_swings::<B>,
                    brain_reactions::<B>,
                    record_strikes,
                )
                    .chain(),
            );
        app
    }

    #[test]
    fn melee_finds_the_player_and_strikes() {
        let mut app = brain_app::<MeleeBrain>();
        let player = app
            .world_mut()
            .spawn((Tag::Player, Transform::from_xyz(0.9, 0.0, 0.0)))
            .id();
        let enemy = app
            .world_mut()
            .spawn((
                Tag::Enemy,
                Transform::default(),
                Velocity::default(),
                MeleeBrain::new(MeleeConfig::default(), BrainTiming::default()),
            ))
            .id();

        for _ in 0..120 {
            app.update();
        }

        let brain = app.world().get::<MeleeBrain>(enemy).expect("brain");
        assert_eq!(brain.target(), Some(player));

        let strikes = &app.world().resource::<Strikes>().0;
        assert!(!strikes.is_empty());
        assert_eq!(strikes[0].target, player);
        assert_eq!(strikes[0].source, enemy);
        assert_eq!(strikes[0].amount, MeleeConfig::default().damage);
    }

    #[test]
    fn out_of_range_enemy_only_runs() {
        let mut app = brain_app::<MeleeBrain>();
        app.world_mut()
            .spawn((Tag::Player, Transform::from_xyz(-6.0, 0.0, 0.0)));
        let enemy = app
            .world_mut()
            .spawn((
                Tag::Enemy,
                Transform::default(),
                Velocity::default(),
                MeleeBrain::new(MeleeConfig::default(), BrainTiming::default()),
            ))
            .id();

        for _ in 0..30 {
            app.update();
        }

        assert!(app.world().resource::<Strikes>().0.is_empty());
        let velocity = app.world().get::<Velocity>(enemy).expect("velocity");
        assert!(velocity.0.x < 0.0, "should head for the player, got {:?}", velocity.0);
    }

    #[test]
    fn killed_enemy_drops_its_swing() {
        let mut app = brain_app::<MeleeBrain>();
        let enemy = app
            .world_mut()
            .spawn((
                Tag::Enemy,
                Transform::default(),
                Velocity(Vec3::X),
                MeleeBrain::new(MeleeConfig::default(), BrainTiming::default()),
                AttackSwing::new(1.0, 0.5),
            ))
            .id();

        app.world_mut().send_event(Killed {
            entity: enemy,
            source: Entity::PLACEHOLDER,
        });
        app.update();

        let world = app.world();
        assert_eq!(world.get::<MeleeBrain>(enemy).map(MeleeBrain::state), Some(EnemyState::Dead));
        assert_eq!(world.get::<Velocity>(enemy), Some(&Velocity(Vec3::ZERO)));
        assert!(world.get::<AttackSwing>(enemy).is_none());
        assert!(world.resource::<Strikes>().0.is_empty());
    }

    #[test]
    fn mage_fires_a_bolt_at_a_distant_player() {
        let mut app = brain_app::<MageBrain>();
        let player = app
            .world_mut()
            .spawn((Tag::Player, Transform::from_xyz(4.0, 0.0, 0.0)))
            .id();
        let config = MageConfig {
            min_strike_range: 5.0,
            max_strike_range: 5.0,
            ..default()
        };
        let mut rng = crate::core::SimRng::from_seed(1).0;
        let mage = app
            .world_mut()
            .spawn((
                Tag::Enemy,
                Transform::default(),
                Velocity::default(),
                MageBrain::new(config, &mut rng, BrainTiming::default()),
            ))
            .id();

        for _ in 0..150 {
            app.update();
        }

        let mut bolts = app.world_mut().query::<&Projectile>();
        let fired: Vec<&Projectile> = bolts.iter(app.world()).collect();
        assert!(!fired.is_empty());
        assert!(fired.iter().all(|bolt| bolt.fired_by == mage && bolt.target == Some(player)));
    }
}
