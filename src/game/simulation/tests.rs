use super::*;
use crate::game::actor::{tags, ActorId};
use crate::game::error::SimError;
use crate::game::level::LevelMap;
use crate::game::pathfinding::PolicyTable;
use crate::game::spawner::EnemyType;
use crate::game::spatial_grid::Occupant;
use crate::game::testing::Harness;

const BOUND: Vec2 = Vec2::new(10.0, 10.0);

fn moving_body(direction: Vec2, speed: f32) -> PhysicsBody {
    let mut body = PhysicsBody::rigid(BOUND, speed);
    body.direction = direction;
    body
}

fn enemy(harness: &mut Harness, center: Vec2, health: i32) -> ActorId {
    harness.spawn(|actor| {
        actor.add_tag(tags::ENEMY);
        actor
            .add(Visual::centered(center, BOUND))?
            .add(Health::new(health))?
            .add(PhysicsBody::rigid(BOUND, 0.0))?;
        Ok(())
    })
}

fn body(harness: &Harness, id: ActorId) -> &PhysicsBody {
    harness.actor(id).get::<PhysicsBody>().unwrap()
}

// ============================================================================
// Physics
// ============================================================================

#[test]
fn test_moving_into_actor_stops_at_its_face() {
    let mut harness = Harness::new(Vec::new());
    let a = harness.spawn_body(Vec2::ZERO, moving_body(Vec2::X, 10.0));
    let b = harness.spawn_body(Vec2::new(15.0, 0.0), moving_body(Vec2::ZERO, 10.0));

    harness.update(a, 1.0, &[]).unwrap();

    assert_eq!(harness.center(a), Vec2::new(5.0, 0.0), "Half the step fits before touching B");
    assert_eq!(body(&harness, a).contacts(), &[Contact::Actor(b)]);
    assert!(body(&harness, a).was_blocked());
    assert_eq!(harness.center(b), Vec2::new(15.0, 0.0));
}

#[test]
fn test_wall_is_never_penetrated() {
    let wall = Rect::new(20.0, -20.0, 40.0, 20.0);
    let mut harness = Harness::new(vec![wall]);
    let a = harness.spawn_body(Vec2::ZERO, moving_body(Vec2::X, 100.0));

    for _ in 0..10 {
        harness.update(a, 0.1, &[]).unwrap();
        let bounds = harness.actor(a).bounds().unwrap();
        assert!(bounds.max.x <= wall.min.x, "Box reached {} past the wall face", bounds.max.x);
    }
    assert_eq!(body(&harness, a).contacts(), &[Contact::Geometry]);
}

#[test]
fn test_sliding_along_a_wall_keeps_free_axis() {
    let wall = Rect::new(20.0, -100.0, 40.0, 100.0);
    let mut harness = Harness::new(vec![wall]);
    let a = harness.spawn_body(Vec2::new(15.0, 0.0), moving_body(Vec2::new(1.0, 1.0).normalize(), 10.0));

    harness.update(a, 1.0, &[]).unwrap();

    let center = harness.center(a);
    assert_eq!(center.x, 15.0, "Already flush with the wall");
    assert!(center.y > 0.0, "Vertical movement continues");
}

#[test]
fn test_grid_follows_movement() {
    let mut harness = Harness::new(Vec::new());
    let a = harness.spawn_body(Vec2::ZERO, moving_body(Vec2::X, 100.0));

    harness.update(a, 1.0, &[]).unwrap();

    let rect = harness.grid.rect_of(Occupant::Actor(a)).unwrap();
    assert_eq!(rect.center(), Vec2::new(100.0, 0.0));
}

#[test]
fn test_overlapping_actors_separate() {
    let mut harness = Harness::new(Vec::new());
    let a = harness.spawn_body(Vec2::ZERO, moving_body(Vec2::ZERO, 50.0));
    let b = harness.spawn_body(Vec2::new(4.0, 0.0), moving_body(Vec2::ZERO, 50.0));

    let mut distance = harness.center(a).distance(harness.center(b));
    for step in 0..5 {
        harness.update(a, 0.1, &[]).unwrap();
        harness.update(b, 0.1, &[]).unwrap();
        let now = harness.center(a).distance(harness.center(b));
        assert!(now >= distance, "Step {}: distance shrank from {} to {}", step, distance, now);
        distance = now;
    }
    assert!(distance > 4.0);
    assert!(harness.center(a).x < 0.0, "A is pushed away from B");
}

#[test]
fn test_coincident_actors_separate_in_some_direction() {
    let mut harness = Harness::new(Vec::new());
    let a = harness.spawn_body(Vec2::ZERO, moving_body(Vec2::ZERO, 50.0));
    let _b = harness.spawn_body(Vec2::ZERO, moving_body(Vec2::ZERO, 50.0));

    harness.update(a, 0.1, &[]).unwrap();
    assert!(harness.center(a).length() > 0.0);
}

#[test]
fn test_free_flight_ignores_geometry() {
    let mut harness = Harness::new(vec![Rect::new(20.0, -20.0, 40.0, 20.0)]);
    let a = harness.spawn_body(Vec2::ZERO, moving_body(Vec2::X, 100.0));

    harness.update_with(a, 1.0, &[], false).unwrap();

    assert_eq!(harness.center(a), Vec2::new(100.0, 0.0));
    assert!(body(&harness, a).contacts().is_empty());
}

#[test]
fn test_dying_actor_does_not_move() {
    let mut harness = Harness::new(Vec::new());
    let a = harness.spawn(|actor| {
        actor
            .add(Visual::centered(Vec2::ZERO, BOUND))?
            .add(Health::new(10))?
            .add(moving_body(Vec2::X, 100.0))?;
        Ok(())
    });
    harness.actor_mut(a).get_mut::<Health>().unwrap().take_damage(10);

    harness.update(a, 1.0, &[]).unwrap();
    assert_eq!(harness.center(a), Vec2::ZERO);
}

#[test]
fn test_non_rigid_passes_through_actors() {
    let mut harness = Harness::new(Vec::new());
    let mut player = PhysicsBody::non_rigid(BOUND, 10.0);
    player.direction = Vec2::X;
    let a = harness.spawn_body(Vec2::ZERO, player);
    let b = harness.spawn_body(Vec2::new(15.0, 0.0), moving_body(Vec2::ZERO, 0.0));

    harness.update(a, 1.0, &[]).unwrap();

    assert_eq!(harness.center(a), Vec2::new(10.0, 0.0));
    assert_eq!(body(&harness, a).contacts(), &[Contact::Actor(b)], "Contacts are still recorded");
}

#[test]
fn test_body_requires_visual() {
    let mut harness = Harness::new(Vec::new());
    let result = harness.actors.spawn(|actor| {
        actor.add(PhysicsBody::rigid(BOUND, 1.0))?;
        Ok(())
    });
    assert!(matches!(result, Err(SimError::MissingComponent { .. })));
}

// ============================================================================
// Player control
// ============================================================================

fn player(harness: &mut Harness) -> ActorId {
    harness.spawn(|actor| {
        actor.add_tag(tags::PLAYER);
        actor
            .add(Visual::centered(Vec2::ZERO, BOUND))?
            .add(Health::new(100))?
            .add(PhysicsBody::non_rigid(BOUND, 100.0))?
            .add(PlayerController::default())?
            .add(Shooter::new(0.2))?
            .add(PlayerTrigger::new(5, 0.5))?;
        Ok(())
    })
}

#[test]
fn test_controller_combines_held_keys() {
    let mut harness = Harness::new(Vec::new());
    let p = player(&mut harness);

    harness
        .update(p, 0.0, &[InputEvent::KeyDown(MoveKey::Right), InputEvent::KeyDown(MoveKey::Down)])
        .unwrap();
    let direction = body(&harness, p).direction;
    assert!((direction - Vec2::new(1.0, 1.0).normalize()).length() < 1e-6);

    harness.update(p, 0.0, &[InputEvent::KeyUp(MoveKey::Right)]).unwrap();
    assert_eq!(body(&harness, p).direction, Vec2::Y);

    harness
        .update(p, 0.0, &[InputEvent::KeyDown(MoveKey::Up)])
        .unwrap();
    assert_eq!(body(&harness, p).direction, Vec2::ZERO, "Opposite keys cancel");
}

#[test]
fn test_shooter_respects_cooldown() {
    let mut harness = Harness::new(Vec::new());
    let p = player(&mut harness);
    let fire = InputEvent::Fire {
        target: Vec2::new(0.0, 50.0),
    };

    harness.update(p, 0.0, &[fire.clone(), fire.clone()]).unwrap();
    assert_eq!(
        harness.commands,
        vec![StageCommand::SpawnBullet {
            origin: Vec2::ZERO,
            direction: Vec2::Y
        }],
        "One bullet per cooldown, even with two requests in a frame"
    );

    harness.update(p, 0.1, &[fire.clone()]).unwrap();
    assert_eq!(harness.commands.len(), 1);

    harness.update(p, 0.15, &[fire]).unwrap();
    assert_eq!(harness.commands.len(), 2);
}

#[test]
fn test_shooter_ignores_target_on_itself() {
    let mut harness = Harness::new(Vec::new());
    let p = player(&mut harness);

    harness.update(p, 0.0, &[InputEvent::Fire { target: Vec2::ZERO }]).unwrap();
    assert!(harness.commands.is_empty());
}

// ============================================================================
// Triggers
// ============================================================================

#[test]
fn test_player_takes_contact_damage_with_cooldown() {
    let mut harness = Harness::new(Vec::new());
    let p = player(&mut harness);
    enemy(&mut harness, Vec2::new(5.0, 0.0), 50);
    let health = |h: &Harness| h.actor(p).get::<Health>().unwrap().health;

    harness.update(p, 0.3, &[]).unwrap();
    assert_eq!(health(&harness), 95);

    harness.update(p, 0.3, &[]).unwrap();
    assert_eq!(health(&harness), 95, "Same enemy is on cooldown");

    harness.update(p, 0.3, &[]).unwrap();
    assert_eq!(health(&harness), 90);
}

#[test]
fn test_dying_enemies_do_not_hurt() {
    let mut harness = Harness::new(Vec::new());
    let p = player(&mut harness);
    let e = enemy(&mut harness, Vec2::new(5.0, 0.0), 50);
    harness.actor_mut(e).get_mut::<Health>().unwrap().take_damage(50);

    harness.update(p, 0.3, &[]).unwrap();
    assert_eq!(harness.actor(p).get::<Health>().unwrap().health, 100);
}

#[test]
fn test_player_trigger_requires_health() {
    let mut harness = Harness::new(Vec::new());
    let result = harness.actors.spawn(|actor| {
        actor.add(PlayerTrigger::default())?;
        Ok(())
    });
    assert!(matches!(result, Err(SimError::MissingComponent { .. })));
}

fn bullet(harness: &mut Harness, origin: Vec2, direction: Vec2) -> ActorId {
    let mut body = PhysicsBody::projectile(Vec2::new(4.0, 4.0), 100.0);
    body.direction = direction;
    harness.spawn(|actor| {
        actor.add_tag(tags::BULLET);
        actor
            .add(Visual::centered(origin, Vec2::new(4.0, 4.0)))?
            .add(body)?
            .add(BulletTrigger::new(10))?
            .add(Lifetime::new(1.0))?;
        Ok(())
    })
}

#[test]
fn test_bullet_damages_enemy_and_dies() {
    let mut harness = Harness::new(Vec::new());
    let e = enemy(&mut harness, Vec2::new(8.0, 0.0), 20);
    let b = bullet(&mut harness, Vec2::ZERO, Vec2::X);

    harness.update(b, 0.1, &[]).unwrap();

    let health = harness.actor(e).get::<Health>().unwrap();
    assert_eq!(health.health, 10);
    assert!(health.damaged);
    assert!(harness.actor(b).has_tag(tags::KILLING));

    harness.update(b, 0.1, &[]).unwrap();
    assert_eq!(harness.actor(e).get::<Health>().unwrap().health, 10, "A spent bullet deals no more damage");
}

#[test]
fn test_bullet_dies_on_walls() {
    let mut harness = Harness::new(vec![Rect::new(8.0, -20.0, 20.0, 20.0)]);
    let b = bullet(&mut harness, Vec2::ZERO, Vec2::X);

    harness.update(b, 0.1, &[]).unwrap();
    assert!(harness.actor(b).has_tag(tags::KILLING));
}

#[test]
fn test_bullet_passes_the_player() {
    let mut harness = Harness::new(Vec::new());
    let p = player(&mut harness);
    let b = bullet(&mut harness, Vec2::new(-8.0, 0.0), Vec2::X);

    harness.update(b, 0.1, &[]).unwrap();
    assert!(!harness.actor(b).has_tag(tags::KILLING));
    assert_eq!(harness.actor(p).get::<Health>().unwrap().health, 100);
}

// ============================================================================
// Animation, lifetime, camera
// ============================================================================

fn clips(death_looping: bool) -> AnimationSet {
    let mut set = AnimationSet::default();
    for (name, frames, looping) in [("idle", 2, true), ("run", 4, true), ("death", 3, death_looping)] {
        set.clips.insert(
            name.to_string(),
            AnimationClip {
                frames,
                frame_time: 0.1,
                looping,
            },
        );
    }
    set
}

fn animated(harness: &mut Harness, set: AnimationSet) -> ActorId {
    harness.spawn(|actor| {
        actor
            .add(Visual::centered(Vec2::ZERO, BOUND))?
            .add(Health::new(10))?
            .add(PhysicsBody::rigid(BOUND, 0.0))?
            .add(Animator::new("test", set)?)?;
        Ok(())
    })
}

#[test]
fn test_animator_requires_run_and_death() {
    let mut set = clips(false);
    set.clips.remove("death");
    let err = Animator::new("Enemy 9", set).unwrap_err();
    assert!(matches!(err, SimError::MissingAnimation { ref clip, .. } if clip == "death"));
}

#[test]
fn test_animator_picks_clip_from_motion() {
    let mut harness = Harness::new(Vec::new());
    let a = animated(&mut harness, clips(false));

    harness.update(a, 0.05, &[]).unwrap();
    assert_eq!(harness.actor(a).get::<Visual>().unwrap().clip, "idle");

    harness.actor_mut(a).get_mut::<PhysicsBody>().unwrap().direction = Vec2::NEG_X;
    harness.update(a, 0.25, &[]).unwrap();
    let visual = harness.actor(a).get::<Visual>().unwrap();
    assert_eq!(visual.clip, "run");
    assert_eq!(visual.frame, 2);
    assert!(visual.flip_x);
}

#[test]
fn test_death_clip_plays_once_then_marks_dead() {
    // Looping flag on the death clip is ignored.
    let mut harness = Harness::new(Vec::new());
    let a = animated(&mut harness, clips(true));
    harness.actor_mut(a).get_mut::<Health>().unwrap().take_damage(10);

    harness.update(a, 0.25, &[]).unwrap();
    assert_eq!(harness.actor(a).liveness(), Liveness::Dying);
    assert_eq!(harness.actor(a).get::<Visual>().unwrap().clip, "death");

    harness.update(a, 0.25, &[]).unwrap();
    assert_eq!(harness.actor(a).liveness(), Liveness::Dead);
    assert_eq!(harness.actor(a).get::<Visual>().unwrap().frame, 2);

    harness.update(a, 1.0, &[]).unwrap();
    assert_eq!(harness.actor(a).get::<Visual>().unwrap().frame, 2, "Last frame holds");
}

#[test]
fn test_damage_flash_clears() {
    let mut harness = Harness::new(Vec::new());
    let a = animated(&mut harness, clips(false));
    harness.actor_mut(a).get_mut::<Health>().unwrap().take_damage(1);

    harness.update(a, 0.05, &[]).unwrap();
    assert!(harness.actor(a).get::<Health>().unwrap().damaged);

    harness.update(a, 0.06, &[]).unwrap();
    assert!(!harness.actor(a).get::<Health>().unwrap().damaged);
}

#[test]
fn test_lifetime_expires() {
    let mut harness = Harness::new(Vec::new());
    let a = harness.spawn(|actor| {
        actor.add(Lifetime::new(0.25))?;
        Ok(())
    });

    harness.update(a, 0.1, &[]).unwrap();
    harness.update(a, 0.1, &[]).unwrap();
    assert!(!harness.actor(a).has_tag(tags::KILLING));

    harness.update(a, 0.1, &[]).unwrap();
    assert!(harness.actor(a).has_tag(tags::KILLING));
}

#[test]
fn test_depth_follows_bottom_edge() {
    let mut harness = Harness::new(Vec::new());
    let a = harness.spawn(|actor| {
        actor.add(Visual::centered(Vec2::new(0.0, 50.0), BOUND))?.add(DepthSort)?;
        Ok(())
    });

    harness.update(a, 0.1, &[]).unwrap();
    assert_eq!(harness.actor(a).get::<Visual>().unwrap().depth, 55.0);
}

#[test]
fn test_camera_clamps_to_level() {
    let rig = CameraRig::new(Vec2::new(100.0, 100.0), Rect::new(0.0, 0.0, 1000.0, 500.0));

    assert_eq!(rig.visible_rect(Vec2::new(10.0, 10.0)).center(), Vec2::new(50.0, 50.0));
    assert_eq!(rig.visible_rect(Vec2::new(500.0, 250.0)).center(), Vec2::new(500.0, 250.0));
    assert_eq!(rig.visible_rect(Vec2::new(990.0, 490.0)).center(), Vec2::new(950.0, 450.0));

    let small = CameraRig::new(Vec2::new(100.0, 100.0), Rect::new(0.0, 0.0, 80.0, 80.0));
    assert_eq!(small.visible_rect(Vec2::new(70.0, 5.0)).center(), Vec2::new(40.0, 40.0));
}

// ============================================================================
// Stage
// ============================================================================

const LEVEL: &str = r#"(
    tile_width: 32.0,
    tile_height: 32.0,
    width: 40,
    height: 30,
    obstacles: [(x: 200.0, y: 200.0, width: 96.0, height: 64.0)],
    markers: {
        "Player": [(640.0, 400.0)],
        "Enemy": [(40.0, 40.0), (1240.0, 920.0)],
    },
)"#;

fn stage() -> Stage {
    let level = LevelMap::from_ron_str(LEVEL).unwrap();
    let mut stage = Stage::new(&InitialConfig::default(), &level, PolicyTable::new()).unwrap();
    stage.director_mut().enabled = false;
    stage
}

#[test]
fn test_stage_starts_with_player_in_grid() {
    let stage = stage();
    let player = stage.player();

    assert_eq!(stage.roster(), &[player]);
    assert!(stage.actor(player).unwrap().has_tag(tags::PLAYER));
    assert!(stage.grid().contains(Occupant::Actor(player)));
    assert!(stage.grid().contains(Occupant::Obstacle(0)));
    assert_eq!(stage.navigation().anchors().len(), 4);
}

#[test]
fn test_stage_requires_player_marker() {
    let level = LevelMap::from_ron_str("(tile_width: 32.0, tile_height: 32.0, width: 4, height: 4)").unwrap();
    let result = Stage::new(&InitialConfig::default(), &level, PolicyTable::new());
    assert!(matches!(result, Err(SimError::MissingMarker(ref m)) if m == "Player"));
}

#[test]
fn test_stage_moves_player_from_input() {
    let mut stage = stage();
    let player = stage.player();
    let start = stage.actor(player).unwrap().center().unwrap();

    stage.step(0.1, &[InputEvent::KeyDown(MoveKey::Right)]).unwrap();

    let now = stage.actor(player).unwrap().center().unwrap();
    assert!((now - (start + Vec2::new(10.0, 0.0))).length() < 1e-3);
    assert_eq!(stage.tick(), 1);
}

#[test]
fn test_stage_fires_and_expires_bullets() {
    let mut stage = stage();
    stage
        .step(0.1, &[InputEvent::Fire {
            target: Vec2::new(640.0, 0.0),
        }])
        .unwrap();

    assert_eq!(stage.roster().len(), 2, "Bullet joins the roster after the actor pass");
    let bullet = stage.roster()[1];
    assert!(stage.actor(bullet).unwrap().has_tag(tags::BULLET));
    assert!(stage.grid().contains(Occupant::Actor(bullet)));

    for _ in 0..20 {
        stage.step(0.1, &[]).unwrap();
    }
    assert_eq!(stage.roster().len(), 1, "Bullet expires after its lifetime");
    assert!(stage.actor(bullet).is_none());
    assert!(!stage.grid().contains(Occupant::Actor(bullet)));
}

#[test]
fn test_paused_stage_does_not_advance() {
    let mut stage = stage();
    stage.paused = true;
    stage.step(0.1, &[InputEvent::KeyDown(MoveKey::Right)]).unwrap();
    assert_eq!(stage.tick(), 0);
    assert_eq!(stage.gametime(), 0.0);
}

#[test]
fn test_game_over_when_player_dies() {
    let mut stage = stage();
    let player = stage.player();
    stage
        .actors_mut()
        .get_mut(player)
        .unwrap()
        .get_mut::<Health>()
        .unwrap()
        .take_damage(1000);

    stage.step(0.1, &[]).unwrap();
    assert!(stage.is_game_over());

    stage.step(0.1, &[]).unwrap();
    assert_eq!(stage.tick(), 1, "No frames run after game over");
}

#[test]
fn test_spawned_enemy_hunts_player() {
    let mut stage = stage();
    let enemy = stage.spawn_enemy(EnemyType::WeakZombie).unwrap();

    assert!(stage.roster().contains(&enemy));
    assert!(stage.grid().contains(Occupant::Actor(enemy)));
    let start = stage.actor(enemy).unwrap().center().unwrap();
    let player_at = stage.actor(stage.player()).unwrap().center().unwrap();

    stage.step(0.1, &[]).unwrap();

    let navigator = stage.actor(enemy).unwrap().navigator().unwrap();
    assert_eq!(navigator.target(), stage.player());
    assert!(!navigator.path().is_empty());
    let now = stage.actor(enemy).unwrap().center().unwrap();
    assert!(now.distance(player_at) < start.distance(player_at), "Enemy closes in");
}

#[test]
fn test_runtime_config_overrides_director() {
    let mut stage = stage();
    stage.apply_game_config(&GameConfig {
        paused: true,
        spawn_enabled: false,
        spawn_override: crate::game::spawner::SpawnOverrides {
            enemy_type: Some(EnemyType::Ghoul),
            strategy: None,
        },
    });

    assert!(stage.paused);
    assert!(!stage.director().enabled);
    assert_eq!(stage.director().overrides.enemy_type, Some(EnemyType::Ghoul));
}
