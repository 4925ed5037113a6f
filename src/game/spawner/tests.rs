use super::*;
use crate::game::actor::{ActorArena, ActorId};
use crate::game::config::InitialConfig;
use crate::game::error::SimError;
use crate::game::pathfinding::StrategyKind;
use crate::game::simulation::{Health, Prefabs, Visual};
use crate::game::spatial_grid::{Occupant, SpatialGrid};
use bevy::math::{Rect, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;

const LEVEL: Rect = Rect {
    min: Vec2::ZERO,
    max: Vec2::new(1280.0, 960.0),
};

struct World {
    actors: ActorArena,
    grid: SpatialGrid,
    roster: Vec<ActorId>,
    rng: StdRng,
    prefabs: Prefabs,
    target: ActorId,
    points: Vec<Vec2>,
}

impl World {
    fn new() -> Self {
        let mut actors = ActorArena::new();
        let target = actors
            .spawn(|actor| {
                actor.add(Visual::centered(Vec2::new(640.0, 480.0), Vec2::splat(10.0)))?;
                Ok(())
            })
            .unwrap();
        Self {
            actors,
            grid: SpatialGrid::default(),
            roster: Vec::new(),
            rng: StdRng::seed_from_u64(11),
            prefabs: Prefabs::new(&InitialConfig::default(), LEVEL, Vec2::splat(32.0)),
            target,
            points: vec![Vec2::new(40.0, 40.0), Vec2::new(1240.0, 920.0)],
        }
    }

    fn env(&mut self) -> SpawnEnv<'_> {
        SpawnEnv {
            actors: &mut self.actors,
            grid: &mut self.grid,
            roster: &mut self.roster,
            rng: &mut self.rng,
            prefabs: &self.prefabs,
            target: self.target,
            spawn_points: &self.points,
            visible: Rect::new(0.0, 0.0, 640.0, 480.0),
        }
    }

    fn kill(&mut self, id: ActorId) {
        let health = self.actors.get_mut(id).unwrap().get_mut::<Health>().unwrap();
        health.take_damage(health.max_health);
        health.dead = true;
    }
}

fn config(max_active: usize) -> SpawnConfig {
    SpawnConfig {
        max_active,
        ..SpawnConfig::default()
    }
}

#[test]
fn test_interval_ramps_down_to_floor() {
    let director = SpawnDirector::new(SpawnConfig::default());
    assert_eq!(director.spawn_interval(0.0), 1.0);
    assert!((director.spawn_interval(150.0) - 0.5).abs() < 1e-6);
    assert_eq!(director.spawn_interval(10_000.0), 0.45);
}

#[test]
fn test_enemy_mix_grows_with_progress() {
    assert_eq!(EnemyType::eligible_at(0.0), &[EnemyType::WeakZombie]);
    assert_eq!(
        EnemyType::eligible_at(0.3),
        &[EnemyType::WeakZombie, EnemyType::WeakSkeleton]
    );
    assert_eq!(
        EnemyType::eligible_at(0.5),
        &[EnemyType::StrongZombie, EnemyType::WeakSkeleton]
    );
    assert_eq!(
        EnemyType::eligible_at(0.7),
        &[EnemyType::StrongZombie, EnemyType::StrongSkeleton]
    );
    assert_eq!(EnemyType::eligible_at(0.95), &EnemyType::ALL);
    assert_eq!(EnemyType::eligible_at(3.0), &EnemyType::ALL, "Progress past the ramp keeps every type");
}

#[test]
fn test_selection_stays_within_profiles() {
    let director = SpawnDirector::new(SpawnConfig::default());
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        assert_eq!(director.select_enemy_type(10.0, &mut rng), EnemyType::WeakZombie);
        let strategy = director.select_strategy(EnemyType::WeakZombie, &mut rng).unwrap();
        assert!(matches!(strategy, StrategyKind::Uninformed | StrategyKind::Informed));
    }
    assert_eq!(
        director.select_strategy(EnemyType::Ghoul, &mut rng).unwrap(),
        StrategyKind::Learned
    );
}

#[test]
fn test_overrides_replace_random_choices() {
    let mut director = SpawnDirector::new(SpawnConfig::default());
    director.overrides = SpawnOverrides {
        enemy_type: Some(EnemyType::Ghoul),
        strategy: Some(StrategyKind::Local),
    };
    let mut rng = StdRng::seed_from_u64(3);

    assert_eq!(director.select_enemy_type(0.0, &mut rng), EnemyType::Ghoul);
    assert_eq!(
        director.select_strategy(EnemyType::WeakZombie, &mut rng).unwrap(),
        StrategyKind::Local
    );
}

#[test]
fn test_missing_profile_is_an_error() {
    let mut cfg = SpawnConfig::default();
    cfg.profiles.remove(&EnemyType::Ghoul);
    let director = SpawnDirector::new(cfg);
    let mut rng = StdRng::seed_from_u64(3);

    let err = director.select_strategy(EnemyType::Ghoul, &mut rng).unwrap_err();
    assert!(matches!(err, SimError::MissingProfile(_)));
}

#[test]
fn test_spawn_points_prefer_hidden() {
    let mut rng = StdRng::seed_from_u64(5);
    let points = [Vec2::new(10.0, 10.0), Vec2::new(900.0, 900.0)];
    let visible = Rect::new(0.0, 0.0, 100.0, 100.0);

    for _ in 0..20 {
        assert_eq!(pick_spawn_point(&points, visible, &mut rng), Some(Vec2::new(900.0, 900.0)));
    }

    let everything = Rect::new(0.0, 0.0, 1000.0, 1000.0);
    let picked = pick_spawn_point(&points, everything, &mut rng).unwrap();
    assert!(points.contains(&picked), "All visible: fall back to any point");

    assert_eq!(pick_spawn_point(&[], visible, &mut rng), None);
}

#[test]
fn test_update_spawns_once_interval_elapses() {
    let mut world = World::new();
    let mut director = SpawnDirector::new(SpawnConfig::default());

    assert_eq!(director.update(0.5, 0.5, &mut world.env()).unwrap(), None);
    let spawned = director.update(1.0, 0.5, &mut world.env()).unwrap().expect("interval reached");

    assert_eq!(director.active_count(), 1);
    assert_eq!(world.roster, vec![spawned]);
    assert!(world.grid.contains(Occupant::Actor(spawned)));
    let center = world.actors.get(spawned).unwrap().center().unwrap();
    assert_eq!(center, Vec2::new(1240.0, 920.0), "Only the hidden point is used");
    let navigator = world.actors.get(spawned).unwrap().navigator().unwrap();
    assert_eq!(navigator.target(), world.target);
}

#[test]
fn test_disabled_director_does_nothing() {
    let mut world = World::new();
    let mut director = SpawnDirector::new(SpawnConfig::default());
    director.enabled = false;

    for _ in 0..10 {
        assert_eq!(director.update(0.0, 1.0, &mut world.env()).unwrap(), None);
    }
    assert!(world.roster.is_empty());
}

#[test]
fn test_population_cap() {
    let mut world = World::new();
    let mut director = SpawnDirector::new(config(2));

    for step in 1..=10 {
        director.update(step as f32, 1.0, &mut world.env()).unwrap();
    }
    assert_eq!(director.active_count(), 2);
    assert_eq!(world.roster.len(), 2);
}

#[test]
fn test_dead_enemies_are_pooled_and_reused() {
    let mut world = World::new();
    let mut director = SpawnDirector::new(SpawnConfig::default());
    director.overrides = SpawnOverrides {
        enemy_type: Some(EnemyType::StrongZombie),
        strategy: None,
    };

    let first = director.spawn(EnemyType::StrongZombie, &mut world.env()).unwrap();
    world.kill(first);

    // Not yet due: the update only retires.
    assert_eq!(director.update(0.1, 0.1, &mut world.env()).unwrap(), None);
    assert_eq!(director.active_count(), 0);
    assert_eq!(director.inactive_count(), 1);
    assert!(world.roster.is_empty());
    assert!(!world.grid.contains(Occupant::Actor(first)));

    let again = director.update(1.2, 1.0, &mut world.env()).unwrap().unwrap();
    assert_eq!(again, first, "Same type and strategy reuses the pooled actor");
    assert_eq!(director.reused(), 1);
    assert_eq!(director.inactive_count(), 0);

    let actor = world.actors.get(again).unwrap();
    let health = actor.get::<Health>().unwrap();
    assert_eq!(health.health, health.max_health);
    assert!(!health.dead);
    assert!(actor.navigator().unwrap().path().is_empty());
}

#[test]
fn test_pool_is_not_shared_across_strategies() {
    let mut world = World::new();
    let mut director = SpawnDirector::new(SpawnConfig::default());

    director.overrides.strategy = Some(StrategyKind::Informed);
    let first = director.spawn(EnemyType::WeakZombie, &mut world.env()).unwrap();
    world.kill(first);
    director.update(0.0, 0.0, &mut world.env()).unwrap();

    director.overrides.strategy = Some(StrategyKind::Uninformed);
    let second = director.spawn(EnemyType::WeakZombie, &mut world.env()).unwrap();

    assert_ne!(first, second);
    assert_eq!(director.reused(), 0);
    assert_eq!(director.inactive_count(), 1);
}

#[test]
fn test_removed_enemies_leave_the_director() {
    let mut world = World::new();
    let mut director = SpawnDirector::new(SpawnConfig::default());
    let id = director.spawn(EnemyType::WeakZombie, &mut world.env()).unwrap();

    world.grid.remove(Occupant::Actor(id)).unwrap();
    world.actors.remove(id);
    director.update(0.0, 0.0, &mut world.env()).unwrap();

    assert_eq!(director.active_count(), 0);
    assert_eq!(director.inactive_count(), 0, "Gone actors are not pooled");
}

#[test]
fn test_spawn_without_points_fails() {
    let mut world = World::new();
    world.points.clear();
    let mut director = SpawnDirector::new(SpawnConfig::default());

    let err = director.spawn(EnemyType::WeakZombie, &mut world.env()).unwrap_err();
    assert!(matches!(err, SimError::MissingMarker(_)));
}
