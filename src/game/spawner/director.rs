use bevy::log::debug;
use bevy::math::{Rect, Vec2};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use super::{EnemyType, SpawnConfig, SpawnOverrides};
use crate::game::actor::{tags, Actor, ActorArena, ActorId};
use crate::game::error::SimError;
use crate::game::pathfinding::StrategyKind;
use crate::game::simulation::{Animator, Health, PhysicsBody, Prefabs, Visual};
use crate::game::spatial_grid::{Occupant, SpatialGrid};

/// Stage services the director needs for one update.
pub struct SpawnEnv<'a> {
    pub actors: &'a mut ActorArena,
    pub grid: &'a mut SpatialGrid,
    /// Actors updated each frame, in order.
    pub roster: &'a mut Vec<ActorId>,
    pub rng: &'a mut StdRng,
    pub prefabs: &'a Prefabs,
    /// Actor every enemy hunts.
    pub target: ActorId,
    pub spawn_points: &'a [Vec2],
    /// What the camera currently shows.
    pub visible: Rect,
}

/// Uniform pick among points the camera cannot see, or among all of them
/// when every point is visible.
pub fn pick_spawn_point(points: &[Vec2], visible: Rect, rng: &mut StdRng) -> Option<Vec2> {
    let hidden: Vec<Vec2> = points.iter().copied().filter(|p| !visible.contains(*p)).collect();
    if hidden.is_empty() {
        points.choose(rng).copied()
    } else {
        hidden.choose(rng).copied()
    }
}

/// Time-driven enemy population.
///
/// Dead enemies leave the roster and the grid but stay in the arena as an
/// inactive pool; a later spawn of the same type and strategy reuses them.
#[derive(Debug)]
pub struct SpawnDirector {
    config: SpawnConfig,
    pub overrides: SpawnOverrides,
    pub enabled: bool,
    active: Vec<(ActorId, EnemyType)>,
    inactive: Vec<(ActorId, EnemyType)>,
    since_spawn: f32,
    reused: u64,
}

impl SpawnDirector {
    pub fn new(config: SpawnConfig) -> Self {
        Self {
            config,
            overrides: SpawnOverrides::default(),
            enabled: true,
            active: Vec::new(),
            inactive: Vec::new(),
            since_spawn: 0.0,
            reused: 0,
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    pub fn active(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.active.iter().map(|(id, _)| *id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    /// Number of spawns served from the inactive pool.
    pub fn reused(&self) -> u64 {
        self.reused
    }

    pub fn spawn_interval(&self, gametime: f32) -> f32 {
        let cfg = &self.config;
        (cfg.interval_start - gametime / cfg.ramp_seconds).max(cfg.interval_floor)
    }

    pub fn select_enemy_type(&self, gametime: f32, rng: &mut StdRng) -> EnemyType {
        if let Some(forced) = self.overrides.enemy_type {
            return forced;
        }
        let progress = gametime / self.config.ramp_seconds;
        EnemyType::eligible_at(progress)
            .choose(rng)
            .copied()
            .unwrap_or(EnemyType::WeakZombie)
    }

    pub fn select_strategy(&self, enemy: EnemyType, rng: &mut StdRng) -> Result<StrategyKind, SimError> {
        if let Some(forced) = self.overrides.strategy {
            return Ok(forced);
        }
        self.config
            .profiles
            .get(&enemy)
            .and_then(|profile| profile.strategies.choose(rng).copied())
            .ok_or_else(|| SimError::MissingProfile(format!("{enemy:?}")))
    }

    /// Retire the dead, then spawn one enemy when the interval has elapsed.
    /// Returns the spawned enemy, if any.
    pub fn update(&mut self, gametime: f32, dt: f32, env: &mut SpawnEnv<'_>) -> Result<Option<ActorId>, SimError> {
        if !self.enabled {
            return Ok(None);
        }
        self.retire_dead(env)?;

        let interval = self.spawn_interval(gametime);
        self.since_spawn += dt;
        if self.since_spawn < interval {
            return Ok(None);
        }
        self.since_spawn = 0.0;

        let enemy = self.select_enemy_type(gametime, env.rng);
        if self.active.len() >= self.config.max_active {
            return Ok(None);
        }
        self.spawn(enemy, env).map(Some)
    }

    fn retire_dead(&mut self, env: &mut SpawnEnv<'_>) -> Result<(), SimError> {
        let retiring: Vec<(ActorId, EnemyType)> = self
            .active
            .iter()
            .copied()
            .filter(|(id, _)| {
                env.actors
                    .get(*id)
                    .is_none_or(|actor| actor.get::<Health>().is_some_and(|h| h.dead))
            })
            .collect();

        for (id, enemy) in retiring {
            self.active.retain(|(active, _)| *active != id);
            env.roster.retain(|r| *r != id);
            let occupant = Occupant::Actor(id);
            if env.grid.contains(occupant) {
                env.grid.remove(occupant)?;
            }
            if env.actors.contains(id) {
                self.inactive.push((id, enemy));
                debug!("[SPAWN] Retired {:?} {:?}", enemy, id);
            }
        }
        Ok(())
    }

    /// Spawn one enemy of type `enemy` at a hidden spawn point.
    pub fn spawn(&mut self, enemy: EnemyType, env: &mut SpawnEnv<'_>) -> Result<ActorId, SimError> {
        let strategy = self.select_strategy(enemy, env.rng)?;
        let profile = self
            .config
            .profiles
            .get(&enemy)
            .ok_or_else(|| SimError::MissingProfile(format!("{enemy:?}")))?;
        let center = pick_spawn_point(env.spawn_points, env.visible, env.rng)
            .ok_or_else(|| SimError::MissingMarker(self.config.marker.clone()))?;

        let pooled = self.inactive.iter().position(|(id, kind)| {
            *kind == enemy
                && env
                    .actors
                    .get(*id)
                    .and_then(Actor::navigator)
                    .is_some_and(|nav| nav.strategy() == strategy)
        });

        let id = match pooled {
            Some(slot) => {
                let (id, _) = self.inactive.swap_remove(slot);
                if let Some(actor) = env.actors.get_mut(id) {
                    reactivate(actor, center)?;
                }
                self.reused += 1;
                id
            }
            None => env.prefabs.enemy(env.actors, profile, strategy, center, env.target)?,
        };

        let bounds = env
            .actors
            .get(id)
            .and_then(Actor::bounds)
            .ok_or_else(SimError::missing::<Visual>)?;
        env.grid.insert(Occupant::Actor(id), bounds)?;
        env.roster.push(id);
        self.active.push((id, enemy));
        debug!(
            "[SPAWN] {:?} ({:?}) at ({:.0}, {:.0}), {} active",
            enemy,
            strategy,
            center.x,
            center.y,
            self.active.len()
        );
        Ok(id)
    }
}

/// Bring a pooled enemy back at `center` with full health and no path.
fn reactivate(actor: &mut Actor, center: Vec2) -> Result<(), SimError> {
    actor.remove_tag(tags::KILLING);
    actor.require_mut::<Visual>()?.set_center(center);
    actor.require_mut::<Health>()?.revive();
    actor.require_mut::<PhysicsBody>()?.direction = Vec2::ZERO;
    if let Some(animator) = actor.get_mut::<Animator>() {
        animator.reset();
    }
    if let Some(navigator) = actor.navigator_mut() {
        navigator.reset();
    }
    Ok(())
}
