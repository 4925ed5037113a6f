use bevy::log::info;
use bevy::math::{Rect, Vec2};
use bevy::prelude::Resource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use survival_macros::profile;

use super::{CameraRig, InputEvent, Liveness, Prefabs, StageCommand};
use crate::game::actor::{tags, Actor, ActorArena, ActorId, FrameContext};
use crate::game::config::{GameConfig, InitialConfig};
use crate::game::error::SimError;
use crate::game::level::{LevelMap, PLAYER_MARKER};
use crate::game::navigation::NavigationGraph;
use crate::game::pathfinding::PolicyTable;
use crate::game::spatial_grid::{Occupant, SpatialGrid};
use crate::game::spawner::{EnemyType, SpawnDirector, SpawnEnv};
use crate::profile_log;

/// One running level: every actor plus the services they share.
///
/// # Frame
/// 1. every roster actor runs its fragments, in roster order,
/// 2. queued commands (bullets) are applied,
/// 3. actors tagged `killing` are removed,
/// 4. the spawn director retires and spawns enemies,
/// 5. the game is over once the player stops being alive.
#[derive(Resource)]
pub struct Stage {
    actors: ActorArena,
    roster: Vec<ActorId>,
    grid: SpatialGrid,
    navigation: NavigationGraph,
    policy: PolicyTable,
    director: SpawnDirector,
    prefabs: Prefabs,
    rng: StdRng,
    player: ActorId,
    spawn_points: Vec<Vec2>,
    level_bounds: Rect,
    gametime: f32,
    tick: u64,
    pub paused: bool,
    game_over: bool,
    commands: Vec<StageCommand>,
}

impl Stage {
    pub fn new(config: &InitialConfig, level: &LevelMap, policy: PolicyTable) -> Result<Self, SimError> {
        let mut grid = SpatialGrid::new(config.cell_size);
        let obstacles = level.obstacle_rects();
        for (i, rect) in obstacles.iter().enumerate() {
            grid.insert(Occupant::Obstacle(i as u32), *rect)?;
        }
        let navigation = NavigationGraph::new(obstacles);

        let player_spawn = level
            .markers(PLAYER_MARKER)
            .first()
            .copied()
            .ok_or_else(|| SimError::MissingMarker(PLAYER_MARKER.to_string()))?;

        let level_bounds = level.bounds();
        let prefabs = Prefabs::new(config, level_bounds, level.tile_size());
        let mut actors = ActorArena::new();
        let player = prefabs.player(&mut actors, player_spawn)?;
        if let Some(bounds) = actors.get(player).and_then(Actor::bounds) {
            grid.insert(Occupant::Actor(player), bounds)?;
        }

        let spawn_points = level.markers(&config.spawn.marker);
        info!(
            "[STAGE] Stage ready: {}x{} px, {} obstacles, {} spawn points, policy entries: {}",
            level_bounds.width(),
            level_bounds.height(),
            level.obstacles.len(),
            spawn_points.len(),
            policy.len()
        );

        Ok(Self {
            actors,
            roster: vec![player],
            grid,
            navigation,
            policy,
            director: SpawnDirector::new(config.spawn.clone()),
            prefabs,
            rng: StdRng::seed_from_u64(config.seed),
            player,
            spawn_points,
            level_bounds,
            gametime: 0.0,
            tick: 0,
            paused: false,
            game_over: false,
            commands: Vec::new(),
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn actors(&self) -> &ActorArena {
        &self.actors
    }

    pub fn actors_mut(&mut self) -> &mut ActorArena {
        &mut self.actors
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn roster(&self) -> &[ActorId] {
        &self.roster
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn navigation(&self) -> &NavigationGraph {
        &self.navigation
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn director(&self) -> &SpawnDirector {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut SpawnDirector {
        &mut self.director
    }

    pub fn player(&self) -> ActorId {
        self.player
    }

    pub fn gametime(&self) -> f32 {
        self.gametime
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn level_bounds(&self) -> Rect {
        self.level_bounds
    }

    /// World rectangle shown by the player's camera.
    pub fn camera_view(&self) -> Rect {
        let Some(player) = self.actors.get(self.player) else {
            return self.level_bounds;
        };
        match (player.get::<CameraRig>(), player.center()) {
            (Some(rig), Some(center)) => rig.visible_rect(center),
            _ => self.level_bounds,
        }
    }

    pub fn apply_game_config(&mut self, config: &GameConfig) {
        self.paused = config.paused;
        self.director.enabled = config.spawn_enabled;
        self.director.overrides = config.spawn_override;
    }

    // ------------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------------

    pub fn step(&mut self, dt: f32, events: &[InputEvent]) -> Result<(), SimError> {
        if self.paused || self.game_over {
            return Ok(());
        }
        self.tick += 1;
        self.gametime += dt;

        self.run_actors(self.tick, dt, events)?;
        self.apply_commands()?;
        self.remove_killed()?;
        self.run_director(dt)?;

        let player_alive = self
            .actors
            .get(self.player)
            .is_some_and(|player| player.liveness() == Liveness::Alive);
        if !player_alive {
            self.game_over = true;
            info!("[STAGE] Game over after {:.1}s ({} ticks)", self.gametime, self.tick);
        }

        profile_log!(
            self.tick,
            "[STAGE] tick {}: {} actors, {} enemies active, {} pooled, {} nav caches",
            self.tick,
            self.roster.len(),
            self.director.active_count(),
            self.director.inactive_count(),
            self.navigation.cached_probes()
        );
        Ok(())
    }

    #[profile(4)]
    fn run_actors(&mut self, tick: u64, dt: f32, events: &[InputEvent]) -> Result<(), SimError> {
        for i in 0..self.roster.len() {
            let id = self.roster[i];
            let Some(mut actor) = self.actors.checkout(id) else {
                continue;
            };
            let mut ctx = FrameContext {
                dt,
                tick,
                paused: self.paused,
                order: 0,
                events,
                grid: Some(&mut self.grid),
                actors: &mut self.actors,
                navigation: &mut self.navigation,
                policy: &self.policy,
                commands: &mut self.commands,
                rng: &mut self.rng,
            };
            let result = actor.update(&mut ctx);
            self.actors.restore(actor);
            result?;
        }
        Ok(())
    }

    fn apply_commands(&mut self) -> Result<(), SimError> {
        for command in std::mem::take(&mut self.commands) {
            match command {
                StageCommand::SpawnBullet { origin, direction } => {
                    let id = self.prefabs.bullet(&mut self.actors, origin, direction)?;
                    self.enter(id)?;
                }
            }
        }
        Ok(())
    }

    fn remove_killed(&mut self) -> Result<(), SimError> {
        let killed: Vec<ActorId> = self
            .roster
            .iter()
            .copied()
            .filter(|id| self.actors.get(*id).is_some_and(|a| a.has_tag(tags::KILLING)))
            .collect();
        if killed.is_empty() {
            return Ok(());
        }
        self.roster.retain(|id| !killed.contains(id));
        for id in killed {
            let occupant = Occupant::Actor(id);
            if self.grid.contains(occupant) {
                self.grid.remove(occupant)?;
            }
            self.actors.remove(id);
        }
        Ok(())
    }

    fn run_director(&mut self, dt: f32) -> Result<(), SimError> {
        let visible = self.camera_view();
        let mut env = SpawnEnv {
            actors: &mut self.actors,
            grid: &mut self.grid,
            roster: &mut self.roster,
            rng: &mut self.rng,
            prefabs: &self.prefabs,
            target: self.player,
            spawn_points: &self.spawn_points,
            visible,
        };
        self.director.update(self.gametime, dt, &mut env)?;
        Ok(())
    }

    /// Register an actor already in the arena with the grid and roster.
    fn enter(&mut self, id: ActorId) -> Result<(), SimError> {
        if let Some(bounds) = self.actors.get(id).and_then(Actor::bounds) {
            self.grid.insert(Occupant::Actor(id), bounds)?;
        }
        self.roster.push(id);
        Ok(())
    }

    /// Spawn an enemy right away, bypassing the director's timer and cap.
    pub fn spawn_enemy(&mut self, enemy: EnemyType) -> Result<ActorId, SimError> {
        let visible = self.camera_view();
        let mut env = SpawnEnv {
            actors: &mut self.actors,
            grid: &mut self.grid,
            roster: &mut self.roster,
            rng: &mut self.rng,
            prefabs: &self.prefabs,
            target: self.player,
            spawn_points: &self.spawn_points,
            visible,
        };
        self.director.spawn(enemy, &mut env)
    }
}
