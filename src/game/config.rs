use std::collections::BTreeMap;

use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};

use crate::game::pathfinding::{DEFAULT_BACKTRACK_BUDGET, DEFAULT_BEAM_DEPTH, DEFAULT_BEAM_WIDTH, DEFAULT_MAX_STEPS};
use crate::game::simulation::{AnimationClip, AnimationSet, SEPARATION_FORCE};
use crate::game::spatial_grid::CELL_SIZE;
use crate::game::spawner::{SpawnConfig, SpawnOverrides};

pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";

/// Size, speed and look of one kind of actor.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ActorConfig {
    pub skin: String,
    /// Visual rectangle size.
    pub size: Vec2,
    /// Collision box size.
    pub bound: Vec2,
    pub speed: f32,
    pub health: i32,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct BulletConfig {
    pub size: Vec2,
    pub bound: Vec2,
    pub speed: f32,
    /// Seconds before an unblocked bullet disappears.
    pub lifetime: f32,
    pub damage: i32,
    /// Seconds between two shots.
    pub fire_cooldown: f32,
}

/// Bearing drift, in degrees, tolerated by each search before it replans.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ReplanAngles {
    pub uninformed: f32,
    pub informed: f32,
    pub local: f32,
    pub and_or: f32,
    pub backtracking: f32,
    pub learned: f32,
}

impl Default for ReplanAngles {
    fn default() -> Self {
        Self {
            uninformed: 60.0,
            informed: 45.0,
            local: 80.0,
            and_or: 90.0,
            backtracking: 45.0,
            learned: 45.0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PathfindingConfig {
    pub replan: ReplanAngles,
    pub beam_width: usize,
    pub beam_depth: usize,
    pub backtrack_budget: usize,
    pub policy_max_steps: usize,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            replan: ReplanAngles::default(),
            beam_width: DEFAULT_BEAM_WIDTH,
            beam_depth: DEFAULT_BEAM_DEPTH,
            backtrack_budget: DEFAULT_BACKTRACK_BUDGET,
            policy_max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Static configuration loaded once at startup. Changing these values needs a
/// new stage.
#[derive(Resource, Deserialize, Serialize, Clone, Debug)]
pub struct InitialConfig {
    // Simulation
    pub tick_rate: f64,
    pub cell_size: f32,
    pub seed: u64,
    pub separation_force: f32,

    // Files
    pub level_path: String,
    pub policy_path: String,

    // Actors
    pub player: ActorConfig,
    pub player_contact_damage: i32,
    pub player_hit_cooldown: f32,
    pub enemy_size: Vec2,
    pub enemy_bound: Vec2,
    pub bullet: BulletConfig,
    pub viewport: Vec2,

    // Pathfinding
    pub pathfinding: PathfindingConfig,

    // Content
    pub skins: BTreeMap<String, AnimationSet>,
    pub spawn: SpawnConfig,
}

impl InitialConfig {
    pub fn skin(&self, name: &str) -> Option<&AnimationSet> {
        self.skins.get(name)
    }

    /// Read and parse a RON file.
    pub fn load(path: &str) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))?;
        ron::from_str::<InitialConfig>(&contents).map_err(|e| format!("failed to parse {path}: {e}"))
    }
}

/// Runtime configuration that can be hot-reloaded during play.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug, Default, PartialEq)]
pub struct GameConfig {
    pub paused: bool,
    #[serde(default = "default_spawn_enabled")]
    pub spawn_enabled: bool,
    #[serde(default)]
    pub spawn_override: SpawnOverrides,
}

fn default_spawn_enabled() -> bool {
    true
}

#[derive(Resource)]
pub struct GameConfigHandle(pub Handle<GameConfig>);

pub struct GameConfigPlugin;

impl Plugin for GameConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<GameConfig>::new(&["game_config.ron"]))
            .add_systems(Startup, (load_initial_config, setup_runtime_config).chain());
    }
}

/// Load static initial configuration synchronously at startup.
/// A stage cannot be built before this has run.
pub fn load_initial_config(mut commands: Commands, existing: Option<Res<InitialConfig>>) {
    if existing.is_some() {
        info!("[CONFIG] Initial config provided by the app, skipping {}", INITIAL_CONFIG_PATH);
        return;
    }
    match InitialConfig::load(INITIAL_CONFIG_PATH) {
        Ok(config) => {
            info!("[CONFIG] Loaded initial config from {}", INITIAL_CONFIG_PATH);
            commands.insert_resource(config);
        }
        Err(e) => {
            error!("[CONFIG] {}", e);
            error!("[CONFIG] Using default InitialConfig");
            commands.insert_resource(InitialConfig::default());
        }
    }
}

/// Load runtime configuration asynchronously (can be hot-reloaded).
fn setup_runtime_config(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load("game_config.ron");
    commands.insert_resource(GameConfigHandle(handle));
}

fn clip(frames: usize, frame_time: f32, looping: bool) -> AnimationClip {
    AnimationClip {
        frames,
        frame_time,
        looping,
    }
}

fn default_skin() -> AnimationSet {
    let mut set = AnimationSet::default();
    set.clips.insert("idle".into(), clip(4, 0.15, true));
    set.clips.insert("run".into(), clip(6, 0.1, true));
    set.clips.insert("death".into(), clip(6, 0.1, false));
    set
}

impl Default for InitialConfig {
    fn default() -> Self {
        let spawn = SpawnConfig::default();
        let mut skins = BTreeMap::new();
        skins.insert("Farmer 0".to_string(), default_skin());
        for profile in spawn.profiles.values() {
            skins.insert(profile.skin.clone(), default_skin());
        }

        Self {
            tick_rate: 60.0,
            cell_size: CELL_SIZE,
            seed: 0x5eed,
            separation_force: SEPARATION_FORCE,
            level_path: "assets/maps/arena.ron".into(),
            policy_path: "assets/policy.bin".into(),
            player: ActorConfig {
                skin: "Farmer 0".into(),
                size: Vec2::new(32.0, 32.0),
                bound: Vec2::new(10.0, 11.0),
                speed: 100.0,
                health: 100,
            },
            player_contact_damage: 5,
            player_hit_cooldown: 0.5,
            enemy_size: Vec2::new(32.0, 32.0),
            enemy_bound: Vec2::new(10.0, 11.0),
            bullet: BulletConfig {
                size: Vec2::new(8.0, 8.0),
                bound: Vec2::new(4.0, 4.0),
                speed: 400.0,
                lifetime: 1.5,
                damage: 10,
                fire_cooldown: 0.2,
            },
            viewport: Vec2::new(1280.0, 720.0),
            pathfinding: PathfindingConfig::default(),
            skins,
            spawn,
        }
    }
}
