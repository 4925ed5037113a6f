/// Simulation layer - the stage and every actor fragment.
///
/// This module is organized into:
/// - **components**: Visual, health, lifetime, depth and camera fragments
/// - **physics**: Movement against the spatial grid with contact recording
/// - **control**: Player input and shooting
/// - **triggers**: Damage from recorded contacts
/// - **animation**: Clip selection and frame advance
/// - **prefabs**: Player, enemy and bullet factories
/// - **stage**: The per-level world and its frame step
/// - **events**: Input messages and deferred stage commands

use bevy::prelude::*;

use crate::game::config::{load_initial_config, GameConfig, GameConfigHandle, InitialConfig};
use crate::game::level::LevelMap;
use crate::game::pathfinding::PolicyTable;

// Module declarations
pub mod animation;
pub mod components;
pub mod control;
pub mod events;
pub mod physics;
pub mod prefabs;
pub mod stage;
pub mod triggers;
#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use animation::{AnimationClip, AnimationSet, Animator};
pub use components::*;
pub use control::{PlayerController, Shooter};
pub use events::*;
pub use physics::{Contact, PhysicsBody, COLLISION_TOLERANCE, SEPARATION_FORCE};
pub use prefabs::Prefabs;
pub use stage::Stage;
pub use triggers::{BulletTrigger, PlayerTrigger};

/// Builds the stage at startup and steps it on the fixed timestep.
pub struct StagePlugin;

impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(60.0));
        app.add_message::<InputEvent>();

        app.add_systems(Startup, setup_stage.after(load_initial_config));
        app.add_systems(FixedUpdate, step_stage);
        app.add_systems(Update, apply_runtime_config);
    }
}

fn setup_stage(mut commands: Commands, config: Res<InitialConfig>, mut time: ResMut<Time<Fixed>>) -> Result {
    let level = LevelMap::load(&config.level_path)?;
    let policy = PolicyTable::load_or_empty(&config.policy_path);
    let stage = Stage::new(&config, &level, policy)?;

    time.set_timestep_hz(config.tick_rate);
    info!("[STAGE] Loaded {} at {} Hz", config.level_path, config.tick_rate);
    commands.insert_resource(stage);
    Ok(())
}

fn step_stage(stage: Option<ResMut<Stage>>, time: Res<Time>, mut input: MessageReader<InputEvent>) -> Result {
    let Some(mut stage) = stage else {
        return Ok(());
    };
    let events: Vec<InputEvent> = input.read().cloned().collect();
    stage.step(time.delta_secs(), &events)?;
    Ok(())
}

fn apply_runtime_config(
    config_handle: Option<Res<GameConfigHandle>>,
    game_configs: Res<Assets<GameConfig>>,
    mut events: MessageReader<AssetEvent<GameConfig>>,
    stage: Option<ResMut<Stage>>,
) {
    let (Some(config_handle), Some(mut stage)) = (config_handle, stage) else {
        return;
    };
    for event in events.read() {
        if event.is_modified(config_handle.0.id()) || event.is_loaded_with_dependencies(config_handle.0.id()) {
            if let Some(config) = game_configs.get(&config_handle.0) {
                info!(
                    "[CONFIG] Runtime config applied: paused={} spawning={} override={:?}",
                    config.paused, config.spawn_enabled, config.spawn_override
                );
                stage.apply_game_config(config);
            }
        }
    }
}
