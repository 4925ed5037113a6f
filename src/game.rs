use bevy::prelude::*;

pub mod actor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod level;
pub mod navigation;
pub mod pathfinding;
pub mod simulation;
pub mod spatial_grid;
pub mod spawner;
#[cfg(test)]
pub(crate) mod testing;

use config::GameConfigPlugin;
use simulation::StagePlugin;

/// Headless survival game: configuration plus the fixed-step stage.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((GameConfigPlugin, StagePlugin));
    }
}
