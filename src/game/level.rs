use std::collections::BTreeMap;
use std::path::Path;

use bevy::math::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PLAYER_MARKER: &str = "Player";

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level: {0}")]
    Parse(String),
}

/// Static obstacle in pixels, top-left origin.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LevelObstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LevelObstacle {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Collision layout and named marker points of a level.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LevelMap {
    pub tile_width: f32,
    pub tile_height: f32,
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    #[serde(default)]
    pub obstacles: Vec<LevelObstacle>,
    #[serde(default)]
    pub markers: BTreeMap<String, Vec<(f32, f32)>>,
}

impl LevelMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, LevelError> {
        ron::from_str(contents).map_err(|e| LevelError::Parse(e.to_string()))
    }

    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width, self.tile_height)
    }

    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(self.width as f32 * self.tile_width, self.height as f32 * self.tile_height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_corners(Vec2::ZERO, self.pixel_size())
    }

    pub fn obstacle_rects(&self) -> Vec<Rect> {
        self.obstacles.iter().map(LevelObstacle::rect).collect()
    }

    /// Points of a marker list; empty when the level has none.
    pub fn markers(&self, name: &str) -> Vec<Vec2> {
        self.markers
            .get(name)
            .map(|points| points.iter().map(|&(x, y)| Vec2::new(x, y)).collect())
            .unwrap_or_default()
    }
}
