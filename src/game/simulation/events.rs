use bevy::prelude::*;

/// Movement keys understood by the player controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Up,
    Down,
    Left,
    Right,
}

impl MoveKey {
    pub fn direction(self) -> Vec2 {
        match self {
            MoveKey::Up => Vec2::new(0.0, -1.0),
            MoveKey::Down => Vec2::new(0.0, 1.0),
            MoveKey::Left => Vec2::new(-1.0, 0.0),
            MoveKey::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Input already translated from devices by the host application.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(MoveKey),
    KeyUp(MoveKey),
    /// Shoot toward a world position.
    Fire { target: Vec2 },
}

/// Structural change requested by a fragment, applied after the actor pass.
#[derive(Debug, Clone, PartialEq)]
pub enum StageCommand {
    SpawnBullet { origin: Vec2, direction: Vec2 },
}
