use bevy::math::Vec2;

use super::{InputEvent, Liveness, PhysicsBody, StageCommand, Visual};
use crate::game::actor::{order, Actor, Fragment, FrameContext, UpdateOrder};
use crate::game::error::SimError;

/// Turns movement key presses into a direction for the physics body.
#[derive(Clone, Debug, Default)]
pub struct PlayerController {
    held: Vec2,
}

impl PlayerController {
    pub fn held(&self) -> Vec2 {
        self.held
    }
}

impl Fragment for PlayerController {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::At(order::INPUT)
    }

    fn update(&mut self, actor: &mut Actor, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        for event in ctx.events {
            match event {
                InputEvent::KeyDown(key) => self.held += key.direction(),
                InputEvent::KeyUp(key) => self.held -= key.direction(),
                InputEvent::Fire { .. } => {}
            }
        }
        let body = actor.require_mut::<PhysicsBody>()?;
        body.direction = self.held.normalize_or_zero();
        Ok(())
    }
}

/// Fires bullets toward the requested position, limited by a cooldown.
#[derive(Clone, Debug)]
pub struct Shooter {
    pub cooldown: f32,
    ready_in: f32,
}

impl Shooter {
    pub fn new(cooldown: f32) -> Self {
        Self {
            cooldown,
            ready_in: 0.0,
        }
    }
}

impl Fragment for Shooter {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::At(order::INPUT)
    }

    fn update(&mut self, actor: &mut Actor, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        self.ready_in = (self.ready_in - ctx.dt).max(0.0);
        if actor.liveness() != Liveness::Alive {
            return Ok(());
        }

        let origin = actor.require::<Visual>()?.center();
        for event in ctx.events {
            let InputEvent::Fire { target } = event else {
                continue;
            };
            if self.ready_in > 0.0 {
                break;
            }
            let direction = (*target - origin).normalize_or_zero();
            if direction == Vec2::ZERO {
                continue;
            }
            ctx.commands.push(StageCommand::SpawnBullet { origin, direction });
            self.ready_in = self.cooldown;
        }
        Ok(())
    }
}
