use bevy::math::{Rect, Vec2};

use crate::game::actor::{order, tags, Actor, Fragment, FrameContext, UpdateOrder};
use crate::game::error::SimError;

/// Visual anchor of an actor. Position lives here; a renderer reads it back.
#[derive(Clone, Debug, PartialEq)]
pub struct Visual {
    pub rect: Rect,
    pub clip: &'static str,
    pub frame: usize,
    pub flip_x: bool,
    /// Draw order for y-sorted layers.
    pub depth: f32,
}

impl Visual {
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            rect: Rect::from_center_size(center, size),
            clip: "",
            frame: 0,
            flip_x: false,
            depth: center.y + size.y / 2.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.rect = Rect::from_center_size(center, self.rect.size());
    }
}

impl Fragment for Visual {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    /// Health is gone; the actor still animates but no longer moves.
    Dying,
    /// Death has played out; the owner removes or recycles the actor.
    Dead,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Health {
    pub health: i32,
    pub max_health: i32,
    /// Hit this frame; cleared by the animator once the flash has played.
    pub damaged: bool,
    pub dead: bool,
}

impl Health {
    pub fn new(max_health: i32) -> Self {
        Self {
            health: max_health,
            max_health,
            damaged: false,
            dead: false,
        }
    }

    pub fn liveness(&self) -> Liveness {
        if self.dead {
            Liveness::Dead
        } else if self.health <= 0 {
            Liveness::Dying
        } else {
            Liveness::Alive
        }
    }

    pub fn is_alive(&self) -> bool {
        self.liveness() == Liveness::Alive
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.health -= amount;
        self.damaged = true;
    }

    pub fn revive(&mut self) {
        self.health = self.max_health;
        self.damaged = false;
        self.dead = false;
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Fragment for Health {}

/// Marks the actor for removal after a fixed time.
#[derive(Clone, Debug)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }
}

impl Fragment for Lifetime {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::At(order::PROCESS)
    }

    fn update(&mut self, actor: &mut Actor, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        self.remaining -= ctx.dt;
        if self.remaining <= 0.0 {
            actor.add_tag(tags::KILLING);
        }
        Ok(())
    }
}

/// Keeps the draw depth in step with the bottom edge of the visual.
#[derive(Clone, Debug, Default)]
pub struct DepthSort;

impl Fragment for DepthSort {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::At(order::RENDER)
    }

    fn update(&mut self, actor: &mut Actor, _ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        let visual = actor.require_mut::<Visual>()?;
        visual.depth = visual.rect.max.y;
        Ok(())
    }
}

/// Camera following its actor, clamped to the level.
#[derive(Clone, Debug)]
pub struct CameraRig {
    pub viewport: Vec2,
    pub level: Rect,
}

impl CameraRig {
    pub fn new(viewport: Vec2, level: Rect) -> Self {
        Self { viewport, level }
    }

    /// World rectangle visible when centered on `focus`.
    pub fn visible_rect(&self, focus: Vec2) -> Rect {
        let half = self.viewport / 2.0;
        let level_size = self.level.size();
        let clamp_axis = |focus: f32, half: f32, min: f32, size: f32| {
            if size <= half * 2.0 {
                min + size / 2.0
            } else {
                focus.clamp(min + half, min + size - half)
            }
        };
        let center = Vec2::new(
            clamp_axis(focus.x, half.x, self.level.min.x, level_size.x),
            clamp_axis(focus.y, half.y, self.level.min.y, level_size.y),
        );
        Rect::from_center_size(center, self.viewport)
    }
}

impl Fragment for CameraRig {}
