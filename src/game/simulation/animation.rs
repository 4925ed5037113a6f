use std::collections::BTreeMap;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use super::{Health, Liveness, PhysicsBody, Visual};
use crate::game::actor::{order, Actor, Fragment, FrameContext, UpdateOrder};
use crate::game::error::SimError;

pub const IDLE: &str = "idle";
pub const RUN: &str = "run";
pub const DEATH: &str = "death";

/// How long the hit flash stays on after damage.
pub const DAMAGE_FLASH_SECONDS: f32 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub frames: usize,
    pub frame_time: f32,
    #[serde(default = "default_looping")]
    pub looping: bool,
}

fn default_looping() -> bool {
    true
}

/// Clips of one skin, keyed by clip name. The death clip never loops.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationSet {
    pub clips: BTreeMap<String, AnimationClip>,
}

impl AnimationSet {
    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }
}

/// Picks and advances the visual's clip from the actor's movement and health.
#[derive(Clone, Debug)]
pub struct Animator {
    skin: String,
    set: AnimationSet,
    current: &'static str,
    elapsed: f32,
    flash: f32,
    finished: bool,
}

impl Animator {
    /// Fails when the skin cannot show running or dying.
    pub fn new(skin: impl Into<String>, set: AnimationSet) -> Result<Self, SimError> {
        let skin = skin.into();
        for required in [RUN, DEATH] {
            if set.clip(required).is_none() {
                return Err(SimError::MissingAnimation {
                    skin,
                    clip: required.to_string(),
                });
            }
        }
        Ok(Self {
            skin,
            set,
            current: "",
            elapsed: 0.0,
            flash: 0.0,
            finished: false,
        })
    }

    pub fn skin(&self) -> &str {
        &self.skin
    }

    pub fn current(&self) -> &'static str {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = "";
        self.elapsed = 0.0;
        self.flash = 0.0;
        self.finished = false;
    }

    fn choose(&self, liveness: Liveness, moving: bool) -> &'static str {
        if liveness != Liveness::Alive {
            DEATH
        } else if moving || self.set.clip(IDLE).is_none() {
            RUN
        } else {
            IDLE
        }
    }
}

impl Fragment for Animator {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::At(order::ANIMATE)
    }

    fn on_attach(&mut self, actor: &Actor) -> Result<(), SimError> {
        if !actor.has::<Visual>() {
            return Err(SimError::missing::<Visual>());
        }
        Ok(())
    }

    fn update(&mut self, actor: &mut Actor, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        let liveness = actor.liveness();
        let direction = actor.get::<PhysicsBody>().map_or(Vec2::ZERO, |b| b.direction);
        let wanted = self.choose(liveness, direction != Vec2::ZERO);

        if wanted != self.current {
            self.current = wanted;
            self.elapsed = 0.0;
            self.finished = false;
        }

        let clip = self.set.clip(self.current).ok_or_else(|| SimError::MissingAnimation {
            skin: self.skin.clone(),
            clip: self.current.to_string(),
        })?;
        let frames = clip.frames.max(1);

        if !self.finished {
            self.elapsed += ctx.dt;
        }
        let mut frame = if clip.frame_time > 0.0 {
            (self.elapsed / clip.frame_time) as usize
        } else {
            0
        };
        if frame >= frames {
            if clip.looping && self.current != DEATH {
                frame %= frames;
            } else {
                frame = frames - 1;
                self.finished = true;
            }
        }

        let visual = actor.require_mut::<Visual>()?;
        visual.clip = self.current;
        visual.frame = frame;
        if direction.x != 0.0 {
            visual.flip_x = direction.x < 0.0;
        }

        if let Some(health) = actor.get_mut::<Health>() {
            if health.damaged {
                self.flash += ctx.dt;
                if self.flash >= DAMAGE_FLASH_SECONDS {
                    health.damaged = false;
                    self.flash = 0.0;
                }
            }
            if self.current == DEATH && self.finished {
                health.dead = true;
            }
        }
        Ok(())
    }
}
