use rustc_hash::FxHashMap;

use super::{Contact, Health, Liveness, PhysicsBody};
use crate::game::actor::{order, tags, Actor, ActorId, Fragment, FrameContext, UpdateOrder};
use crate::game::error::SimError;

const PLAYER_TRIGGER_ORDERS: &[i32] = &[order::PREPROCESS, order::POST_PHYSICS];

/// Damage taken by the player from touching enemies.
///
/// Runs twice per frame: the preprocess pass ticks per-enemy cooldowns, the
/// post-physics pass applies damage from this frame's contacts.
#[derive(Clone, Debug)]
pub struct PlayerTrigger {
    pub damage: i32,
    pub cooldown: f32,
    cooldowns: FxHashMap<ActorId, f32>,
}

impl PlayerTrigger {
    pub fn new(damage: i32, cooldown: f32) -> Self {
        Self {
            damage,
            cooldown,
            cooldowns: FxHashMap::default(),
        }
    }
}

impl Default for PlayerTrigger {
    fn default() -> Self {
        Self::new(5, 0.5)
    }
}

impl Fragment for PlayerTrigger {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::Multi(PLAYER_TRIGGER_ORDERS)
    }

    fn on_attach(&mut self, actor: &Actor) -> Result<(), SimError> {
        if !actor.has::<Health>() {
            return Err(SimError::missing::<Health>());
        }
        Ok(())
    }

    fn update(&mut self, actor: &mut Actor, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        if ctx.order == order::PREPROCESS {
            let dt = ctx.dt;
            self.cooldowns.retain(|_, remaining| {
                *remaining -= dt;
                *remaining > 0.0
            });
            return Ok(());
        }

        let contacts: Vec<ActorId> = actor
            .require::<PhysicsBody>()?
            .contacts()
            .iter()
            .filter_map(|contact| match contact {
                Contact::Actor(id) => Some(*id),
                Contact::Geometry => None,
            })
            .collect();

        for id in contacts {
            let hostile = ctx
                .actors
                .get(id)
                .is_some_and(|other| other.has_tag(tags::ENEMY) && other.liveness() == Liveness::Alive);
            if !hostile || self.cooldowns.contains_key(&id) {
                continue;
            }
            let health = actor.require_mut::<Health>()?;
            if health.liveness() != Liveness::Alive {
                break;
            }
            health.take_damage(self.damage);
            self.cooldowns.insert(id, self.cooldown);
        }
        Ok(())
    }
}

/// Bullet impact: damages the first live enemy it touches, dies on walls.
#[derive(Clone, Debug)]
pub struct BulletTrigger {
    pub damage: i32,
}

impl BulletTrigger {
    pub fn new(damage: i32) -> Self {
        Self { damage }
    }
}

impl Default for BulletTrigger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Fragment for BulletTrigger {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::At(order::POST_PHYSICS)
    }

    fn update(&mut self, actor: &mut Actor, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        if actor.has_tag(tags::KILLING) {
            return Ok(());
        }
        let contacts: Vec<Contact> = actor.require::<PhysicsBody>()?.contacts().to_vec();

        for contact in contacts {
            match contact {
                Contact::Geometry => {
                    actor.add_tag(tags::KILLING);
                    break;
                }
                Contact::Actor(id) => {
                    let Some(enemy) = ctx.actors.get_mut(id) else {
                        continue;
                    };
                    if !enemy.has_tag(tags::ENEMY) || enemy.liveness() != Liveness::Alive {
                        continue;
                    }
                    if let Some(health) = enemy.get_mut::<Health>() {
                        health.take_damage(self.damage);
                    }
                    actor.add_tag(tags::KILLING);
                    break;
                }
            }
        }
        Ok(())
    }
}
