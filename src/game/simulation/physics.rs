use std::f32::consts::TAU;

use bevy::math::{Rect, Vec2};
use rand::Rng;
use smallvec::SmallVec;

use super::{Liveness, Visual};
use crate::game::actor::{order, Actor, ActorId, Fragment, FrameContext, UpdateOrder};
use crate::game::error::SimError;
use crate::game::geometry::{collides, translate};
use crate::game::spatial_grid::{Neighbor, Occupant};

/// Penetration distances below this are treated as zero.
pub const COLLISION_TOLERANCE: f32 = 1e-4;
/// Magnitude of the push added when two solid actors overlap.
pub const SEPARATION_FORCE: f32 = 3.0;

/// Something touched during the last physics step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    Geometry,
    Actor(ActorId),
}

/// Velocity integration against the spatial grid.
///
/// # Collision response
///
/// For every neighbor the moved box would overlap:
/// - already overlapping static geometry is ignored when `clip` is set,
/// - already overlapping actors push each other apart with a fixed radial
///   impulse that is folded into `direction` immediately,
/// - anything else that may collide limits how far the actor moves, per axis,
///   to the distance left to its nearest face.
///
/// Contacts are recorded for post-physics fragments whether or not they
/// blocked movement.
#[derive(Clone, Debug)]
pub struct PhysicsBody {
    pub direction: Vec2,
    pub speed: f32,
    /// Collision box size, centered on the visual.
    pub bound: Vec2,
    /// Blocks, and is blocked by, other solid actors.
    pub solid: bool,
    /// May pass into geometry it already overlaps.
    pub clip: bool,
    /// Never blocked by anything (projectiles); still records contacts.
    pub ghost: bool,
    pub separation_force: f32,
    contacts: SmallVec<[Contact; 4]>,
    blocked: bool,
}

impl PhysicsBody {
    pub fn new(bound: Vec2, speed: f32) -> Self {
        Self {
            direction: Vec2::ZERO,
            speed,
            bound,
            solid: true,
            clip: true,
            ghost: false,
            separation_force: SEPARATION_FORCE,
            contacts: SmallVec::new(),
            blocked: false,
        }
    }

    pub fn rigid(bound: Vec2, speed: f32) -> Self {
        Self::new(bound, speed)
    }

    /// Walks through other actors but not through walls.
    pub fn non_rigid(bound: Vec2, speed: f32) -> Self {
        Self {
            solid: false,
            ..Self::new(bound, speed)
        }
    }

    pub fn projectile(bound: Vec2, speed: f32) -> Self {
        Self {
            solid: false,
            ghost: true,
            ..Self::new(bound, speed)
        }
    }

    pub fn with_separation_force(mut self, force: f32) -> Self {
        self.separation_force = force;
        self
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Whether movement was cut short during the last step.
    pub fn was_blocked(&self) -> bool {
        self.blocked
    }

    /// May `other` (None = static geometry) stop this body?
    pub fn should_collide(&self, other: Option<&Actor>) -> bool {
        if self.ghost {
            return false;
        }
        let Some(other) = other else {
            return true;
        };
        if !self.solid || other.liveness() != Liveness::Alive {
            return false;
        }
        other.get::<PhysicsBody>().is_some_and(|body| body.solid)
    }

    /// May this body keep overlapping `other`?
    pub fn allows_inside(&self, other: &Actor) -> bool {
        if !self.solid {
            return self.clip;
        }
        if other.liveness() != Liveness::Alive {
            return true;
        }
        other.get::<PhysicsBody>().is_none_or(|body| !body.solid)
    }

    fn record(&mut self, contact: Contact) {
        if !self.contacts.contains(&contact) {
            self.contacts.push(contact);
        }
    }

    fn separation_from(&self, center: Vec2, other_center: Option<Vec2>, rng: &mut impl Rng) -> Vec2 {
        let away = other_center.map_or(Vec2::ZERO, |c| center - c);
        if away == Vec2::ZERO {
            Vec2::from_angle(rng.random::<f32>() * TAU) * self.separation_force
        } else {
            away.normalize() * self.separation_force
        }
    }
}

/// Fraction of `offset` that keeps `moving` out of `other` along each axis.
fn allowed_fraction(moving: Rect, other: Rect, offset: Vec2) -> Vec2 {
    let axis = |offset: f32, ahead: f32, behind: f32| -> Option<f32> {
        if offset == 0.0 {
            return None;
        }
        let dist = if offset > 0.0 { ahead } else { behind };
        if dist.abs() > COLLISION_TOLERANCE && offset.abs() > COLLISION_TOLERANCE {
            Some((dist / offset).abs())
        } else {
            Some(0.0)
        }
    };

    let kx = axis(offset.x, other.min.x - moving.max.x, moving.min.x - other.max.x);
    let ky = axis(offset.y, other.min.y - moving.max.y, moving.min.y - other.max.y);
    Vec2::new(kx.unwrap_or(1.0), ky.unwrap_or(1.0))
}

impl Fragment for PhysicsBody {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::At(order::PHYSICS)
    }

    fn on_attach(&mut self, actor: &Actor) -> Result<(), SimError> {
        if !actor.has::<Visual>() {
            return Err(SimError::missing::<Visual>());
        }
        Ok(())
    }

    fn update(&mut self, actor: &mut Actor, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        self.contacts.clear();
        self.blocked = false;

        if actor.liveness() != Liveness::Alive {
            return Ok(());
        }
        let center = actor.require::<Visual>()?.center();

        let Some(grid) = ctx.grid.as_deref_mut() else {
            let offset = self.direction * self.speed * ctx.dt;
            actor.require_mut::<Visual>()?.set_center(center + offset);
            return Ok(());
        };

        let own = Occupant::Actor(actor.id());
        let bbox = Rect::from_center_size(center, self.bound);
        let mut offset = self.direction * self.speed * ctx.dt;
        let mut moved = translate(bbox, offset);
        let mut k = Vec2::ONE;

        let neighbors: SmallVec<[Neighbor; 16]> = grid
            .query_neighbors(center)
            .filter(|n| n.occupant != own)
            .collect();

        for neighbor in neighbors {
            if !collides(moved, neighbor.rect) {
                continue;
            }
            let other = neighbor.owner.and_then(|id| ctx.actors.get(id));
            if neighbor.owner.is_some() && other.is_none() {
                // Owner already removed from the stage.
                continue;
            }
            self.record(match neighbor.owner {
                Some(id) => Contact::Actor(id),
                None => Contact::Geometry,
            });

            if collides(bbox, neighbor.rect) {
                match (neighbor.owner, other) {
                    (Some(_), Some(other)) => {
                        if self.allows_inside(other) {
                            continue;
                        }
                        let push = self.separation_from(center, other.center(), &mut *ctx.rng);
                        self.direction += push;
                        offset = self.direction * self.speed * ctx.dt;
                        moved = translate(bbox, offset);
                    }
                    (None, _) if self.clip => continue,
                    _ => {}
                }
            }

            if !self.should_collide(other) {
                continue;
            }
            let fraction = allowed_fraction(bbox, neighbor.rect, offset);
            k = k.min(fraction);
        }

        let offset = offset * k;
        self.blocked = k != Vec2::ONE;

        grid.remove(own)?;
        actor.require_mut::<Visual>()?.set_center(center + offset);
        grid.insert(own, Rect::from_center_size(center + offset, self.bound))?;
        Ok(())
    }
}
