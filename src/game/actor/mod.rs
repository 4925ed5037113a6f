use std::any::TypeId;

use bevy::math::{Rect, Vec2};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::game::error::SimError;
use crate::game::pathfinding::Navigator;
use crate::game::simulation::{Health, Liveness, PhysicsBody, Visual};

mod arena;
mod context;
mod fragment;

pub use arena::{ActorArena, ActorId};
pub use context::FrameContext;
pub use fragment::{order, AsAny, Fragment, UpdateOrder};

pub mod tags {
    pub const PLAYER: &str = "player";
    pub const ENEMY: &str = "enemy";
    pub const BULLET: &str = "bullet";
    /// Remove the actor from the stage at the end of the frame.
    pub const KILLING: &str = "killing";
}

struct FragmentSlot {
    type_name: &'static str,
    priorities: SmallVec<[i32; 2]>,
    fragment: Option<Box<dyn Fragment>>,
}

/// A logical game entity: a bag of fragments, at most one per concrete type,
/// plus a set of string tags.
///
/// # Dispatch
///
/// [`Actor::update`] runs every updatable fragment in descending priority.
/// Fragments registering several priorities run once per priority. Ties keep
/// registration order.
pub struct Actor {
    id: ActorId,
    tags: FxHashSet<&'static str>,
    slots: Vec<FragmentSlot>,
    index: FxHashMap<TypeId, usize>,
}

impl Actor {
    pub(crate) fn new(id: ActorId) -> Self {
        Self {
            id,
            tags: FxHashSet::default(),
            slots: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    // ------------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------------

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn add_tag(&mut self, tag: &'static str) {
        self.tags.insert(tag);
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    // ------------------------------------------------------------------------
    // Fragments
    // ------------------------------------------------------------------------

    /// Attach a fragment. If one of the same type is already present the new
    /// one is dropped and the first registration wins.
    pub fn add<T: Fragment>(&mut self, mut fragment: T) -> Result<&mut Self, SimError> {
        let key = TypeId::of::<T>();
        if self.index.contains_key(&key) {
            return Ok(self);
        }

        fragment.on_attach(self)?;

        let priorities = fragment.update_order().priorities();
        self.index.insert(key, self.slots.len());
        self.slots.push(FragmentSlot {
            type_name: std::any::type_name::<T>(),
            priorities,
            fragment: Some(Box::new(fragment)),
        });
        Ok(self)
    }

    pub fn has<T: Fragment>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: Fragment>(&self) -> Option<&T> {
        let idx = *self.index.get(&TypeId::of::<T>())?;
        let fragment = self.slots[idx].fragment.as_deref()?;
        fragment.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: Fragment>(&mut self) -> Option<&mut T> {
        let idx = *self.index.get(&TypeId::of::<T>())?;
        let fragment = self.slots[idx].fragment.as_deref_mut()?;
        fragment.as_any_mut().downcast_mut::<T>()
    }

    /// Lookup that falls back to `default` instead of failing.
    pub fn get_or<'a, T: Fragment>(&'a self, default: &'a T) -> &'a T {
        self.get::<T>().unwrap_or(default)
    }

    /// Lookup for components the caller cannot work without.
    pub fn require<T: Fragment>(&self) -> Result<&T, SimError> {
        self.get::<T>().ok_or_else(SimError::missing::<T>)
    }

    pub fn require_mut<T: Fragment>(&mut self) -> Result<&mut T, SimError> {
        self.get_mut::<T>().ok_or_else(SimError::missing::<T>)
    }

    /// The pathfinder of this actor, whichever strategy it uses.
    pub fn navigator(&self) -> Option<&dyn Navigator> {
        self.slots
            .iter()
            .filter_map(|slot| slot.fragment.as_deref())
            .find_map(|fragment| fragment.as_navigator())
    }

    pub fn navigator_mut(&mut self) -> Option<&mut dyn Navigator> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.fragment.as_deref_mut())
            .find_map(|fragment| fragment.as_navigator_mut())
    }

    pub fn fragment_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|slot| slot.type_name)
    }

    // ------------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------------

    pub fn center(&self) -> Option<Vec2> {
        self.get::<Visual>().map(|v| v.rect.center())
    }

    /// Collision box: the body's bound around the visual center, or the
    /// visual rectangle itself for actors without a body.
    pub fn bounds(&self) -> Option<Rect> {
        let visual = self.get::<Visual>()?;
        match self.get::<PhysicsBody>() {
            Some(body) => Some(Rect::from_center_size(visual.rect.center(), body.bound)),
            None => Some(visual.rect),
        }
    }

    pub fn liveness(&self) -> Liveness {
        self.get::<Health>().map_or(Liveness::Alive, Health::liveness)
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    pub fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        if ctx.paused {
            return Ok(());
        }

        let mut schedule: SmallVec<[(i32, usize); 16]> = SmallVec::new();
        for (idx, slot) in self.slots.iter().enumerate() {
            for &priority in &slot.priorities {
                schedule.push((priority, idx));
            }
        }
        // Stable: equal priorities keep registration order.
        schedule.sort_by(|a, b| b.0.cmp(&a.0));

        for (priority, idx) in schedule {
            let Some(mut fragment) = self.slots[idx].fragment.take() else {
                continue;
            };
            ctx.order = priority;
            let result = fragment.update(self, ctx);
            self.slots[idx].fragment = Some(fragment);
            result?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("tags", &self.tags)
            .field("fragments", &self.fragment_names().collect::<Vec<_>>())
            .finish()
    }
}
