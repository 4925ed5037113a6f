use slotmap::{new_key_type, SlotMap};

use super::Actor;
use crate::game::error::SimError;

new_key_type! {
    /// Generational handle to an actor. Stale handles never alias a newer actor.
    pub struct ActorId;
}

/// Owner of every actor in a stage.
///
/// An actor can be checked out while it runs its own update; during that time
/// its slot stays reserved (lookups return `None`) and its id stays valid.
#[derive(Default)]
pub struct ActorArena {
    slots: SlotMap<ActorId, Option<Actor>>,
}

impl ActorArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id, let `build` attach fragments, then store the actor.
    ///
    /// The slot is released again if `build` fails.
    pub fn spawn<F>(&mut self, build: F) -> Result<ActorId, SimError>
    where
        F: FnOnce(&mut Actor) -> Result<(), SimError>,
    {
        let id = self.slots.insert(None);
        let mut actor = Actor::new(id);
        if let Err(e) = build(&mut actor) {
            self.slots.remove(id);
            return Err(e);
        }
        if let Some(slot) = self.slots.get_mut(id) {
            *slot = Some(actor);
        }
        Ok(id)
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.slots.contains_key(id)
    }

    /// Take an actor out for exclusive use. Pair with [`ActorArena::restore`].
    pub fn checkout(&mut self, id: ActorId) -> Option<Actor> {
        self.slots.get_mut(id).and_then(Option::take)
    }

    pub fn restore(&mut self, actor: Actor) {
        if let Some(slot) = self.slots.get_mut(actor.id()) {
            *slot = Some(actor);
        }
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        self.slots.remove(id).flatten()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.slots
            .iter()
            .filter_map(|(id, slot)| slot.as_ref().map(|actor| (id, actor)))
    }
}
