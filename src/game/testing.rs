//! Minimal world for driving fragments in unit tests.

use bevy::math::{Rect, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::actor::{Actor, ActorArena, ActorId, FrameContext};
use crate::game::error::SimError;
use crate::game::navigation::NavigationGraph;
use crate::game::pathfinding::PolicyTable;
use crate::game::simulation::{InputEvent, PhysicsBody, StageCommand, Visual};
use crate::game::spatial_grid::{Occupant, SpatialGrid};

pub(crate) struct Harness {
    pub grid: SpatialGrid,
    pub actors: ActorArena,
    pub navigation: NavigationGraph,
    pub policy: PolicyTable,
    pub commands: Vec<StageCommand>,
    pub rng: StdRng,
    pub tick: u64,
}

impl Harness {
    pub fn new(obstacles: Vec<Rect>) -> Self {
        let mut grid = SpatialGrid::default();
        for (i, rect) in obstacles.iter().enumerate() {
            grid.insert(Occupant::Obstacle(i as u32), *rect).unwrap();
        }
        Self {
            grid,
            actors: ActorArena::new(),
            navigation: NavigationGraph::new(obstacles),
            policy: PolicyTable::new(),
            commands: Vec::new(),
            rng: StdRng::seed_from_u64(7),
            tick: 0,
        }
    }

    /// Spawn an actor with `build`, then register its box with the grid.
    pub fn spawn<F>(&mut self, build: F) -> ActorId
    where
        F: FnOnce(&mut Actor) -> Result<(), SimError>,
    {
        let id = self.actors.spawn(build).unwrap();
        if let Some(bounds) = self.actors.get(id).and_then(Actor::bounds) {
            if self.actors.get(id).is_some_and(|a| a.has::<PhysicsBody>()) {
                self.grid.insert(Occupant::Actor(id), bounds).unwrap();
            }
        }
        id
    }

    /// An actor with only a visual and a body.
    pub fn spawn_body(&mut self, center: Vec2, body: PhysicsBody) -> ActorId {
        let size = body.bound;
        self.spawn(|actor| {
            actor.add(Visual::centered(center, size))?.add(body)?;
            Ok(())
        })
    }

    pub fn update(&mut self, id: ActorId, dt: f32, events: &[InputEvent]) -> Result<(), SimError> {
        self.update_with(id, dt, events, true)
    }

    pub fn update_with(&mut self, id: ActorId, dt: f32, events: &[InputEvent], use_grid: bool) -> Result<(), SimError> {
        let mut actor = self.actors.checkout(id).unwrap();
        let result = self.with_ctx(dt, events, use_grid, |ctx| actor.update(ctx));
        self.actors.restore(actor);
        result
    }

    /// Run `f` with a frame context over this world.
    pub fn with_ctx<R>(
        &mut self,
        dt: f32,
        events: &[InputEvent],
        use_grid: bool,
        f: impl FnOnce(&mut FrameContext<'_>) -> R,
    ) -> R {
        self.tick += 1;
        let mut ctx = FrameContext {
            dt,
            tick: self.tick,
            paused: false,
            order: 0,
            events,
            grid: if use_grid { Some(&mut self.grid) } else { None },
            actors: &mut self.actors,
            navigation: &mut self.navigation,
            policy: &self.policy,
            commands: &mut self.commands,
            rng: &mut self.rng,
        };
        f(&mut ctx)
    }

    pub fn center(&self, id: ActorId) -> Vec2 {
        self.actors.get(id).and_then(Actor::center).unwrap()
    }

    pub fn actor(&self, id: ActorId) -> &Actor {
        self.actors.get(id).unwrap()
    }

    pub fn actor_mut(&mut self, id: ActorId) -> &mut Actor {
        self.actors.get_mut(id).unwrap()
    }
}
