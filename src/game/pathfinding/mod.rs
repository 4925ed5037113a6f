use bevy::log::debug;
use bevy::math::Vec2;
use survival_macros::profile;

use crate::game::actor::{order, Actor, ActorId, Fragment, FrameContext, UpdateOrder};
use crate::game::error::SimError;
use crate::game::geometry::bearing_degrees;
use crate::game::simulation::{PhysicsBody, Visual};

mod and_or;
mod astar;
mod backtrack;
mod beam;
mod bfs;
mod policy;
mod types;

pub use and_or::{and_or_route, AndOr, GoalTree};
pub use astar::{astar_route, Informed};
pub use backtrack::{Backtracking, DEFAULT_BACKTRACK_BUDGET};
pub use beam::{beam_route, BeamResult, Local, DEFAULT_BEAM_DEPTH, DEFAULT_BEAM_WIDTH};
pub use bfs::{bfs_route, Uninformed};
pub use policy::{
    load_policy, policy_walk, save_policy, tile_center, to_tile, Action, Learned, PolicyError, PolicyTable,
    DEFAULT_MAX_STEPS, POLICY_VERSION,
};
pub use types::{Path, PathStrategy, PlanEnv, PlanOutcome, PlanRequest, StrategyKind};

/// Read access to an actor's pathfinder, whatever its strategy.
pub trait Navigator {
    fn strategy(&self) -> StrategyKind;
    fn target(&self) -> ActorId;
    fn path(&self) -> &[Vec2];
    fn replans(&self) -> u32;
    /// Forget the current path, e.g. when a pooled actor is reused.
    fn reset(&mut self);
}

/// Steers its actor toward a target actor along a planned path.
///
/// Each frame:
/// 1. drop the next waypoint if the actor has clearly passed it,
/// 2. replan when there is no path, or when the target's bearing has drifted
///    from the bearing of the path's far end by more than the strategy's
///    threshold,
/// 3. point the physics body at the next waypoint (or stop).
pub struct Pathfinder<S: PathStrategy> {
    strategy: S,
    target: ActorId,
    path: Path,
    last_position: Option<Vec2>,
    replans: u32,
}

impl<S: PathStrategy> Pathfinder<S> {
    pub fn new(strategy: S, target: ActorId) -> Self {
        Self {
            strategy,
            target,
            path: Vec::new(),
            last_position: None,
            replans: 0,
        }
    }

    pub fn strategy_ref(&self) -> &S {
        &self.strategy
    }

    /// Pop the next waypoint once the actor has gone past it further than it
    /// was before this step.
    fn drop_overshot_waypoint(&mut self, current: Vec2) {
        let (Some(last), Some(&waypoint)) = (self.last_position, self.path.last()) else {
            return;
        };
        let before = waypoint - last;
        let now = waypoint - current;
        if now.dot(before) < 0.0 && now.length_squared() > before.length_squared() {
            self.path.pop();
        }
    }

    fn should_replan(&self, current: Vec2, destination: Vec2) -> bool {
        let Some(&far_end) = self.path.first() else {
            return true;
        };
        let to_far_end = bearing_degrees(current - far_end);
        let to_target = bearing_degrees(current - destination);
        (to_far_end - to_target).abs() % 180.0 > self.strategy.replan_angle()
    }

    #[profile(2)]
    fn replan(&mut self, request: PlanRequest, ctx: &mut FrameContext<'_>) {
        self.replans += 1;
        let mut env = PlanEnv {
            navigation: &mut *ctx.navigation,
            policy: ctx.policy,
        };
        match self.strategy.plan(&request, &mut env) {
            PlanOutcome::Found(path) => self.path = path,
            PlanOutcome::NotFound => {
                debug!(
                    "[PATHFINDING] {:?}: no path {:?} -> {:?}",
                    self.strategy.kind(),
                    request.start,
                    request.end
                );
                self.path.clear();
            }
            PlanOutcome::Exhausted => {
                self.path.pop();
            }
        }
    }
}

impl<S: PathStrategy> Fragment for Pathfinder<S> {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::At(order::PATHFIND)
    }

    fn on_attach(&mut self, actor: &Actor) -> Result<(), SimError> {
        if !actor.has::<PhysicsBody>() {
            return Err(SimError::missing::<PhysicsBody>());
        }
        Ok(())
    }

    fn update(&mut self, actor: &mut Actor, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        let current = actor.center().ok_or_else(SimError::missing::<Visual>)?;
        let destination = ctx.actors.get(self.target).and_then(Actor::center);

        match destination {
            Some(destination) => {
                self.drop_overshot_waypoint(current);
                self.last_position = Some(current);

                if self.should_replan(current, destination) {
                    let probe = actor.require::<PhysicsBody>()?.bound;
                    let request = PlanRequest {
                        start: current,
                        end: destination,
                        probe,
                    };
                    self.replan(request, ctx);
                }
            }
            // Target gone: hold position.
            None => self.path.clear(),
        }

        let body = actor.require_mut::<PhysicsBody>()?;
        body.direction = match self.path.last() {
            Some(waypoint) => (*waypoint - current).normalize_or_zero(),
            None => Vec2::ZERO,
        };
        Ok(())
    }

    fn as_navigator(&self) -> Option<&dyn Navigator> {
        Some(self)
    }

    fn as_navigator_mut(&mut self) -> Option<&mut dyn Navigator> {
        Some(self)
    }
}

impl<S: PathStrategy> Navigator for Pathfinder<S> {
    fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    fn target(&self) -> ActorId {
        self.target
    }

    fn path(&self) -> &[Vec2] {
        &self.path
    }

    fn replans(&self) -> u32 {
        self.replans
    }

    fn reset(&mut self) {
        self.path.clear();
        self.last_position = None;
    }
}
