use rand::rngs::StdRng;

use super::ActorArena;
use crate::game::navigation::NavigationGraph;
use crate::game::pathfinding::PolicyTable;
use crate::game::simulation::{InputEvent, StageCommand};
use crate::game::spatial_grid::SpatialGrid;

/// Everything a fragment may touch during one actor's update.
///
/// The updating actor itself is checked out of `actors`, so lookups of its own
/// id return `None`.
pub struct FrameContext<'a> {
    pub dt: f32,
    pub tick: u64,
    pub paused: bool,
    /// Priority currently being dispatched.
    pub order: i32,
    pub events: &'a [InputEvent],
    /// Absent for free-flying motion.
    pub grid: Option<&'a mut SpatialGrid>,
    pub actors: &'a mut ActorArena,
    pub navigation: &'a mut NavigationGraph,
    pub policy: &'a PolicyTable,
    pub commands: &'a mut Vec<StageCommand>,
    pub rng: &'a mut StdRng,
}
