use std::cmp::Ordering;

use bevy::math::Vec2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::game::geometry::NavPoint;
use crate::game::navigation::NavigationGraph;
use crate::game::pathfinding::PolicyTable;

/// Waypoints ordered from the far end to the next step: the last element is
/// where the actor heads now, and it is consumed from the back.
pub type Path = Vec<Vec2>;

/// Which search an enemy uses. Serialized in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Breadth-first search.
    Uninformed,
    /// A* with a Euclidean heuristic.
    Informed,
    /// Beam search.
    Local,
    AndOr,
    Backtracking,
    /// Pretrained policy table lookup.
    Learned,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Uninformed,
        StrategyKind::Informed,
        StrategyKind::Local,
        StrategyKind::AndOr,
        StrategyKind::Backtracking,
        StrategyKind::Learned,
    ];
}

pub struct PlanRequest {
    pub start: Vec2,
    pub end: Vec2,
    /// Size of the moving actor's collision box.
    pub probe: Vec2,
}

/// Shared services a strategy may consult while planning.
pub struct PlanEnv<'a> {
    pub navigation: &'a mut NavigationGraph,
    pub policy: &'a PolicyTable,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlanOutcome {
    Found(Path),
    /// No route: the actor holds position.
    NotFound,
    /// Search budget ran out before reaching the goal (beam search). The
    /// previous path loses its next waypoint and is otherwise kept.
    Exhausted,
}

/// A search variant pluggable into [`super::Pathfinder`].
pub trait PathStrategy: Send + Sync + 'static {
    fn kind(&self) -> StrategyKind;

    /// Bearing change (degrees) past which the stale path is replaced.
    fn replan_angle(&self) -> f32;

    fn plan(&mut self, request: &PlanRequest, env: &mut PlanEnv<'_>) -> PlanOutcome;
}

/// Forward route `[start, ..., end]` to path convention, dropping `start`.
pub(super) fn route_to_path(route: Vec<NavPoint>) -> Path {
    route.into_iter().skip(1).rev().map(NavPoint::to_vec2).collect()
}

/// Min-heap entry for cost-ordered frontiers; ties pop in insertion order.
#[derive(Clone, Copy, Debug)]
pub(super) struct FrontierEntry {
    pub cost: OrderedFloat<f32>,
    pub seq: u64,
    pub node: NavPoint,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
