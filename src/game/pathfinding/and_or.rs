use bevy::math::Vec2;
use rustc_hash::FxHashSet;

use super::bfs::bfs_route;
use super::types::{PathStrategy, PlanEnv, PlanOutcome, PlanRequest, StrategyKind};
use crate::game::geometry::NavPoint;
use crate::game::navigation::NavAdjacency;

/// Compound goal: reach every child in order (`And`), any one child (`Or`),
/// or a single point (`Leaf`).
#[derive(Clone, Debug, PartialEq)]
pub enum GoalTree {
    Leaf(NavPoint),
    And(Vec<GoalTree>),
    Or(Vec<GoalTree>),
}

/// Recursive AND-OR descent; leaves are solved by breadth-first search.
///
/// Returns the route in travel order, starting at `point`. Points in `visited`
/// cannot start a new sub-search; AND chains add each leg's start point, so a
/// chain cannot restart from a junction it already left.
pub fn and_or_route(
    nav: &NavAdjacency,
    point: NavPoint,
    goal: &GoalTree,
    visited: &FxHashSet<NavPoint>,
) -> Option<Vec<NavPoint>> {
    if visited.contains(&point) {
        return None;
    }

    match goal {
        GoalTree::Leaf(target) => bfs_route(nav, point, *target),
        GoalTree::And(children) => {
            let mut route: Vec<NavPoint> = Vec::new();
            let mut seen = visited.clone();
            let mut from = point;
            for child in children {
                let leg = and_or_route(nav, from, child, &seen)?;
                seen.insert(from);
                // Each leg starts where the previous one ended.
                let skip = usize::from(!route.is_empty());
                route.extend(leg.iter().skip(skip).copied());
                if let Some(last) = leg.last() {
                    from = *last;
                }
            }
            Some(route)
        }
        GoalTree::Or(children) => children
            .iter()
            .filter_map(|child| and_or_route(nav, point, child, visited))
            .find(|route| !route.is_empty()),
    }
}

fn merge_into(nav: &mut NavAdjacency, other: NavAdjacency) {
    for (node, neighbors) in other {
        let entry = nav.entry(node).or_default();
        for n in neighbors {
            if !entry.contains(&n) {
                entry.push(n);
            }
        }
    }
}

/// AND-OR search toward the target, optionally through fixed waypoints first.
#[derive(Clone, Debug)]
pub struct AndOr {
    replan_angle: f32,
    waypoints: Vec<Vec2>,
}

impl AndOr {
    pub fn new(replan_angle: f32) -> Self {
        Self {
            replan_angle,
            waypoints: Vec::new(),
        }
    }

    /// Visit `waypoints` in order before heading for the target.
    pub fn through(mut self, waypoints: Vec<Vec2>) -> Self {
        self.waypoints = waypoints;
        self
    }

    pub fn goal_for(&self, end: Vec2) -> GoalTree {
        let mut legs: Vec<GoalTree> = self
            .waypoints
            .iter()
            .map(|w| GoalTree::Leaf((*w).into()))
            .collect();
        legs.push(GoalTree::Leaf(end.into()));
        GoalTree::And(legs)
    }
}

impl Default for AndOr {
    fn default() -> Self {
        Self::new(90.0)
    }
}

impl PathStrategy for AndOr {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AndOr
    }

    fn replan_angle(&self) -> f32 {
        self.replan_angle
    }

    fn plan(&mut self, request: &PlanRequest, env: &mut PlanEnv<'_>) -> PlanOutcome {
        let mut nav = env.navigation.nav_for(request.probe, request.start, request.end);
        // Every leg's endpoints must be spliced in as graph nodes.
        let mut from = request.start;
        for waypoint in self.waypoints.iter().copied().chain(std::iter::once(request.end)) {
            if !self.waypoints.is_empty() {
                merge_into(&mut nav, env.navigation.nav_for(request.probe, from, waypoint));
            }
            from = waypoint;
        }

        let start = NavPoint::from(request.start);
        let goal = self.goal_for(request.end);
        match and_or_route(&nav, start, &goal, &FxHashSet::default()) {
            Some(route) => {
                let path: Vec<Vec2> = route
                    .into_iter()
                    .rev()
                    .filter(|p| *p != start)
                    .map(NavPoint::to_vec2)
                    .collect();
                if path.is_empty() {
                    PlanOutcome::NotFound
                } else {
                    PlanOutcome::Found(path)
                }
            }
            None => PlanOutcome::NotFound,
        }
    }
}
