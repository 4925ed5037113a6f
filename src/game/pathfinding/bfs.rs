use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::types::{route_to_path, PathStrategy, PlanEnv, PlanOutcome, PlanRequest, StrategyKind};
use crate::game::geometry::NavPoint;
use crate::game::navigation::NavAdjacency;

/// Fewest-hops route `[start, ..., end]`, or `None` when `end` is unreachable.
pub fn bfs_route(nav: &NavAdjacency, start: NavPoint, end: NavPoint) -> Option<Vec<NavPoint>> {
    let mut frontier = VecDeque::from([start]);
    let mut came_from: FxHashMap<NavPoint, Option<NavPoint>> = FxHashMap::default();
    came_from.insert(start, None);

    while let Some(point) = frontier.pop_front() {
        if point == end {
            return Some(walk_parents(&came_from, end));
        }
        for &neighbor in nav.get(&point).map(Vec::as_slice).unwrap_or(&[]) {
            if !came_from.contains_key(&neighbor) {
                came_from.insert(neighbor, Some(point));
                frontier.push_back(neighbor);
            }
        }
    }
    None
}

/// Follow parent links back from `end` and return the route in travel order.
pub(super) fn walk_parents(came_from: &FxHashMap<NavPoint, Option<NavPoint>>, end: NavPoint) -> Vec<NavPoint> {
    let mut route = vec![end];
    let mut node = end;
    while let Some(Some(parent)) = came_from.get(&node) {
        route.push(*parent);
        node = *parent;
    }
    route.reverse();
    route
}

/// Breadth-first search over the probe's navigation adjacency.
#[derive(Clone, Debug)]
pub struct Uninformed {
    replan_angle: f32,
}

impl Uninformed {
    pub fn new(replan_angle: f32) -> Self {
        Self { replan_angle }
    }
}

impl Default for Uninformed {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl PathStrategy for Uninformed {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Uninformed
    }

    fn replan_angle(&self) -> f32 {
        self.replan_angle
    }

    fn plan(&mut self, request: &PlanRequest, env: &mut PlanEnv<'_>) -> PlanOutcome {
        let nav = env.navigation.nav_for(request.probe, request.start, request.end);
        match bfs_route(&nav, request.start.into(), request.end.into()) {
            Some(route) => PlanOutcome::Found(route_to_path(route)),
            None => PlanOutcome::NotFound,
        }
    }
}
