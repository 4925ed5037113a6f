use std::collections::BinaryHeap;

use bevy::log::{error, warn};
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use super::bfs::walk_parents;
use super::types::{route_to_path, FrontierEntry, PathStrategy, PlanEnv, PlanOutcome, PlanRequest, StrategyKind};
use crate::game::geometry::NavPoint;
use crate::game::navigation::NavAdjacency;

/// Safety limit on heap pops. Visibility graphs are small, so hitting this
/// means something is badly wrong with the adjacency.
const MAX_ITERATIONS: usize = 50_000;

/// Cheapest route `[start, ..., end]` by Euclidean edge length.
pub fn astar_route(nav: &NavAdjacency, start: NavPoint, end: NavPoint) -> Option<Vec<NavPoint>> {
    let mut open_set = BinaryHeap::new();
    let mut seq = 0u64;
    open_set.push(FrontierEntry {
        cost: OrderedFloat(0.0),
        seq,
        node: start,
    });

    let mut came_from: FxHashMap<NavPoint, Option<NavPoint>> = FxHashMap::default();
    came_from.insert(start, None);
    let mut g_score: FxHashMap<NavPoint, f32> = FxHashMap::default();
    g_score.insert(start, 0.0);

    let mut iterations = 0usize;
    while let Some(FrontierEntry { node: current, .. }) = open_set.pop() {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            error!(
                "[PATHFINDING] A* exceeded max iterations ({}) from {:?} to {:?}",
                MAX_ITERATIONS, start, end
            );
            return None;
        }

        if current == end {
            if iterations > 1000 {
                warn!("[PATHFINDING] A* used {} iterations (high!)", iterations);
            }
            return Some(walk_parents(&came_from, end));
        }

        let current_g = g_score.get(&current).copied().unwrap_or(f32::INFINITY);
        for &neighbor in nav.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
            let tentative = current_g + current.distance(neighbor);
            if tentative < g_score.get(&neighbor).copied().unwrap_or(f32::INFINITY) {
                came_from.insert(neighbor, Some(current));
                g_score.insert(neighbor, tentative);
                seq += 1;
                open_set.push(FrontierEntry {
                    cost: OrderedFloat(tentative + neighbor.distance(end)),
                    seq,
                    node: neighbor,
                });
            }
        }
    }
    None
}

/// A* over the probe's navigation adjacency.
#[derive(Clone, Debug)]
pub struct Informed {
    replan_angle: f32,
}

impl Informed {
    pub fn new(replan_angle: f32) -> Self {
        Self { replan_angle }
    }
}

impl Default for Informed {
    fn default() -> Self {
        Self::new(45.0)
    }
}

impl PathStrategy for Informed {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Informed
    }

    fn replan_angle(&self) -> f32 {
        self.replan_angle
    }

    fn plan(&mut self, request: &PlanRequest, env: &mut PlanEnv<'_>) -> PlanOutcome {
        let nav = env.navigation.nav_for(request.probe, request.start, request.end);
        match astar_route(&nav, request.start.into(), request.end.into()) {
            Some(route) => PlanOutcome::Found(route_to_path(route)),
            None => PlanOutcome::NotFound,
        }
    }
}
