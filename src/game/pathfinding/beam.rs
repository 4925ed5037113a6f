use rustc_hash::FxHashMap;

use super::bfs::walk_parents;
use super::types::{route_to_path, PathStrategy, PlanEnv, PlanOutcome, PlanRequest, StrategyKind};
use crate::game::geometry::NavPoint;
use crate::game::navigation::NavAdjacency;

pub const DEFAULT_BEAM_WIDTH: usize = 6;
pub const DEFAULT_BEAM_DEPTH: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct BeamResult {
    /// Route `[start, ..., end]` when the goal entered a beam in time.
    pub route: Option<Vec<NavPoint>>,
    /// Beam nodes expanded, at most `width * depth`.
    pub expansions: usize,
}

/// Greedy search keeping only the `width` candidates closest to `end` per level.
///
/// A node discovered once is never rediscovered, even when it was pruned from
/// the beam. The goal counts as reached only when it is part of a beam being
/// expanded, so it must surface within `depth` levels.
pub fn beam_route(nav: &NavAdjacency, start: NavPoint, end: NavPoint, width: usize, depth: usize) -> BeamResult {
    let mut beam = vec![start];
    let mut came_from: FxHashMap<NavPoint, Option<NavPoint>> = FxHashMap::default();
    came_from.insert(start, None);
    let mut expansions = 0;

    for _ in 0..depth {
        if beam.is_empty() {
            break;
        }
        let mut candidates: Vec<(f32, NavPoint)> = Vec::new();
        for &point in &beam {
            expansions += 1;
            if point == end {
                return BeamResult {
                    route: Some(walk_parents(&came_from, end)),
                    expansions,
                };
            }
            for &neighbor in nav.get(&point).map(Vec::as_slice).unwrap_or(&[]) {
                if !came_from.contains_key(&neighbor) {
                    came_from.insert(neighbor, Some(point));
                    candidates.push((neighbor.distance(end), neighbor));
                }
            }
        }
        // Stable sort: equally scored candidates keep discovery order.
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.truncate(width);
        beam = candidates.into_iter().map(|(_, point)| point).collect();
    }

    BeamResult {
        route: None,
        expansions,
    }
}

/// Beam search over the probe's navigation adjacency.
///
/// Running out of depth does not clear the current path: the outcome is
/// [`PlanOutcome::Exhausted`], which drops only the next waypoint of the old
/// path.
#[derive(Clone, Debug)]
pub struct Local {
    replan_angle: f32,
    width: usize,
    depth: usize,
}

impl Local {
    pub fn new(replan_angle: f32, width: usize, depth: usize) -> Self {
        Self {
            replan_angle,
            width,
            depth,
        }
    }
}

impl Default for Local {
    fn default() -> Self {
        Self::new(80.0, DEFAULT_BEAM_WIDTH, DEFAULT_BEAM_DEPTH)
    }
}

impl PathStrategy for Local {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Local
    }

    fn replan_angle(&self) -> f32 {
        self.replan_angle
    }

    fn plan(&mut self, request: &PlanRequest, env: &mut PlanEnv<'_>) -> PlanOutcome {
        let nav = env.navigation.nav_for(request.probe, request.start, request.end);
        let result = beam_route(&nav, request.start.into(), request.end.into(), self.width, self.depth);
        match result.route {
            Some(route) => PlanOutcome::Found(route_to_path(route)),
            None => PlanOutcome::Exhausted,
        }
    }
}
