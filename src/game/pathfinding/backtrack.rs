use bevy::log::warn;
use bevy::math::{Rect, Vec2};

use super::types::{PathStrategy, PlanEnv, PlanOutcome, PlanRequest, StrategyKind};
use crate::game::geometry::sweep_intersects;
use crate::game::navigation::NavigationGraph;

pub const DEFAULT_BACKTRACK_BUDGET: usize = 20_000;

/// Depth-first search over probe placements.
///
/// Candidates are the goal placement plus every anchor placement, sorted by
/// distance to the goal. A chain of placements is valid when the probe can be
/// swept from each one to the next; the search stops at the first valid chain
/// ending on the goal placement.
struct PlacementSearch<'a> {
    candidates: &'a [Rect],
    goal: usize,
    collidable: &'a [Rect],
    budget: usize,
    checks: usize,
}

enum Step {
    Reached(Vec<usize>),
    DeadEnd,
    OutOfBudget,
}

impl PlacementSearch<'_> {
    fn descend(&mut self, from: Rect, picked: &mut Vec<usize>, used: &mut [bool]) -> Step {
        if picked.len() == self.candidates.len() {
            return Step::Reached(picked.clone());
        }

        for idx in 0..self.candidates.len() {
            if used[idx] {
                continue;
            }
            self.checks += 1;
            if self.checks > self.budget {
                return Step::OutOfBudget;
            }

            let to = self.candidates[idx];
            if sweep_intersects(from, to, self.collidable) {
                continue;
            }

            picked.push(idx);
            if idx == self.goal {
                return Step::Reached(picked.clone());
            }

            used[idx] = true;
            match self.descend(to, picked, used) {
                Step::DeadEnd => {}
                done => return done,
            }
            used[idx] = false;
            picked.pop();
        }
        Step::DeadEnd
    }
}

/// Backtracking constraint search over anchor placements.
#[derive(Clone, Debug)]
pub struct Backtracking {
    replan_angle: f32,
    budget: usize,
}

impl Backtracking {
    pub fn new(replan_angle: f32, budget: usize) -> Self {
        Self { replan_angle, budget }
    }

    /// Chain of placement centers from the first step to the goal, in travel order.
    pub fn solve(&self, graph: &NavigationGraph, probe: Vec2, start: Vec2, end: Vec2) -> Option<Vec<Vec2>> {
        let collidable = graph.collidable_for(probe);

        let mut candidates: Vec<Rect> = Vec::with_capacity(graph.anchors().len() + 1);
        candidates.push(Rect::from_center_size(end, probe));
        candidates.extend(
            graph
                .anchors()
                .iter()
                .map(|anchor| NavigationGraph::place_probe(probe, anchor)),
        );

        // Stable sort keeps the goal ahead of anything equally close.
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|a, b| {
            let da = end.distance(candidates[*a].center());
            let db = end.distance(candidates[*b].center());
            da.total_cmp(&db)
        });
        let sorted: Vec<Rect> = order.iter().map(|&i| candidates[i]).collect();
        let goal = order.iter().position(|&i| i == 0).unwrap_or(0);

        let mut search = PlacementSearch {
            candidates: &sorted,
            goal,
            collidable: &collidable,
            budget: self.budget,
            checks: 0,
        };
        let mut used = vec![false; sorted.len()];
        let mut picked = Vec::new();

        match search.descend(Rect::from_center_size(start, probe), &mut picked, &mut used) {
            Step::Reached(chain) => Some(chain.into_iter().map(|i| sorted[i].center()).collect()),
            Step::DeadEnd => None,
            Step::OutOfBudget => {
                warn!(
                    "[PATHFINDING] Backtracking gave up after {} sweep checks ({:?} -> {:?})",
                    self.budget, start, end
                );
                None
            }
        }
    }
}

impl Default for Backtracking {
    fn default() -> Self {
        Self::new(45.0, DEFAULT_BACKTRACK_BUDGET)
    }
}

impl PathStrategy for Backtracking {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Backtracking
    }

    fn replan_angle(&self) -> f32 {
        self.replan_angle
    }

    fn plan(&mut self, request: &PlanRequest, env: &mut PlanEnv<'_>) -> PlanOutcome {
        match self.solve(env.navigation, request.probe, request.start, request.end) {
            Some(chain) => PlanOutcome::Found(chain.into_iter().rev().collect()),
            None => PlanOutcome::NotFound,
        }
    }
}
