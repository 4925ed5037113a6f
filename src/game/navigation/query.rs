use bevy::log::debug;
use bevy::math::{Rect, Vec2};
use ordered_float::OrderedFloat;
use survival_macros::profile;

use super::{Anchor, NavAdjacency, NavigationGraph};
use crate::game::geometry::{collides, place_corner, sweep_intersects, NavPoint};

impl NavigationGraph {
    /// Obstacles that matter for sweeps of this probe size.
    ///
    /// Obstacles overlapping the probe laid at the origin are left out, so an
    /// actor never collides with geometry it is measured against.
    pub fn collidable_for(&self, probe: Vec2) -> Vec<Rect> {
        let origin_probe = Rect::from_corners(Vec2::ZERO, probe);
        self.obstacles
            .iter()
            .copied()
            .filter(|obstacle| !collides(*obstacle, origin_probe))
            .collect()
    }

    /// Probe rectangle aligned on an anchor.
    pub fn place_probe(probe: Vec2, anchor: &Anchor) -> Rect {
        place_corner(probe, anchor.corner, anchor.point)
    }

    /// Adjacency for `probe` between `start` and `end`.
    ///
    /// The anchor-to-anchor part is cached per probe size; `start` and `end`
    /// are spliced into a fresh copy each call.
    #[profile(2)]
    pub fn nav_for(&mut self, probe: Vec2, start: Vec2, end: Vec2) -> NavAdjacency {
        let collidable = self.collidable_for(probe);
        let mut nav = self.adjacency_for(probe, &collidable).clone();

        let start_key = NavPoint::from(start);
        let end_key = NavPoint::from(end);
        let start_box = Rect::from_center_size(start, probe);
        let end_box = Rect::from_center_size(end, probe);

        if !nav.contains_key(&start_key) {
            let neighbors = self
                .anchors
                .iter()
                .map(|anchor| Self::place_probe(probe, anchor))
                .filter(|placed| !sweep_intersects(start_box, *placed, &collidable))
                .map(|placed| NavPoint::from(placed.center()))
                .collect();
            nav.insert(start_key, neighbors);
        }

        if !nav.contains_key(&end_key) {
            nav.insert(end_key, Vec::new());
            for anchor in &self.anchors {
                let placed = Self::place_probe(probe, anchor);
                if !sweep_intersects(end_box, placed, &collidable) {
                    // The goal goes first so searches try it before anything else.
                    nav.entry(NavPoint::from(placed.center()))
                        .or_default()
                        .insert(0, end_key);
                }
            }
        }

        if !sweep_intersects(start_box, end_box, &collidable) {
            nav.entry(start_key).or_default().push(end_key);
        }

        nav
    }

    fn adjacency_for(&mut self, probe: Vec2, collidable: &[Rect]) -> &NavAdjacency {
        let key = (OrderedFloat(probe.x), OrderedFloat(probe.y));
        if !self.cache.contains_key(&key) {
            let built = self.build_adjacency(probe, collidable);
            debug!(
                "[NAV] Cached adjacency for probe {}x{}: {} nodes",
                probe.x,
                probe.y,
                built.len()
            );
            self.cache.insert(key, built);
        }
        self.cache.entry(key).or_default()
    }

    fn build_adjacency(&self, probe: Vec2, collidable: &[Rect]) -> NavAdjacency {
        let placed: Vec<Rect> = self
            .anchors
            .iter()
            .map(|anchor| Self::place_probe(probe, anchor))
            .collect();

        let mut nav = NavAdjacency::default();
        for (idx, from) in placed.iter().enumerate() {
            let blocked = collidable.iter().any(|obstacle| collides(*from, *obstacle));
            let neighbors = if blocked {
                Vec::new()
            } else {
                self.links(idx)
                    .iter()
                    .map(|&other| placed[other])
                    .filter(|to| !sweep_intersects(*from, *to, collidable))
                    .map(|to| NavPoint::from(to.center()))
                    .collect()
            };
            nav.insert(NavPoint::from(from.center()), neighbors);
        }
        nav
    }
}
