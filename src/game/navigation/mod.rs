use bevy::log::info;
use bevy::math::{Rect, Vec2};
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::game::geometry::{inflate, ray_intersects, Corner, NavPoint};

mod query;

/// Node-to-neighbors map produced for one probe size.
pub type NavAdjacency = FxHashMap<NavPoint, Vec<NavPoint>>;

type ProbeKey = (OrderedFloat<f32>, OrderedFloat<f32>);

/// Margin added around obstacle corners so anchors never sit exactly on geometry.
pub const ANCHOR_INFLATE: f32 = 0.5;

/// A navigation node: a point next to an obstacle corner, plus the corner of a
/// probe rectangle that should be placed on it so the probe grazes the obstacle
/// from outside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub point: Vec2,
    pub corner: Corner,
}

/// Visibility graph over the inflated corners of static obstacles.
///
/// Built once per level. Per-probe adjacencies (which also account for the
/// footprint of the moving actor) are computed lazily and cached forever,
/// since the obstacle set never changes during a session.
///
/// # Performance
///
/// - **Build:** O(A² · O) where A = anchors (4 per obstacle), O = obstacles
/// - **First query per probe size:** O(A · L · O), L = average links per anchor
/// - **Later queries:** clone of the cached adjacency plus O(A · O) for splicing
pub struct NavigationGraph {
    obstacles: Vec<Rect>,
    anchors: Vec<Anchor>,
    links: Vec<Vec<usize>>,
    cache: FxHashMap<ProbeKey, NavAdjacency>,
}

impl NavigationGraph {
    pub fn new(obstacles: Vec<Rect>) -> Self {
        let anchors: Vec<Anchor> = obstacles.iter().flat_map(|rect| anchors_of(*rect)).collect();

        let mut links = vec![Vec::new(); anchors.len()];
        let mut link_count = 0;
        for i in 0..anchors.len() {
            for j in (i + 1)..anchors.len() {
                if !ray_intersects(anchors[i].point, anchors[j].point, &obstacles) {
                    links[i].push(j);
                    links[j].push(i);
                    link_count += 1;
                }
            }
        }

        info!(
            "[NAV] Visibility graph built: {} obstacles, {} anchors, {} links",
            obstacles.len(),
            anchors.len(),
            link_count
        );

        Self {
            obstacles,
            anchors,
            links,
            cache: FxHashMap::default(),
        }
    }

    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Indices of anchors visible from anchor `idx`.
    pub fn links(&self, idx: usize) -> &[usize] {
        self.links.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of probe sizes with a cached adjacency.
    pub fn cached_probes(&self) -> usize {
        self.cache.len()
    }
}

impl Default for NavigationGraph {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Four anchors per obstacle, each tagged with the corner opposite to the one it
/// was taken from.
fn anchors_of(obstacle: Rect) -> [Anchor; 4] {
    let grown = inflate(obstacle, ANCHOR_INFLATE, ANCHOR_INFLATE);
    Corner::ALL.map(|corner| Anchor {
        point: corner.of(grown),
        corner: corner.opposite(),
    })
}
