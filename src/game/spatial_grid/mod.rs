use bevy::math::{IVec2, Rect};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::game::actor::ActorId;

mod grid;
mod query;

pub use query::Neighbor;

/// Default cell edge length in world units.
pub const CELL_SIZE: f32 = 32.0;

/// Stable handle for anything stored in the grid.
///
/// Static geometry is addressed by its index in the level's obstacle list,
/// dynamic actors by their arena id. Removal matches on this handle, never on
/// rectangle values, so two equal rectangles can never be confused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    Obstacle(u32),
    Actor(ActorId),
}

impl Occupant {
    pub fn owner(self) -> Option<ActorId> {
        match self {
            Occupant::Obstacle(_) => None,
            Occupant::Actor(id) => Some(id),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("occupant {0:?} is already in the spatial grid")]
    AlreadyInserted(Occupant),
    #[error("occupant {0:?} was never inserted into the spatial grid")]
    NotInserted(Occupant),
}

/// Uniform hash grid used for broad-phase collision and neighbor queries.
///
/// Cells are keyed by `(floor(x / cell), floor(y / cell))` and the grid is
/// unbounded. Each occupant remembers the rectangle it was inserted with, so
/// removal recomputes exactly the same cell set as insertion.
///
/// # Example
///
/// ```rust
/// use bevy::math::{IVec2, Rect, Vec2};
/// use survival::game::spatial_grid::{Occupant, SpatialGrid};
///
/// let mut grid = SpatialGrid::new(32.0);
/// let wall = Occupant::Obstacle(0);
/// grid.insert(wall, Rect::from_center_size(Vec2::splat(16.0), Vec2::splat(10.0))).unwrap();
/// assert_eq!(grid.cells_of(wall), vec![IVec2::new(0, 0)]);
///
/// let found: Vec<_> = grid.query_neighbors(Vec2::new(40.0, 40.0)).collect();
/// assert_eq!(found.len(), 1);
/// assert!(found[0].owner.is_none());
/// ```
///
/// # Performance
///
/// - **Insert/Remove:** O(c) where c = cells covered by the rectangle (1 for small actors)
/// - **Query:** O(k) over the occupants of the 3x3 neighborhood
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: FxHashMap<IVec2, SmallVec<[Occupant; 4]>>,
    occupants: FxHashMap<Occupant, Rect>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(CELL_SIZE)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: FxHashMap::default(),
            occupants: FxHashMap::default(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub fn contains(&self, occupant: Occupant) -> bool {
        self.occupants.contains_key(&occupant)
    }

    /// Rectangle an occupant was inserted with.
    pub fn rect_of(&self, occupant: Occupant) -> Option<Rect> {
        self.occupants.get(&occupant).copied()
    }

    /// Total occupant references across all cells.
    /// Useful for debugging and diagnostics.
    pub fn total_entries(&self) -> usize {
        self.cells.values().map(|cell| cell.len()).sum()
    }

    /// Number of cells currently holding at least one occupant.
    pub fn non_empty_cells(&self) -> usize {
        self.cells.len()
    }
}
