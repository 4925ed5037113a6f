use bevy::math::{IVec2, Rect, Vec2};
use rustc_hash::FxHashSet;

use super::{Occupant, SpatialGrid};
use crate::game::actor::ActorId;

/// One result of a neighborhood query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub rect: Rect,
    pub occupant: Occupant,
    /// `None` for static geometry.
    pub owner: Option<ActorId>,
}

impl SpatialGrid {
    /// Every occupant stored in the 3x3 cell block around `point`.
    ///
    /// Occupants spanning several cells are reported once.
    pub fn query_neighbors(&self, point: Vec2) -> impl Iterator<Item = Neighbor> + '_ {
        let center = self.cell_of(point);
        let mut seen: FxHashSet<Occupant> = FxHashSet::default();

        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| center + IVec2::new(dx, dy)))
            .filter_map(move |cell| self.cells.get(&cell))
            .flat_map(|list| list.iter().copied())
            .filter(move |occupant| seen.insert(*occupant))
            .filter_map(move |occupant| {
                self.occupants.get(&occupant).map(|rect| Neighbor {
                    rect: *rect,
                    occupant,
                    owner: occupant.owner(),
                })
            })
    }
}
