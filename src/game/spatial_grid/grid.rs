use bevy::log::debug;
use bevy::math::{IVec2, Rect, Vec2};
use smallvec::SmallVec;

use super::{GridError, Occupant, SpatialGrid};

impl SpatialGrid {
    pub fn cell_of(&self, point: Vec2) -> IVec2 {
        IVec2::new(
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    /// Every cell a rectangle occupies.
    ///
    /// # Multi-Cell Storage
    ///
    /// A rectangle smaller than a cell on both axes lives only in the cell of
    /// its center. Anything larger is stored in every cell it overlaps; far
    /// edges are rounded up first so an edge that ends inside a cell still
    /// claims it, while an edge landing exactly on a boundary does not spill
    /// into the next one.
    ///
    /// # Example
    ///
    /// - 10x10 centered at (16, 16), cell 32: `[(0, 0)]`
    /// - 40x10 centered at (16, 16), cell 32: `[(-1, 0), (0, 0), (1, 0)]`
    pub fn cells_for(&self, rect: Rect) -> SmallVec<[IVec2; 4]> {
        let size = rect.size();
        if size.x < self.cell_size && size.y < self.cell_size {
            return SmallVec::from_elem(self.cell_of(rect.center()), 1);
        }

        let min = self.cell_of(rect.min);
        let max = self.cell_of(Vec2::new(rect.max.x.ceil() - 1.0, rect.max.y.ceil() - 1.0));

        let mut cells = SmallVec::new();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                cells.push(IVec2::new(x, y));
            }
        }
        cells
    }

    /// Cells currently holding `occupant`, in insertion order.
    pub fn cells_of(&self, occupant: Occupant) -> Vec<IVec2> {
        match self.occupants.get(&occupant) {
            Some(rect) => self.cells_for(*rect).into_vec(),
            None => Vec::new(),
        }
    }

    /// Insert an occupant with its bounding rectangle.
    ///
    /// Inserting the same handle twice is a programming error.
    pub fn insert(&mut self, occupant: Occupant, rect: Rect) -> Result<(), GridError> {
        if self.occupants.contains_key(&occupant) {
            return Err(GridError::AlreadyInserted(occupant));
        }
        for cell in self.cells_for(rect) {
            self.cells.entry(cell).or_default().push(occupant);
        }
        self.occupants.insert(occupant, rect);
        Ok(())
    }

    /// Remove an occupant from exactly the cells it was inserted into.
    ///
    /// The cell set is recomputed from the stored rectangle, never from the
    /// caller's current idea of where the occupant is.
    pub fn remove(&mut self, occupant: Occupant) -> Result<Rect, GridError> {
        let rect = self
            .occupants
            .remove(&occupant)
            .ok_or(GridError::NotInserted(occupant))?;

        for cell in self.cells_for(rect) {
            let now_empty = match self.cells.get_mut(&cell) {
                Some(list) => {
                    if let Some(pos) = list.iter().position(|o| *o == occupant) {
                        list.remove(pos);
                    } else {
                        debug!("[GRID] {:?} missing from cell {:?} during removal", occupant, cell);
                    }
                    list.is_empty()
                }
                None => false,
            };
            // Drop empty cells so a round trip leaves no residue.
            if now_empty {
                self.cells.remove(&cell);
            }
        }
        Ok(rect)
    }

    /// Remove then reinsert with a new rectangle.
    pub fn relocate(&mut self, occupant: Occupant, rect: Rect) -> Result<(), GridError> {
        self.remove(occupant)?;
        self.insert(occupant, rect)
    }
}
