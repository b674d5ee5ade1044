use core::ops::{Index, IndexMut};
use hashbrown::HashSet;
use ndarray::Array2;
use smallvec::SmallVec;
use web_time::Instant;

use crate::*;

/// Non-invisible neighbors of a cell, at most eight.
pub type ActiveNeighbors = SmallVec<[Coord2; 8]>;

/// Square board of dots, stored row-major and addressed by `(row, col)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    cells: Array2<Cell>,
}

impl Grid {
    pub fn new(len: Coord, now: Instant) -> Self {
        let size = usize::from(len);
        let cells = Array2::from_shape_fn((size, size), |(row, col)| {
            // both fit in Coord since they are bounded by len
            let coords = (row as Coord, col as Coord);
            Cell::new(linear_index(coords, len) as CellCount + 1, coords, now)
        });
        Self { cells }
    }

    /// Number of cells along one side.
    pub fn len(&self) -> Coord {
        self.cells.nrows().try_into().unwrap_or(Coord::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell_count(&self) -> CellCount {
        mult(self.len(), self.len())
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let len = self.len();
        if coords.0 < len && coords.1 < len {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn get(&self, coords: Coord2) -> Option<&Cell> {
        self.cells.get(coords.to_nd_index())
    }

    /// Lookup by 0-based row-major index.
    pub fn at_index(&self, index: usize) -> Option<&Cell> {
        let len = usize::from(self.len());
        if len == 0 {
            return None;
        }
        self.cells.get([index / len, index % len])
    }

    pub fn index_of(&self, coords: Coord2) -> usize {
        linear_index(coords, self.len())
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    /// The eight compass neighbors of `coords`, N first and clockwise, `None` off the board.
    pub fn neighbors(&self, coords: Coord2) -> [Option<&Cell>; 8] {
        let len = self.len();
        neighbor_slots(coords, (len, len)).map(|slot| slot.map(|pos| &self[pos]))
    }

    pub fn active_neighbors(&self, coords: Coord2) -> ActiveNeighbors {
        self.iter_neighbors(coords)
            .filter(|&pos| self[pos].state().is_active())
            .collect()
    }

    /// Size of the 8-connected group of non-invisible cells containing `seed`.
    ///
    /// # Panics
    ///
    /// Panics if `seed` itself is invisible, since it then belongs to no cluster.
    pub fn cluster_size_from(&self, seed: Coord2) -> usize {
        assert!(
            self[seed].state().is_active(),
            "cluster seed {seed:?} is invisible"
        );

        let mut visited: HashSet<Coord2> = HashSet::new();
        let mut stack = vec![seed];

        while let Some(coords) = stack.pop() {
            if !visited.insert(coords) {
                continue;
            }
            stack.extend(
                self.active_neighbors(coords)
                    .into_iter()
                    .filter(|pos| !visited.contains(pos)),
            );
        }

        visited.len()
    }

    pub(crate) fn apply_layout(&mut self, layout: &Layout) {
        for cell in self.cells.iter_mut() {
            let center = layout.center_of(cell.coords());
            cell.set_center(center);
        }
    }
}

impl Index<Coord2> for Grid {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

impl IndexMut<Coord2> for Grid {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        &mut self.cells[coords.to_nd_index()]
    }
}

const fn linear_index((row, col): Coord2, len: Coord) -> usize {
    row as usize * len as usize + col as usize
}
