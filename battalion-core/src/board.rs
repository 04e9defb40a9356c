//! Square board geometry: cells, neighbours and cell sets

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A board cell in (column, row) coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i16,
    pub y: i16,
}

impl Cell {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Orthogonal neighbours, N, E, S, W. May fall outside the board.
    pub fn neighbors(&self) -> [Cell; 4] {
        DIRECTIONS.map(|(dx, dy)| Cell::new(self.x + dx, self.y + dy))
    }

    /// Manhattan distance
    pub fn distance_to(&self, other: Cell) -> i16 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn is_neighbor(&self, other: Cell) -> bool {
        self.distance_to(other) == 1
    }

    /// Check if this cell is inside a `width` x `height` board
    pub fn in_bounds(&self, width: usize, height: usize) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as usize) < width && (self.y as usize) < height
    }

    /// Row-major index. Caller guarantees the cell is in bounds.
    pub fn index(&self, width: usize) -> usize {
        self.y as usize * width + self.x as usize
    }

    pub fn from_index(index: usize, width: usize) -> Cell {
        Cell::new((index % width) as i16, (index / width) as i16)
    }
}

/// Row-major order, matching `iter_cells`
impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction vectors (dx, dy)
/// Index: 0=N, 1=E, 2=S, 3=W
pub const DIRECTIONS: [(i16, i16); 4] = [
    (0, -1), // N
    (1, 0),  // E
    (0, 1),  // S
    (-1, 0), // W
];

/// Iterate all cells of a board in row-major order
pub fn iter_cells(width: usize, height: usize) -> impl Iterator<Item = Cell> {
    (0..width * height).map(move |i| Cell::from_index(i, width))
}

// ============================================================================
// BITMAP
// ============================================================================

/// A set of board cells
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bitmap {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Bitmap {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn from_predicate(width: usize, height: usize, pred: impl FnMut(Cell) -> bool) -> Self {
        let bits = iter_cells(width, height).map(pred).collect();
        Self { width, height, bits }
    }

    /// Out-of-board cells are never contained
    pub fn contains(&self, cell: Cell) -> bool {
        cell.in_bounds(self.width, self.height) && self.bits[cell.index(self.width)]
    }

    pub fn insert(&mut self, cell: Cell) {
        if cell.in_bounds(self.width, self.height) {
            self.bits[cell.index(self.width)] = true;
        }
    }

    /// In-place union with a bitmap of the same dimensions
    pub fn union_with(&mut self, other: &Bitmap) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        for (bit, &o) in self.bits.iter_mut().zip(&other.bits) {
            *bit |= o;
        }
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| Cell::from_index(i, self.width))
    }

    pub fn len(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_bounds() {
        assert!(Cell::new(0, 0).in_bounds(3, 3));
        assert!(Cell::new(2, 2).in_bounds(3, 3));
        assert!(!Cell::new(3, 0).in_bounds(3, 3));
        assert!(!Cell::new(0, -1).in_bounds(3, 3));
    }

    #[test]
    fn test_neighbors_and_distance() {
        let c = Cell::new(1, 1);
        let n = c.neighbors();
        assert_eq!(n[0], Cell::new(1, 0));
        assert_eq!(n[1], Cell::new(2, 1));
        assert!(n.iter().all(|&m| c.is_neighbor(m)));
        assert_eq!(Cell::new(0, 0).distance_to(Cell::new(2, 3)), 5);
    }

    #[test]
    fn test_index_roundtrip() {
        for cell in iter_cells(4, 3) {
            assert_eq!(Cell::from_index(cell.index(4), 4), cell);
        }
    }

    #[test]
    fn test_bitmap() {
        let mut a = Bitmap::from_predicate(3, 3, |c| c.x == 0);
        assert_eq!(a.len(), 3);
        assert!(a.contains(Cell::new(0, 2)));
        assert!(!a.contains(Cell::new(-1, 0)));

        let b = Bitmap::from_predicate(3, 3, |c| c == Cell::new(2, 2));
        a.union_with(&b);
        assert_eq!(a.len(), 4);
        assert_eq!(a.cells().last(), Some(Cell::new(2, 2)));
        assert!(Bitmap::empty(2, 2).is_empty());
    }
}
