//! Grid coordinates and bounds.
//!
//! A [`Cell`] is a plain `(row, col)` value. A [`Grid`] knows its height and
//! width and answers the two geometric questions the engine asks: which
//! cells surround a given cell, and which cells exist at all.

use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// A grid position, ordered row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Immutable grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Grid {
    height: usize,
    width: usize,
}

impl Grid {
    /// Create a grid. Both dimensions must be non-zero and their product
    /// must fit in a `usize`.
    pub fn new(height: usize, width: usize) -> Result<Self, ContractError> {
        if height == 0 || width == 0 {
            return Err(ContractError::EmptyGrid { height, width });
        }
        if height.checked_mul(width).is_none() {
            return Err(ContractError::GridTooLarge { height, width });
        }
        Ok(Self { height, width })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    /// Always false; an empty grid cannot be constructed.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Fail with [`ContractError::OutOfBounds`] unless `cell` is on the grid.
    pub fn check(&self, cell: Cell) -> Result<(), ContractError> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(ContractError::OutOfBounds {
                cell,
                height: self.height,
                width: self.width,
            })
        }
    }

    /// The in-bounds 8-connected neighbours of `cell`, excluding `cell` itself.
    pub fn neighbours(&self, cell: Cell) -> impl Iterator<Item = Cell> + use<> {
        let (height, width) = (self.height, self.width);
        let rows = cell.row.saturating_sub(1)..=(cell.row + 1).min(height - 1);
        rows.flat_map(move |row| {
            let cols = cell.col.saturating_sub(1)..=(cell.col + 1).min(width - 1);
            cols.map(move |col| Cell::new(row, col))
        })
        .filter(move |&c| c != cell)
    }

    /// Every cell of the grid in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Cell::new(row, col)))
    }
}
