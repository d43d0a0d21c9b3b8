//! Ground truth: where the hazards really are.
//!
//! The engine never looks at a [`Minefield`]. The game driver consults it
//! through the [`Oracle`] trait and feeds the answers to
//! [`Agent::observe`](crate::agent::Agent::observe).

use std::collections::BTreeSet;

use rand::Rng;

use crate::cell::{Cell, Grid};
use crate::error::FieldError;

/// The environment's side of an observation.
pub trait Oracle {
    fn grid(&self) -> Grid;

    /// Hazards among the 8-neighbours of `cell`, not counting `cell`.
    fn hazard_count_at(&self, cell: Cell) -> usize;

    fn is_hazard(&self, cell: Cell) -> bool;
}

/// A grid with a fixed hazard layout and the set of cells flagged so far.
#[derive(Debug, Clone)]
pub struct Minefield {
    grid: Grid,
    hazards: BTreeSet<Cell>,
    flagged: BTreeSet<Cell>,
}

impl Minefield {
    /// Place exactly `hazards` hazards uniformly at random.
    pub fn random(grid: Grid, hazards: usize, rng: &mut impl Rng) -> Result<Self, FieldError> {
        if hazards > grid.len() {
            return Err(FieldError::TooManyHazards {
                hazards,
                cells: grid.len(),
            });
        }
        let width = grid.width();
        let placed = rand::seq::index::sample(rng, grid.len(), hazards)
            .into_iter()
            .map(|i| Cell::new(i / width, i % width))
            .collect();
        Ok(Self {
            grid,
            hazards: placed,
            flagged: BTreeSet::new(),
        })
    }

    /// Use an explicit hazard layout.
    pub fn with_hazards(
        grid: Grid,
        hazards: impl IntoIterator<Item = Cell>,
    ) -> Result<Self, FieldError> {
        let hazards: BTreeSet<Cell> = hazards.into_iter().collect();
        if let Some(&cell) = hazards.iter().find(|&&c| !grid.contains(c)) {
            return Err(FieldError::HazardOutOfBounds {
                cell,
                height: grid.height(),
                width: grid.width(),
            });
        }
        Ok(Self {
            grid,
            hazards,
            flagged: BTreeSet::new(),
        })
    }

    pub fn hazards(&self) -> &BTreeSet<Cell> {
        &self.hazards
    }

    pub fn flagged(&self) -> &BTreeSet<Cell> {
        &self.flagged
    }

    /// Mark a cell as believed hazardous. Out-of-grid cells are ignored.
    pub fn flag(&mut self, cell: Cell) {
        if self.grid.contains(cell) {
            self.flagged.insert(cell);
        }
    }

    /// Every hazard has been flagged, and nothing else.
    pub fn won(&self) -> bool {
        self.flagged == self.hazards
    }

    /// Every non-hazard cell appears in `opened`.
    pub fn cleared(&self, opened: &BTreeSet<Cell>) -> bool {
        self.grid
            .cells()
            .filter(|c| !self.hazards.contains(c))
            .all(|c| opened.contains(&c))
    }
}

impl Oracle for Minefield {
    fn grid(&self) -> Grid {
        self.grid
    }

    fn hazard_count_at(&self, cell: Cell) -> usize {
        self.grid
            .neighbours(cell)
            .filter(|c| self.hazards.contains(c))
            .count()
    }

    fn is_hazard(&self, cell: Cell) -> bool {
        self.hazards.contains(&cell)
    }
}

impl std::fmt::Display for Minefield {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "--".repeat(self.grid.width()) + "-";
        for row in 0..self.grid.height() {
            writeln!(f, "{rule}")?;
            for col in 0..self.grid.width() {
                let mark = if self.hazards.contains(&Cell::new(row, col)) {
                    'X'
                } else {
                    ' '
                };
                write!(f, "|{mark}")?;
            }
            writeln!(f, "|")?;
        }
        write!(f, "{rule}")
    }
}
