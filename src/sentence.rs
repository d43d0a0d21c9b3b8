//! Sentences: "exactly `count` of these cells are hazards".
//!
//! A [`Sentence`] is the only kind of constraint the knowledge base stores.
//! Its operations are local; none of them looks at any other sentence.

use std::collections::BTreeSet;

use crate::cell::Cell;
use crate::error::ConsistencyError;

/// A constraint stating that exactly `count` of `cells` are hazards.
///
/// Invariant: `count <= cells.len()`. Every constructor and mutator checks it
/// and reports a [`ConsistencyError`] rather than storing a broken sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sentence {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Sentence {
    /// Build a sentence, rejecting counts larger than the cell set.
    pub fn new(
        cells: impl IntoIterator<Item = Cell>,
        count: usize,
    ) -> Result<Self, ConsistencyError> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if count > cells.len() {
            return Err(ConsistencyError::CountExceedsCells {
                count,
                cells: cells.len(),
            });
        }
        Ok(Self { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// An empty sentence carries no information.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// All cells, if every remaining cell must be a hazard.
    pub fn known_hazards(&self) -> BTreeSet<Cell> {
        if self.count == self.cells.len() {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// All cells, if none of them can be a hazard.
    pub fn known_safe(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Remove a cell now known to be a hazard, decrementing the count.
    ///
    /// Returns whether the cell was a member.
    pub fn resolve_as_hazard(&mut self, cell: Cell) -> Result<bool, ConsistencyError> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == 0 {
            return Err(ConsistencyError::NegativeCount { cell });
        }
        self.cells.remove(&cell);
        self.count -= 1;
        Ok(true)
    }

    /// Remove a cell now known to be safe. The count is unchanged.
    ///
    /// Returns whether the cell was a member.
    pub fn resolve_as_safe(&mut self, cell: Cell) -> Result<bool, ConsistencyError> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == self.cells.len() {
            return Err(ConsistencyError::CountExceedsCells {
                count: self.count,
                cells: self.cells.len() - 1,
            });
        }
        self.cells.remove(&cell);
        Ok(true)
    }

    /// Subtract a sentence whose cells are a subset of ours.
    ///
    /// `{A ∪ B} = n` and `{A} = m` together give `{B} = n - m`. Returns
    /// `None` when `subset` is not contained in `self`, or when the difference
    /// is the empty sentence with count zero.
    pub fn reduce_by(&self, subset: &Sentence) -> Result<Option<Sentence>, ConsistencyError> {
        if !subset.cells.is_subset(&self.cells) {
            return Ok(None);
        }
        let cells: BTreeSet<Cell> = self.cells.difference(&subset.cells).copied().collect();
        let Some(count) = self.count.checked_sub(subset.count) else {
            return Err(ConsistencyError::SubsetOvercount {
                subset: subset.count,
                superset: self.count,
            });
        };
        if cells.is_empty() && count == 0 {
            return Ok(None);
        }
        Sentence::new(cells, count).map(Some)
    }
}

impl std::fmt::Display for Sentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cell}")?;
        }
        write!(f, "}} = {}", self.count)
    }
}
