//! Diagnostic error types for the sapper engine.
//!
//! Errors fall into two families that callers must treat differently:
//! [`ContractError`] means the caller broke a precondition and should not
//! retry the same call, while [`ConsistencyError`] means an engine invariant
//! broke and the knowledge base can no longer be trusted to make progress.
//! Running out of moves is not an error at all; the move queries return `None`.

use miette::Diagnostic;
use thiserror::Error;

use crate::cell::Cell;

/// Top-level error type for the sapper engine.
#[derive(Debug, Error, Diagnostic)]
pub enum SapperError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl SapperError {
    /// Whether this error reports a broken engine invariant.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

// ---------------------------------------------------------------------------
// Caller-contract errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ContractError {
    #[error("cell {cell} lies outside the {height}x{width} grid")]
    #[diagnostic(
        code(sapper::contract::out_of_bounds),
        help("Observations must name a cell with row < height and col < width.")
    )]
    OutOfBounds {
        cell: Cell,
        height: usize,
        width: usize,
    },

    #[error("cell {cell} has already been observed")]
    #[diagnostic(
        code(sapper::contract::already_visited),
        help("Each cell is observed at most once. Ask the agent for a fresh move instead.")
    )]
    AlreadyVisited { cell: Cell },

    #[error("cell {cell} reports {count} hazards but has only {neighbours} neighbours")]
    #[diagnostic(
        code(sapper::contract::count_exceeds_neighbours),
        help("The hazard count of an observation cannot exceed the size of its neighbourhood.")
    )]
    CountExceedsNeighbours {
        cell: Cell,
        count: usize,
        neighbours: usize,
    },

    #[error("grid dimensions {height}x{width} are empty")]
    #[diagnostic(
        code(sapper::contract::empty_grid),
        help("Both height and width must be at least 1.")
    )]
    EmptyGrid { height: usize, width: usize },

    #[error("grid dimensions {height}x{width} overflow the cell count")]
    #[diagnostic(
        code(sapper::contract::grid_too_large),
        help("height * width must fit in a usize.")
    )]
    GridTooLarge { height: usize, width: usize },
}

// ---------------------------------------------------------------------------
// Internal-consistency errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("resolving {cell} as a hazard would drive a sentence count below zero")]
    #[diagnostic(
        code(sapper::consistency::negative_count),
        help(
            "A sentence with count 0 claimed the cell was safe, yet it was classified \
             as a hazard. The observations contradict each other or the engine has a bug."
        )
    )]
    NegativeCount { cell: Cell },

    #[error("sentence claims {count} hazards among only {cells} cells")]
    #[diagnostic(
        code(sapper::consistency::count_exceeds_cells),
        help(
            "Every sentence must satisfy count <= |cells|. The observations contradict \
             each other or the engine has a bug."
        )
    )]
    CountExceedsCells { count: usize, cells: usize },

    #[error("subset sentence claims {subset} hazards but its superset claims only {superset}")]
    #[diagnostic(
        code(sapper::consistency::subset_overcount),
        help("A subset can never hold more hazards than a set that contains it.")
    )]
    SubsetOvercount { subset: usize, superset: usize },

    #[error("observation at {cell} reports {count} hazards but {known} neighbours are known hazards")]
    #[diagnostic(
        code(sapper::consistency::observation_conflict),
        help("The oracle disagrees with facts the engine derived earlier.")
    )]
    ObservationConflict {
        cell: Cell,
        count: usize,
        known: usize,
    },

    #[error(
        "observation at {cell} needs {remaining} more hazards but only {unknown} neighbours are unclassified"
    )]
    #[diagnostic(
        code(sapper::consistency::observation_overcount),
        help("The oracle places hazards on cells the engine already proved safe.")
    )]
    ObservationOvercount {
        cell: Cell,
        remaining: usize,
        unknown: usize,
    },

    #[error("cell {cell} would be classified as both safe and hazard")]
    #[diagnostic(
        code(sapper::consistency::classification_conflict),
        help("Classifications are monotonic; a cell can never switch sides.")
    )]
    ClassificationConflict { cell: Cell },

    #[error("closure exceeded its iteration cap ({max_iterations})")]
    #[diagnostic(
        code(sapper::consistency::iteration_cap),
        help(
            "Closure is finite by construction. Hitting the cap means monotonicity broke, \
             or the configured max_iterations is tighter than the problem needs."
        )
    )]
    IterationCap { max_iterations: usize },
}

// ---------------------------------------------------------------------------
// Minefield errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum FieldError {
    #[error("cannot place {hazards} hazards on a grid of {cells} cells")]
    #[diagnostic(
        code(sapper::field::too_many_hazards),
        help("Choose a hazard count no larger than height * width.")
    )]
    TooManyHazards { hazards: usize, cells: usize },

    #[error("hazard {cell} lies outside the {height}x{width} grid")]
    #[diagnostic(code(sapper::field::hazard_out_of_bounds))]
    HazardOutOfBounds {
        cell: Cell,
        height: usize,
        width: usize,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    #[diagnostic(
        code(sapper::config::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(sapper::config::parse),
        help("The config file must be valid TOML with [grid] and [closure] tables.")
    )]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(sapper::config::invalid))]
    Invalid { message: String },
}

/// Convenience result type for sapper operations.
pub type SapperResult<T> = std::result::Result<T, SapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_errors_are_internal() {
        let err: SapperError = ConsistencyError::IterationCap { max_iterations: 3 }.into();
        assert!(err.is_internal());

        let err: SapperError = ContractError::AlreadyVisited {
            cell: Cell::new(0, 0),
        }
        .into();
        assert!(!err.is_internal());
    }

    #[test]
    fn messages_name_the_cell() {
        let err = ContractError::OutOfBounds {
            cell: Cell::new(3, 9),
            height: 3,
            width: 3,
        };
        assert_eq!(err.to_string(), "cell (3, 9) lies outside the 3x3 grid");
    }
}
