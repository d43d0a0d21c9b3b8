// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # sapper
//!
//! A knowledge-base inference engine that deduces, from partial
//! observations on a grid, which cells are certainly safe and which
//! certainly hold a hazard.
//!
//! ## Architecture
//!
//! - **Sentences** (`sentence`): "exactly `n` of these cells are hazards"
//! - **Knowledge base** (`knowledge`): sentence arena plus classified cells
//! - **Closure** (`closure`): pairwise subset reduction run to a fixpoint
//! - **Agent** (`agent`): observations in, certain and fallback moves out
//! - **Environment** (`field`, `game`): ground truth and the driving loop
//!
//! ## Library usage
//!
//! ```
//! use sapper::agent::Agent;
//! use sapper::cell::{Cell, Grid};
//! use sapper::select::FirstCandidate;
//!
//! let mut agent = Agent::new(Grid::new(3, 3).unwrap());
//! agent.observe(Cell::new(2, 2), 0).unwrap();
//! agent.observe(Cell::new(1, 2), 0).unwrap();
//! agent.observe(Cell::new(2, 1), 0).unwrap();
//! agent.observe(Cell::new(1, 1), 1).unwrap();
//! assert!(agent.known_hazards().contains(&Cell::new(0, 0)));
//! assert!(agent.safe_move(&mut FirstCandidate).is_some());
//! ```

pub mod agent;
pub mod cell;
pub mod closure;
pub mod config;
pub mod error;
pub mod field;
pub mod game;
pub mod knowledge;
pub mod select;
pub mod sentence;
