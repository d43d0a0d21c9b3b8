//! The driving loop: ask the agent for a move, open it on the field, report
//! what the field shows.
//!
//! The agent plays a certainly safe cell when it has one and otherwise
//! guesses among the cells it does not know to be hazards. Known hazards are
//! flagged on the field after every observation.

use serde::Serialize;

use crate::agent::Agent;
use crate::cell::Cell;
use crate::closure::ClosureConfig;
use crate::error::SapperResult;
use crate::field::{Minefield, Oracle};
use crate::select::MoveSelector;

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Every hazard flagged, or every safe cell opened.
    Won,
    /// A guess landed on a hazard.
    Lost { at: Cell },
    /// No candidate move remained without the game being won.
    Stalled,
}

/// Summary of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameReport {
    pub outcome: Outcome,
    /// Cells opened, including a fatal one.
    pub moves: usize,
    /// Moves taken without a certainly safe cell available.
    pub guesses: usize,
    pub known_safe: usize,
    pub known_hazards: usize,
    /// Total closure iterations across the game.
    pub closure_iterations: usize,
}

/// A field and the agent playing it.
#[derive(Debug, Clone)]
pub struct Game {
    field: Minefield,
    agent: Agent,
}

impl Game {
    pub fn new(field: Minefield) -> Self {
        Self::with_config(field, ClosureConfig::default())
    }

    pub fn with_config(field: Minefield, config: ClosureConfig) -> Self {
        let agent = Agent::with_config(field.grid(), config);
        Self { field, agent }
    }

    pub fn field(&self) -> &Minefield {
        &self.field
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Play one move. Returns the outcome once the game is over.
    pub fn step(&mut self, selector: &mut impl MoveSelector) -> SapperResult<Turn> {
        if self.is_won() {
            return Ok(Turn::Over(Outcome::Won));
        }

        let (cell, guessed) = match self.agent.safe_move(selector) {
            Some(cell) => (cell, false),
            None => match self.agent.fallback_move(selector) {
                Some(cell) => {
                    tracing::warn!(%cell, "no certain move, guessing");
                    (cell, true)
                }
                None => return Ok(Turn::Over(Outcome::Stalled)),
            },
        };

        if self.field.is_hazard(cell) {
            tracing::info!(%cell, "hit a hazard");
            return Ok(Turn::Over(Outcome::Lost { at: cell }));
        }

        let count = self.field.hazard_count_at(cell);
        let closure = self.agent.observe(cell, count)?;
        for &hazard in self.agent.known_hazards() {
            self.field.flag(hazard);
        }

        Ok(Turn::Played {
            cell,
            guessed,
            closure_iterations: closure.iterations,
        })
    }

    /// Play until the game ends.
    pub fn play(&mut self, selector: &mut impl MoveSelector) -> SapperResult<GameReport> {
        let mut moves = 0;
        let mut guesses = 0;
        let mut closure_iterations = 0;

        let outcome = loop {
            match self.step(selector)? {
                Turn::Played {
                    guessed,
                    closure_iterations: iterations,
                    ..
                } => {
                    moves += 1;
                    guesses += usize::from(guessed);
                    closure_iterations += iterations;
                }
                Turn::Over(outcome) => {
                    if matches!(outcome, Outcome::Lost { .. }) {
                        moves += 1;
                        guesses += 1;
                    }
                    break outcome;
                }
            }
        };

        tracing::info!(?outcome, moves, guesses, "game over");
        Ok(GameReport {
            outcome,
            moves,
            guesses,
            known_safe: self.agent.known_safe().len(),
            known_hazards: self.agent.known_hazards().len(),
            closure_iterations,
        })
    }

    fn is_won(&self) -> bool {
        self.field.won() || self.field.cleared(self.agent.visited())
    }
}

/// Result of a single [`Game::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Played {
        cell: Cell,
        guessed: bool,
        closure_iterations: usize,
    },
    Over(Outcome),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Grid;
    use crate::select::FirstCandidate;

    fn field(h: usize, w: usize, hazards: &[(usize, usize)]) -> Minefield {
        Minefield::with_hazards(
            Grid::new(h, w).unwrap(),
            hazards.iter().copied().map(Cell::from),
        )
        .unwrap()
    }

    #[test]
    fn corner_hazard_is_solved_without_loss() {
        // FirstCandidate opens (0,0) first, which shows a zero.
        let mut game = Game::new(field(3, 3, &[(2, 2)]));
        let report = game.play(&mut FirstCandidate).unwrap();
        assert_eq!(report.outcome, Outcome::Won);
        assert_eq!(report.guesses, 1);
        assert!(game.agent().known_hazards().contains(&Cell::new(2, 2)));
        assert!(game.field().won());
    }

    #[test]
    fn guessing_into_a_hazard_loses() {
        let mut game = Game::new(field(2, 2, &[(0, 0)]));
        let report = game.play(&mut FirstCandidate).unwrap();
        assert_eq!(
            report.outcome,
            Outcome::Lost {
                at: Cell::new(0, 0)
            }
        );
        assert_eq!(report.moves, 1);
    }

    #[test]
    fn hazard_free_field_is_won_before_any_move() {
        let mut game = Game::new(field(4, 4, &[]));
        let report = game.play(&mut FirstCandidate).unwrap();
        assert_eq!(report.outcome, Outcome::Won);
        assert_eq!(report.moves, 0);
    }

    #[test]
    fn first_observation_pins_the_only_hazard() {
        let mut game = Game::new(field(1, 3, &[(0, 1)]));
        let report = game.play(&mut FirstCandidate).unwrap();
        assert_eq!(report.outcome, Outcome::Won);
        assert_eq!(report.known_hazards, 1);
        assert_eq!(report.moves, 1);
        assert_eq!(game.field().flagged().len(), 1);
    }

    #[test]
    fn step_reports_guesses() {
        let mut game = Game::new(field(3, 3, &[(2, 2)]));
        let turn = game.step(&mut FirstCandidate).unwrap();
        assert_eq!(
            turn,
            Turn::Played {
                cell: Cell::new(0, 0),
                guessed: true,
                closure_iterations: 1,
            }
        );
    }
}
