//! The deducing agent.
//!
//! An [`Agent`] turns observations into sentences, closes its knowledge base
//! after each one, and answers the two move queries. It is the single owner
//! of its state; every mutation goes through `observe`, `add_sentence`,
//! `close`, or the two `mark_*` primitives.

use std::collections::BTreeSet;

use crate::cell::{Cell, Grid};
use crate::closure::{self, ClosureConfig, ClosureReport};
use crate::error::{ConsistencyError, ContractError, SapperResult};
use crate::knowledge::{KnowledgeBase, SentenceId};
use crate::select::MoveSelector;
use crate::sentence::Sentence;

/// Knowledge-base agent for a single grid.
#[derive(Debug, Clone)]
pub struct Agent {
    grid: Grid,
    config: ClosureConfig,
    visited: BTreeSet<Cell>,
    knowledge: KnowledgeBase,
    /// Summed subset count of every root sentence, feeding the closure bound.
    derivation_space: usize,
}

impl Agent {
    pub fn new(grid: Grid) -> Self {
        Self::with_config(grid, ClosureConfig::default())
    }

    pub fn with_config(grid: Grid, config: ClosureConfig) -> Self {
        Self {
            grid,
            config,
            visited: BTreeSet::new(),
            knowledge: KnowledgeBase::new(),
            derivation_space: 0,
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn config(&self) -> &ClosureConfig {
        &self.config
    }

    pub fn visited(&self) -> &BTreeSet<Cell> {
        &self.visited
    }

    pub fn known_safe(&self) -> &BTreeSet<Cell> {
        self.knowledge.known_safe()
    }

    pub fn known_hazards(&self) -> &BTreeSet<Cell> {
        self.knowledge.known_hazards()
    }

    pub fn sentences(&self) -> impl Iterator<Item = (SentenceId, &Sentence)> {
        self.knowledge.iter()
    }

    /// Record that `cell` was opened and shows `hazard_count` neighbouring
    /// hazards, then close the knowledge base.
    pub fn observe(&mut self, cell: Cell, hazard_count: usize) -> SapperResult<ClosureReport> {
        self.grid.check(cell)?;
        if self.visited.contains(&cell) {
            return Err(ContractError::AlreadyVisited { cell }.into());
        }
        let neighbours: Vec<Cell> = self.grid.neighbours(cell).collect();
        if hazard_count > neighbours.len() {
            return Err(ContractError::CountExceedsNeighbours {
                cell,
                count: hazard_count,
                neighbours: neighbours.len(),
            }
            .into());
        }

        let known = neighbours
            .iter()
            .filter(|&&c| self.knowledge.known_hazards().contains(&c))
            .count();
        let Some(remaining) = hazard_count.checked_sub(known) else {
            return Err(ConsistencyError::ObservationConflict {
                cell,
                count: hazard_count,
                known,
            }
            .into());
        };
        let frontier: Vec<Cell> = neighbours
            .into_iter()
            .filter(|&c| !self.knowledge.is_classified(c))
            .collect();
        if remaining > frontier.len() {
            return Err(ConsistencyError::ObservationOvercount {
                cell,
                remaining,
                unknown: frontier.len(),
            }
            .into());
        }

        tracing::debug!(%cell, hazard_count, frontier = frontier.len(), "observation");

        // The observed cell itself is not reported; the caller opened it.
        let mut report = ClosureReport::default();
        if remaining == 0 {
            let cleared = self
                .knowledge
                .mark_all_safe(frontier.iter().copied().chain([cell]))?;
            report
                .newly_safe
                .extend(cleared.into_iter().filter(|&c| c != cell));
        } else {
            let sentence = Sentence::new(frontier, remaining)?;
            self.knowledge.mark_safe(cell)?;
            self.add_root(sentence);
        }
        self.visited.insert(cell);

        report.absorb(self.close()?);
        Ok(report)
    }

    /// Assert an externally known constraint and close the knowledge base.
    ///
    /// Already-classified cells are stripped first, so the sentence may
    /// mention cells the agent has resolved.
    pub fn add_sentence(&mut self, sentence: Sentence) -> SapperResult<ClosureReport> {
        for &cell in sentence.cells() {
            self.grid.check(cell)?;
        }
        let stripped = self.knowledge.strip_classified(&sentence)?;
        if !stripped.is_empty() {
            self.add_root(stripped);
        }
        self.close()
    }

    /// Run closure to fixpoint. On an already closed base this changes
    /// nothing and reports a single iteration.
    pub fn close(&mut self) -> SapperResult<ClosureReport> {
        let cap = self.config.effective_cap(self.iteration_bound());
        let report = closure::close(&mut self.knowledge, cap)?;
        if !report.is_noop() {
            tracing::debug!(
                iterations = report.iterations,
                derived = report.derived,
                safe = report.newly_safe.len(),
                hazards = report.newly_hazards.len(),
                "closure reached fixpoint"
            );
        }
        Ok(report)
    }

    /// Classify `cell` as safe and propagate to every sentence. Does not
    /// run closure.
    pub fn mark_safe(&mut self, cell: Cell) -> SapperResult<bool> {
        self.grid.check(cell)?;
        Ok(self.knowledge.mark_safe(cell)?)
    }

    /// Classify `cell` as a hazard and propagate to every sentence. Does not
    /// run closure.
    pub fn mark_hazard(&mut self, cell: Cell) -> SapperResult<bool> {
        self.grid.check(cell)?;
        Ok(self.knowledge.mark_hazard(cell)?)
    }

    /// Known-safe cells not yet visited, ascending.
    pub fn safe_moves(&self) -> Vec<Cell> {
        self.knowledge
            .known_safe()
            .difference(&self.visited)
            .copied()
            .collect()
    }

    /// Unvisited cells not known to be hazards, ascending.
    pub fn fallback_moves(&self) -> Vec<Cell> {
        self.grid
            .cells()
            .filter(|c| !self.visited.contains(c) && !self.knowledge.known_hazards().contains(c))
            .collect()
    }

    /// A cell certain to be safe that has not been visited, if any.
    pub fn safe_move(&self, selector: &mut impl MoveSelector) -> Option<Cell> {
        selector.select(&self.safe_moves())
    }

    /// Any unvisited cell not known to be a hazard, if any.
    pub fn fallback_move(&self, selector: &mut impl MoveSelector) -> Option<Cell> {
        selector.select(&self.fallback_moves())
    }

    /// Iteration bound for the next closure run.
    pub fn iteration_bound(&self) -> usize {
        let classified = self.known_safe().len() + self.known_hazards().len();
        closure::iteration_bound(
            self.grid.len().saturating_sub(classified),
            self.derivation_space,
        )
    }

    fn add_root(&mut self, sentence: Sentence) {
        let space = closure::derivation_space(sentence.len());
        if self.knowledge.insert(sentence).is_some() {
            self.derivation_space = self.derivation_space.saturating_add(space);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SapperError;
    use crate::select::FirstCandidate;

    fn c(row: usize, col: usize) -> Cell {
        Cell::new(row, col)
    }

    fn agent(h: usize, w: usize) -> Agent {
        Agent::new(Grid::new(h, w).unwrap())
    }

    #[test]
    fn zero_count_marks_neighbours_safe_without_sentence() {
        let mut a = agent(3, 3);
        a.observe(c(1, 1), 0).unwrap();
        assert_eq!(a.known_safe().len(), 9);
        assert!(a.known_hazards().is_empty());
        assert_eq!(a.sentences().count(), 0);
    }

    #[test]
    fn informative_observation_stores_frontier() {
        let mut a = agent(3, 3);
        a.observe(c(0, 0), 1).unwrap();
        let stored: Vec<&Sentence> = a.sentences().map(|(_, s)| s).collect();
        assert_eq!(
            stored,
            vec![&Sentence::new([c(0, 1), c(1, 0), c(1, 1)], 1).unwrap()]
        );
        assert!(a.visited().contains(&c(0, 0)));
        assert!(a.known_safe().contains(&c(0, 0)));
    }

    #[test]
    fn known_hazard_neighbours_reduce_count() {
        let mut a = agent(3, 3);
        a.mark_hazard(c(0, 1)).unwrap();
        a.observe(c(0, 0), 2).unwrap();
        // Frontier {(1,0),(1,1)} with one remaining hazard.
        let stored: Vec<&Sentence> = a.sentences().map(|(_, s)| s).collect();
        assert_eq!(
            stored,
            vec![&Sentence::new([c(1, 0), c(1, 1)], 1).unwrap()]
        );
    }

    #[test]
    fn contract_violations_leave_state_untouched() {
        let mut a = agent(3, 3);
        assert!(matches!(
            a.observe(c(3, 3), 0),
            Err(SapperError::Contract(ContractError::OutOfBounds { .. }))
        ));
        assert!(matches!(
            a.observe(c(0, 0), 4),
            Err(SapperError::Contract(
                ContractError::CountExceedsNeighbours { .. }
            ))
        ));
        assert!(a.visited().is_empty());

        a.observe(c(0, 0), 1).unwrap();
        assert!(matches!(
            a.observe(c(0, 0), 1),
            Err(SapperError::Contract(ContractError::AlreadyVisited { .. }))
        ));
        assert_eq!(a.visited().len(), 1);
    }

    #[test]
    fn contradicting_observation_is_internal() {
        let mut a = agent(3, 3);
        a.mark_hazard(c(0, 1)).unwrap();
        a.mark_hazard(c(1, 1)).unwrap();
        let err = a.observe(c(0, 0), 1).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn overcounted_observation_leaves_cell_unvisited() {
        let mut a = agent(1, 3);
        a.observe(c(0, 2), 0).unwrap();
        // (0,1) is already proved safe, so a count of 1 at (0,0) is impossible.
        let err = a.observe(c(0, 0), 1).unwrap_err();
        assert!(matches!(
            err,
            SapperError::Consistency(ConsistencyError::ObservationOvercount {
                remaining: 1,
                unknown: 0,
                ..
            })
        ));
        assert_eq!(a.visited(), &BTreeSet::from([c(0, 2)]));
        assert!(!a.known_safe().contains(&c(0, 0)));

        a.observe(c(0, 0), 0).unwrap();
        assert_eq!(a.visited().len(), 2);
    }

    #[test]
    fn rejected_zero_observation_classifies_nothing() {
        let mut a = agent(1, 3);
        a.add_sentence(Sentence::new([c(0, 1), c(0, 2)], 1).unwrap())
            .unwrap();
        // Claims both (0,1) and (0,2) safe, against the sentence.
        let err = a.observe(c(0, 1), 0).unwrap_err();
        assert!(err.is_internal());
        assert!(a.visited().is_empty());
        assert!(a.known_safe().is_empty());
        assert_eq!(a.sentences().count(), 1);
    }

    #[test]
    fn observing_a_known_hazard_is_internal() {
        let mut a = agent(3, 3);
        a.mark_hazard(c(2, 2)).unwrap();
        let err = a.observe(c(2, 2), 0).unwrap_err();
        assert!(matches!(
            err,
            SapperError::Consistency(ConsistencyError::ClassificationConflict { .. })
        ));
    }

    #[test]
    fn add_sentence_derives_subset_remainder() {
        let mut a = agent(1, 3);
        a.add_sentence(Sentence::new([c(0, 0), c(0, 1), c(0, 2)], 2).unwrap())
            .unwrap();
        let report = a
            .add_sentence(Sentence::new([c(0, 0), c(0, 1)], 1).unwrap())
            .unwrap();
        assert_eq!(report.newly_hazards, vec![c(0, 2)]);
        assert!(a.known_hazards().contains(&c(0, 2)));
    }

    #[test]
    fn add_sentence_strips_classified_cells() {
        let mut a = agent(1, 3);
        a.mark_hazard(c(0, 0)).unwrap();
        let report = a
            .add_sentence(Sentence::new([c(0, 0), c(0, 1), c(0, 2)], 1).unwrap())
            .unwrap();
        let mut safe = report.newly_safe.clone();
        safe.sort();
        assert_eq!(safe, vec![c(0, 1), c(0, 2)]);
    }

    #[test]
    fn close_twice_is_noop() {
        let mut a = agent(3, 3);
        a.observe(c(0, 0), 1).unwrap();
        a.observe(c(0, 2), 1).unwrap();
        let again = a.close().unwrap();
        assert!(again.is_noop());
        assert_eq!(again.iterations, 1);
    }

    #[test]
    fn zero_observation_reports_cleared_neighbours() {
        let mut a = agent(2, 2);
        let report = a.observe(c(0, 0), 0).unwrap();
        assert_eq!(report.newly_safe, vec![c(0, 1), c(1, 0), c(1, 1)]);
        assert!(report.newly_hazards.is_empty());
    }

    #[test]
    fn moves_skip_visited_and_hazards() {
        let mut a = agent(1, 3);
        assert_eq!(a.safe_move(&mut FirstCandidate), None);
        assert_eq!(a.fallback_move(&mut FirstCandidate), Some(c(0, 0)));

        a.mark_hazard(c(0, 0)).unwrap();
        a.observe(c(0, 1), 1).unwrap();
        assert_eq!(a.safe_moves(), vec![c(0, 2)]);
        assert_eq!(a.fallback_moves(), vec![c(0, 2)]);

        a.observe(c(0, 2), 0).unwrap();
        assert_eq!(a.safe_move(&mut FirstCandidate), None);
        assert_eq!(a.fallback_move(&mut FirstCandidate), None);
    }

    #[test]
    fn tight_cap_surfaces_as_internal_error() {
        let mut a = Agent::with_config(
            Grid::new(1, 3).unwrap(),
            ClosureConfig {
                max_iterations: Some(1),
            },
        );
        a.add_sentence(Sentence::new([c(0, 0), c(0, 1), c(0, 2)], 2).unwrap())
            .unwrap();
        let err = a
            .add_sentence(Sentence::new([c(0, 0), c(0, 1)], 1).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            SapperError::Consistency(ConsistencyError::IterationCap { max_iterations: 1 })
        ));
    }
}
