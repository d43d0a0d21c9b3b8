//! Move selection policies.
//!
//! Which of several equally good cells to play is a policy decision, not a
//! correctness one. The agent hands its candidates, sorted ascending, to a
//! [`MoveSelector`].

use rand::Rng;
use rand::seq::SliceRandom;

use crate::cell::Cell;

/// Chooses one cell out of a non-empty candidate slice.
pub trait MoveSelector {
    fn select(&mut self, candidates: &[Cell]) -> Option<Cell>;
}

/// Always the smallest cell in row-major order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl MoveSelector for FirstCandidate {
    fn select(&mut self, candidates: &[Cell]) -> Option<Cell> {
        candidates.first().copied()
    }
}

/// Uniformly random choice driven by any [`Rng`].
#[derive(Debug, Clone)]
pub struct RandomSelector<R> {
    rng: R,
}

impl<R: Rng> RandomSelector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> MoveSelector for RandomSelector<R> {
    fn select(&mut self, candidates: &[Cell]) -> Option<Cell> {
        candidates.choose(&mut self.rng).copied()
    }
}

impl<F> MoveSelector for F
where
    F: FnMut(&[Cell]) -> Option<Cell>,
{
    fn select(&mut self, candidates: &[Cell]) -> Option<Cell> {
        self(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn cells() -> Vec<Cell> {
        vec![Cell::new(0, 2), Cell::new(1, 0), Cell::new(3, 3)]
    }

    #[test]
    fn first_candidate_is_deterministic() {
        assert_eq!(FirstCandidate.select(&cells()), Some(Cell::new(0, 2)));
        assert_eq!(FirstCandidate.select(&[]), None);
    }

    #[test]
    fn random_selector_stays_in_candidates() {
        let mut selector = RandomSelector::new(StdRng::seed_from_u64(7));
        let candidates = cells();
        for _ in 0..50 {
            let pick = selector.select(&candidates).unwrap();
            assert!(candidates.contains(&pick));
        }
        assert_eq!(selector.select(&[]), None);
    }

    #[test]
    fn seeded_random_selectors_agree() {
        let mut a = RandomSelector::new(StdRng::seed_from_u64(42));
        let mut b = RandomSelector::new(StdRng::seed_from_u64(42));
        let candidates = cells();
        for _ in 0..20 {
            assert_eq!(a.select(&candidates), b.select(&candidates));
        }
    }

    #[test]
    fn closures_are_selectors() {
        let mut last = |c: &[Cell]| c.last().copied();
        assert_eq!(last.select(&cells()), Some(Cell::new(3, 3)));
    }
}
