//! Closure of the knowledge base to a fixpoint.
//!
//! Each iteration:
//!
//! 1. normalizes the arena (empty and duplicate sentences go away);
//! 2. derives `{B} = n - m` from every pair `{A ∪ B} = n`, `{A} = m`;
//! 3. collects the cells that some sentence, old or derived, pins down;
//! 4. stores the derived sentences and applies the classifications.
//!
//! The loop stops when an iteration neither derives a sentence nor
//! classifies a cell. Only pairwise subset chains are explored, so some
//! facts that a full constraint solver would find stay undiscovered.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::ConsistencyError;
use crate::knowledge::KnowledgeBase;
use crate::sentence::Sentence;

/// Largest frontier an observation can produce on an 8-connected grid.
pub const NEIGHBOURHOOD: usize = 8;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the closure loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureConfig {
    /// Hard iteration cap. `None` uses the theoretical bound alone; a value
    /// tighter than the bound wins.
    pub max_iterations: Option<usize>,
}

impl ClosureConfig {
    /// The cap in force for a run whose theoretical bound is `bound`.
    pub fn effective_cap(&self, bound: usize) -> usize {
        match self.max_iterations {
            Some(cap) => cap.min(bound),
            None => bound,
        }
    }
}

/// Number of non-empty subsets of a sentence with `cells` members,
/// saturating at `usize::MAX`.
pub fn derivation_space(cells: usize) -> usize {
    u32::try_from(cells)
        .ok()
        .and_then(|n| 1usize.checked_shl(n))
        .map_or(usize::MAX, |subsets| subsets - 1)
}

/// Upper bound on closure iterations.
///
/// While nothing is classified, live sentences only accumulate and every
/// one of them is a non-empty subset of some root sentence, so such a
/// stretch lasts at most `space + 1` iterations, where `space` is the summed
/// [`derivation_space`] of the roots. Each stretch but the last ends by
/// classifying at least one of the `unclassified` cells. One more iteration
/// observes the fixpoint.
pub fn iteration_bound(unclassified: usize, space: usize) -> usize {
    unclassified
        .saturating_add(1)
        .saturating_mul(space.saturating_add(1))
        .saturating_add(1)
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What one closure run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClosureReport {
    /// Iterations executed, including the one that detected the fixpoint.
    pub iterations: usize,
    /// Sentences added by subset reduction.
    pub derived: usize,
    /// Cells newly classified safe, in classification order.
    pub newly_safe: Vec<Cell>,
    /// Cells newly classified as hazards, in classification order.
    pub newly_hazards: Vec<Cell>,
}

impl ClosureReport {
    /// True when the run learned nothing.
    pub fn is_noop(&self) -> bool {
        self.derived == 0 && self.newly_safe.is_empty() && self.newly_hazards.is_empty()
    }

    /// Fold a later report into this one.
    pub fn absorb(&mut self, other: ClosureReport) {
        self.iterations += other.iterations;
        self.derived += other.derived;
        self.newly_safe.extend(other.newly_safe);
        self.newly_hazards.extend(other.newly_hazards);
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Run closure on `kb` until fixpoint or until `max_iterations` is exceeded.
///
/// Classifications applied before an error are kept; they were certain when
/// made.
pub fn close(
    kb: &mut KnowledgeBase,
    max_iterations: usize,
) -> Result<ClosureReport, ConsistencyError> {
    let mut report = ClosureReport::default();

    loop {
        if report.iterations >= max_iterations {
            return Err(ConsistencyError::IterationCap { max_iterations });
        }
        report.iterations += 1;

        kb.normalize();
        let candidates = subset_reductions(kb)?;
        let (safe, hazards) = certainties(kb, &candidates)?;

        tracing::debug!(
            iteration = report.iterations,
            sentences = kb.len(),
            derived = candidates.len(),
            safe = safe.len(),
            hazards = hazards.len(),
            "closure iteration"
        );

        if candidates.is_empty() && safe.is_empty() && hazards.is_empty() {
            return Ok(report);
        }

        for candidate in candidates {
            if kb.insert(candidate).is_some() {
                report.derived += 1;
            }
        }
        report.newly_safe.extend(kb.mark_all_safe(safe)?);
        report.newly_hazards.extend(kb.mark_all_hazards(hazards)?);
    }
}

/// Pairwise subset reduction over every unordered pair of live sentences.
///
/// Returns new, non-empty sentences that are not yet in `kb`.
fn subset_reductions(kb: &KnowledgeBase) -> Result<Vec<Sentence>, ConsistencyError> {
    let live: Vec<&Sentence> = kb.sentences().collect();
    let mut derived: Vec<Sentence> = Vec::new();
    let mut seen: HashSet<Sentence> = HashSet::new();

    for (i, first) in live.iter().enumerate() {
        for second in &live[i + 1..] {
            let (small, large) = if first.len() <= second.len() {
                (first, second)
            } else {
                (second, first)
            };
            let Some(sentence) = large.reduce_by(small)? else {
                continue;
            };
            if sentence.is_empty() || kb.contains(&sentence) {
                continue;
            }
            if seen.insert(sentence.clone()) {
                derived.push(sentence);
            }
        }
    }

    Ok(derived)
}

/// Cells pinned down by any live or candidate sentence, minus those already
/// classified.
fn certainties(
    kb: &KnowledgeBase,
    candidates: &[Sentence],
) -> Result<(BTreeSet<Cell>, BTreeSet<Cell>), ConsistencyError> {
    let mut safe = BTreeSet::new();
    let mut hazards = BTreeSet::new();

    for sentence in kb.sentences().chain(candidates) {
        safe.extend(sentence.known_safe());
        hazards.extend(sentence.known_hazards());
    }
    safe.retain(|c| !kb.is_classified(*c));
    hazards.retain(|c| !kb.is_classified(*c));

    if let Some(&cell) = safe.intersection(&hazards).next() {
        return Err(ConsistencyError::ClassificationConflict { cell });
    }
    Ok((safe, hazards))
}
