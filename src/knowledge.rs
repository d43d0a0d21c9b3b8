//! The knowledge base: a sentence arena plus the two classification sets.
//!
//! Sentences are stored in slots addressed by [`SentenceId`]. Freed slots
//! are recycled, so an id stays valid only while its sentence is live. All
//! mutation goes through [`KnowledgeBase`] methods; nothing outside this
//! module can hold a mutable reference to a stored sentence.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::cell::Cell;
use crate::error::ConsistencyError;
use crate::sentence::Sentence;

/// Index of a live sentence in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SentenceId(u32);

impl SentenceId {
    pub fn get(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SentenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Sentences and classified cells.
///
/// Invariants maintained here:
/// - `safe` and `hazards` are disjoint and only grow;
/// - no live sentence mentions a classified cell;
/// - `index` counts the live copies of every sentence value.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    slots: Vec<Option<Sentence>>,
    free: Vec<u32>,
    live: usize,
    index: HashMap<Sentence, usize>,
    safe: BTreeSet<Cell>,
    hazards: BTreeSet<Cell>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sentences.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn known_safe(&self) -> &BTreeSet<Cell> {
        &self.safe
    }

    pub fn known_hazards(&self) -> &BTreeSet<Cell> {
        &self.hazards
    }

    pub fn is_classified(&self, cell: Cell) -> bool {
        self.safe.contains(&cell) || self.hazards.contains(&cell)
    }

    pub fn get(&self, id: SentenceId) -> Option<&Sentence> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Live sentences in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SentenceId, &Sentence)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (SentenceId(i as u32), s)))
    }

    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn contains(&self, sentence: &Sentence) -> bool {
        self.index.contains_key(sentence)
    }

    /// Store a sentence unless an equal one is already live.
    pub fn insert(&mut self, sentence: Sentence) -> Option<SentenceId> {
        if self.contains(&sentence) {
            return None;
        }
        tracing::trace!(%sentence, "sentence added");
        index_add(&mut self.index, &sentence);
        self.live += 1;
        let id = match self.free.pop() {
            Some(raw) => {
                self.slots[raw as usize] = Some(sentence);
                SentenceId(raw)
            }
            None => {
                self.slots.push(Some(sentence));
                SentenceId((self.slots.len() - 1) as u32)
            }
        };
        Some(id)
    }

    /// Free a slot, returning the sentence it held.
    pub fn remove(&mut self, id: SentenceId) -> Option<Sentence> {
        let taken = self.slots.get_mut(id.index()).and_then(Option::take);
        if let Some(sentence) = &taken {
            index_drop(&mut self.index, sentence);
            self.live -= 1;
            self.free.push(id.0);
        }
        taken
    }

    /// Drop empty sentences and duplicate copies of equal sentences.
    ///
    /// The first copy in slot order survives. Returns how many were dropped.
    pub fn normalize(&mut self) -> usize {
        let doomed: Vec<SentenceId> = {
            let mut seen: HashSet<&Sentence> = HashSet::new();
            self.iter()
                .filter(|(_, sentence)| sentence.is_empty() || !seen.insert(*sentence))
                .map(|(id, _)| id)
                .collect()
        };
        for &id in &doomed {
            self.remove(id);
        }
        doomed.len()
    }

    /// Classify `cell` as safe and strip it from every sentence.
    ///
    /// Returns `false` when the cell was already known safe.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool, ConsistencyError> {
        Ok(!self.mark_all_safe([cell])?.is_empty())
    }

    /// Classify `cell` as a hazard and strip it from every sentence.
    ///
    /// Returns `false` when the cell was already a known hazard.
    pub fn mark_hazard(&mut self, cell: Cell) -> Result<bool, ConsistencyError> {
        Ok(!self.mark_all_hazards([cell])?.is_empty())
    }

    /// Classify a batch of cells as safe.
    ///
    /// Either every cell is classified or, on error, nothing changes. Returns
    /// the cells that were not already known safe, in ascending order.
    pub fn mark_all_safe(
        &mut self,
        cells: impl IntoIterator<Item = Cell>,
    ) -> Result<Vec<Cell>, ConsistencyError> {
        let fresh: BTreeSet<Cell> = cells
            .into_iter()
            .filter(|c| !self.safe.contains(c))
            .collect();
        if let Some(&cell) = fresh.iter().find(|c| self.hazards.contains(*c)) {
            return Err(ConsistencyError::ClassificationConflict { cell });
        }
        for sentence in self.sentences() {
            let remaining = sentence.len() - sentence.cells().intersection(&fresh).count();
            if sentence.count() > remaining {
                return Err(ConsistencyError::CountExceedsCells {
                    count: sentence.count(),
                    cells: remaining,
                });
            }
        }

        for sentence in self.slots.iter_mut().flatten() {
            if sentence.cells().is_disjoint(&fresh) {
                continue;
            }
            index_drop(&mut self.index, sentence);
            let resolved = fresh
                .iter()
                .try_for_each(|&cell| sentence.resolve_as_safe(cell).map(drop));
            index_add(&mut self.index, sentence);
            resolved?;
        }
        self.safe.extend(fresh.iter().copied());
        Ok(fresh.into_iter().collect())
    }

    /// Classify a batch of cells as hazards.
    ///
    /// Either every cell is classified or, on error, nothing changes. Returns
    /// the cells that were not already known hazards, in ascending order.
    pub fn mark_all_hazards(
        &mut self,
        cells: impl IntoIterator<Item = Cell>,
    ) -> Result<Vec<Cell>, ConsistencyError> {
        let fresh: BTreeSet<Cell> = cells
            .into_iter()
            .filter(|c| !self.hazards.contains(c))
            .collect();
        if let Some(&cell) = fresh.iter().find(|c| self.safe.contains(*c)) {
            return Err(ConsistencyError::ClassificationConflict { cell });
        }
        for sentence in self.sentences() {
            // The member past the first `count` would push the count below zero.
            let excess = sentence.cells().intersection(&fresh).nth(sentence.count());
            if let Some(&cell) = excess {
                return Err(ConsistencyError::NegativeCount { cell });
            }
        }

        for sentence in self.slots.iter_mut().flatten() {
            if sentence.cells().is_disjoint(&fresh) {
                continue;
            }
            index_drop(&mut self.index, sentence);
            let resolved = fresh
                .iter()
                .try_for_each(|&cell| sentence.resolve_as_hazard(cell).map(drop));
            index_add(&mut self.index, sentence);
            resolved?;
        }
        self.hazards.extend(fresh.iter().copied());
        Ok(fresh.into_iter().collect())
    }

    /// Rewrite a sentence so it mentions no classified cell.
    ///
    /// Known hazards are subtracted from the count; known safe cells are
    /// simply dropped.
    pub fn strip_classified(&self, sentence: &Sentence) -> Result<Sentence, ConsistencyError> {
        let mut stripped = sentence.clone();
        for &cell in sentence.cells() {
            if self.hazards.contains(&cell) {
                stripped.resolve_as_hazard(cell)?;
            } else if self.safe.contains(&cell) {
                stripped.resolve_as_safe(cell)?;
            }
        }
        Ok(stripped)
    }
}

fn index_add(index: &mut HashMap<Sentence, usize>, sentence: &Sentence) {
    *index.entry(sentence.clone()).or_default() += 1;
}

fn index_drop(index: &mut HashMap<Sentence, usize>, sentence: &Sentence) {
    if let Some(copies) = index.get_mut(sentence) {
        *copies -= 1;
        if *copies == 0 {
            index.remove(sentence);
        }
    }
}
