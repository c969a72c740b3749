use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    rank_candidates, Candidate, EmissionEntry, InitialEntry, ProbabilityStore, StoreEntry,
    StoreError, StoreStats, TransitionEntry,
};

/// Flat row lists, the serialized form of a `MemoryStore`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct StoreData {
    pub initial: Vec<InitialEntry>,
    pub emission: Vec<EmissionEntry>,
    pub transition: Vec<TransitionEntry>,
}

/// Hash-indexed, append-only store.
///
/// Rows live in insertion order in `data`; the indexes hold row positions so
/// duplicate keys stay visible to queries, exactly as separate table rows
/// would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: StoreData,
    /// unit → initial rows
    initial_idx: HashMap<String, Vec<usize>>,
    /// pronunciation → emission rows
    emission_idx: HashMap<String, Vec<usize>>,
    /// prev unit → transition rows
    transition_idx: HashMap<String, Vec<usize>>,
}

fn check_log_prob(log_prob: f64) -> Result<(), StoreError> {
    if log_prob.is_finite() && log_prob <= 0.0 {
        Ok(())
    } else {
        Err(StoreError::InvalidLogProb(log_prob))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from rows, in order.
    pub fn from_entries(
        entries: impl IntoIterator<Item = StoreEntry>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.insert_batch(entries.into_iter().collect())?;
        Ok(store)
    }

    pub(super) fn from_data(data: StoreData) -> Result<Self, StoreError> {
        let mut store = Self::new();
        let entries = data
            .initial
            .into_iter()
            .map(StoreEntry::Initial)
            .chain(data.emission.into_iter().map(StoreEntry::Emission))
            .chain(data.transition.into_iter().map(StoreEntry::Transition));
        store.insert_batch(entries.collect())?;
        Ok(store)
    }

    pub(super) fn data(&self) -> &StoreData {
        &self.data
    }

    /// Initial rows in insertion order, duplicates included.
    pub fn initial_entries(&self) -> &[InitialEntry] {
        &self.data.initial
    }

    pub fn emission_entries(&self) -> &[EmissionEntry] {
        &self.data.emission
    }

    pub fn transition_entries(&self) -> &[TransitionEntry] {
        &self.data.transition
    }

    pub fn is_empty(&self) -> bool {
        self.data.initial.is_empty()
            && self.data.emission.is_empty()
            && self.data.transition.is_empty()
    }

    fn push(&mut self, entry: StoreEntry) {
        match entry {
            StoreEntry::Initial(e) => {
                let row = self.data.initial.len();
                self.initial_idx.entry(e.unit.clone()).or_default().push(row);
                self.data.initial.push(e);
            }
            StoreEntry::Emission(e) => {
                let row = self.data.emission.len();
                self.emission_idx
                    .entry(e.pronunciation.clone())
                    .or_default()
                    .push(row);
                self.data.emission.push(e);
            }
            StoreEntry::Transition(e) => {
                let row = self.data.transition.len();
                self.transition_idx
                    .entry(e.prev.clone())
                    .or_default()
                    .push(row);
                self.data.transition.push(e);
            }
        }
    }

    /// Emission rows for `pronunciation`, grouped by unit.
    fn emissions_by_unit(&self, pronunciation: &str) -> HashMap<&str, Vec<f64>> {
        let mut by_unit: HashMap<&str, Vec<f64>> = HashMap::new();
        if let Some(rows) = self.emission_idx.get(pronunciation) {
            for &row in rows {
                let e = &self.data.emission[row];
                by_unit.entry(e.unit.as_str()).or_default().push(e.log_prob);
            }
        }
        by_unit
    }
}

impl ProbabilityStore for MemoryStore {
    fn insert(&mut self, entry: StoreEntry) -> Result<(), StoreError> {
        check_log_prob(entry.log_prob())?;
        self.push(entry);
        Ok(())
    }

    /// Validates every row before appending any, so a rejected batch leaves
    /// the tables untouched.
    fn insert_batch(&mut self, entries: Vec<StoreEntry>) -> Result<(), StoreError> {
        for entry in &entries {
            check_log_prob(entry.log_prob())?;
        }
        for entry in entries {
            self.push(entry);
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        *self = Self::new();
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats {
            initial: self.data.initial.len(),
            emission: self.data.emission.len(),
            transition: self.data.transition.len(),
        })
    }

    fn initial(&self, unit: &str) -> Result<Option<f64>, StoreError> {
        Ok(self
            .initial_idx
            .get(unit)
            .and_then(|rows| rows.first())
            .map(|&row| self.data.initial[row].log_prob))
    }

    fn emission(&self, unit: &str, pronunciation: &str) -> Result<Option<f64>, StoreError> {
        Ok(self.emission_idx.get(pronunciation).and_then(|rows| {
            rows.iter()
                .map(|&row| &self.data.emission[row])
                .find(|e| e.unit == unit)
                .map(|e| e.log_prob)
        }))
    }

    fn transition(&self, prev: &str, next: &str) -> Result<Option<f64>, StoreError> {
        Ok(self.transition_idx.get(prev).and_then(|rows| {
            rows.iter()
                .map(|&row| &self.data.transition[row])
                .find(|e| e.next == next)
                .map(|e| e.log_prob)
        }))
    }

    fn best_next(
        &self,
        prev: &str,
        pronunciation: &str,
    ) -> Result<Option<Candidate>, StoreError> {
        let Some(rows) = self.transition_idx.get(prev) else {
            return Ok(None);
        };
        let emissions = self.emissions_by_unit(pronunciation);
        if emissions.is_empty() {
            return Ok(None);
        }

        let mut best: Option<Candidate> = None;
        for &row in rows {
            let t = &self.data.transition[row];
            let Some(emission_probs) = emissions.get(t.next.as_str()) else {
                continue;
            };
            for &e in emission_probs {
                let candidate = Candidate::new(t.next.as_str(), e + t.log_prob);
                let better = best
                    .as_ref()
                    .map_or(true, |b| rank_candidates(&candidate, b).is_lt());
                if better {
                    best = Some(candidate);
                }
            }
        }
        Ok(best)
    }

    fn top_initial_candidates(
        &self,
        pronunciation: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut candidates: Vec<Candidate> = Vec::new();
        for (unit, emission_probs) in self.emissions_by_unit(pronunciation) {
            let Some(rows) = self.initial_idx.get(unit) else {
                continue;
            };
            for &e in &emission_probs {
                for &row in rows {
                    let i = self.data.initial[row].log_prob;
                    candidates.push(Candidate::new(unit, e + i));
                }
            }
        }
        candidates.sort_by(rank_candidates);
        candidates.truncate(limit);
        Ok(candidates)
    }
}
