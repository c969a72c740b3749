//! Maximum-likelihood estimation of the initial, emission and transition
//! tables from a tagged corpus.
//!
//! Counting happens in one pass over the corpus into three count maps; only
//! after the pass are counts turned into log-probabilities and written to
//! the store, as a single batch.


use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::corpus::{read_corpus, CorpusError, CorpusLine, DataKind};
use crate::store::{
    EmissionEntry, InitialEntry, ProbabilityStore, StoreEntry, StoreError, TransitionEntry,
};
use crate::text::{primary_pronunciation, syllables, Segmenter, Transliterator};
use crate::unicode::is_pure_hanzi;

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Raw counts accumulated over one pass.
#[derive(Debug, Default)]
struct Counts {
    lines: usize,
    skipped: usize,
    /// unit → lines starting with it
    initial: BTreeMap<String, u64>,
    /// unit → pronunciation → occurrences
    emission: BTreeMap<String, BTreeMap<String, u64>>,
    /// prev → next → occurrences
    transition: BTreeMap<String, BTreeMap<String, u64>>,
}

impl Counts {
    fn bump_emission(&mut self, unit: &str, pronunciation: &str) {
        *self
            .emission
            .entry(unit.to_string())
            .or_default()
            .entry(pronunciation.to_string())
            .or_insert(0) += 1;
    }

    fn bump_transition(&mut self, prev: &str, next: &str) {
        *self
            .transition
            .entry(prev.to_string())
            .or_default()
            .entry(next.to_string())
            .or_insert(0) += 1;
    }
}

/// Normalize nested counts per outer key into log-probabilities.
fn normalize<'a>(
    counts: &'a BTreeMap<String, BTreeMap<String, u64>>,
) -> impl Iterator<Item = (&'a str, &'a str, f64)> + 'a {
    counts.iter().flat_map(|(outer, inner)| {
        let total: u64 = inner.values().sum();
        inner
            .iter()
            .map(move |(key, &n)| (outer.as_str(), key.as_str(), (n as f64 / total as f64).ln()))
    })
}

/// The three estimated tables, ready to be written.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TrainedTables {
    pub initial: Vec<InitialEntry>,
    pub emission: Vec<EmissionEntry>,
    pub transition: Vec<TransitionEntry>,
}

impl TrainedTables {
    pub fn into_entries(self) -> Vec<StoreEntry> {
        self.initial
            .into_iter()
            .map(StoreEntry::Initial)
            .chain(self.emission.into_iter().map(StoreEntry::Emission))
            .chain(self.transition.into_iter().map(StoreEntry::Transition))
            .collect()
    }
}

/// What a training run consumed and produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrainSummary {
    /// Non-blank corpus lines, the denominator of initial probabilities.
    pub lines: usize,
    /// Lines discarded for containing non-hanzi characters.
    pub skipped: usize,
    pub initial: usize,
    pub emission: usize,
    pub transition: usize,
}

pub struct Trainer<'a> {
    segmenter: &'a dyn Segmenter,
    transliterator: &'a dyn Transliterator,
    log_interval: usize,
    max_unit_len: usize,
}

impl<'a> Trainer<'a> {
    pub fn new(segmenter: &'a dyn Segmenter, transliterator: &'a dyn Transliterator) -> Self {
        Self {
            segmenter,
            transliterator,
            log_interval: 10_000,
            max_unit_len: usize::MAX,
        }
    }

    /// Skip initial and emission rows for units longer than `n` characters,
    /// which a decoder limited to `n` syllables never looks up. Characters
    /// are always kept (clamped to at least 1).
    pub fn with_max_unit_len(mut self, n: usize) -> Self {
        self.max_unit_len = n.max(1);
        self
    }

    fn fits(&self, unit: &str) -> bool {
        unit.chars().count() <= self.max_unit_len
    }

    /// Log progress every `interval` lines (clamped to at least 1).
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval.max(1);
        self
    }

    /// Parse `path` and train into `store`. A malformed line aborts before
    /// anything is written.
    pub fn train_file<S: ProbabilityStore + ?Sized>(
        &self,
        path: &Path,
        store: &mut S,
    ) -> Result<TrainSummary, TrainError> {
        let lines = read_corpus(path)?;
        self.train(&lines, store)
    }

    /// Estimate the tables from `lines` and write them into `store`.
    pub fn train<S: ProbabilityStore + ?Sized>(
        &self,
        lines: &[CorpusLine],
        store: &mut S,
    ) -> Result<TrainSummary, TrainError> {
        let _span = info_span!("train", lines = lines.len()).entered();
        let (tables, counts) = self.estimate(lines);
        let summary = TrainSummary {
            lines: counts.lines,
            skipped: counts.skipped,
            initial: tables.initial.len(),
            emission: tables.emission.len(),
            transition: tables.transition.len(),
        };
        info!(
            initial = summary.initial,
            emission = summary.emission,
            transition = summary.transition,
            "inserting into store"
        );
        store.insert_batch(tables.into_entries())?;
        info!(skipped = summary.skipped, "training done");
        Ok(summary)
    }

    /// Count `lines` and convert the counts to log-probabilities without
    /// touching any store.
    pub fn tables(&self, lines: &[CorpusLine]) -> TrainedTables {
        self.estimate(lines).0
    }

    fn estimate(&self, lines: &[CorpusLine]) -> (TrainedTables, Counts) {
        let mut counts = Counts::default();
        for line in lines {
            self.observe(line, &mut counts);
            if counts.lines % self.log_interval == 0 {
                info!(processed = counts.lines, total = lines.len(), "counting");
            }
        }
        debug!(
            lines = counts.lines,
            skipped = counts.skipped,
            "counting done"
        );

        let total_lines = counts.lines.max(1) as f64;
        let initial = counts
            .initial
            .iter()
            .map(|(unit, &n)| InitialEntry {
                unit: unit.clone(),
                log_prob: (n as f64 / total_lines).ln(),
            })
            .collect();
        let emission = normalize(&counts.emission)
            .map(|(unit, pronunciation, log_prob)| EmissionEntry {
                unit: unit.to_string(),
                pronunciation: pronunciation.to_string(),
                log_prob,
            })
            .collect();
        let transition = normalize(&counts.transition)
            .map(|(prev, next, log_prob)| TransitionEntry {
                prev: prev.to_string(),
                next: next.to_string(),
                log_prob,
            })
            .collect();

        (
            TrainedTables {
                initial,
                emission,
                transition,
            },
            counts,
        )
    }

    fn observe(&self, line: &CorpusLine, counts: &mut Counts) {
        counts.lines += 1;
        let text = line.text.as_str();
        if !is_pure_hanzi(text) {
            counts.skipped += 1;
            return;
        }

        let units: Vec<String> = match line.kind {
            DataKind::Word => text.chars().map(String::from).collect(),
            DataKind::Sentence => self
                .segmenter
                .segment(text)
                .into_iter()
                .filter(|w| is_pure_hanzi(w))
                .collect(),
        };

        self.observe_initial(line.kind, text, &units, counts);
        self.observe_emission(line.kind, text, &units, counts);

        for pair in units.windows(2) {
            counts.bump_transition(&pair[0], &pair[1]);
        }
    }

    /// The first character always counts; a word line also counts the whole
    /// word and a sentence line its first multi-character word. A line
    /// contributes at most once to any unit, which keeps every initial
    /// probability at or below 1.
    fn observe_initial(&self, kind: DataKind, text: &str, units: &[String], counts: &mut Counts) {
        let mut starts: Vec<&str> = Vec::with_capacity(2);
        if let Some((end, _)) = text.char_indices().nth(1) {
            starts.push(&text[..end]);
        } else {
            starts.push(text);
        }
        let extra = match kind {
            DataKind::Word => Some(text),
            DataKind::Sentence => units.first().map(String::as_str),
        };
        if let Some(extra) = extra.filter(|w| self.fits(w)) {
            if !starts.contains(&extra) {
                starts.push(extra);
            }
        }
        for unit in starts {
            *counts.initial.entry(unit.to_string()).or_insert(0) += 1;
        }
    }

    fn observe_emission(&self, kind: DataKind, text: &str, units: &[String], counts: &mut Counts) {
        match kind {
            DataKind::Word => {
                let Some(per_char) = syllables(self.transliterator, text) else {
                    return;
                };
                // Primary reading, then every heteronym once more.
                for (c, candidates) in text.chars().zip(&per_char) {
                    let unit = c.to_string();
                    counts.bump_emission(&unit, &candidates[0]);
                    for candidate in candidates {
                        counts.bump_emission(&unit, candidate);
                    }
                }
                if per_char.len() > 1 && self.fits(text) {
                    let joined: Vec<&str> = per_char.iter().map(|c| c[0].as_str()).collect();
                    counts.bump_emission(text, &joined.join(" "));
                }
            }
            DataKind::Sentence => {
                for word in units.iter().filter(|w| self.fits(w)) {
                    if let Some(pronunciation) = primary_pronunciation(self.transliterator, word) {
                        counts.bump_emission(word, &pronunciation);
                    }
                }
            }
        }
    }
}
