//! Log-probability tables learned by the trainer and read by the decoder.
//!
//! `ProbabilityStore` is the storage-agnostic contract: append-only inserts
//! plus the two joined queries the decoder needs. `MemoryStore` is the
//! hash-indexed implementation, persisted as a single checksummed file.

mod memory;
mod persistence;
#[cfg(test)]
pub(crate) mod testutil;
#[cfg(test)]
mod tests;

pub use memory::MemoryStore;

use std::cmp::Ordering;
use std::io;

use serde::{Deserialize, Serialize};

/// Error type for store queries, inserts and binary I/O.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected HZPS)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch: header {expected:#010x}, body {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("log-probability must be finite and <= 0, got {0}")]
    InvalidLogProb(f64),

    #[error("probability store unavailable: {0}")]
    Unavailable(String),
}

/// log P(unit starts a sequence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialEntry {
    pub unit: String,
    pub log_prob: f64,
}

/// log P(pronunciation | unit). `pronunciation` is space-joined syllables,
/// one per character of `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionEntry {
    pub unit: String,
    pub pronunciation: String,
    pub log_prob: f64,
}

/// log P(next | prev)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub prev: String,
    pub next: String,
    pub log_prob: f64,
}

/// One row destined for one of the three tables.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEntry {
    Initial(InitialEntry),
    Emission(EmissionEntry),
    Transition(TransitionEntry),
}

impl StoreEntry {
    pub fn initial(unit: impl Into<String>, log_prob: f64) -> Self {
        Self::Initial(InitialEntry {
            unit: unit.into(),
            log_prob,
        })
    }

    pub fn emission(
        unit: impl Into<String>,
        pronunciation: impl Into<String>,
        log_prob: f64,
    ) -> Self {
        Self::Emission(EmissionEntry {
            unit: unit.into(),
            pronunciation: pronunciation.into(),
            log_prob,
        })
    }

    pub fn transition(prev: impl Into<String>, next: impl Into<String>, log_prob: f64) -> Self {
        Self::Transition(TransitionEntry {
            prev: prev.into(),
            next: next.into(),
            log_prob,
        })
    }

    pub fn log_prob(&self) -> f64 {
        match self {
            Self::Initial(e) => e.log_prob,
            Self::Emission(e) => e.log_prob,
            Self::Transition(e) => e.log_prob,
        }
    }
}

/// A unit proposed by a joined query, with its combined log-probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub unit: String,
    pub score: f64,
}

impl Candidate {
    pub fn new(unit: impl Into<String>, score: f64) -> Self {
        Self {
            unit: unit.into(),
            score,
        }
    }
}

/// Ranking used by every joined query: higher score first, then the
/// lexicographically smaller unit, so equal scores resolve the same way on
/// every run.
pub fn rank_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.unit.cmp(&b.unit))
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub initial: usize,
    pub emission: usize,
    pub transition: usize,
}

/// Storage contract shared by training (writes) and decoding (reads).
///
/// Inserts never deduplicate; callers aggregate before writing. Queries for
/// keys that were never inserted return `None`/empty rather than a
/// zero-probability score.
pub trait ProbabilityStore: Send + Sync {
    fn insert(&mut self, entry: StoreEntry) -> Result<(), StoreError>;

    fn insert_batch(&mut self, entries: Vec<StoreEntry>) -> Result<(), StoreError> {
        for entry in entries {
            self.insert(entry)?;
        }
        Ok(())
    }

    /// Drop every row of all three tables.
    fn reset(&mut self) -> Result<(), StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Exact lookups. With duplicate rows, the first inserted value wins.
    fn initial(&self, unit: &str) -> Result<Option<f64>, StoreError>;
    fn emission(&self, unit: &str, pronunciation: &str) -> Result<Option<f64>, StoreError>;
    fn transition(&self, prev: &str, next: &str) -> Result<Option<f64>, StoreError>;

    /// The unit maximizing `emission(unit, pronunciation) + transition(prev, unit)`
    /// among units that have both rows.
    fn best_next(
        &self,
        prev: &str,
        pronunciation: &str,
    ) -> Result<Option<Candidate>, StoreError>;

    /// Up to `limit` units maximizing `emission(unit, pronunciation) + initial(unit)`,
    /// best first.
    fn top_initial_candidates(
        &self,
        pronunciation: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, StoreError>;
}
