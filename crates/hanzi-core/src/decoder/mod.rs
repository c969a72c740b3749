//! Pinyin-to-hanzi decoding by greedy, longest-span-first search.
//!
//! At each position the search tries the longest span of syllables first and
//! asks the store for units matching that span: the top few sentence-initial
//! units when there is no previous unit, otherwise the single best successor
//! of the previous unit. A span with exactly one candidate, or with a
//! candidate of score 0, stops the search from trying shorter spans. Each
//! level keeps only its best-scoring completion, so alternatives are never
//! revisited once a level has chosen.
//!
//! When no span yields a completion after a previous unit, the unit before it
//! retries the remainder with no previous unit, breaking the chain instead of
//! failing the whole input.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, debug_span};

use crate::settings::Settings;
use crate::store::{Candidate, ProbabilityStore, StoreError};
use crate::unicode::tokenize_pinyin;

pub const DEFAULT_MAX_UNIT_LEN: usize = 5;
pub const DEFAULT_INITIAL_CANDIDATES: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty pinyin input")]
    EmptyInput,

    #[error("no viable segmentation")]
    NoViableSegmentation,

    #[error("decode deadline exceeded")]
    DeadlineExceeded,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// One decoded unit and the syllables it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedUnit {
    pub unit: String,
    /// Space-joined syllables.
    pub pronunciation: String,
}

/// A complete decoding with its total log-probability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPath {
    pub units: Vec<DecodedUnit>,
    pub score: f64,
}

impl DecodedPath {
    /// Units concatenated without separators.
    pub fn text(&self) -> String {
        self.units.iter().map(|u| u.unit.as_str()).collect()
    }

    /// Units joined by `sep`, for showing the segmentation.
    pub fn segmented(&self, sep: &str) -> String {
        self.units
            .iter()
            .map(|u| u.unit.as_str())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

pub struct Decoder<'a, S: ProbabilityStore + ?Sized> {
    store: &'a S,
    max_unit_len: usize,
    initial_candidates: usize,
}

impl<'a, S: ProbabilityStore + ?Sized> Decoder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            max_unit_len: DEFAULT_MAX_UNIT_LEN,
            initial_candidates: DEFAULT_INITIAL_CANDIDATES,
        }
    }

    pub fn from_settings(store: &'a S, settings: &Settings) -> Self {
        Self::new(store)
            .with_max_unit_len(settings.max_unit_len())
            .with_initial_candidates(settings.decoder.initial_candidates)
    }

    /// Longest unit, in syllables (clamped to at least 1).
    pub fn with_max_unit_len(mut self, n: usize) -> Self {
        self.max_unit_len = n.max(1);
        self
    }

    /// Sentence-initial candidates explored per span (clamped to at least 1).
    pub fn with_initial_candidates(mut self, n: usize) -> Self {
        self.initial_candidates = n.max(1);
        self
    }

    pub fn max_unit_len(&self) -> usize {
        self.max_unit_len
    }

    /// Decode pinyin text to hanzi.
    ///
    /// Empty input and inputs with no viable segmentation both yield an empty
    /// string; only store failures are errors.
    pub fn decode(&self, input: &str) -> Result<String, DecodeError> {
        self.decode_with_deadline(input, None)
    }

    /// Like `decode`, aborting with `DeadlineExceeded` once `deadline` passes.
    pub fn decode_with_deadline(
        &self,
        input: &str,
        deadline: Option<Instant>,
    ) -> Result<String, DecodeError> {
        match self.decode_segments(input, deadline) {
            Ok(path) => Ok(path.text()),
            Err(DecodeError::EmptyInput) | Err(DecodeError::NoViableSegmentation) => {
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Decode and return the winning path. Unlike `decode`, empty input and
    /// failed searches are reported as `EmptyInput` / `NoViableSegmentation`.
    pub fn decode_segments(
        &self,
        input: &str,
        deadline: Option<Instant>,
    ) -> Result<DecodedPath, DecodeError> {
        let tokens = tokenize_pinyin(input);
        if tokens.is_empty() {
            debug!("empty pinyin input");
            return Err(DecodeError::EmptyInput);
        }
        self.decode_tokens(&tokens, deadline)
    }

    /// Decode already-normalized syllable tokens.
    pub fn decode_tokens(
        &self,
        tokens: &[String],
        deadline: Option<Instant>,
    ) -> Result<DecodedPath, DecodeError> {
        let _span = debug_span!("decode", tokens = tokens.len()).entered();
        if tokens.is_empty() {
            return Err(DecodeError::EmptyInput);
        }
        let mut search = Search {
            store: self.store,
            max_unit_len: self.max_unit_len,
            initial_candidates: self.initial_candidates,
            tokens,
            deadline,
            memo: HashMap::new(),
        };
        search.run()?;
        let result = search.path();
        debug!(
            found = result.is_some(),
            score = result.as_ref().map(|p| p.score),
            memo = search.memo.len()
        );
        result.ok_or(DecodeError::NoViableSegmentation)
    }
}

/// Winning first unit of the completion from one (offset, previous unit)
/// state, with the total score of that completion.
#[derive(Debug, Clone)]
struct Step {
    unit: String,
    span: usize,
    /// Whether the rest follows `unit` or restarts with no previous unit.
    chained: bool,
    score: f64,
}

/// One pending (offset, previous unit) state on the search stack.
struct Frame {
    offset: usize,
    prev: Option<String>,
    /// Span currently being tried, counting down to 1.
    span: usize,
    loaded: bool,
    candidates: Vec<Candidate>,
    /// Candidate whose completion is being resolved.
    next: usize,
    /// The chained completion of `candidates[next]` failed; the unchained
    /// one is being resolved.
    retry: bool,
    settled: bool,
    best: Option<Step>,
}

enum Progress {
    /// The frame needs this state resolved before it can continue.
    Need(usize, Option<String>),
    Done,
}

/// State of one top-level decode.
///
/// `memo` caches the outcome for each (offset, previous unit) pair; the
/// search is a pure function of that pair, so caching never changes the
/// result. `None` marks a position with no viable completion. Only the first
/// step of each completion is kept; full paths are rebuilt by following the
/// steps from the start.
///
/// Pending states live on an explicit stack, so input length is bounded by
/// memory rather than by the thread's stack.
struct Search<'s, S: ProbabilityStore + ?Sized> {
    store: &'s S,
    max_unit_len: usize,
    initial_candidates: usize,
    tokens: &'s [String],
    deadline: Option<Instant>,
    memo: HashMap<(usize, Option<String>), Option<Step>>,
}

impl<S: ProbabilityStore + ?Sized> Search<'_, S> {
    fn candidates(
        &self,
        prev: Option<&str>,
        pronunciation: &str,
    ) -> Result<Vec<Candidate>, StoreError> {
        match prev {
            None => self
                .store
                .top_initial_candidates(pronunciation, self.initial_candidates),
            Some(prev) => Ok(self
                .store
                .best_next(prev, pronunciation)?
                .into_iter()
                .collect()),
        }
    }

    fn frame(&self, offset: usize, prev: Option<String>) -> Frame {
        Frame {
            offset,
            prev,
            span: self.max_unit_len.min(self.tokens.len() - offset),
            loaded: false,
            candidates: Vec::new(),
            next: 0,
            retry: false,
            settled: false,
            best: None,
        }
    }

    /// Score of the best completion from `offset` after `prev`: `None` when
    /// not yet searched, `Some(None)` when there is none.
    fn resolved(&self, offset: usize, prev: Option<&str>) -> Option<Option<f64>> {
        if offset == self.tokens.len() {
            return Some(Some(0.0));
        }
        self.memo
            .get(&(offset, prev.map(str::to_string)))
            .map(|step| step.as_ref().map(|s| s.score))
    }

    /// Search every state reachable from the start of the input.
    fn run(&mut self) -> Result<(), DecodeError> {
        let mut stack = vec![self.frame(0, None)];
        while let Some(frame) = stack.last_mut() {
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(DecodeError::DeadlineExceeded);
            }
            match self.advance(frame)? {
                Progress::Need(offset, prev) => {
                    let child = self.frame(offset, prev);
                    stack.push(child);
                }
                Progress::Done => {
                    if let Some(done) = stack.pop() {
                        self.memo.insert((done.offset, done.prev), done.best);
                    }
                }
            }
        }
        Ok(())
    }

    /// Drive `frame` until it needs an unresolved state or has tried every
    /// span it is allowed to.
    fn advance(&self, frame: &mut Frame) -> Result<Progress, DecodeError> {
        loop {
            if let Some(candidate) = frame.candidates.get(frame.next) {
                let offset = frame.offset + frame.span;
                let prev = (!frame.retry).then_some(candidate.unit.as_str());
                match self.resolved(offset, prev) {
                    None => return Ok(Progress::Need(offset, prev.map(str::to_string))),
                    Some(Some(rest)) => {
                        let score = candidate.score + rest;
                        // Strictly greater: the earliest recorded path wins ties.
                        if frame.best.as_ref().map_or(true, |b| score > b.score) {
                            frame.best = Some(Step {
                                unit: candidate.unit.clone(),
                                span: frame.span,
                                chained: !frame.retry,
                                score,
                            });
                        }
                        frame.next += 1;
                        frame.retry = false;
                    }
                    // Break the chain: continue as if starting a new sentence.
                    Some(None) if !frame.retry => frame.retry = true,
                    Some(None) => {
                        frame.next += 1;
                        frame.retry = false;
                    }
                }
                continue;
            }

            if frame.loaded {
                if frame.settled || frame.span == 1 {
                    return Ok(Progress::Done);
                }
                frame.span -= 1;
            }
            let pronunciation = self.tokens[frame.offset..frame.offset + frame.span].join(" ");
            frame.candidates = self.candidates(frame.prev.as_deref(), &pronunciation)?;
            frame.settled = frame.candidates.len() == 1
                || frame.candidates.iter().any(|c| c.score == 0.0);
            frame.loaded = true;
            frame.next = 0;
        }
    }

    /// Rebuild the winning path by following memoized steps from the start.
    fn path(&self) -> Option<DecodedPath> {
        let score = self.memo.get(&(0, None))?.as_ref()?.score;
        let mut units = Vec::new();
        let mut offset = 0;
        let mut prev: Option<String> = None;
        while offset < self.tokens.len() {
            let step = self.memo.get(&(offset, prev))?.as_ref()?;
            units.push(DecodedUnit {
                unit: step.unit.clone(),
                pronunciation: self.tokens[offset..offset + step.span].join(" "),
            });
            offset += step.span;
            prev = step.chained.then(|| step.unit.clone());
        }
        Some(DecodedPath { units, score })
    }
}
