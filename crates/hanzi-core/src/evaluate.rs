//! Decoding accuracy over a list of known words.
//!
//! Each word is transliterated to its primary pinyin, decoded, and scored by
//! positional character matches against the expected word. Words are taken
//! either in file order or drawn at random over several seeded rounds.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::decoder::{DecodeError, Decoder};
use crate::store::ProbabilityStore;
use crate::text::{primary_pronunciation, Transliterator};
use crate::unicode::is_pure_hanzi;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AccuracyReport {
    /// Words decoded and scored.
    pub words: usize,
    /// Words skipped: non-hanzi or without a known reading.
    pub skipped: usize,
    /// Words decoded exactly.
    pub exact: usize,
    /// Sum over scored words of matched characters / word length.
    pub char_score: f64,
}

impl AccuracyReport {
    /// Mean per-character accuracy in `[0, 1]`; 0 when nothing was scored.
    pub fn accuracy(&self) -> f64 {
        if self.words == 0 {
            0.0
        } else {
            self.char_score / self.words as f64
        }
    }

    /// Add the counts of another run.
    pub fn absorb(&mut self, other: &AccuracyReport) {
        self.words += other.words;
        self.skipped += other.skipped;
        self.exact += other.exact;
        self.char_score += other.char_score;
    }

    pub fn exact_rate(&self) -> f64 {
        if self.words == 0 {
            0.0
        } else {
            self.exact as f64 / self.words as f64
        }
    }
}

/// Fraction of positions where `predicted` and `expected` carry the same
/// character, relative to the length of `expected`.
pub fn positional_match(predicted: &str, expected: &str) -> f64 {
    let len = expected.chars().count();
    if len == 0 {
        return 0.0;
    }
    let matched = predicted
        .chars()
        .zip(expected.chars())
        .filter(|(a, b)| a == b)
        .count();
    matched as f64 / len as f64
}

/// Score `words` against `decoder`, stopping after `limit` scored words.
pub fn evaluate<S, I>(
    decoder: &Decoder<'_, S>,
    transliterator: &dyn Transliterator,
    words: I,
    limit: Option<usize>,
) -> Result<AccuracyReport, EvalError>
where
    S: ProbabilityStore + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let _span = info_span!("evaluate").entered();
    let mut report = AccuracyReport::default();

    for word in words {
        if limit.is_some_and(|n| report.words >= n) {
            break;
        }
        let word = word.as_ref();
        let pinyin = match primary_pronunciation(transliterator, word) {
            Some(p) if is_pure_hanzi(word) => p,
            _ => {
                report.skipped += 1;
                continue;
            }
        };
        let predicted = decoder.decode(&pinyin)?;
        let score = positional_match(&predicted, word);
        debug!(word, %pinyin, %predicted, score);

        report.words += 1;
        report.char_score += score;
        if predicted == word {
            report.exact += 1;
        }
    }

    info!(
        words = report.words,
        skipped = report.skipped,
        exact = report.exact,
        accuracy = report.accuracy(),
        "evaluation done"
    );
    Ok(report)
}

/// Draw `rounds` samples of `size` words each, with replacement, from a
/// generator seeded with `seed`. Empty when `words` is.
pub fn sample_words<T: AsRef<str>>(
    words: &[T],
    size: usize,
    rounds: usize,
    seed: u64,
) -> Vec<Vec<&str>> {
    if words.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rounds)
        .map(|_| {
            (0..size)
                .map(|_| words[rng.gen_range(0..words.len())].as_ref())
                .collect()
        })
        .collect()
}

/// Score `rounds` random samples of `size` words and sum the results.
pub fn evaluate_rounds<S, T>(
    decoder: &Decoder<'_, S>,
    transliterator: &dyn Transliterator,
    words: &[T],
    size: usize,
    rounds: usize,
    seed: u64,
) -> Result<AccuracyReport, EvalError>
where
    S: ProbabilityStore + ?Sized,
    T: AsRef<str>,
{
    let mut total = AccuracyReport::default();
    for (round, sample) in sample_words(words, size, rounds, seed).iter().enumerate() {
        let report = evaluate(decoder, transliterator, sample, None)?;
        info!(round = round + 1, accuracy = report.accuracy(), "round done");
        total.absorb(&report);
    }
    Ok(total)
}

/// First whitespace-separated column of every non-blank line, so a dictionary
/// or a tagged corpus can serve as test data directly.
pub fn read_test_words(path: &Path) -> Result<Vec<String>, EvalError> {
    let reader = BufReader::new(File::open(path)?);
    let mut words = Vec::new();
    for line in reader.lines() {
        if let Some(word) = line?.split_whitespace().next() {
            words.push(word.to_string());
        }
    }
    Ok(words)
}
