
use std::path::Path;
use std::time::Instant;

use tracing::info;

use hanzi_core::corpus::{read_corpus, CorpusLine};
use hanzi_core::decoder::{DecodedPath, Decoder};
use hanzi_core::evaluate::{evaluate, evaluate_rounds, AccuracyReport};
use hanzi_core::settings::{ModelMode, Settings};
use hanzi_core::store::{MemoryStore, ProbabilityStore, StoreStats};
use hanzi_core::text::{CharSegmenter, Segmenter, Transliterator};
use hanzi_core::trainer::{TrainError, TrainSummary, Trainer};

use crate::EngineError;

/// A probability store plus everything needed to train and decode with it.
///
/// Training takes `&mut self` and decoding `&self`, so a trained engine can
/// be shared across threads for concurrent decoding.
pub struct Engine<S: ProbabilityStore = MemoryStore> {
    settings: Settings,
    segmenter: Box<dyn Segmenter>,
    transliterator: Box<dyn Transliterator>,
    store: S,
}

impl Engine<MemoryStore> {
    /// An engine with an empty in-memory store and default settings.
    pub fn new(segmenter: Box<dyn Segmenter>, transliterator: Box<dyn Transliterator>) -> Self {
        Self::with_store(MemoryStore::new(), segmenter, transliterator)
    }

    /// Load a store previously written by [`Engine::save`].
    pub fn open(
        path: &Path,
        segmenter: Box<dyn Segmenter>,
        transliterator: Box<dyn Transliterator>,
    ) -> Result<Self, EngineError> {
        let store = MemoryStore::open(path)?;
        info!(path = %path.display(), "store opened");
        Ok(Self::with_store(store, segmenter, transliterator))
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        self.store.save(path)?;
        info!(path = %path.display(), "store saved");
        Ok(())
    }
}

impl<S: ProbabilityStore> Engine<S> {
    pub fn with_store(
        store: S,
        segmenter: Box<dyn Segmenter>,
        transliterator: Box<dyn Transliterator>,
    ) -> Self {
        Self {
            settings: Settings::default(),
            segmenter,
            transliterator,
            store,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> Result<StoreStats, EngineError> {
        Ok(self.store.stats()?)
    }

    /// Train from a corpus file. Tables are appended to; call
    /// [`Engine::reset`] first to retrain from scratch.
    pub fn train(&mut self, path: &Path) -> Result<TrainSummary, EngineError> {
        let lines = read_corpus(path).map_err(TrainError::from)?;
        self.train_lines(&lines)
    }

    pub fn train_lines(&mut self, lines: &[CorpusLine]) -> Result<TrainSummary, EngineError> {
        // Character models never train on words, whatever the segmenter or
        // the corpus tags say.
        let segmenter: &dyn Segmenter = match self.settings.model.mode {
            ModelMode::Char => &CharSegmenter,
            ModelMode::Word => &*self.segmenter,
        };
        let trainer = Trainer::new(segmenter, &*self.transliterator)
            .with_log_interval(self.settings.trainer.log_interval)
            .with_max_unit_len(self.settings.max_unit_len());
        Ok(trainer.train(lines, &mut self.store)?)
    }

    /// Drop every learned table.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.store.reset()?;
        info!("store reset");
        Ok(())
    }

    pub fn decoder(&self) -> Decoder<'_, S> {
        Decoder::from_settings(&self.store, &self.settings)
    }

    /// Decode pinyin to hanzi; `""` when the input is empty or cannot be
    /// decoded. The configured `decoder.deadline_ms`, if any, applies.
    pub fn decode(&self, text: &str) -> Result<String, EngineError> {
        Ok(self
            .decoder()
            .decode_with_deadline(text, self.default_deadline())?)
    }

    /// Decode with an explicit deadline, overriding the configured one.
    pub fn decode_with_deadline(
        &self,
        text: &str,
        deadline: Instant,
    ) -> Result<String, EngineError> {
        Ok(self.decoder().decode_with_deadline(text, Some(deadline))?)
    }

    /// The winning units with their pronunciations and total score.
    pub fn decode_segments(&self, text: &str) -> Result<DecodedPath, EngineError> {
        Ok(self
            .decoder()
            .decode_segments(text, self.default_deadline())?)
    }

    /// Positional character accuracy of decoding `words` from their primary
    /// readings, over at most `limit` words.
    pub fn evaluate<I>(&self, words: I, limit: Option<usize>) -> Result<AccuracyReport, EngineError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Ok(evaluate(
            &self.decoder(),
            &*self.transliterator,
            words,
            limit,
        )?)
    }

    /// Accuracy summed over `rounds` seeded random samples of `size` words.
    pub fn evaluate_rounds<T: AsRef<str>>(
        &self,
        words: &[T],
        size: usize,
        rounds: usize,
        seed: u64,
    ) -> Result<AccuracyReport, EngineError> {
        Ok(evaluate_rounds(
            &self.decoder(),
            &*self.transliterator,
            words,
            size,
            rounds,
            seed,
        )?)
    }

    fn default_deadline(&self) -> Option<Instant> {
        self.settings
            .decode_timeout()
            .map(|timeout| Instant::now() + timeout)
    }
}
