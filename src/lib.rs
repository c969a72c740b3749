//! Pinyin-to-hanzi decoding engine.
//!
//! [`Engine`] owns a probability store together with the settings and text
//! capabilities used to fill it, and decodes pinyin against it. The
//! statistical pieces live in `hanzi_core` and are re-exported here.

mod engine;
mod error;
pub mod trace_init;

pub use engine::Engine;
pub use error::EngineError;

pub use hanzi_core::corpus::{CorpusLine, DataKind};
pub use hanzi_core::decoder::{DecodeError, DecodedPath, DecodedUnit};
pub use hanzi_core::evaluate::AccuracyReport;
pub use hanzi_core::settings::{ModelMode, Settings};
pub use hanzi_core::store::{MemoryStore, ProbabilityStore, StoreStats};
pub use hanzi_core::text::{CharSegmenter, Segmenter, TableTransliterator, Transliterator};
pub use hanzi_core::trainer::TrainSummary;

pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
