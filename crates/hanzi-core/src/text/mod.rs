//! Text capabilities consumed by training and evaluation.
//!
//! Segmentation and transliteration are external concerns; the engine only
//! depends on the two traits here. `CharSegmenter` and
//! `TableTransliterator` are dependency-free implementations, the `jieba`
//! and `pinyin` features add dictionary-backed ones.

#[cfg(feature = "jieba")]
mod jieba;
#[cfg(feature = "pinyin")]
mod pinyin;
mod table;

#[cfg(feature = "jieba")]
pub use self::jieba::JiebaSegmenter;
#[cfg(feature = "pinyin")]
pub use self::pinyin::PinyinTransliterator;
pub use table::{TableError, TableTransliterator};

use crate::unicode::normalize_syllable;

/// Splits text into word units, in order.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Maps text to candidate syllables, one entry per character, most common
/// reading first. Characters without a known reading yield an empty entry.
pub trait Transliterator: Send + Sync {
    fn transliterate(&self, text: &str) -> Vec<Vec<String>>;
}

/// One unit per character: the segmentation of character-only models.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharSegmenter;

impl Segmenter for CharSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        text.chars().map(String::from).collect()
    }
}

/// Normalized, deduplicated candidate syllables per character of `text`.
///
/// Returns `None` unless every character has at least one usable reading,
/// so callers never build a pronunciation with a missing syllable.
pub fn syllables(translit: &dyn Transliterator, text: &str) -> Option<Vec<Vec<String>>> {
    let per_char = translit.transliterate(text);
    if per_char.len() != text.chars().count() {
        return None;
    }
    per_char
        .into_iter()
        .map(|candidates| {
            let mut normalized: Vec<String> = Vec::with_capacity(candidates.len());
            for c in candidates.iter().map(String::as_str).filter_map(normalize_syllable) {
                if !normalized.contains(&c) {
                    normalized.push(c);
                }
            }
            (!normalized.is_empty()).then_some(normalized)
        })
        .collect()
}

/// The space-joined primary reading of `text`, e.g. `"ni hao"` for 你好.
pub fn primary_pronunciation(translit: &dyn Transliterator, text: &str) -> Option<String> {
    let per_char = syllables(translit, text)?;
    Some(
        per_char
            .iter()
            .map(|candidates| candidates[0].as_str())
            .collect::<Vec<_>>()
            .join(" "),
    )
}
