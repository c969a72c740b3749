//! Character-level classification for Chinese text and pinyin syllables.

/// CJK Unified Ideographs block (U+4E00..U+9FFF). Extension blocks are not
/// accepted: training only learns from the common-use block.
pub fn is_hanzi(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// True when `text` is non-empty and every character is a hanzi.
pub fn is_pure_hanzi(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_hanzi)
}

/// Normalize one typed syllable to the spelling used in emission keys.
///
/// Lowercases, maps the keyboard spelling `v` to `ü`, and strips a trailing
/// tone number (1-5). Returns `None` when nothing is left.
pub fn normalize_syllable(raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    let trimmed = lower.trim_end_matches(|c: char| ('1'..='5').contains(&c));
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().map(|c| if c == 'v' { 'ü' } else { c }).collect())
}

/// Split pinyin text into normalized syllable tokens.
pub fn tokenize_pinyin(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(normalize_syllable)
        .collect()
}
