use ::pinyin::ToPinyinMulti;

use super::Transliterator;

/// Transliterator backed by the `pinyin` crate's heteronym tables.
///
/// Readings are toneless (`plain`) to match typed input; the crate lists
/// the most frequent reading first.
#[derive(Debug, Default, Clone, Copy)]
pub struct PinyinTransliterator;

impl Transliterator for PinyinTransliterator {
    fn transliterate(&self, text: &str) -> Vec<Vec<String>> {
        text.to_pinyin_multi()
            .map(|multi| match multi {
                Some(multi) => {
                    let mut readings: Vec<String> = Vec::new();
                    for i in 0..multi.count() {
                        let plain = multi.get(i).plain().to_string();
                        // Tone variants collapse to the same plain reading.
                        if !readings.contains(&plain) {
                            readings.push(plain);
                        }
                    }
                    readings
                }
                None => Vec::new(),
            })
            .collect()
    }
}
