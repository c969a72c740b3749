use jieba_rs::Jieba;

use super::Segmenter;

/// Word segmenter backed by `jieba-rs` with its bundled dictionary.
pub struct JiebaSegmenter {
    jieba: Jieba,
}

impl Default for JiebaSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl JiebaSegmenter {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }
}

impl Segmenter for JiebaSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        self.jieba
            .cut(text, true)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
