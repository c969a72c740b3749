use std::path::Path;
use std::process;

use hanzi_core::settings::{ModelMode, Settings};
use hanzi_core::text::{
    CharSegmenter, JiebaSegmenter, PinyinTransliterator, Segmenter, TableTransliterator,
    Transliterator,
};
use hanzi_engine::Engine;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub mod config_ops;
pub mod decode_ops;
pub mod eval_ops;
pub mod train_ops;

/// Options shared by every command that touches a model.
#[derive(Debug, Default, Clone)]
pub struct ModelOptions {
    /// Settings TOML; built-in defaults when absent.
    pub config: Option<String>,
    /// Character table TOML replacing the `pinyin` crate readings.
    pub readings: Option<String>,
    pub mode: Option<ModelMode>,
    pub word_len: Option<usize>,
}

impl ModelOptions {
    pub fn settings(&self) -> Settings {
        let mut settings = match &self.config {
            Some(path) => die!(
                Settings::from_file(Path::new(path)),
                "Error loading settings {path}: {}"
            ),
            None => Settings::default(),
        };
        if let Some(mode) = self.mode {
            settings.model.mode = mode;
        }
        if let Some(n) = self.word_len {
            if n == 0 {
                eprintln!("Error: --word-len must be > 0");
                process::exit(1);
            }
            settings.model.max_word_len = n;
        }
        settings
    }

    pub fn transliterator(&self) -> Box<dyn Transliterator> {
        match &self.readings {
            Some(path) => Box::new(die!(
                TableTransliterator::from_file(Path::new(path)),
                "Error loading readings {path}: {}"
            )),
            None => Box::new(PinyinTransliterator),
        }
    }

    /// Word models segment sentences with jieba; decoding never segments,
    /// so the dictionary is only loaded when training.
    pub fn segmenter(&self, settings: &Settings, training: bool) -> Box<dyn Segmenter> {
        if training && settings.model.mode == ModelMode::Word {
            Box::new(JiebaSegmenter::new())
        } else {
            Box::new(CharSegmenter)
        }
    }

    /// Open a saved store with these options applied.
    pub fn open_engine(&self, store: &str) -> Engine {
        let settings = self.settings();
        let segmenter = self.segmenter(&settings, false);
        let engine = die!(
            Engine::open(Path::new(store), segmenter, self.transliterator()),
            "Error opening store {store}: {}"
        );
        engine.with_settings(settings)
    }
}
