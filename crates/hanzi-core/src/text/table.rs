use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::Transliterator;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("[readings] table is empty")]
    Empty,
    #[error("key must be a single character: {0}")]
    InvalidKey(String),
    #[error("no readings for key: {0}")]
    EmptyReadings(String),
}

#[derive(Deserialize)]
struct ReadingTable {
    readings: BTreeMap<String, Vec<String>>,
}

/// Transliterator driven by an explicit character → readings table.
///
/// TOML form:
///
/// ```toml
/// [readings]
/// "你" = ["ni"]
/// "行" = ["xing", "hang"]
/// ```
#[derive(Debug, Default, Clone)]
pub struct TableTransliterator {
    readings: HashMap<char, Vec<String>>,
}

impl TableTransliterator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (char, Vec<S>)>,
        S: Into<String>,
    {
        let mut t = Self::new();
        for (c, readings) in pairs {
            t.insert(c, readings.into_iter().map(Into::into).collect());
        }
        t
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, TableError> {
        let table: ReadingTable =
            toml::from_str(toml_str).map_err(|e| TableError::Parse(e.to_string()))?;
        if table.readings.is_empty() {
            return Err(TableError::Empty);
        }

        let mut t = Self::new();
        for (key, readings) in table.readings {
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(TableError::InvalidKey(key));
            };
            if readings.is_empty() {
                return Err(TableError::EmptyReadings(key));
            }
            t.insert(c, readings);
        }
        Ok(t)
    }

    pub fn from_file(path: &Path) -> Result<Self, TableError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Append readings for `c`, keeping earlier ones first.
    pub fn insert(&mut self, c: char, readings: Vec<String>) {
        let entry = self.readings.entry(c).or_default();
        for r in readings {
            if !entry.contains(&r) {
                entry.push(r);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl Transliterator for TableTransliterator {
    fn transliterate(&self, text: &str) -> Vec<Vec<String>> {
        text.chars()
            .map(|c| self.readings.get(&c).cloned().unwrap_or_default())
            .collect()
    }
}
