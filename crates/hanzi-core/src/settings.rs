//! Engine settings loaded from TOML.
//!
//! - `Settings::default()` parses the embedded `default_settings.toml`
//! - `Settings::from_toml(content)` parses and validates a user file
//!
//! Settings are owned by the caller (usually the engine) rather than held in
//! a process-wide singleton, so two engines with different unit lengths can
//! coexist.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Granularity of the units the model learns and decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelMode {
    /// Units are segmented words of up to `max_word_len` characters.
    Word,
    /// Units are single characters.
    Char,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub model: ModelSettings,
    pub decoder: DecoderSettings,
    pub trainer: TrainerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    pub mode: ModelMode,
    pub max_word_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecoderSettings {
    pub initial_candidates: usize,
    pub deadline_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainerSettings {
    pub log_interval: usize,
}

impl Default for Settings {
    fn default() -> Self {
        // Embedded TOML is validated by build.rs and by `parse_default_toml`.
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("default settings TOML must be valid")
    }
}

impl Settings {
    pub fn from_toml(toml_str: &str) -> Result<Self, SettingsError> {
        parse_settings_toml(toml_str)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        parse_settings_toml(&content)
    }

    /// Longest unit (in syllables) the decoder tries, per model mode.
    pub fn max_unit_len(&self) -> usize {
        match self.model.mode {
            ModelMode::Word => self.model.max_word_len,
            ModelMode::Char => 1,
        }
    }

    /// Per-call decode deadline, if one is configured.
    pub fn decode_timeout(&self) -> Option<Duration> {
        (self.decoder.deadline_ms > 0).then(|| Duration::from_millis(self.decoder.deadline_ms))
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive_usize!(model.max_word_len);
    check_positive_usize!(decoder.initial_candidates);
    check_positive_usize!(trainer.log_interval);

    Ok(())
}
