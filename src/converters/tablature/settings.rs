//! Conversion settings
//!
//! Settings can be built in code, deserialized from a JS object, or loaded
//! from YAML:
//!
//! ```yaml
//! default_tuning: [38, 45, 50, 55, 59, 64]
//! convert_lyrics: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::SettingsError;

/// Standard six-string guitar tuning, lowest string first
pub const STANDARD_TUNING: [i32; 6] = [40, 45, 50, 55, 59, 64];

pub const DEFAULT_FRET_COUNT: i32 = 24;

/// Configuration options for conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    /// Tuning for single-staff tracks without a usable tuning of their own
    pub default_tuning: Vec<i32>,

    /// Fret count used together with `default_tuning`
    pub default_fret_count: i32,

    /// Whether to attach lyric syllables to chords
    pub convert_lyrics: bool,

    /// Whether to place chord diagrams
    pub convert_fret_diagrams: bool,

    /// Whether to place tempo markers from tempo automation
    pub convert_tempo_map: bool,

    /// Whether to place fermatas
    pub convert_fermatas: bool,

    /// Whether to connect slides and hammer-ons to the following chord
    pub connect_slides: bool,

    /// Whether to reset drum channel programs after conversion
    pub reset_drum_programs: bool,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            default_tuning: STANDARD_TUNING.to_vec(),
            default_fret_count: DEFAULT_FRET_COUNT,
            convert_lyrics: true,
            convert_fret_diagrams: true,
            convert_tempo_map: true,
            convert_fermatas: true,
            connect_slides: true,
            reset_drum_programs: true,
        }
    }
}

impl ConversionSettings {
    /// Parse settings from YAML; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        let settings: ConversionSettings =
            serde_yaml::from_str(yaml).map_err(|e| SettingsError::Yaml(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.default_tuning.is_empty() {
            return Err(SettingsError::Invalid("default_tuning must not be empty".to_string()));
        }
        if self.default_fret_count <= 0 {
            return Err(SettingsError::Invalid(format!(
                "default_fret_count must be positive, got {}",
                self.default_fret_count
            )));
        }
        Ok(())
    }
}
