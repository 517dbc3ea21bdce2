//! Tablature document to score converter
//!
//! This module converts a parsed tablature document (tracks, master bars,
//! bars, voices, beats, notes) into a [`Score`](crate::score::Score) of
//! measures, segments, chords, rests and spanners.
//!
//! # Overview
//!
//! The conversion is one synchronous pass:
//! 1. **Set up**: one part per source track, staves, tuning and MIDI channel
//! 2. **Walk**: master bars in order, then every bar, voice, beat and note
//! 3. **Finish**: tempo map, fermatas, slide/hammer-on connection, purge of
//!    unterminated ties and slurs
//!
//! # Features
//!
//! - Best-effort conversion (malformed input is skipped and reported, never fatal)
//! - Exact rational durations and tuplets
//! - Ties, slurs, let ring, palm mute, vibrato, hairpins and voltas
//! - Grace notes deferred until the beat that owns them
//! - Comprehensive error reporting with skipped elements
//!
//! # Basic Usage
//!
//! ```ignore
//! use tab_import_wasm::converters::tablature::{convert_document, ConversionSettings};
//!
//! let doc: SourceDocument = serde_json::from_str(json)?;
//! let result = convert_document(&doc, None)?;
//! println!("{} measures", result.score.measures.len());
//! ```

pub mod errors;
pub mod settings;
pub mod types;
pub mod duration;
pub mod pitch;
pub mod bend;
pub mod grace;
pub mod spanners;
pub mod converter;
pub mod tracks;
pub mod bar;
pub mod beat;
pub mod note;
pub mod finalize;

// Re-export main API
pub use converter::{validate_document, ConversionContext, TablatureConverter};
pub use errors::{ConversionError, SettingsError};
pub use settings::ConversionSettings;
pub use types::{ConversionResult, ConversionStats, ConversionStatus, SkippedElement};

use crate::models::SourceDocument;

/// Convert a tablature document to a score.
///
/// # Arguments
///
/// * `doc` - Source document, left untouched
/// * `settings` - Optional conversion settings (uses defaults if None)
///
/// # Returns
///
/// * `Ok(ConversionResult)` - Score with skip report; `Partial` if anything was dropped
/// * `Err(ConversionError)` - Invalid settings or a document the walk cannot process
pub fn convert_document(
    doc: &SourceDocument,
    settings: Option<ConversionSettings>,
) -> Result<ConversionResult, ConversionError> {
    let settings = settings.unwrap_or_default();
    settings.validate()?;
    validate_document(doc)?;

    log::info!(
        "tablature import: {} tracks, {} master bars",
        doc.tracks.len(),
        doc.master_bars.len()
    );

    let mut converter = TablatureConverter::new(doc, &settings);
    converter.run();
    Ok(converter.finish())
}
