//! Tablature import for the WASM API
//!
//! Two entry points over the same conversion:
//! - `importTablature`: JS object in, JS object out
//! - `importTablatureJson`: JSON string in, JSON string out

use wasm_bindgen::prelude::*;

use crate::api::helpers::{deserialize, js_error, serialize};
use crate::converters::tablature::{convert_document, ConversionResult, ConversionSettings};
use crate::models::SourceDocument;
use crate::{wasm_info, wasm_log, wasm_warn};

fn report(result: &ConversionResult) {
    wasm_info!(
        "  Score built: {} measures, {} parts",
        result.score.measures.len(),
        result.score.parts.len()
    );
    if !result.skipped_elements.is_empty() {
        wasm_warn!("  Skipped {} elements during conversion", result.skipped_elements.len());
        for skipped in &result.skipped_elements {
            wasm_log!(
                "    {} (bar {:?}, track {:?}): {}",
                skipped.element_type,
                skipped.measure_index,
                skipped.track,
                skipped.reason
            );
        }
    }
}

/// Import a tablature document given as a JS object
///
/// # Parameters
/// * `document` - Source document (`tracks`, `master_tracks`, `master_bars`)
/// * `settings` - Optional conversion settings; `undefined`/`null` uses defaults
///
/// # Returns
/// Conversion result object: score, skipped elements, status and stats
#[wasm_bindgen(js_name = importTablature)]
pub fn import_tablature(document: JsValue, settings: JsValue) -> Result<JsValue, JsValue> {
    wasm_info!("importTablature called");

    let doc: SourceDocument = deserialize(document, "Document deserialization error")?;
    let settings: Option<ConversionSettings> = if settings.is_undefined() || settings.is_null() {
        None
    } else {
        Some(deserialize(settings, "Settings deserialization error")?)
    };

    let result = convert_document(&doc, settings).map_err(|e| js_error("Conversion error", e))?;
    report(&result);

    let value = serialize(&result, "Result serialization error")?;
    wasm_info!("importTablature completed successfully");
    Ok(value)
}

/// Import a tablature document given as JSON
///
/// # Parameters
/// * `json` - Source document as JSON
/// * `settings_json` - Optional settings as JSON
///
/// # Returns
/// Conversion result as JSON
#[wasm_bindgen(js_name = importTablatureJson)]
pub fn import_tablature_json(json: String, settings_json: Option<String>) -> Result<String, JsValue> {
    wasm_info!("importTablatureJson called ({} bytes)", json.len());

    let doc: SourceDocument =
        serde_json::from_str(&json).map_err(|e| js_error("Document JSON parse error", e))?;
    let settings = match settings_json {
        Some(s) => Some(
            serde_json::from_str::<ConversionSettings>(&s).map_err(|e| js_error("Settings parse error", e))?,
        ),
        None => None,
    };

    let result = convert_document(&doc, settings).map_err(|e| js_error("Conversion error", e))?;
    report(&result);

    let out = serde_json::to_string(&result).map_err(|e| js_error("Result serialization error", e))?;
    wasm_info!("importTablatureJson completed successfully");
    Ok(out)
}
