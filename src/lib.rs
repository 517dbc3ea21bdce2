//! Tablature Import WASM Module
//!
//! Converts guitar tablature documents (tracks, master bars, beats and notes
//! with their playing techniques) into a notation score model. It runs in the
//! browser next to the editor module and natively for tests.

pub mod models;
pub mod score;
pub mod converters;
pub mod api;

// Re-export commonly used types
pub use converters::tablature::{convert_document, ConversionError, ConversionResult, ConversionSettings};
pub use models::SourceDocument;
pub use score::Score;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    init_logging();

    log::info!("Tablature import WASM module initialized");
}

#[cfg(feature = "console_log")]
fn init_logging() {
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        crate::wasm_warn!("logger already initialized: {}", e);
    }
}

#[cfg(not(feature = "console_log"))]
fn init_logging() {}
