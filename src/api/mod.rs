//! Tablature Import WASM API
//!
//! This module provides the JavaScript-facing API for the tablature importer.
//!
//! # Module Structure
//!
//! - `helpers`: Console logging macros, serialization and error conversion
//! - `import`: `importTablature` and `importTablatureJson`

pub mod helpers;
pub mod import;

pub use import::{import_tablature, import_tablature_json};
