//! Format converters
//!
//! This module contains converters from source notation formats into the
//! score model.

pub mod tablature;

// Re-export for convenience
pub use tablature::{
    convert_document,
    ConversionError,
    ConversionResult,
    ConversionSettings,
    ConversionStatus,
    SkippedElement,
};
