//! Models module for tablature import
//!
//! This module contains the read-only source document model handed to
//! the tablature converter: master bars, bars, voices, beats and notes,
//! plus the track and automation descriptions around them.

pub mod source;
pub mod track;

// Re-export commonly used types
pub use source::*;
pub use track::*;
