//! Result and report types for tablature import

use serde::{Deserialize, Serialize};

use crate::score::Score;

/// Result of a conversion with its skip report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Converted score (complete, or with the skipped parts left out)
    pub score: Score,

    /// List of elements that couldn't be converted
    pub skipped_elements: Vec<SkippedElement>,

    pub status: ConversionStatus,

    pub stats: ConversionStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionStatus {
    Complete,
    /// At least one element was skipped or purged
    Partial,
}

/// Counters of defective-input recovery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub measures: usize,
    pub chord_rests: usize,
    pub purged_grace_chords: usize,
    pub discarded_ties: usize,
    pub discarded_slurs: usize,
}

/// Information about a skipped/unsupported element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedElement {
    /// Element kind (e.g., "grace-rest", "tie")
    pub element_type: String,

    /// Master bar index where the element appears (if in measure context)
    pub measure_index: Option<usize>,

    /// Track where the element appears (if in track context)
    pub track: Option<usize>,

    /// Human-readable explanation of why skipped
    pub reason: String,
}
