//! Score module: the target document built by the importers
//!
//! Measures, segments, chords, rests, notes, ties, spanners and tuplets,
//! plus the parts/staves/instruments they are played on.

pub mod document;
pub mod elements;
pub mod instrument;
pub mod types;

pub use document::{Measure, Score, ScoreError, Segment, SegmentType};
pub use elements::*;
pub use instrument::*;
pub use types::*;
