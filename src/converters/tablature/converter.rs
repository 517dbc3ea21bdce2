//! Converter state and the top-level walk
//!
//! One [`TablatureConverter`] converts one document. All cross-node state
//! lives in its fields and is dropped with it:
//!
//! ```text
//! run()
//! ├── set_up_tracks          (tracks.rs)
//! ├── collect_tempo_map
//! ├── convert_master_bar*    (bar.rs)
//! │   └── convert_bar → convert_voice → convert_beat (beat.rs)
//! │                                     └── convert_note (note.rs)
//! └── post passes            (finalize.rs)
//!     ├── tempo map, fermatas, slide/hammer-on connection
//!     ├── unterminated ties and slurs
//!     └── drum program reset
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::models::*;
use crate::score::*;

use super::errors::ConversionError;
use super::settings::ConversionSettings;
use super::spanners::{HairpinTracker, RunTracker, SlurTracker, TieTracker, TupletTracker};
use super::types::{ConversionResult, ConversionStats, ConversionStatus, SkippedElement};

/// Position of the walk: master bar, track and tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub master_bar: usize,
    pub measure: usize,
    pub track: usize,
    pub tick: Fraction,
}

/// Report collected while converting
#[derive(Debug, Default)]
pub struct ConversionContext {
    pub current_measure: Option<usize>,
    pub current_track: Option<usize>,
    pub skipped_elements: Vec<SkippedElement>,
    pub stats: ConversionStats,
}

impl ConversionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_skipped(&mut self, element_type: &str, reason: &str) {
        self.skipped_elements.push(SkippedElement {
            element_type: element_type.to_string(),
            measure_index: self.current_measure,
            track: self.current_track,
            reason: reason.to_string(),
        });
    }
}

/// Kind of a pending continuous line registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Slide,
    LegatoSlide,
    HammerOn,
}

/// Slide or hammer-on waiting to be connected to the next chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuousLink {
    pub kind: LinkKind,
    pub note: NoteId,
}

pub struct TablatureConverter<'a> {
    pub(super) doc: &'a SourceDocument,
    pub(super) settings: &'a ConversionSettings,
    pub(super) score: Score,
    pub(super) context: ConversionContext,

    // last-seen values
    pub(super) last_time_sig: Option<TimeSig>,
    pub(super) last_key_sigs: HashMap<usize, KeySig>,
    pub(super) last_clefs: HashMap<usize, ClefType>,
    pub(super) last_dynamics: HashMap<usize, DynamicType>,
    pub(super) last_triplet_feel: TripletFeel,
    pub(super) last_diagram: Option<i32>,
    pub(super) last_volta: Option<SpannerId>,

    // running spanners
    pub(super) ties: TieTracker,
    pub(super) slurs: SlurTracker,
    pub(super) let_rings: RunTracker,
    pub(super) palm_mutes: RunTracker,
    pub(super) vibratos: RunTracker,
    pub(super) tuplets: TupletTracker,
    pub(super) hairpins: HairpinTracker,

    // collected for the post passes
    pub(super) tempo_events: BTreeMap<usize, Vec<TempoAutomation>>,
    pub(super) fermatas: Vec<(usize, Fermata)>,
    pub(super) links: Vec<ContinuousLink>,
}

impl<'a> TablatureConverter<'a> {
    pub fn new(doc: &'a SourceDocument, settings: &'a ConversionSettings) -> Self {
        TablatureConverter {
            doc,
            settings,
            score: Score::new(),
            context: ConversionContext::new(),
            last_time_sig: None,
            last_key_sigs: HashMap::new(),
            last_clefs: HashMap::new(),
            last_dynamics: HashMap::new(),
            last_triplet_feel: TripletFeel::None,
            last_diagram: None,
            last_volta: None,
            ties: TieTracker::new(),
            slurs: SlurTracker::new(),
            let_rings: RunTracker::new(),
            palm_mutes: RunTracker::new(),
            vibratos: RunTracker::new(),
            tuplets: TupletTracker::new(),
            hairpins: HairpinTracker::new(),
            tempo_events: BTreeMap::new(),
            fermatas: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Walk the whole document
    pub fn run(&mut self) {
        self.set_up_tracks();
        self.collect_tempo_map();

        let doc = self.doc;
        for (idx, master_bar) in doc.master_bars.iter().enumerate() {
            self.convert_master_bar(idx, master_bar);
        }
        self.context.current_measure = None;
        self.context.current_track = None;

        if self.settings.convert_tempo_map {
            self.add_tempo_map();
        }
        if self.settings.convert_fermatas {
            self.add_fermatas();
        }
        if self.settings.connect_slides {
            self.add_continuous_slide_hammer_on();
        } else {
            self.links.clear();
        }
        self.clear_defective_spanners();
        if self.settings.reset_drum_programs {
            self.reset_drum_programs();
        }
    }

    pub fn finish(self) -> ConversionResult {
        let mut stats = self.context.stats;
        stats.measures = self.score.measures.len();
        stats.chord_rests = self.score.chord_rests().count();

        let status = if self.context.skipped_elements.is_empty() {
            ConversionStatus::Complete
        } else {
            ConversionStatus::Partial
        };

        log::info!(
            "tablature import: {} measures, {} chords/rests, {} skipped",
            stats.measures,
            stats.chord_rests,
            self.context.skipped_elements.len()
        );

        ConversionResult {
            score: self.score,
            skipped_elements: self.context.skipped_elements,
            status,
            stats,
        }
    }

    fn collect_tempo_map(&mut self) {
        for event in &self.doc.master_tracks.tempo {
            self.tempo_events.entry(event.bar).or_default().push(*event);
        }
    }

    // ========================================================================
    // SHARED HELPERS
    // ========================================================================

    /// Source track index of the part playing `track`
    pub(super) fn source_track_of(&self, track: usize) -> Option<usize> {
        self.score.part_of_track(track).map(|p| p.id)
    }

    pub(super) fn skip_at(&mut self, cursor: &Cursor, element_type: &str, reason: &str) {
        self.context.current_measure = Some(cursor.master_bar);
        self.context.current_track = Some(cursor.track);
        self.context.add_skipped(element_type, reason);
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Reject documents the walk cannot process
pub fn validate_document(doc: &SourceDocument) -> Result<(), ConversionError> {
    let staves = doc.staff_count();
    for (idx, mb) in doc.master_bars.iter().enumerate() {
        let sig = mb.time_sig;
        if sig.numerator <= 0 || sig.denominator <= 0 {
            return Err(ConversionError::InvalidDocument(format!(
                "master bar {} has time signature {}/{}",
                idx, sig.numerator, sig.denominator
            )));
        }
        if mb.bars.len() > staves {
            return Err(ConversionError::InvalidDocument(format!(
                "master bar {} has {} bars but the tracks declare {} staves",
                idx,
                mb.bars.len(),
                staves
            )));
        }
        if mb.bars.is_empty() && staves > 0 {
            return Err(ConversionError::InvalidDocument(format!(
                "master bar {} has no bars",
                idx
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(bars: usize, staves: usize, sig: TimeSig) -> SourceDocument {
        SourceDocument {
            tracks: vec![SourceTrack { staff_count: staves, ..Default::default() }],
            master_tracks: MasterTracks::default(),
            master_bars: vec![MasterBar {
                time_sig: sig,
                bars: vec![Bar::default(); bars],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_validate_accepts_plain_document() {
        assert!(validate_document(&doc_with(1, 1, TimeSig::default())).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_time_signature() {
        let doc = doc_with(1, 1, TimeSig { numerator: 4, denominator: 0 });
        assert!(matches!(validate_document(&doc), Err(ConversionError::InvalidDocument(_))));
    }

    #[test]
    fn test_validate_rejects_extra_bars() {
        let doc = doc_with(3, 2, TimeSig::default());
        assert!(matches!(validate_document(&doc), Err(ConversionError::InvalidDocument(_))));
    }

    #[test]
    fn test_validate_rejects_empty_master_bar() {
        let doc = doc_with(0, 1, TimeSig::default());
        assert!(validate_document(&doc).is_err());
    }

    #[test]
    fn test_context_records_position() {
        let mut ctx = ConversionContext::new();
        ctx.current_measure = Some(2);
        ctx.current_track = Some(4);
        ctx.add_skipped("grace-rest", "grace rests are dropped");
        assert_eq!(ctx.skipped_elements[0].measure_index, Some(2));
        assert_eq!(ctx.skipped_elements[0].track, Some(4));
    }
}
