//! Score elements: chords, rests, notes, ties, spanners, tuplets and the
//! items that live directly in segments

use serde::{Deserialize, Serialize};

use super::types::*;

// ============================================================================
// CHORD / REST
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chord {
    pub notes: Vec<NoteId>,
    pub note_type: NoteType,
    /// Leading grace chords, in playing order
    pub grace_notes: Vec<ChordRestId>,
    /// Position among the owner's grace chords
    pub grace_index: usize,
    /// Owning full chord of a grace chord
    pub parent: Option<ChordRestId>,
    pub articulations: Vec<Articulation>,
    pub arpeggio: Option<ArpeggioType>,
    pub tremolo: Option<TremoloType>,
    pub chord_lines: Vec<ChordLine>,
}

impl Chord {
    pub fn new() -> Self {
        Chord {
            notes: Vec::new(),
            note_type: NoteType::Normal,
            grace_notes: Vec::new(),
            grace_index: 0,
            parent: None,
            articulations: Vec::new(),
            arpeggio: None,
            tremolo: None,
            chord_lines: Vec::new(),
        }
    }
}

impl Default for Chord {
    fn default() -> Self {
        Self::new()
    }
}

/// Straight or wavy line before/after a note (fall, doit, scoop, plop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordLine {
    pub kind: ChordLineType,
    pub straight: bool,
    pub note: NoteId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChordRestKind {
    Chord(Chord),
    Rest,
    /// Repeat of the previous `span` measures; `position` is 1-based
    MeasureRepeat { span: u8, position: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordRest {
    pub kind: ChordRestKind,
    pub track: usize,
    /// Written duration, before any tuplet scaling
    pub duration: Fraction,
    pub duration_type: DurationType,
    pub dots: u8,
    /// Position in the score; set when attached to a segment
    pub tick: Fraction,
    /// Index of the owning measure once attached
    pub measure: Option<usize>,
    pub tuplet: Option<TupletId>,
    pub lyrics: Vec<String>,
}

impl ChordRest {
    pub fn new(kind: ChordRestKind, track: usize) -> Self {
        ChordRest {
            kind,
            track,
            duration: Fraction::new(1, 4),
            duration_type: DurationType::Quarter,
            dots: 0,
            tick: Fraction::new(0, 1),
            measure: None,
            tuplet: None,
            lyrics: Vec::new(),
        }
    }

    pub fn chord(track: usize) -> Self {
        Self::new(ChordRestKind::Chord(Chord::new()), track)
    }

    pub fn rest(track: usize) -> Self {
        Self::new(ChordRestKind::Rest, track)
    }

    pub fn is_chord(&self) -> bool {
        matches!(self.kind, ChordRestKind::Chord(_))
    }

    pub fn is_rest(&self) -> bool {
        matches!(self.kind, ChordRestKind::Rest)
    }

    pub fn as_chord(&self) -> Option<&Chord> {
        match &self.kind {
            ChordRestKind::Chord(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_chord_mut(&mut self) -> Option<&mut Chord> {
        match &mut self.kind {
            ChordRestKind::Chord(c) => Some(c),
            _ => None,
        }
    }

    /// Set written duration together with its note value
    pub fn set_duration(&mut self, duration: Fraction) {
        self.duration = duration;
        match DurationType::from_fraction(duration) {
            Some((ty, dots)) => {
                self.duration_type = ty;
                self.dots = dots;
            }
            None => {
                self.duration_type = DurationType::Measure;
                self.dots = 0;
            }
        }
    }
}

// ============================================================================
// NOTE
// ============================================================================

/// One point of a bend curve: `time` in percent of the note, `pitch` in
/// quarter tones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BendPoint {
    pub time: i32,
    pub pitch: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub chord: ChordRestId,
    pub pitch: i32,
    /// String index, 0 = highest-pitched string; -1 when not fretted
    pub string: i32,
    pub fret: i32,
    /// Sounding note; false for silent harmonic shadows
    pub play: bool,
    pub tie_for: Option<TieId>,
    pub tie_back: Option<TieId>,
    pub bend: Vec<BendPoint>,
    pub texts: Vec<String>,
    pub fingerings: Vec<String>,
    pub symbols: Vec<SymId>,
}

impl Note {
    pub fn new(chord: ChordRestId) -> Self {
        Note {
            chord,
            pitch: 60,
            string: -1,
            fret: -1,
            play: true,
            tie_for: None,
            tie_back: None,
            bend: Vec::new(),
            texts: Vec::new(),
            fingerings: Vec::new(),
            symbols: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tie {
    pub track: usize,
    pub start_note: Option<NoteId>,
    pub end_note: Option<NoteId>,
}

// ============================================================================
// SPANNERS / TUPLETS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpannerKind {
    Slur,
    LetRing,
    PalmMute,
    Vibrato(VibratoLine),
    Hairpin(HairpinType),
    /// Alternate-ending bracket; `endings` are the pass numbers it covers
    Volta { endings: Vec<i32>, text: String },
    Glissando { start_note: NoteId, end_note: NoteId },
}

impl SpannerKind {
    /// Short name used by reports and logs
    pub fn name(&self) -> &'static str {
        match self {
            SpannerKind::Slur => "slur",
            SpannerKind::LetRing => "let-ring",
            SpannerKind::PalmMute => "palm-mute",
            SpannerKind::Vibrato(_) => "vibrato",
            SpannerKind::Hairpin(_) => "hairpin",
            SpannerKind::Volta { .. } => "volta",
            SpannerKind::Glissando { .. } => "glissando",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spanner {
    pub kind: SpannerKind,
    pub tick: Fraction,
    pub tick2: Fraction,
    pub track: usize,
    pub track2: usize,
    pub start_element: Option<ChordRestId>,
    pub end_element: Option<ChordRestId>,
}

impl Spanner {
    /// Spanner starting and ending at `tick` on `track`
    pub fn new(kind: SpannerKind, tick: Fraction, track: usize) -> Self {
        Spanner {
            kind,
            tick,
            tick2: tick,
            track,
            track2: track,
            start_element: None,
            end_element: None,
        }
    }

    pub fn ticks(&self) -> Fraction {
        self.tick2 - self.tick
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuplet {
    pub track: usize,
    pub measure: usize,
    /// Note value the ratio counts in
    pub base_len: Fraction,
    /// (numerator, denominator): numerator notes in the time of denominator
    pub ratio: (i32, i32),
    /// Total length the tuplet occupies
    pub ticks: Fraction,
    pub elements: Vec<ChordRestId>,
}

impl Tuplet {
    /// Ratio as a fraction; a degenerate ratio reads as 1
    pub fn ratio_fraction(&self) -> Fraction {
        match self.ratio {
            (n, d) if n > 0 && d > 0 => Fraction::new(n, d),
            _ => Fraction::new(1, 1),
        }
    }
}

// ============================================================================
// SEGMENT ITEMS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FretDiagramItem {
    pub strings: i32,
    pub fret_offset: i32,
    pub markers: Vec<FretMarker>,
    /// (string, fret) pairs with a dot
    pub dots: Vec<(i32, i32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FretMarker {
    None,
    Cross,
    Circle,
}

/// Element placed directly in a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    ChordRest(ChordRestId),
    Clef(ClefKind),
    KeySig(i8),
    TimeSig { numerator: i32, denominator: i32 },
    StaffText(String),
    Text(String),
    RehearsalMark(String),
    Symbol(SymId),
    Dynamic(DynamicLevel),
    TempoText { tempo: f64, text: String },
    Fermata { sym: SymId, time_stretch: f32 },
    FretDiagram(FretDiagramItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentItem {
    pub track: usize,
    pub element: Element,
}
