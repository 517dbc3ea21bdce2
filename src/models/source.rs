//! Source document model (read-only import input)
//!
//! A tablature document arrives as a tree of master bars, each holding one
//! bar per staff, each bar holding voices of beats, each beat holding notes:
//!
//! ```text
//! SourceDocument
//! ├── tracks          (instrument, tuning, diagrams)
//! ├── master_tracks   (tempo automation)
//! └── master_bars
//!     └── MasterBar   (time/key signature, repeats, voltas, markers, fermatas)
//!         └── Bar     (one per staff: clef, simile mark)
//!             └── Voice
//!                 └── Beat   (rhythm, grace class, per-beat attributes)
//!                     └── Note   (pitch descriptor, tie phase, effects)
//! ```
//!
//! The converter never mutates this tree. Every type deserializes with
//! defaults for missing fields, so a JSON document only has to spell out
//! what is actually present.

use serde::{Deserialize, Serialize};

use super::track::{MasterTracks, SourceTrack};

/// Marker used throughout the source format for "no value"
pub const UNSET: i32 = -1;

fn unset() -> i32 {
    UNSET
}

/// Complete source document handed to the converter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDocument {
    /// Tracks in source index order
    pub tracks: Vec<SourceTrack>,

    /// Document-wide automation (tempo changes)
    pub master_tracks: MasterTracks,

    /// One entry per measure across all tracks
    pub master_bars: Vec<MasterBar>,
}

impl SourceDocument {
    /// Total number of staves declared by all tracks
    pub fn staff_count(&self) -> usize {
        self.tracks.iter().map(|t| t.staff_count).sum()
    }

    /// Look up a track by its source index
    pub fn track(&self, idx: usize) -> Option<&SourceTrack> {
        self.tracks.iter().find(|t| t.idx == idx)
    }
}

// ============================================================================
// MASTER BAR
// ============================================================================

/// Time signature as written (not reduced: 2/2 stays 2/2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSig {
    pub numerator: i32,
    pub denominator: i32,
}

impl Default for TimeSig {
    fn default() -> Self {
        TimeSig { numerator: 4, denominator: 4 }
    }
}

/// Key signature on the circle of fifths
#[repr(i8)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    serde_repr::Serialize_repr, serde_repr::Deserialize_repr,
)]
pub enum KeySig {
    CFlat = -7,
    GFlat = -6,
    DFlat = -5,
    AFlat = -4,
    EFlat = -3,
    BFlat = -2,
    F = -1,
    #[default]
    C = 0,
    G = 1,
    D = 2,
    A = 3,
    E = 4,
    B = 5,
    FSharp = 6,
    CSharp = 7,
}

impl KeySig {
    /// Number of sharps (positive) or flats (negative)
    pub fn fifths(self) -> i8 {
        self as i8
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatType {
    #[default]
    None,
    Start,
    End,
    StartEnd,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repeat {
    #[serde(rename = "type")]
    pub kind: RepeatType,
    pub count: i32,
}

/// Navigation markers of a master bar
///
/// `jump` holds names like `DaCapoAlFine`, `target` names like `Segno`,
/// `Coda` or `Fine`. Empty strings mean "no marker".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Direction {
    pub jump: String,
    pub target: String,
}

/// Rehearsal section: a letter and a free-form title, both optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub letter: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripletFeel {
    #[default]
    None,
    Triplet8th,
    Triplet16th,
    Dotted8th,
    Dotted16th,
    Scottish8th,
    Scottish16th,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FermataType {
    #[default]
    Medium,
    Short,
    Long,
}

/// Fermata placed inside a master bar at a fractional offset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fermata {
    #[serde(rename = "type")]
    pub kind: FermataType,
    /// Stretch parameter as stored by the source format
    pub length: f32,
    /// Offset numerator (whole-note fraction from measure start)
    pub offset_numerator: i32,
    pub offset_denominator: i32,
}

impl Default for Fermata {
    fn default() -> Self {
        Fermata {
            kind: FermataType::Medium,
            length: 0.0,
            offset_numerator: 0,
            offset_denominator: 1,
        }
    }
}

/// One measure across all tracks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterBar {
    pub time_sig: TimeSig,
    pub key_sig: KeySig,
    pub repeat: Repeat,
    /// Ending numbers of the volta this measure belongs to (empty = none)
    pub alternate_endings: Vec<i32>,
    pub direction: Direction,
    pub section: Section,
    pub triplet_feel: TripletFeel,
    pub fermatas: Vec<Fermata>,
    /// One bar per staff, in staff order
    pub bars: Vec<Bar>,
}

// ============================================================================
// BAR / VOICE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClefType {
    #[default]
    G2,
    F4,
    C3,
    C4,
    Neutral,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OttavaType {
    #[default]
    Regular,
    Va8,
    Vb8,
    Ma15,
    Mb15,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clef {
    #[serde(rename = "type")]
    pub kind: ClefType,
    pub ottava: OttavaType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimileMark {
    #[default]
    None,
    Simple,
    FirstOfDouble,
    SecondOfDouble,
}

/// One staff's content within a master bar
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bar {
    pub clef: Clef,
    pub simile_mark: SimileMark,
    pub voices: Vec<Voice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Voice {
    pub beats: Vec<Beat>,
}

// ============================================================================
// BEAT
// ============================================================================

/// Written note value of a beat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RhythmUnit {
    Whole,
    Half,
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rhythm {
    pub unit: RhythmUnit,
    pub dots: u8,
}

/// Grace classification of a beat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraceNotes {
    #[default]
    None,
    /// Played on the beat, borrowing time from the following chord
    OnBeat,
    /// Played before the beat
    BeforeBeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DynamicType {
    PPP,
    PP,
    P,
    MP,
    MF,
    F,
    FF,
    FFF,
}

/// `numerator` notes in the time of `denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupletRatio {
    pub numerator: i32,
    pub denominator: i32,
}

impl TupletRatio {
    /// Largest ratio part accepted; larger values overflow tuplet arithmetic
    pub const MAX_PART: i32 = 64;

    /// Both parts within `1..=MAX_PART`
    pub fn is_valid(&self) -> bool {
        (1..=Self::MAX_PART).contains(&self.numerator) && (1..=Self::MAX_PART).contains(&self.denominator)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hairpin {
    #[default]
    None,
    Crescendo,
    Decrescendo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TremoloRatio {
    pub numerator: i32,
    pub denominator: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrokeDirection {
    #[default]
    None,
    Up,
    Down,
}

/// Barre indication: `string` 1 means a half barre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barre {
    pub fret: i32,
    pub string: i32,
}

/// Phase of a legato/slur or tie run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    None,
    Start,
    Mediate,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VibratoWithBar {
    #[default]
    None,
    Slight,
    Wide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fade {
    #[default]
    None,
    FadeIn,
    FadeOut,
    VolumeSwell,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wah {
    #[default]
    None,
    Open,
    Closed,
}

/// Fret diagram reference of a beat in one (track, master bar) context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramRef {
    pub track: usize,
    pub master_bar: usize,
    pub diagram: i32,
}

/// Lyric syllable of a beat in one (track, master bar) context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricRef {
    pub track: usize,
    pub master_bar: usize,
    pub text: String,
}

/// One rhythmic event of a voice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Beat {
    pub rhythm: Rhythm,
    pub rest: bool,
    pub grace_notes: GraceNotes,
    pub dynamic: Option<DynamicType>,
    pub tuplet: Option<TupletRatio>,
    pub hairpin: Hairpin,
    pub tremolo: Option<TremoloRatio>,
    pub arpeggio: StrokeDirection,
    pub brush: StrokeDirection,
    pub barre: Option<Barre>,
    pub legato: Phase,
    pub vibrato: VibratoWithBar,
    pub fade: Fade,
    pub pick_stroke: StrokeDirection,
    pub rasgueado: bool,
    pub wah: Wah,
    pub slapped: bool,
    pub popped: bool,
    pub free_text: String,
    /// Elapsed time marker in seconds
    pub time: Option<i32>,
    pub diagrams: Vec<DiagramRef>,
    pub lyrics: Vec<LyricRef>,
    pub notes: Vec<Note>,
}

impl Beat {
    /// Diagram id used by this beat when it appears in `track` at `master_bar`
    pub fn diagram_idx(&self, track: usize, master_bar: usize) -> Option<i32> {
        self.diagrams
            .iter()
            .find(|d| d.track == track && d.master_bar == master_bar)
            .map(|d| d.diagram)
    }

    /// Lyric text for this beat in `track` at `master_bar` (empty if none)
    pub fn lyrics_for(&self, track: usize, master_bar: usize) -> &str {
        self.lyrics
            .iter()
            .find(|l| l.track == track && l.master_bar == master_bar)
            .map(|l| l.text.as_str())
            .unwrap_or("")
    }
}

// ============================================================================
// NOTE
// ============================================================================

/// Raw pitch descriptor; every field uses [`UNSET`] for "absent" except
/// `tone`, whose absent value is 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiPitch {
    /// Source string number, 0 = lowest-pitched string
    pub string: i32,
    pub fret: i32,
    pub midi: i32,
    pub octave: i32,
    pub tone: i32,
    pub element: i32,
    pub variation: i32,
}

impl Default for MidiPitch {
    fn default() -> Self {
        MidiPitch {
            string: UNSET,
            fret: UNSET,
            midi: UNSET,
            octave: UNSET,
            tone: 0,
            element: UNSET,
            variation: UNSET,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HammerOn {
    #[default]
    None,
    Start,
    End,
}

/// Bend curve with offsets in percent of the note length and values in
/// quarter tones. Middle offsets of 12 mean "no middle point"; offsets of
/// [`UNSET`] mean "exactly in the middle".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BendCurve {
    pub origin_value: i32,
    pub middle_offset1: i32,
    pub middle_offset2: i32,
    pub middle_value: i32,
    pub destination_offset: i32,
    pub destination_value: i32,
}

impl Default for BendCurve {
    fn default() -> Self {
        BendCurve {
            origin_value: 0,
            middle_offset1: 12,
            middle_offset2: 12,
            middle_value: UNSET,
            destination_offset: UNSET,
            destination_value: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmonicType {
    #[default]
    None,
    Natural,
    Artificial,
    Pinch,
    Tap,
    Semi,
    FeedBack,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Harmonic {
    #[serde(rename = "type")]
    pub kind: HarmonicType,
    /// Fret position of the harmonic node (may be fractional, e.g. 3.2)
    pub fret: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VibratoType {
    #[default]
    None,
    Slight,
    Wide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ornament {
    #[default]
    None,
    Turn,
    InvertedTurn,
    UpperMordent,
    LowerMordent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trill {
    pub auxiliary_fret: i32,
    pub speed: i32,
}

/// Slide flag bits (see [`Note::slides`])
pub mod slide_bits {
    pub const SHIFT: u8 = 0;
    pub const LEGATO: u8 = 1;
    pub const OUT_DOWN: u8 = 2;
    pub const OUT_UP: u8 = 3;
    pub const IN_FROM_BELOW: u8 = 4;
    pub const IN_FROM_ABOVE: u8 = 5;
    pub const COUNT: u8 = 6;
}

/// One note of a beat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    pub pitch: MidiPitch,
    pub tie: Phase,
    /// Slide flags, bit numbers in [`slide_bits`]
    pub slides: u8,
    pub hammer_on: HammerOn,
    pub bend: Option<BendCurve>,
    pub harmonic: Harmonic,
    pub vibrato: VibratoType,
    pub ornament: Ornament,
    pub trill: Option<Trill>,
    pub left_fingering: String,
    pub right_fingering: String,
    /// Accent flags: bit 0 staccato, bit 2 marcato, any other bit sforzando
    pub accents: u8,
    pub let_ring: bool,
    pub palm_mute: bool,
    pub tapping: bool,
    pub left_hand_tapped: bool,
}

impl Note {
    pub fn has_slide(&self, bit: u8) -> bool {
        self.slides & (1 << bit) != 0
    }
}
