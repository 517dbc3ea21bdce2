//! Shared score types: exact time, track numbering, element ids and the
//! small enums used by several element kinds

use num_rational::Rational32;
use serde::{Deserialize, Serialize};

/// Exact duration or position, in whole notes
pub type Fraction = Rational32;

/// Integer ticks per whole note (480 per quarter)
pub const TICKS_PER_WHOLE: i32 = 1920;

/// Voices per staff; track = staff * VOICES + voice
pub const VOICES: usize = 4;

pub fn track_of(staff: usize, voice: usize) -> usize {
    staff * VOICES + voice
}

pub fn staff_of(track: usize) -> usize {
    track / VOICES
}

/// Integer ticks of a fraction, rounded to the nearest tick
pub fn to_ticks(f: Fraction) -> i32 {
    (f * TICKS_PER_WHOLE).round().to_integer()
}

pub fn from_ticks(ticks: i32) -> Fraction {
    Fraction::new(ticks, TICKS_PER_WHOLE)
}

// ============================================================================
// ELEMENT IDS
// ============================================================================

macro_rules! element_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            pub struct $name(pub usize);
        )*
    };
}

element_id!(
    /// Chord, rest or measure repeat in the score arena
    ChordRestId,
    NoteId,
    TieId,
    /// Slur, line, hairpin, volta or glissando
    SpannerId,
    TupletId,
);

// ============================================================================
// DURATIONS
// ============================================================================

/// Written note value of a chord or rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationType {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
    /// Whole-measure rest or a remainder no single value expresses
    Measure,
}

impl DurationType {
    pub const ALL: [DurationType; 7] = [
        DurationType::Whole,
        DurationType::Half,
        DurationType::Quarter,
        DurationType::Eighth,
        DurationType::Sixteenth,
        DurationType::ThirtySecond,
        DurationType::SixtyFourth,
    ];

    /// Denominator of the undotted value (1 for whole ... 64); `None` for Measure
    pub fn denominator(self) -> Option<i32> {
        match self {
            DurationType::Whole => Some(1),
            DurationType::Half => Some(2),
            DurationType::Quarter => Some(4),
            DurationType::Eighth => Some(8),
            DurationType::Sixteenth => Some(16),
            DurationType::ThirtySecond => Some(32),
            DurationType::SixtyFourth => Some(64),
            DurationType::Measure => None,
        }
    }

    /// Undotted length in whole notes
    pub fn fraction(self) -> Option<Fraction> {
        self.denominator().map(|d| Fraction::new(1, d))
    }

    /// Find the value and dot count (up to 3) that spell `len` exactly
    pub fn from_fraction(len: Fraction) -> Option<(DurationType, u8)> {
        for ty in Self::ALL {
            let Some(base) = ty.fraction() else { continue };
            let mut total = base;
            let mut add = base;
            for dots in 0..=3u8 {
                if total == len {
                    return Some((ty, dots));
                }
                add /= 2;
                total += add;
            }
        }
        None
    }
}

/// Grace and normal note kinds of a chord
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    #[default]
    Normal,
    Acciaccatura,
    Appoggiatura,
    Grace4,
    Grace16,
    Grace32,
    Grace8After,
    Grace16After,
    Grace32After,
}

impl NoteType {
    pub fn is_grace(self) -> bool {
        self != NoteType::Normal
    }

    pub fn is_grace_after(self) -> bool {
        matches!(
            self,
            NoteType::Grace8After | NoteType::Grace16After | NoteType::Grace32After
        )
    }
}

// ============================================================================
// SYMBOLS
// ============================================================================

/// Musical symbols placed as articulations, note symbols or segment symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymId {
    ArticStaccatoAbove,
    ArticMarcatoAbove,
    DynamicSforzando,
    ArticLaissezVibrerAbove,
    OrnamentTurn,
    OrnamentTurnInverted,
    OrnamentMordent,
    OrnamentUpPrall,
    StringsUpBow,
    StringsDownBow,
    BrassMuteOpen,
    BrassMuteClosed,
    WiggleSawtooth,
    WiggleSawtoothWide,
    GuitarFadeIn,
    GuitarFadeOut,
    GuitarVolumeSwell,
    FermataAbove,
    FermataShortAbove,
    FermataLongAbove,
    Segno,
    SegnoSerpent2,
    Coda,
    CodaSquare,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticulationAnchor {
    #[default]
    Chord,
    TopStaff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Articulation {
    pub sym: SymId,
    pub anchor: ArticulationAnchor,
}

impl Articulation {
    pub fn new(sym: SymId) -> Self {
        Articulation { sym, anchor: ArticulationAnchor::Chord }
    }

    pub fn top_staff(sym: SymId) -> Self {
        Articulation { sym, anchor: ArticulationAnchor::TopStaff }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClefKind {
    G,
    G8va,
    F,
    F8va,
    F15ma,
    Perc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArpeggioType {
    Up,
    Down,
    UpStraight,
    DownStraight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TremoloType {
    R8,
    R16,
    R32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordLineType {
    Fall,
    Doit,
    Scoop,
    Plop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HairpinType {
    Crescendo,
    Decrescendo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VibratoLine {
    GuitarVibrato,
    GuitarVibratoWide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DynamicLevel {
    PPP,
    PP,
    P,
    MP,
    MF,
    F,
    FF,
    FFF,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_roundtrip() {
        assert_eq!(to_ticks(Fraction::new(1, 4)), 480);
        assert_eq!(from_ticks(1440), Fraction::new(3, 4));
        assert_eq!(to_ticks(Fraction::new(1, 3)), 640);
    }

    #[test]
    fn test_track_numbering() {
        assert_eq!(track_of(2, 1), 9);
        assert_eq!(staff_of(9), 2);
    }

    #[test]
    fn test_duration_type_from_fraction() {
        assert_eq!(
            DurationType::from_fraction(Fraction::new(3, 8)),
            Some((DurationType::Quarter, 1))
        );
        assert_eq!(
            DurationType::from_fraction(Fraction::new(1, 2)),
            Some((DurationType::Half, 0))
        );
        assert_eq!(DurationType::from_fraction(Fraction::new(5, 8)), None);
    }
}
