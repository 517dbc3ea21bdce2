//! Pitch and string/fret resolution
//!
//! A source note names its pitch in one of several ways. The first
//! present encoding wins:
//!
//! 1. explicit MIDI pitch
//! 2. octave * 12 + tone
//! 3. drum element + variation (table lookup)
//! 4. on the drum channel, the instrument program (single-drum parts)
//! 5. string + fret through the instrument tuning
//!
//! When the note has no string, the resolver assigns one: scanning from the
//! highest-pitched string down, the first string whose open pitch is at or
//! below the target and that no other note of the chord occupies.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::models::{HarmonicType, MidiPitch, UNSET};
use crate::score::StringData;

pub const DEFAULT_DRUM_PITCH: i32 = 44;

lazy_static! {
    /// (element, variation) -> percussion pitch
    static ref DRUM_PITCHES: HashMap<(i32, i32), i32> = {
        let mut m = HashMap::new();
        m.insert((11, 0), 44); // pedal hi-hat
        m.insert((0, 0), 36);  // kick
        m.insert((5, 0), 41);  // very low tom
        m.insert((6, 0), 43);  // low tom
        m.insert((7, 0), 45);  // mid tom
        m.insert((1, 0), 40);  // snare
        m.insert((1, 1), 91);  // snare rim shot
        m.insert((1, 2), 37);  // snare side stick
        m.insert((8, 0), 48);  // high tom
        m.insert((9, 0), 50);  // very high tom
        m.insert((15, 0), 51); // ride middle
        m.insert((15, 1), 59); // ride edge
        m.insert((15, 2), 59); // ride bell
        m.insert((10, 0), 42); // hi-hat closed
        m.insert((10, 1), 46); // hi-hat half
        m.insert((10, 2), 46); // hi-hat open
        m.insert((12, 0), 49); // crash medium
        m.insert((14, 0), 55); // splash
        m.insert((13, 0), 57); // crash high
        m.insert((16, 0), 52); // china
        m.insert((4, 0), 102); // cowbell high
        m.insert((3, 0), 56);  // cowbell medium
        m.insert((2, 0), 99);  // cowbell low
        m
    };
}

pub fn drum_pitch(element: i32, variation: i32) -> i32 {
    DRUM_PITCHES
        .get(&(element, variation))
        .copied()
        .unwrap_or(DEFAULT_DRUM_PITCH)
}

/// Instrument facts the resolver needs
#[derive(Debug, Clone, Copy)]
pub struct InstrumentInfo<'a> {
    pub string_data: &'a StringData,
    pub drum_channel: bool,
    pub program: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPitch {
    pub pitch: i32,
    /// 0 = highest-pitched string, -1 = none
    pub string: i32,
    pub fret: i32,
}

/// Resolve a note's pitch; `used_strings` are strings already taken by
/// other notes of the same chord
pub fn resolve_pitch(
    midi: &MidiPitch,
    instrument: InstrumentInfo<'_>,
    used_strings: &[i32],
) -> ResolvedPitch {
    let sd = instrument.string_data;
    let mut string = if midi.string != UNSET {
        sd.len() as i32 - 1 - midi.string
    } else {
        UNSET
    };
    let mut fret = midi.fret;

    let pitch = if midi.midi != UNSET {
        midi.midi
    } else if midi.octave != UNSET || midi.tone != 0 {
        midi.octave * 12 + midi.tone
    } else if midi.variation != UNSET {
        drum_pitch(midi.element, midi.variation)
    } else if instrument.drum_channel {
        instrument.program
    } else {
        match sd.get_pitch(string, midi.fret) {
            Some(p) => p,
            None => {
                log::debug!(
                    "note string {} fret {} outside tuning of {} strings",
                    midi.string,
                    midi.fret,
                    sd.len()
                );
                0
            }
        }
    };

    if string == UNSET {
        string = string_for_pitch(sd, pitch, used_strings);
        fret = sd.open_pitch(string).map(|open| pitch - open).unwrap_or(UNSET);
    }

    ResolvedPitch { pitch, string, fret }
}

/// Highest free string able to play `pitch`, or -1
pub fn string_for_pitch(sd: &StringData, pitch: i32, used_strings: &[i32]) -> i32 {
    (0..sd.len() as i32)
        .find(|&s| {
            sd.open_pitch(s).is_some_and(|open| pitch >= open) && !used_strings.contains(&s)
        })
        .unwrap_or(UNSET)
}

// ============================================================================
// HARMONICS
// ============================================================================

/// Fret of the overtone sounded by a harmonic touched at `node`
fn overtone_fret(node: f32) -> Option<i32> {
    let is = |v: f32| (node - v).abs() < 0.05;
    if is(12.0) {
        Some(12)
    } else if is(7.0) || is(19.0) {
        Some(19)
    } else if is(5.0) || is(24.0) {
        Some(24)
    } else if is(3.9) || is(4.0) || is(9.0) || is(16.0) {
        Some(28)
    } else if is(3.2) {
        Some(31)
    } else if is(2.7) {
        Some(34)
    } else if is(2.3) || is(2.4) {
        Some(36)
    } else if is(2.0) {
        Some(38)
    } else if is(1.8) {
        Some(40)
    } else {
        None
    }
}

/// Fret whose pitch the harmonic sounds
///
/// Natural harmonics sound the overtone of the open string. The other kinds
/// are played over a fretted note, so the overtone is counted from that fret.
pub fn harmonic_fret(note_fret: i32, node: f32, kind: HarmonicType) -> i32 {
    match kind {
        HarmonicType::Natural => overtone_fret(node).unwrap_or(note_fret),
        _ => note_fret.max(0) + overtone_fret(node).unwrap_or(12),
    }
}

pub fn harmonic_text(kind: HarmonicType) -> &'static str {
    match kind {
        HarmonicType::Artificial => "A.H.",
        HarmonicType::Pinch => "P.H.",
        HarmonicType::Tap => "T.H.",
        HarmonicType::Semi => "S.H.",
        HarmonicType::FeedBack => "Fdbk.",
        HarmonicType::None | HarmonicType::Natural => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guitar() -> StringData {
        StringData::new(24, vec![40, 45, 50, 55, 59, 64])
    }

    fn info(sd: &StringData) -> InstrumentInfo<'_> {
        InstrumentInfo { string_data: sd, drum_channel: false, program: 25 }
    }

    #[test]
    fn test_string_and_fret() {
        let sd = guitar();
        // source string 0 is the low E
        let midi = MidiPitch { string: 0, fret: 3, ..Default::default() };
        let r = resolve_pitch(&midi, info(&sd), &[]);
        assert_eq!(r, ResolvedPitch { pitch: 43, string: 5, fret: 3 });
    }

    #[test]
    fn test_midi_wins_and_string_is_assigned() {
        let sd = guitar();
        let midi = MidiPitch { midi: 60, ..Default::default() };
        let r = resolve_pitch(&midi, info(&sd), &[]);
        // B string (59) is the highest string at or below 60
        assert_eq!(r, ResolvedPitch { pitch: 60, string: 1, fret: 1 });

        let r = resolve_pitch(&midi, info(&sd), &[1]);
        assert_eq!(r, ResolvedPitch { pitch: 60, string: 2, fret: 5 });
    }

    #[test]
    fn test_octave_tone() {
        let sd = guitar();
        let midi = MidiPitch { octave: 5, tone: 4, ..Default::default() };
        assert_eq!(resolve_pitch(&midi, info(&sd), &[]).pitch, 64);
    }

    #[test]
    fn test_drum_lookup_and_fallback() {
        assert_eq!(drum_pitch(0, 0), 36);
        assert_eq!(drum_pitch(1, 1), 91);
        assert_eq!(drum_pitch(42, 7), DEFAULT_DRUM_PITCH);
    }

    #[test]
    fn test_single_drum_uses_program() {
        let sd = guitar();
        let drums = InstrumentInfo { string_data: &sd, drum_channel: true, program: 38 };
        let r = resolve_pitch(&MidiPitch::default(), drums, &[]);
        assert_eq!(r.pitch, 38);
    }

    #[test]
    fn test_no_string_low_enough() {
        let sd = guitar();
        assert_eq!(string_for_pitch(&sd, 30, &[]), UNSET);
    }

    #[test]
    fn test_harmonic_frets() {
        assert_eq!(harmonic_fret(0, 12.0, HarmonicType::Natural), 12);
        assert_eq!(harmonic_fret(0, 7.0, HarmonicType::Natural), 19);
        assert_eq!(harmonic_fret(0, 3.2, HarmonicType::Natural), 31);
        assert_eq!(harmonic_fret(5, 12.0, HarmonicType::Artificial), 17);
        assert_eq!(harmonic_text(HarmonicType::Pinch), "P.H.");
        assert_eq!(harmonic_text(HarmonicType::Natural), "");
    }
}
