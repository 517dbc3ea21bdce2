//! Grace-note classification and the pending grace queue
//!
//! Grace chords are built as soon as their beat is read but stay out of the
//! measure until the next full beat of the same voice arrives. That beat
//! takes them as leading grace notes. If the voice ends first, they are
//! purged.

use crate::models::{Beat, GraceNotes, RhythmUnit};
use crate::score::{ChordRestId, DurationType, Fraction, NoteType};

use super::duration::denominator;

/// Note type and written duration of a grace chord
///
/// On-beat graces are written as plain `1/unit` values and become
/// after-graces. Other graces keep the beat's full duration and are typed by
/// that value; dotted values fall through to an acciaccatura.
pub fn classify_grace(kind: GraceNotes, unit: RhythmUnit, beat_duration: Fraction) -> (NoteType, Fraction) {
    match kind {
        GraceNotes::OnBeat => {
            let duration = Fraction::new(1, denominator(unit));
            let note_type = match unit {
                RhythmUnit::Sixteenth => NoteType::Grace8After,
                RhythmUnit::ThirtySecond => NoteType::Grace16After,
                _ => NoteType::Grace32After,
            };
            (note_type, duration)
        }
        _ => {
            let note_type = match DurationType::from_fraction(beat_duration) {
                Some((DurationType::Eighth, 0)) => NoteType::Grace4,
                Some((DurationType::Sixteenth, 0)) => NoteType::Appoggiatura,
                Some((DurationType::ThirtySecond, 0)) => NoteType::Grace16,
                Some((DurationType::SixtyFourth, 0)) => NoteType::Grace32,
                _ => NoteType::Acciaccatura,
            };
            (note_type, beat_duration)
        }
    }
}

/// Grace chords waiting for the next full beat of a voice
#[derive(Debug, Default)]
pub struct GraceQueue<'a> {
    pending: Vec<(ChordRestId, &'a Beat)>,
}

impl<'a> GraceQueue<'a> {
    pub fn new() -> Self {
        GraceQueue { pending: Vec::new() }
    }

    pub fn push(&mut self, chord: ChordRestId, beat: &'a Beat) {
        self.pending.push((chord, beat));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Hand all pending chords to the next full beat, in reading order
    pub fn flush(&mut self) -> Vec<(ChordRestId, &'a Beat)> {
        std::mem::take(&mut self.pending)
    }

    /// Chords never claimed by a full beat
    pub fn into_defective(self) -> Vec<ChordRestId> {
        self.pending.into_iter().map(|(id, _)| id).collect()
    }
}
