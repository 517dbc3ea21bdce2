//! Note conversion: pitch, bend and per-note decorations

use crate::models::{self, slide_bits, HammerOn, HarmonicType, Ornament, VibratoType, DRUM_CHANNEL};
use crate::score::*;

use super::bend::bend_points;
use super::converter::{ContinuousLink, Cursor, LinkKind, TablatureConverter};
use super::pitch::{harmonic_fret, harmonic_text, resolve_pitch, InstrumentInfo};

/// Articulation for one set accent bit
pub fn accent_sym(bit: u32) -> SymId {
    match bit {
        0 => SymId::ArticStaccatoAbove,
        2 => SymId::ArticMarcatoAbove,
        _ => SymId::DynamicSforzando,
    }
}

/// Chord line for a slide into or out of the note
pub fn slide_chord_line(bit: u8) -> Option<ChordLineType> {
    match bit {
        slide_bits::OUT_DOWN => Some(ChordLineType::Fall),
        slide_bits::OUT_UP => Some(ChordLineType::Doit),
        slide_bits::IN_FROM_BELOW => Some(ChordLineType::Scoop),
        slide_bits::IN_FROM_ABOVE => Some(ChordLineType::Plop),
        _ => None,
    }
}

pub fn ornament_sym(ornament: Ornament) -> Option<SymId> {
    match ornament {
        Ornament::None => None,
        Ornament::Turn => Some(SymId::OrnamentTurn),
        Ornament::InvertedTurn => Some(SymId::OrnamentTurnInverted),
        Ornament::LowerMordent => Some(SymId::OrnamentMordent),
        Ornament::UpperMordent => Some(SymId::OrnamentUpPrall),
    }
}

fn left_fingering_text(finger: &str) -> &str {
    if finger == "Open" {
        "O"
    } else {
        finger
    }
}

impl<'a> TablatureConverter<'a> {
    pub(super) fn convert_note(&mut self, src: &models::Note, cr: ChordRestId, cursor: &Cursor) {
        let Some(chord) = self.score.chord(cr) else {
            return;
        };
        let is_grace = chord.note_type.is_grace();
        let used_strings: Vec<i32> = chord
            .notes
            .iter()
            .filter_map(|&n| self.score.note(n).map(|n| n.string))
            .filter(|&s| s >= 0)
            .collect();

        let Some(part) = self.score.part_of_track(cursor.track) else {
            log::error!("track {} has no part", cursor.track);
            return;
        };
        let string_data = part.instrument.string_data.clone();
        let channel = part.instrument.channel(0).copied().unwrap_or_default();
        let info = InstrumentInfo {
            string_data: &string_data,
            drum_channel: channel.midi_channel == DRUM_CHANNEL,
            program: channel.program,
        };
        let resolved = resolve_pitch(&src.pitch, info, &used_strings);

        let mut note = Note::new(cr);
        note.pitch = resolved.pitch;
        note.string = resolved.string;
        note.fret = resolved.fret;
        if let Some(curve) = &src.bend {
            note.bend = bend_points(curve);
        }
        let Some(id) = self.score.add_note(cr, note) else {
            return;
        };

        if !is_grace {
            if src.let_ring {
                self.let_rings.step(&mut self.score, SpannerKind::LetRing, cr);
            }
            if src.palm_mute {
                self.palm_mutes.step(&mut self.score, SpannerKind::PalmMute, cr);
            }
        }

        self.add_accents(src, cr);
        self.add_slides(src, id, cr);
        if src.hammer_on == HammerOn::Start {
            self.links.push(ContinuousLink { kind: LinkKind::HammerOn, note: id });
        }
        if src.tapping {
            self.add_text_to_note("T", id);
        }
        if src.left_hand_tapped {
            if let Some(n) = self.score.note_mut(id) {
                n.symbols.push(SymId::ArticLaissezVibrerAbove);
            }
            self.add_text_to_note("T", id);
        }
        if let Some(sym) = ornament_sym(src.ornament) {
            self.score.toggle_articulation(cr, Articulation::new(sym));
        }
        if !is_grace {
            let line = match src.vibrato {
                VibratoType::None => None,
                VibratoType::Slight => Some(VibratoLine::GuitarVibrato),
                VibratoType::Wide => Some(VibratoLine::GuitarVibratoWide),
            };
            if let Some(line) = line {
                self.vibratos.step(&mut self.score, SpannerKind::Vibrato(line), cr);
            }
        }
        if let Some(trill) = &src.trill {
            log::trace!("trill on fret {} not converted", trill.auxiliary_fret);
        }
        self.add_harmonic(src, id, cr, &string_data, cursor.track);
        self.add_fingering(src, id);
        self.ties.apply(&mut self.score, src.tie, id, cursor.track);
    }

    fn add_accents(&mut self, src: &models::Note, cr: ChordRestId) {
        if src.accents == 0 {
            return;
        }
        let Some(chord) = self.score.chord_mut(cr) else {
            return;
        };
        for bit in (0..u8::BITS).filter(|b| src.accents & (1 << b) != 0) {
            chord.articulations.push(Articulation::new(accent_sym(bit)));
        }
    }

    fn add_slides(&mut self, src: &models::Note, note: NoteId, cr: ChordRestId) {
        if src.slides == 0 {
            return;
        }
        for bit in slide_bits::OUT_DOWN..slide_bits::COUNT {
            if !src.has_slide(bit) {
                continue;
            }
            if let (Some(kind), Some(chord)) = (slide_chord_line(bit), self.score.chord_mut(cr)) {
                chord.chord_lines.push(ChordLine { kind, straight: true, note });
            }
        }
        if src.has_slide(slide_bits::SHIFT) {
            self.links.push(ContinuousLink { kind: LinkKind::Slide, note });
        }
        if src.has_slide(slide_bits::LEGATO) {
            self.links.push(ContinuousLink { kind: LinkKind::LegatoSlide, note });
        }
    }

    /// Sound the overtone; non-natural harmonics keep a silent copy of the
    /// fretted note
    fn add_harmonic(&mut self, src: &models::Note, note: NoteId, cr: ChordRestId, sd: &StringData, track: usize) {
        let kind = src.harmonic.kind;
        if kind == HarmonicType::None {
            return;
        }
        let Some((pitch, string, fret)) = self.score.note(note).map(|n| (n.pitch, n.string, n.fret)) else {
            return;
        };

        if kind != HarmonicType::Natural {
            let mut shadow = Note::new(cr);
            shadow.pitch = pitch;
            shadow.string = string;
            shadow.fret = fret;
            shadow.play = false;
            if let Some(shadow) = self.score.add_note(cr, shadow) {
                self.ties.apply(&mut self.score, src.tie, shadow, track);
            }
        }

        let overtone = harmonic_fret(fret, src.harmonic.fret, kind);
        match sd.get_pitch(string, overtone) {
            Some(p) => {
                if let Some(n) = self.score.note_mut(note) {
                    n.pitch = p;
                }
            }
            None => log::debug!("harmonic fret {} on string {} has no pitch", overtone, string),
        }

        let text = harmonic_text(kind);
        if !text.is_empty() {
            self.add_text_to_note(text, note);
        }
    }

    fn add_fingering(&mut self, src: &models::Note, note: NoteId) {
        let Some(n) = self.score.note_mut(note) else {
            return;
        };
        if !src.left_fingering.is_empty() {
            n.fingerings.push(left_fingering_text(&src.left_fingering).to_string());
        }
        if !src.right_fingering.is_empty() {
            n.fingerings.push(src.right_fingering.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_bits() {
        assert_eq!(accent_sym(0), SymId::ArticStaccatoAbove);
        assert_eq!(accent_sym(1), SymId::DynamicSforzando);
        assert_eq!(accent_sym(2), SymId::ArticMarcatoAbove);
        assert_eq!(accent_sym(3), SymId::DynamicSforzando);
    }

    #[test]
    fn test_slide_chord_lines() {
        assert_eq!(slide_chord_line(slide_bits::SHIFT), None);
        assert_eq!(slide_chord_line(slide_bits::LEGATO), None);
        assert_eq!(slide_chord_line(slide_bits::OUT_DOWN), Some(ChordLineType::Fall));
        assert_eq!(slide_chord_line(slide_bits::OUT_UP), Some(ChordLineType::Doit));
        assert_eq!(slide_chord_line(slide_bits::IN_FROM_BELOW), Some(ChordLineType::Scoop));
        assert_eq!(slide_chord_line(slide_bits::IN_FROM_ABOVE), Some(ChordLineType::Plop));
    }

    #[test]
    fn test_ornaments() {
        assert_eq!(ornament_sym(Ornament::None), None);
        assert_eq!(ornament_sym(Ornament::LowerMordent), Some(SymId::OrnamentMordent));
        assert_eq!(ornament_sym(Ornament::UpperMordent), Some(SymId::OrnamentUpPrall));
    }

    #[test]
    fn test_open_fingering() {
        assert_eq!(left_fingering_text("Open"), "O");
        assert_eq!(left_fingering_text("i"), "i");
    }
}
