//! Passes run after the walk, and the purges that keep the score free of
//! dangling references

use crate::models::{Fermata, FermataType};
use crate::score::*;

use super::converter::{ContinuousLink, Cursor, LinkKind, TablatureConverter};
use super::grace::GraceQueue;
use super::spanners::slur_between;

/// Tempo in quarter notes per minute for a source tempo event
pub fn quarter_bpm(value: i32, tempo_unit: i32) -> f64 {
    match tempo_unit {
        0 => value as f64,
        5 => value as f64 * 3.0,
        unit => value as f64 * unit as f64 / 2.0,
    }
}

pub fn tempo_text(bpm: f64) -> String {
    format!("<sym>metNoteQuarterUp</sym> = {}", bpm.round() as i64)
}

/// Time stretch of a fermata of the given length parameter
pub fn fermata_stretch(length: f32) -> f32 {
    1.5 - 0.5 * length + 3.0 * length * length
}

pub fn fermata_sym(kind: FermataType) -> SymId {
    match kind {
        FermataType::Long => SymId::FermataLongAbove,
        FermataType::Short => SymId::FermataShortAbove,
        FermataType::Medium => SymId::FermataAbove,
    }
}

fn fermata_offset(fermata: &Fermata) -> Fraction {
    if fermata.offset_denominator <= 0 {
        return Fraction::new(0, 1);
    }
    Fraction::new(fermata.offset_numerator.max(0), fermata.offset_denominator)
}

impl<'a> TablatureConverter<'a> {
    // ========================================================================
    // TEMPO
    // ========================================================================

    pub(super) fn add_tempo_map(&mut self) {
        let events = std::mem::take(&mut self.tempo_events);
        for (bar, events) in events {
            let Some(measure) = self.score.measures.get(bar) else {
                log::debug!("tempo change in bar {} past the last measure", bar);
                self.context.current_measure = Some(bar);
                self.context.add_skipped("tempo", "bar does not exist");
                continue;
            };
            let (start, len) = (measure.tick, measure.ticks);
            for event in events {
                let offset = (event.position as f64 * to_ticks(len) as f64).round() as i32;
                let tick = start + from_ticks(offset);
                let bpm = quarter_bpm(event.value, event.tempo_unit);
                self.score.measures[bar].add_item(
                    SegmentType::ChordRest,
                    tick,
                    0,
                    Element::TempoText { tempo: bpm / 60.0, text: tempo_text(bpm) },
                );
                self.score.set_tempo(tick, bpm / 60.0);
                log::debug!("tempo {} bpm at bar {} (tick {})", bpm, bar, to_ticks(tick));
            }
        }
    }

    // ========================================================================
    // FERMATAS
    // ========================================================================

    pub(super) fn add_fermatas(&mut self) {
        let fermatas = std::mem::take(&mut self.fermatas);
        let staves = self.score.nstaves();
        for (measure, fermata) in fermatas {
            let tick = self.score.measures[measure].tick + fermata_offset(&fermata);
            let sym = fermata_sym(fermata.kind);
            let time_stretch = fermata_stretch(fermata.length);
            for staff in 0..staves {
                let track = track_of(staff, 0);
                if self.score.chord_rest_at(tick, track).is_none() {
                    log::debug!("fermata at {} has no chord or rest on track {}", to_ticks(tick), track);
                    continue;
                }
                self.score.measures[measure].add_item(
                    SegmentType::ChordRest,
                    tick,
                    track,
                    Element::Fermata { sym, time_stretch },
                );
            }
        }
    }

    // ========================================================================
    // SLIDES / HAMMER-ONS
    // ========================================================================

    pub(super) fn add_continuous_slide_hammer_on(&mut self) {
        let links = std::mem::take(&mut self.links);
        for link in links {
            self.connect_link(link);
        }
    }

    fn connect_link(&mut self, link: ContinuousLink) {
        let Some((start_chord, string, start_pitch)) =
            self.score.note(link.note).map(|n| (n.chord, n.string, n.pitch))
        else {
            return;
        };
        let Some(track) = self.score.chord_rest(start_chord).map(|c| c.track) else {
            return;
        };

        // a grace chord leads into the chord that owns it
        let next = match self.score.chord(start_chord).and_then(|c| c.parent) {
            Some(parent) => Some(parent),
            None => self.score.next_chord_rest(start_chord),
        };
        let end_note = next.and_then(|n| self.score.chord(n)).and_then(|chord| {
            chord
                .notes
                .iter()
                .copied()
                .find(|&n| string >= 0 && self.score.note(n).is_some_and(|n| n.string == string))
                .or_else(|| chord.notes.first().copied())
        });
        let (Some(end_chord), Some(end_note)) = (next, end_note) else {
            log::debug!("{:?} on track {} has no following chord", link.kind, track);
            self.context.current_measure = self.score.chord_rest(start_chord).and_then(|c| c.measure);
            self.context.current_track = Some(track);
            self.context.add_skipped("continuous-line", "no following chord on the track");
            return;
        };

        match link.kind {
            LinkKind::Slide => self.add_glissando(link.note, end_note),
            LinkKind::LegatoSlide => {
                self.add_glissando(link.note, end_note);
                slur_between(&mut self.score, start_chord, end_chord);
            }
            LinkKind::HammerOn => {
                slur_between(&mut self.score, start_chord, end_chord);
                let end_pitch = self.score.note(end_note).map(|n| n.pitch).unwrap_or(start_pitch);
                let text = if end_pitch > start_pitch { "H" } else { "P" };
                self.add_text_to_note(text, link.note);
            }
        }
    }

    fn add_glissando(&mut self, start_note: NoteId, end_note: NoteId) {
        let start = self.score.note(start_note).and_then(|n| self.score.chord_rest(n.chord));
        let end = self.score.note(end_note).and_then(|n| self.score.chord_rest(n.chord));
        let (Some(start), Some(end)) = (start.map(|c| (c.tick, c.track)), end.map(|c| (c.tick, c.track))) else {
            return;
        };
        let mut gliss = Spanner::new(SpannerKind::Glissando { start_note, end_note }, start.0, start.1);
        gliss.tick2 = end.0;
        gliss.track2 = end.1;
        self.score.add_spanner(gliss);
    }

    // ========================================================================
    // PURGES
    // ========================================================================

    /// Grace chords left pending when their voice ended
    pub(super) fn clear_defective_grace_chords(&mut self, graces: GraceQueue<'a>, cursor: &Cursor) {
        if graces.is_empty() {
            return;
        }
        self.purge_grace_chords(graces.into_defective(), cursor, "grace notes at the end of a voice");
    }

    /// Delete grace chords with their notes, ties and pending links
    pub(super) fn purge_grace_chords(&mut self, chords: Vec<ChordRestId>, cursor: &Cursor, reason: &str) {
        for chord in chords {
            let notes = self.score.chord_notes_recursive(chord);
            self.links.retain(|l| !notes.contains(&l.note));
            self.ties.purge_notes(&mut self.score, &notes);
            self.score.delete_chord_rest(chord);
            self.context.stats.purged_grace_chords += 1;
            log::warn!("purging grace chord on track {} in bar {}: {}", cursor.track, cursor.master_bar, reason);
            self.skip_at(cursor, "grace-chord", reason);
        }
    }

    /// Drop ties and slurs that never found their end
    pub(super) fn clear_defective_spanners(&mut self) {
        let ties = self.ties.discard_open(&mut self.score);
        let slurs = self.slurs.discard_open(&mut self.score);
        self.context.stats.discarded_ties += ties;
        self.context.stats.discarded_slurs += slurs;
        for _ in 0..ties {
            self.context.add_skipped("tie", "unterminated at end of document");
        }
        for _ in 0..slurs {
            self.context.add_skipped("slur", "unterminated at end of document");
        }
    }
}
