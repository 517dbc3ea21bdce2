//! Beat conversion and per-beat decorations
//!
//! A full beat is placed, takes the pending grace chords, converts its
//! notes, then runs every entry of [`BEAT_DECORATIONS`] in order. A grace
//! beat only builds its chord and joins the voice's [`GraceQueue`].

use crate::models::*;
use crate::score::*;

use super::converter::{Cursor, TablatureConverter};
use super::duration::{beat_duration, MAX_DOTS};
use super::grace::{classify_grace, GraceQueue};

/// Per-beat decoration kinds, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatDecoration {
    Dynamic,
    Tuplet,
    Timer,
    FreeText,
    VibratoWithBar,
    Fade,
    Hairpin,
    Rasgueado,
    Tremolo,
    PickStroke,
    Wah,
    FretDiagram,
    Barre,
    Slapped,
    Popped,
    Brush,
    Arpeggio,
    Lyrics,
    Legato,
}

pub const BEAT_DECORATIONS: [BeatDecoration; 19] = [
    BeatDecoration::Dynamic,
    BeatDecoration::Tuplet,
    BeatDecoration::Timer,
    BeatDecoration::FreeText,
    BeatDecoration::VibratoWithBar,
    BeatDecoration::Fade,
    BeatDecoration::Hairpin,
    BeatDecoration::Rasgueado,
    BeatDecoration::Tremolo,
    BeatDecoration::PickStroke,
    BeatDecoration::Wah,
    BeatDecoration::FretDiagram,
    BeatDecoration::Barre,
    BeatDecoration::Slapped,
    BeatDecoration::Popped,
    BeatDecoration::Brush,
    BeatDecoration::Arpeggio,
    BeatDecoration::Lyrics,
    BeatDecoration::Legato,
];

// ============================================================================
// PURE MAPPINGS
// ============================================================================

pub fn dynamic_level(d: DynamicType) -> DynamicLevel {
    match d {
        DynamicType::PPP => DynamicLevel::PPP,
        DynamicType::PP => DynamicLevel::PP,
        DynamicType::P => DynamicLevel::P,
        DynamicType::MP => DynamicLevel::MP,
        DynamicType::MF => DynamicLevel::MF,
        DynamicType::F => DynamicLevel::F,
        DynamicType::FF => DynamicLevel::FF,
        DynamicType::FFF => DynamicLevel::FFF,
    }
}

pub fn tremolo_type(ratio: TremoloRatio) -> TremoloType {
    match ratio.denominator {
        2 => TremoloType::R8,
        4 => TremoloType::R16,
        _ => TremoloType::R32,
    }
}

/// "m:ss"
pub fn timer_text(seconds: i32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Roman numeral used for barre frets
pub fn roman(fret: i32) -> String {
    let mut out = "X".repeat((fret.max(0) / 10) as usize);
    let mut rest = fret.max(0) % 10;
    match rest {
        9 => out.push_str("IX"),
        4 => out.push_str("IV"),
        _ => {
            if rest >= 5 {
                out.push('V');
                rest -= 5;
            }
            out.push_str(&"I".repeat(rest as usize));
        }
    }
    out
}

pub fn barre_text(barre: Barre) -> String {
    let prefix = if barre.string == 1 { "1/2B " } else { "B " };
    format!("{}{}", prefix, roman(barre.fret))
}

/// Brush strokes are drawn straight; the arrow points against the stroke
fn brush_type(dir: StrokeDirection) -> Option<ArpeggioType> {
    match dir {
        StrokeDirection::None => None,
        StrokeDirection::Up => Some(ArpeggioType::DownStraight),
        StrokeDirection::Down => Some(ArpeggioType::UpStraight),
    }
}

fn arpeggio_type(dir: StrokeDirection) -> Option<ArpeggioType> {
    match dir {
        StrokeDirection::None => None,
        StrokeDirection::Up => Some(ArpeggioType::Down),
        StrokeDirection::Down => Some(ArpeggioType::Up),
    }
}

pub fn diagram_item(diagram: &FretDiagram) -> FretDiagramItem {
    let strings = diagram.string_count.max(0);
    let mut markers = vec![FretMarker::Cross; strings as usize];
    let mut dots = Vec::new();
    for (&string, &fret) in &diagram.frets {
        if fret == 0 {
            if let Some(m) = markers.get_mut(string as usize) {
                *m = FretMarker::Circle;
            }
        } else {
            if let Some(m) = markers.get_mut(string as usize) {
                *m = FretMarker::None;
            }
            dots.push((string, fret));
        }
    }
    FretDiagramItem { strings, fret_offset: diagram.base_fret, markers, dots }
}

impl<'a> TablatureConverter<'a> {
    /// Convert one beat; returns the tick where the next beat starts
    pub(super) fn convert_beat(&mut self, beat: &'a Beat, graces: &mut GraceQueue<'a>, cursor: Cursor) -> Fraction {
        let measure_end = self.score.measures[cursor.measure].end_tick();
        if cursor.tick >= measure_end {
            log::debug!(
                "beat at {} on track {} starts past measure end {}",
                cursor.tick,
                cursor.track,
                measure_end
            );
            self.skip_at(&cursor, "beat", "starts at or past the end of its measure");
            return cursor.tick;
        }

        if beat.rhythm.dots > MAX_DOTS {
            log::debug!("beat with {} dots on track {} capped at {}", beat.rhythm.dots, cursor.track, MAX_DOTS);
            self.skip_at(&cursor, "dots", &format!("{} dots capped at {}", beat.rhythm.dots, MAX_DOTS));
        }
        let duration = beat_duration(beat.rhythm);
        let mut cr = if beat.rest { ChordRest::rest(cursor.track) } else { ChordRest::chord(cursor.track) };
        cr.set_duration(duration);

        if beat.grace_notes != GraceNotes::None {
            if beat.rest {
                log::debug!("grace rest on track {} dropped", cursor.track);
                self.skip_at(&cursor, "grace-rest", "grace rests are not representable");
                return cursor.tick;
            }
            let (note_type, grace_duration) = classify_grace(beat.grace_notes, beat.rhythm.unit, duration);
            cr.set_duration(grace_duration);
            cr.tick = cursor.tick;
            if let Some(chord) = cr.as_chord_mut() {
                chord.note_type = note_type;
            }
            let id = self.score.create_chord_rest(cr);
            self.convert_notes(beat, id, cursor);
            graces.push(id, beat);
            return cursor.tick;
        }

        let id = self.score.create_chord_rest(cr);
        if let Err(e) = self.score.attach_chord_rest(id, cursor.tick) {
            log::debug!("beat not placed: {}", e);
            self.score.delete_chord_rest(id);
            self.skip_at(&cursor, "beat", &e.to_string());
            return cursor.tick;
        }

        self.flush_graces(graces, id, &cursor);
        self.convert_notes(beat, id, cursor);

        for decoration in BEAT_DECORATIONS {
            self.decorate_beat(decoration, beat, id, &cursor);
        }

        cursor.tick + self.score.actual_duration(id)
    }

    /// Attach pending grace chords to the full chord `owner`
    fn flush_graces(&mut self, graces: &mut GraceQueue<'a>, owner: ChordRestId, cursor: &Cursor) {
        if graces.is_empty() {
            return;
        }
        let pending = graces.flush();
        if !self.score.chord_rest(owner).is_some_and(ChordRest::is_chord) {
            let ids = pending.into_iter().map(|(id, _)| id).collect();
            self.purge_grace_chords(ids, cursor, "grace notes before a rest");
            return;
        }
        for (grace_index, (grace, grace_beat)) in pending.into_iter().enumerate() {
            if let Some(chord) = self.score.chord_mut(grace) {
                chord.grace_index = grace_index;
            }
            self.score.add_grace(owner, grace);
            self.slurs.apply(&mut self.score, grace_beat.legato, grace);
        }
    }

    fn convert_notes(&mut self, beat: &Beat, cr: ChordRestId, cursor: Cursor) {
        if !self.score.chord_rest(cr).is_some_and(ChordRest::is_chord) {
            return;
        }
        for note in &beat.notes {
            self.convert_note(note, cr, &cursor);
        }
    }

    // ========================================================================
    // DECORATIONS
    // ========================================================================

    fn decorate_beat(&mut self, decoration: BeatDecoration, beat: &Beat, cr: ChordRestId, cursor: &Cursor) {
        let is_chord = self.score.chord_rest(cr).is_some_and(ChordRest::is_chord);
        match decoration {
            BeatDecoration::Dynamic => self.add_dynamic(beat, cursor, is_chord),
            BeatDecoration::Tuplet => {
                let ratio = match beat.tuplet {
                    Some(r) if !r.is_valid() => {
                        log::debug!("tuplet ratio {}:{} ignored", r.numerator, r.denominator);
                        self.skip_at(
                            cursor,
                            "tuplet",
                            &format!("ratio {}:{} is out of range", r.numerator, r.denominator),
                        );
                        None
                    }
                    r => r,
                };
                self.tuplets.apply(&mut self.score, ratio, cr)
            }
            BeatDecoration::Timer => {
                if let Some(time) = beat.time {
                    self.add_segment_item(cursor, Element::Text(timer_text(time)));
                }
            }
            BeatDecoration::FreeText => {
                if !beat.free_text.is_empty() {
                    self.add_segment_item(cursor, Element::Text(beat.free_text.clone()));
                }
            }
            BeatDecoration::VibratoWithBar if is_chord => {
                let sym = match beat.vibrato {
                    VibratoWithBar::None => return,
                    VibratoWithBar::Slight => SymId::WiggleSawtooth,
                    VibratoWithBar::Wide => SymId::WiggleSawtoothWide,
                };
                self.score.toggle_articulation(cr, Articulation::top_staff(sym));
            }
            BeatDecoration::Fade if is_chord => {
                let sym = match beat.fade {
                    Fade::None => return,
                    Fade::FadeIn => SymId::GuitarFadeIn,
                    Fade::FadeOut => SymId::GuitarFadeOut,
                    Fade::VolumeSwell => SymId::GuitarVolumeSwell,
                };
                self.score.toggle_articulation(cr, Articulation::top_staff(sym));
            }
            BeatDecoration::Hairpin => self.hairpins.apply(&mut self.score, beat.hairpin, cr),
            BeatDecoration::Rasgueado if is_chord && beat.rasgueado => {
                let first = self.score.chord(cr).and_then(|c| c.notes.first().copied());
                if let Some(note) = first {
                    self.add_text_to_note("rasg.", note);
                }
            }
            BeatDecoration::Tremolo => {
                if let (Some(ratio), Some(chord)) = (beat.tremolo, self.score.chord_mut(cr)) {
                    chord.tremolo = Some(tremolo_type(ratio));
                }
            }
            BeatDecoration::PickStroke if is_chord => {
                let sym = match beat.pick_stroke {
                    StrokeDirection::None => return,
                    StrokeDirection::Up => SymId::StringsUpBow,
                    StrokeDirection::Down => SymId::StringsDownBow,
                };
                self.score.toggle_articulation(cr, Articulation::new(sym));
            }
            BeatDecoration::Wah if is_chord => {
                let sym = match beat.wah {
                    Wah::None => return,
                    Wah::Open => SymId::BrassMuteOpen,
                    Wah::Closed => SymId::BrassMuteClosed,
                };
                self.score.toggle_articulation(cr, Articulation::new(sym));
            }
            BeatDecoration::FretDiagram if self.settings.convert_fret_diagrams => {
                self.add_fret_diagram(beat, cursor)
            }
            BeatDecoration::Barre if is_chord => {
                if let (Some(barre), Some(note)) = (beat.barre, self.score.up_note(cr)) {
                    self.add_text_to_note(&barre_text(barre), note);
                }
            }
            BeatDecoration::Slapped if is_chord && beat.slapped => {
                if let Some(note) = self.score.up_note(cr) {
                    self.add_text_to_note("S", note);
                }
            }
            BeatDecoration::Popped if is_chord && beat.popped => {
                if let Some(note) = self.score.up_note(cr) {
                    self.add_text_to_note("P", note);
                }
            }
            BeatDecoration::Brush => {
                if let (Some(arp), Some(chord)) = (brush_type(beat.brush), self.score.chord_mut(cr)) {
                    chord.arpeggio = Some(arp);
                }
            }
            BeatDecoration::Arpeggio => {
                if let (Some(arp), Some(chord)) = (arpeggio_type(beat.arpeggio), self.score.chord_mut(cr)) {
                    chord.arpeggio = Some(arp);
                }
            }
            BeatDecoration::Lyrics if self.settings.convert_lyrics => {
                let Some(track) = self.source_track_of(cursor.track) else {
                    return;
                };
                let text = beat.lyrics_for(track, cursor.master_bar);
                if !text.is_empty() {
                    if let Some(c) = self.score.chord_rest_mut(cr) {
                        c.lyrics.push(text.to_string());
                    }
                }
            }
            BeatDecoration::Legato => self.slurs.apply(&mut self.score, beat.legato, cr),
            _ => {}
        }
    }

    fn add_dynamic(&mut self, beat: &Beat, cursor: &Cursor, is_chord: bool) {
        let Some(dynamic) = beat.dynamic else {
            return;
        };
        if !is_chord || self.last_dynamics.get(&cursor.track) == Some(&dynamic) {
            return;
        }
        self.last_dynamics.insert(cursor.track, dynamic);
        self.add_segment_item(cursor, Element::Dynamic(dynamic_level(dynamic)));
    }

    fn add_fret_diagram(&mut self, beat: &Beat, cursor: &Cursor) {
        let Some(track) = self.source_track_of(cursor.track) else {
            return;
        };
        let idx = beat.diagram_idx(track, cursor.master_bar);
        if idx == self.last_diagram {
            return;
        }
        self.last_diagram = idx;
        let Some(idx) = idx else {
            return;
        };
        let doc = self.doc;
        let Some(diagram) = doc.track(track).and_then(|t| t.diagrams.get(&idx)) else {
            log::debug!("track {} has no diagram {}", track, idx);
            self.skip_at(cursor, "fret-diagram", &format!("diagram {} not defined", idx));
            return;
        };
        self.add_segment_item(cursor, Element::FretDiagram(diagram_item(diagram)));
    }

    /// Place an element in the ChordRest segment at the cursor
    fn add_segment_item(&mut self, cursor: &Cursor, element: Element) {
        self.score.measures[cursor.measure].add_item(SegmentType::ChordRest, cursor.tick, cursor.track, element);
    }

    /// Attach text to a note; one trailing backslash is dropped
    pub(super) fn add_text_to_note(&mut self, text: &str, note: NoteId) {
        let text = text.strip_suffix('\\').unwrap_or(text);
        if let Some(n) = self.score.note_mut(note) {
            n.texts.push(text.to_string());
        }
    }
}
