//! Master bar and bar orchestration
//!
//! Per master bar, in order: measure, time signature, key signature,
//! volta and repeat, fermata collection, the bars of every staff, triplet
//! feel, section marks, direction marks.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::models::*;
use crate::score::*;

use super::converter::{Cursor, TablatureConverter};
use super::grace::GraceQueue;

lazy_static! {
    /// Jump names to display text
    static ref JUMP_TEXTS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("DaCapo", "Da Capo");
        m.insert("DaCapoAlCoda", "D.C. al Coda");
        m.insert("DaCapoAlDoubleCoda", "D.C. al Coda");
        m.insert("DaCapoAlFine", "D.C. al Fine");
        m.insert("DaSegnoAlCoda", "D.S. al Coda");
        m.insert("DaSegnoAlDoubleCoda", "D.S. al Double Coda");
        m.insert("DaSegnoAlFine", "D.S. al Fine");
        m.insert("DaSegnoSegno", "Da Segno Segno");
        m.insert("DaSegnoSegnoAlCoda", "D.S.S. al Coda");
        m.insert("DaSegnoSegnoAlDoubleCoda", "D.S.S. al Double Coda");
        m.insert("DaSegnoSegnoAlFine", "D.S.S. al Fine");
        m.insert("DaCoda", "Da Coda");
        m.insert("DaDoubleCoda", "Da Double Coda");
        m
    };

    /// Target names to symbols
    static ref TARGET_SYMBOLS: HashMap<&'static str, SymId> = {
        let mut m = HashMap::new();
        m.insert("Segno", SymId::Segno);
        m.insert("SegnoSegno", SymId::SegnoSerpent2);
        m.insert("Coda", SymId::Coda);
        m.insert("DoubleCoda", SymId::CodaSquare);
        m
    };
}

const FINE_TARGET: &str = "Fine";
const FINE_TEXT: &str = "fine";

/// Display text of a jump; unknown names read as "Da Double Coda"
pub fn jump_text(jump: &str) -> &'static str {
    JUMP_TEXTS.get(jump).copied().unwrap_or("Da Double Coda")
}

pub fn clef_kind(clef: Clef) -> ClefKind {
    match (clef.kind, clef.ottava) {
        (ClefType::Neutral, _) => ClefKind::Perc,
        (ClefType::G2, OttavaType::Va8) => ClefKind::G8va,
        (ClefType::G2, _) => ClefKind::G,
        (ClefType::F4, OttavaType::Va8) => ClefKind::F8va,
        (ClefType::F4, OttavaType::Ma15) => ClefKind::F15ma,
        (ClefType::F4, _) => ClefKind::F,
        _ => ClefKind::G,
    }
}

pub fn triplet_feel_text(feel: TripletFeel) -> &'static str {
    match feel {
        TripletFeel::None => "No triplet feel",
        TripletFeel::Triplet8th => "Triplet feel 8th",
        TripletFeel::Triplet16th => "Triplet feel 16th",
        TripletFeel::Dotted8th => "Dotted 8th feel",
        TripletFeel::Dotted16th => "Dotted 16th feel",
        TripletFeel::Scottish8th => "Scottish 8th feel",
        TripletFeel::Scottish16th => "Scottish 16th feel",
    }
}

/// Volta text: ending numbers joined by "-"
pub fn volta_text(endings: &[i32]) -> String {
    endings.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("-")
}

impl<'a> TablatureConverter<'a> {
    pub(super) fn convert_master_bar(&mut self, idx: usize, mb: &'a MasterBar) {
        self.context.current_measure = Some(idx);
        self.context.current_track = None;

        let tick = self.score.end_tick();
        let measure = self.score.add_measure(tick, (mb.time_sig.numerator, mb.time_sig.denominator));

        self.add_time_sig(mb, measure);
        self.add_key_sig(mb, measure);
        self.add_repeat(mb, measure);
        self.collect_fermatas(mb, measure);
        self.convert_bars(idx, mb, measure, tick);
        self.add_triplet_feel(mb, measure);
        self.add_section(mb, measure);
        self.add_direction(mb, measure);
    }

    // ========================================================================
    // SIGNATURES / REPEATS
    // ========================================================================

    fn add_time_sig(&mut self, mb: &MasterBar, measure: usize) {
        if self.last_time_sig == Some(mb.time_sig) {
            return;
        }
        self.last_time_sig = Some(mb.time_sig);

        let m = &mut self.score.measures[measure];
        let tick = m.tick;
        for (staff_idx, staff) in self.score.staves.iter().enumerate() {
            if staff.staff_type.gen_timesig() {
                m.add_item(
                    SegmentType::TimeSig,
                    tick,
                    track_of(staff_idx, 0),
                    Element::TimeSig { numerator: mb.time_sig.numerator, denominator: mb.time_sig.denominator },
                );
            }
        }
    }

    fn add_key_sig(&mut self, mb: &MasterBar, measure: usize) {
        let m = &mut self.score.measures[measure];
        let tick = m.tick;
        for (staff_idx, staff) in self.score.staves.iter().enumerate() {
            if self.last_key_sigs.get(&staff_idx) == Some(&mb.key_sig) {
                continue;
            }
            if staff.staff_type.gen_timesig() {
                m.add_item(SegmentType::KeySig, tick, track_of(staff_idx, 0), Element::KeySig(mb.key_sig.fifths()));
                self.last_key_sigs.insert(staff_idx, mb.key_sig);
            }
        }
    }

    fn add_repeat(&mut self, mb: &MasterBar, measure: usize) {
        self.add_volta(mb, measure);

        let m = &mut self.score.measures[measure];
        match mb.repeat.kind {
            RepeatType::None => return,
            RepeatType::Start => m.repeat_start = true,
            RepeatType::End => m.repeat_end = true,
            RepeatType::StartEnd => {
                m.repeat_start = true;
                m.repeat_end = true;
            }
        }
        m.repeat_count = mb.repeat.count;
    }

    /// Continue the previous volta when the ending set is unchanged,
    /// otherwise open a new one
    fn add_volta(&mut self, mb: &MasterBar, measure: usize) {
        let endings = &mb.alternate_endings;
        if endings.is_empty() {
            self.last_volta = None;
            return;
        }

        if let Some(last) = self.last_volta {
            let same = self.score.spanner(last).is_some_and(|sp| match &sp.kind {
                SpannerKind::Volta { endings: prev, .. } => {
                    prev.len() == endings.len() && endings.iter().all(|e| prev.contains(e))
                }
                _ => false,
            });
            if !same {
                self.last_volta = None;
            }
        }

        let (tick, end) = {
            let m = &self.score.measures[measure];
            (m.tick, m.end_tick())
        };
        let kind = SpannerKind::Volta { endings: endings.clone(), text: volta_text(endings) };

        match self.last_volta {
            Some(id) => {
                self.score.remove_spanner(id);
                if let Some(sp) = self.score.spanner_mut(id) {
                    sp.kind = kind;
                    sp.tick2 = end;
                }
                self.score.readd_spanner(id);
            }
            None => {
                let mut volta = Spanner::new(kind, tick, 0);
                volta.tick2 = end;
                self.last_volta = Some(self.score.add_spanner(volta));
            }
        }
    }

    fn collect_fermatas(&mut self, mb: &MasterBar, measure: usize) {
        for fermata in &mb.fermatas {
            self.fermatas.push((measure, *fermata));
        }
    }

    // ========================================================================
    // MARKERS
    // ========================================================================

    fn add_triplet_feel(&mut self, mb: &MasterBar, measure: usize) {
        if mb.triplet_feel == self.last_triplet_feel {
            return;
        }
        self.last_triplet_feel = mb.triplet_feel;

        let m = &mut self.score.measures[measure];
        let tick = m.tick;
        m.add_item(
            SegmentType::ChordRest,
            tick,
            0,
            Element::StaffText(triplet_feel_text(mb.triplet_feel).to_string()),
        );
    }

    fn add_section(&mut self, mb: &MasterBar, measure: usize) {
        let m = &mut self.score.measures[measure];
        let tick = m.tick;
        for text in [&mb.section.letter, &mb.section.text] {
            if !text.is_empty() {
                m.add_item(SegmentType::ChordRest, tick, 0, Element::RehearsalMark(text.clone()));
            }
        }
    }

    fn add_direction(&mut self, mb: &MasterBar, measure: usize) {
        let direction = &mb.direction;
        let tick = self.score.measures[measure].tick;

        if !direction.jump.is_empty() {
            let text = if direction.target == FINE_TARGET { FINE_TEXT } else { jump_text(&direction.jump) };
            if !JUMP_TEXTS.contains_key(direction.jump.as_str()) {
                log::debug!("unknown jump '{}' shown as '{}'", direction.jump, text);
            }
            self.score.measures[measure].add_item(
                SegmentType::KeySig,
                tick,
                0,
                Element::StaffText(text.to_string()),
            );
        }

        if direction.target.is_empty() {
            return;
        }
        let element = if direction.target == FINE_TARGET {
            Element::StaffText(FINE_TEXT.to_string())
        } else if let Some(sym) = TARGET_SYMBOLS.get(direction.target.as_str()) {
            Element::Symbol(*sym)
        } else {
            log::debug!("unknown direction target '{}'", direction.target);
            self.context.current_track = None;
            self.context.add_skipped("direction-target", &format!("unknown target '{}'", direction.target));
            return;
        };
        self.score.measures[measure].add_item(SegmentType::BarLine, tick, 0, element);
    }

    // ========================================================================
    // BARS / VOICES
    // ========================================================================

    fn convert_bars(&mut self, idx: usize, mb: &'a MasterBar, measure: usize, tick: Fraction) {
        for staff in 0..self.score.nstaves() {
            let cursor = Cursor { master_bar: idx, measure, track: track_of(staff, 0), tick };
            match mb.bars.get(staff) {
                Some(bar) => self.convert_bar(bar, cursor),
                None => {
                    log::debug!("master bar {} has no bar for staff {}", idx, staff);
                    self.fill_uncompleted_measure(cursor);
                }
            }
        }
    }

    fn convert_bar(&mut self, bar: &'a Bar, cursor: Cursor) {
        self.context.current_track = Some(cursor.track);
        self.add_clef(bar, cursor);
        if self.add_simile_mark(bar, cursor) {
            return;
        }
        self.convert_voices(&bar.voices, cursor);
    }

    fn add_clef(&mut self, bar: &Bar, cursor: Cursor) {
        if self.last_clefs.get(&cursor.track) == Some(&bar.clef.kind) {
            return;
        }
        let m = &mut self.score.measures[cursor.measure];
        let tick = m.tick;
        m.add_item(SegmentType::Clef, tick, cursor.track, Element::Clef(clef_kind(bar.clef)));
        self.last_clefs.insert(cursor.track, bar.clef.kind);
    }

    /// Place a measure repeat for simile bars; true when the voices are skipped
    fn add_simile_mark(&mut self, bar: &Bar, cursor: Cursor) -> bool {
        let (span, position) = match bar.simile_mark {
            SimileMark::None => return false,
            SimileMark::Simple => (1, 1),
            SimileMark::FirstOfDouble => (2, 1),
            SimileMark::SecondOfDouble => (2, 2),
        };
        let len = self.score.measures[cursor.measure].ticks;
        let mut cr = ChordRest::new(ChordRestKind::MeasureRepeat { span, position }, cursor.track);
        cr.set_duration(len);
        cr.duration_type = DurationType::Measure;
        cr.dots = 0;
        let id = self.score.create_chord_rest(cr);
        if let Err(e) = self.score.attach_chord_rest(id, cursor.tick) {
            log::debug!("measure repeat not placed: {}", e);
            self.skip_at(&cursor, "simile-mark", &e.to_string());
        }
        true
    }

    fn convert_voices(&mut self, voices: &'a [Voice], cursor: Cursor) {
        if voices.is_empty() {
            self.fill_uncompleted_measure(cursor);
            return;
        }
        if voices.len() > VOICES {
            log::debug!("{} voices on track {}, only {} kept", voices.len(), cursor.track, VOICES);
            let reason = format!("{} voices past the first {} dropped", voices.len() - VOICES, VOICES);
            self.skip_at(&cursor, "voice", &reason);
        }
        for (voice_idx, voice) in voices.iter().take(VOICES).enumerate() {
            let cursor = Cursor { track: cursor.track + voice_idx, ..cursor };
            self.convert_voice(voice, cursor);
        }
    }

    fn convert_voice(&mut self, voice: &'a Voice, mut cursor: Cursor) {
        cursor.tick = self.score.measures[cursor.measure].tick;
        let mut graces = GraceQueue::new();
        for beat in &voice.beats {
            cursor.tick = self.convert_beat(beat, &mut graces, cursor);
        }
        self.fill_uncompleted_measure(cursor);
        self.clear_defective_grace_chords(graces, &cursor);
    }

    /// Pad the rest of the measure on the cursor's track with one rest
    pub(super) fn fill_uncompleted_measure(&mut self, cursor: Cursor) {
        let end = self.score.measures[cursor.measure].end_tick();
        let remaining = end - cursor.tick;
        if remaining <= Fraction::new(0, 1) {
            return;
        }
        if let Err(e) = self.score.set_rest(cursor.tick, cursor.track, remaining) {
            log::debug!("fill rest not placed: {}", e);
            self.skip_at(&cursor, "fill-rest", &e.to_string());
        }
    }
}
