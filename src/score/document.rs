//! Score document and its building API
//!
//! Elements live in arenas owned by the [`Score`] and are addressed by the
//! typed ids from [`super::types`]. Measures hold segments; segments hold
//! [`SegmentItem`]s on numbered tracks. A chord or rest is "attached" once
//! its id has been placed in a ChordRest segment.
//!
//! ```text
//! Score
//! ├── parts / staves
//! ├── measures ── segments (Clef < KeySig < TimeSig < ChordRest < BarLine per tick)
//! │                 └── items { track, element }
//! ├── chord_rests / notes / ties / tuplets   (arenas)
//! ├── spanners (arena) + spanner list (registration order)
//! └── tempo map
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::elements::*;
use super::instrument::{Part, Staff};
use super::types::*;

/// Errors raised by the building API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("no measure contains tick {0}")]
    NoMeasureAt(Fraction),

    #[error("track {track} already has a chord or rest at tick {tick}")]
    SlotOccupied { track: usize, tick: Fraction },

    #[error("unknown chord/rest {0:?}")]
    UnknownChordRest(ChordRestId),
}

/// Segment kinds, in layout order within one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    Clef,
    KeySig,
    TimeSig,
    ChordRest,
    BarLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentType,
    pub tick: Fraction,
    pub items: Vec<SegmentItem>,
}

impl Segment {
    pub fn items_on(&self, track: usize) -> impl Iterator<Item = &Element> {
        self.items.iter().filter(move |i| i.track == track).map(|i| &i.element)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub tick: Fraction,
    /// Length; always equals the time signature
    pub ticks: Fraction,
    pub time_sig: (i32, i32),
    pub repeat_start: bool,
    pub repeat_end: bool,
    pub repeat_count: i32,
    pub segments: Vec<Segment>,
}

impl Measure {
    pub fn end_tick(&self) -> Fraction {
        self.tick + self.ticks
    }

    pub fn contains(&self, tick: Fraction) -> bool {
        tick >= self.tick && tick < self.end_tick()
    }

    pub fn find_segment(&self, kind: SegmentType, tick: Fraction) -> Option<&Segment> {
        self.segments.iter().find(|s| s.kind == kind && s.tick == tick)
    }

    /// Index of the segment of `kind` at `tick`, creating it in order if absent
    pub fn get_segment(&mut self, kind: SegmentType, tick: Fraction) -> usize {
        if let Some(idx) = self.segments.iter().position(|s| s.kind == kind && s.tick == tick) {
            return idx;
        }
        let idx = self
            .segments
            .iter()
            .position(|s| (s.tick, s.kind) > (tick, kind))
            .unwrap_or(self.segments.len());
        self.segments.insert(idx, Segment { kind, tick, items: Vec::new() });
        idx
    }

    pub fn add_item(&mut self, kind: SegmentType, tick: Fraction, track: usize, element: Element) {
        let idx = self.get_segment(kind, tick);
        self.segments[idx].items.push(SegmentItem { track, element });
    }

    /// Items of `kind` segments on `track`, in tick order
    pub fn items_of(&self, kind: SegmentType, track: usize) -> impl Iterator<Item = (Fraction, &Element)> {
        self.segments
            .iter()
            .filter(move |s| s.kind == kind)
            .flat_map(move |s| s.items_on(track).map(move |e| (s.tick, e)))
    }
}

/// Target score document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Score {
    pub parts: Vec<Part>,
    pub staves: Vec<Staff>,
    pub measures: Vec<Measure>,
    /// Tick -> tempo in quarter notes per second
    pub tempo_map: BTreeMap<i32, f64>,
    chord_rests: Vec<Option<ChordRest>>,
    notes: Vec<Option<Note>>,
    ties: Vec<Option<Tie>>,
    tuplets: Vec<Tuplet>,
    spanners: Vec<Option<Spanner>>,
    spanner_list: Vec<SpannerId>,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // PARTS / STAVES
    // ========================================================================

    pub fn append_part(&mut self, part: Part) -> usize {
        self.parts.push(part);
        self.parts.len() - 1
    }

    pub fn append_staff(&mut self, staff: Staff) -> usize {
        let part = staff.part;
        self.staves.push(staff);
        let idx = self.staves.len() - 1;
        if let Some(p) = self.parts.get_mut(part) {
            p.staves.push(idx);
        }
        idx
    }

    pub fn nstaves(&self) -> usize {
        self.staves.len()
    }

    pub fn part_of_track(&self, track: usize) -> Option<&Part> {
        let staff = self.staves.get(staff_of(track))?;
        self.parts.get(staff.part)
    }

    // ========================================================================
    // MEASURES
    // ========================================================================

    pub fn add_measure(&mut self, tick: Fraction, time_sig: (i32, i32)) -> usize {
        self.measures.push(Measure {
            tick,
            ticks: Fraction::new(time_sig.0, time_sig.1),
            time_sig,
            repeat_start: false,
            repeat_end: false,
            repeat_count: 0,
            segments: Vec::new(),
        });
        self.measures.len() - 1
    }

    pub fn last_measure(&self) -> Option<&Measure> {
        self.measures.last()
    }

    pub fn last_measure_mut(&mut self) -> Option<&mut Measure> {
        self.measures.last_mut()
    }

    /// End tick of the last measure (0 for an empty score)
    pub fn end_tick(&self) -> Fraction {
        self.last_measure().map(Measure::end_tick).unwrap_or_else(|| Fraction::new(0, 1))
    }

    pub fn measure_index_at(&self, tick: Fraction) -> Option<usize> {
        self.measures.iter().position(|m| m.contains(tick))
    }

    // ========================================================================
    // CHORDS / RESTS
    // ========================================================================

    /// Put a chord or rest into the arena without placing it anywhere
    pub fn create_chord_rest(&mut self, cr: ChordRest) -> ChordRestId {
        self.chord_rests.push(Some(cr));
        ChordRestId(self.chord_rests.len() - 1)
    }

    pub fn chord_rest(&self, id: ChordRestId) -> Option<&ChordRest> {
        self.chord_rests.get(id.0).and_then(Option::as_ref)
    }

    pub fn chord_rest_mut(&mut self, id: ChordRestId) -> Option<&mut ChordRest> {
        self.chord_rests.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn chord(&self, id: ChordRestId) -> Option<&Chord> {
        self.chord_rest(id).and_then(ChordRest::as_chord)
    }

    pub fn chord_mut(&mut self, id: ChordRestId) -> Option<&mut Chord> {
        self.chord_rest_mut(id).and_then(ChordRest::as_chord_mut)
    }

    /// All live chords and rests, grace chords included
    pub fn chord_rests(&self) -> impl Iterator<Item = (ChordRestId, &ChordRest)> {
        self.chord_rests
            .iter()
            .enumerate()
            .filter_map(|(i, cr)| cr.as_ref().map(|cr| (ChordRestId(i), cr)))
    }

    /// Place a chord or rest in the ChordRest segment at `tick`
    pub fn attach_chord_rest(&mut self, id: ChordRestId, tick: Fraction) -> Result<(), ScoreError> {
        let midx = self.measure_index_at(tick).ok_or(ScoreError::NoMeasureAt(tick))?;
        let track = self.chord_rest(id).ok_or(ScoreError::UnknownChordRest(id))?.track;
        if self.chord_rest_at(tick, track).is_some() {
            return Err(ScoreError::SlotOccupied { track, tick });
        }
        self.measures[midx].add_item(SegmentType::ChordRest, tick, track, Element::ChordRest(id));
        if let Some(cr) = self.chord_rest_mut(id) {
            cr.tick = tick;
            cr.measure = Some(midx);
        }
        Ok(())
    }

    pub fn chord_rest_at(&self, tick: Fraction, track: usize) -> Option<ChordRestId> {
        let m = &self.measures[self.measure_index_at(tick)?];
        m.find_segment(SegmentType::ChordRest, tick)?
            .items_on(track)
            .find_map(|e| match e {
                Element::ChordRest(id) => Some(*id),
                _ => None,
            })
    }

    /// Next attached chord or rest after `id` on the same track
    pub fn next_chord_rest(&self, id: ChordRestId) -> Option<ChordRestId> {
        let cr = self.chord_rest(id)?;
        let (track, tick) = (cr.track, cr.tick);
        let start = cr.measure?;
        self.measures[start..]
            .iter()
            .flat_map(|m| m.items_of(SegmentType::ChordRest, track))
            .filter(|(t, _)| *t > tick)
            .find_map(|(_, e)| match e {
                Element::ChordRest(next) => Some(*next),
                _ => None,
            })
    }

    /// Add a grace chord in front of `parent`
    pub fn add_grace(&mut self, parent: ChordRestId, grace: ChordRestId) {
        let (tick, measure) = match self.chord_rest(parent) {
            Some(p) => (p.tick, p.measure),
            None => return,
        };
        if let Some(g) = self.chord_rest_mut(grace) {
            g.tick = tick;
            g.measure = measure;
            if let Some(c) = g.as_chord_mut() {
                c.parent = Some(parent);
            }
        }
        if let Some(p) = self.chord_mut(parent) {
            p.grace_notes.push(grace);
        }
    }

    /// Notes of a chord and of its grace chords, recursively
    pub fn chord_notes_recursive(&self, id: ChordRestId) -> Vec<NoteId> {
        let mut out = Vec::new();
        if let Some(chord) = self.chord(id) {
            out.extend(chord.notes.iter().copied());
            for g in &chord.grace_notes {
                out.extend(self.chord_notes_recursive(*g));
            }
        }
        out
    }

    /// Remove a chord or rest with its notes and grace chords
    pub fn delete_chord_rest(&mut self, id: ChordRestId) {
        let Some(cr) = self.chord_rests.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        if let ChordRestKind::Chord(chord) = &cr.kind {
            for n in &chord.notes {
                if let Some(slot) = self.notes.get_mut(n.0) {
                    *slot = None;
                }
            }
            for g in chord.grace_notes.clone() {
                self.delete_chord_rest(g);
            }
        }
        if let Some(tid) = cr.tuplet {
            if let Some(t) = self.tuplets.get_mut(tid.0) {
                t.elements.retain(|e| *e != id);
            }
        }
        if let Some(midx) = cr.measure {
            for seg in &mut self.measures[midx].segments {
                seg.items.retain(|i| i.element != Element::ChordRest(id));
            }
        }
    }

    /// Written duration scaled by the tuplet ratio
    pub fn actual_duration(&self, id: ChordRestId) -> Fraction {
        let Some(cr) = self.chord_rest(id) else {
            return Fraction::new(0, 1);
        };
        match cr.tuplet.and_then(|t| self.tuplets.get(t.0)) {
            Some(t) => cr.duration / t.ratio_fraction(),
            None => cr.duration,
        }
    }

    /// Highest-pitched note of a chord
    pub fn up_note(&self, id: ChordRestId) -> Option<NoteId> {
        let chord = self.chord(id)?;
        chord
            .notes
            .iter()
            .copied()
            .filter_map(|n| self.note(n).map(|note| (n, note.pitch)))
            .max_by_key(|(_, p)| *p)
            .map(|(n, _)| n)
    }

    /// Add the articulation, or remove it if the chord already has it.
    /// Returns whether the articulation is now present.
    pub fn toggle_articulation(&mut self, id: ChordRestId, art: Articulation) -> bool {
        let Some(chord) = self.chord_mut(id) else {
            return false;
        };
        if let Some(pos) = chord.articulations.iter().position(|a| a.sym == art.sym) {
            chord.articulations.remove(pos);
            false
        } else {
            chord.articulations.push(art);
            true
        }
    }

    /// Fill `len` at `tick` on `track` with one rest
    pub fn set_rest(&mut self, tick: Fraction, track: usize, len: Fraction) -> Result<ChordRestId, ScoreError> {
        let mut rest = ChordRest::rest(track);
        let full_measure = self
            .measure_index_at(tick)
            .map(|m| self.measures[m].tick == tick && self.measures[m].ticks == len)
            .unwrap_or(false);
        rest.set_duration(len);
        if full_measure {
            rest.duration_type = DurationType::Measure;
            rest.dots = 0;
        }
        let id = self.create_chord_rest(rest);
        if let Err(e) = self.attach_chord_rest(id, tick) {
            self.chord_rests[id.0] = None;
            return Err(e);
        }
        Ok(id)
    }

    // ========================================================================
    // NOTES / TIES
    // ========================================================================

    pub fn add_note(&mut self, chord: ChordRestId, mut note: Note) -> Option<NoteId> {
        let id = NoteId(self.notes.len());
        note.chord = chord;
        self.chord_mut(chord)?.notes.push(id);
        self.notes.push(Some(note));
        Some(id)
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(id.0).and_then(Option::as_ref)
    }

    pub fn note_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn add_tie(&mut self, tie: Tie) -> TieId {
        self.ties.push(Some(tie));
        TieId(self.ties.len() - 1)
    }

    pub fn tie(&self, id: TieId) -> Option<&Tie> {
        self.ties.get(id.0).and_then(Option::as_ref)
    }

    pub fn tie_mut(&mut self, id: TieId) -> Option<&mut Tie> {
        self.ties.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn delete_tie(&mut self, id: TieId) {
        if let Some(slot) = self.ties.get_mut(id.0) {
            *slot = None;
        }
    }

    pub fn ties(&self) -> impl Iterator<Item = (TieId, &Tie)> {
        self.ties
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_ref().map(|t| (TieId(i), t)))
    }

    // ========================================================================
    // SPANNERS / TUPLETS
    // ========================================================================

    /// Create a spanner and register it with the spanner list
    pub fn add_spanner(&mut self, spanner: Spanner) -> SpannerId {
        self.spanners.push(Some(spanner));
        let id = SpannerId(self.spanners.len() - 1);
        self.spanner_list.push(id);
        id
    }

    /// Take a spanner off the spanner list; the object itself is kept
    pub fn remove_spanner(&mut self, id: SpannerId) {
        self.spanner_list.retain(|s| *s != id);
    }

    /// Put a previously removed spanner back at the end of the list
    pub fn readd_spanner(&mut self, id: SpannerId) {
        if self.spanner(id).is_some() && !self.spanner_list.contains(&id) {
            self.spanner_list.push(id);
        }
    }

    pub fn delete_spanner(&mut self, id: SpannerId) {
        self.remove_spanner(id);
        if let Some(slot) = self.spanners.get_mut(id.0) {
            *slot = None;
        }
    }

    pub fn spanner(&self, id: SpannerId) -> Option<&Spanner> {
        self.spanners.get(id.0).and_then(Option::as_ref)
    }

    pub fn spanner_mut(&mut self, id: SpannerId) -> Option<&mut Spanner> {
        self.spanners.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Registered spanners in list order
    pub fn spanners(&self) -> impl Iterator<Item = (SpannerId, &Spanner)> {
        self.spanner_list
            .iter()
            .filter_map(|id| self.spanner(*id).map(|s| (*id, s)))
    }

    pub fn add_tuplet(&mut self, tuplet: Tuplet) -> TupletId {
        self.tuplets.push(tuplet);
        TupletId(self.tuplets.len() - 1)
    }

    pub fn tuplet(&self, id: TupletId) -> Option<&Tuplet> {
        self.tuplets.get(id.0)
    }

    pub fn tuplets(&self) -> impl Iterator<Item = &Tuplet> {
        self.tuplets.iter().filter(|t| !t.elements.is_empty())
    }

    pub fn add_to_tuplet(&mut self, tuplet: TupletId, cr: ChordRestId) {
        if let Some(t) = self.tuplets.get_mut(tuplet.0) {
            t.elements.push(cr);
        }
        if let Some(c) = self.chord_rest_mut(cr) {
            c.tuplet = Some(tuplet);
        }
    }

    /// Sum of the written durations of a tuplet's members
    pub fn tuplet_elements_duration(&self, id: TupletId) -> Fraction {
        self.tuplet(id)
            .map(|t| {
                t.elements
                    .iter()
                    .filter_map(|e| self.chord_rest(*e))
                    .fold(Fraction::new(0, 1), |acc, cr| acc + cr.duration)
            })
            .unwrap_or_else(|| Fraction::new(0, 1))
    }

    // ========================================================================
    // TEMPO
    // ========================================================================

    /// Register `tempo` (quarter notes per second) at `tick`
    pub fn set_tempo(&mut self, tick: Fraction, tempo: f64) {
        self.tempo_map.insert(to_ticks(tick), tempo);
    }
}
