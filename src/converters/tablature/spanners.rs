//! Running spanner state
//!
//! Each tracker owns the "open spanner" state of one spanner family and
//! holds only ids into the score. The decision of what to do for a chord
//! is a pure function ([`decide_run`], [`tuplet_continues`]) so the policies
//! can be tested without a document.
//!
//! | family                       | state            | policy              |
//! |------------------------------|------------------|---------------------|
//! | let ring, palm mute, vibrato | one per track    | extend or start     |
//! | tie                          | many per track   | explicit phase      |
//! | slur                         | one per track    | explicit phase      |
//! | tuplet, hairpin              | one global       | continue or restart |

use std::collections::HashMap;

use crate::models::{Hairpin, Phase, TupletRatio};
use crate::score::*;

// ============================================================================
// EXTEND-OR-START RUNS (let ring, palm mute, vibrato)
// ============================================================================

/// What a run does for one chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStep {
    /// Chord already ends the open spanner
    Ignore,
    /// Move the open spanner's end to this chord
    Extend,
    /// Open a new spanner here; `replaced` when an older one was dropped
    Start { replaced: bool },
}

/// Decide how an open spanner of `kind` reacts to a chord at `tick`
pub fn decide_run(open: Option<&Spanner>, kind: &SpannerKind, chord: ChordRestId, tick: Fraction) -> RunStep {
    let Some(open) = open else {
        return RunStep::Start { replaced: false };
    };
    if open.kind != *kind {
        return RunStep::Start { replaced: true };
    }
    if open.end_element == Some(chord) {
        RunStep::Ignore
    } else if open.tick2 < tick {
        RunStep::Start { replaced: true }
    } else {
        RunStep::Extend
    }
}

/// Per-track open spanner of one extend-or-start family
#[derive(Debug, Default)]
pub struct RunTracker {
    open: HashMap<usize, SpannerId>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_on(&self, track: usize) -> Option<SpannerId> {
        self.open.get(&track).copied()
    }

    /// Apply one chord to the run on its track
    pub fn step(&mut self, score: &mut Score, kind: SpannerKind, chord: ChordRestId) -> RunStep {
        let Some(cr) = score.chord_rest(chord) else {
            return RunStep::Ignore;
        };
        let (track, tick) = (cr.track, cr.tick);
        let end = tick + score.actual_duration(chord);

        let open = self.open_on(track);
        let step = decide_run(open.and_then(|id| score.spanner(id)), &kind, chord, tick);
        match step {
            RunStep::Ignore => {}
            RunStep::Extend => {
                if let Some(sp) = open.and_then(|id| score.spanner_mut(id)) {
                    sp.tick2 = end;
                    sp.end_element = Some(chord);
                }
            }
            RunStep::Start { replaced } => {
                if replaced {
                    log::debug!("{} on track {} restarted at {}", kind.name(), track, tick);
                }
                let mut sp = Spanner::new(kind, tick, track);
                sp.tick2 = end;
                sp.start_element = Some(chord);
                sp.end_element = Some(chord);
                let id = score.add_spanner(sp);
                self.open.insert(track, id);
            }
        }
        step
    }
}

// ============================================================================
// TIES
// ============================================================================

/// Open ties, several per track allowed (one per chord tone)
#[derive(Debug, Default)]
pub struct TieTracker {
    open: Vec<(usize, TieId)>,
}

impl TieTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn apply(&mut self, score: &mut Score, phase: Phase, note: NoteId, track: usize) {
        match phase {
            Phase::None => {}
            Phase::Start => self.start(score, note, track),
            Phase::Mediate => {
                self.end(score, note, track);
                self.start(score, note, track);
            }
            Phase::End => {
                self.end(score, note, track);
            }
        }
    }

    fn start(&mut self, score: &mut Score, note: NoteId, track: usize) {
        let id = score.add_tie(Tie { track, start_note: Some(note), end_note: None });
        if let Some(n) = score.note_mut(note) {
            n.tie_for = Some(id);
        }
        self.open.push((track, id));
    }

    /// Close the first open tie on `track` starting at the same pitch
    fn end(&mut self, score: &mut Score, note: NoteId, track: usize) -> bool {
        let Some(pitch) = score.note(note).map(|n| n.pitch) else {
            return false;
        };
        let found = self.open.iter().position(|&(t, tie)| {
            t == track
                && score
                    .tie(tie)
                    .and_then(|tie| tie.start_note)
                    .and_then(|s| score.note(s))
                    .is_some_and(|s| s.pitch == pitch)
        });
        let Some(pos) = found else {
            log::debug!("tie end on track {} (pitch {}) has no open start", track, pitch);
            return false;
        };
        let (_, tie) = self.open.remove(pos);
        if let Some(t) = score.tie_mut(tie) {
            t.end_note = Some(note);
        }
        if let Some(n) = score.note_mut(note) {
            n.tie_back = Some(tie);
        }
        true
    }

    /// Detach and delete every tie touching `notes` (notes about to be deleted)
    pub fn purge_notes(&mut self, score: &mut Score, notes: &[NoteId]) {
        for &note in notes {
            let Some((tie_for, tie_back)) = score.note(note).map(|n| (n.tie_for, n.tie_back)) else {
                continue;
            };
            for tie in [tie_for, tie_back].into_iter().flatten() {
                self.open.retain(|&(_, t)| t != tie);
                Self::delete(score, tie);
            }
        }
    }

    /// Delete ties never closed; returns how many were discarded
    pub fn discard_open(&mut self, score: &mut Score) -> usize {
        let open = std::mem::take(&mut self.open);
        for &(track, tie) in &open {
            log::warn!("discarding unterminated tie on track {}", track);
            Self::delete(score, tie);
        }
        open.len()
    }

    fn delete(score: &mut Score, tie: TieId) {
        let Some(t) = score.tie(tie).copied() else {
            return;
        };
        if let Some(n) = t.start_note.and_then(|s| score.note_mut(s)) {
            n.tie_for = None;
        }
        if let Some(n) = t.end_note.and_then(|e| score.note_mut(e)) {
            n.tie_back = None;
        }
        score.delete_tie(tie);
    }
}

// ============================================================================
// SLURS
// ============================================================================

/// Per-track open slur driven by the beat's legato phase
///
/// Mediate closes the open slur and starts the next one at the same chord,
/// so a long phrase becomes a chain of slurs sharing their joints.
#[derive(Debug, Default)]
pub struct SlurTracker {
    open: HashMap<usize, SpannerId>,
    created: Vec<SpannerId>,
}

impl SlurTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_on(&self, track: usize) -> Option<SpannerId> {
        self.open.get(&track).copied()
    }

    pub fn apply(&mut self, score: &mut Score, phase: Phase, cr: ChordRestId) {
        let Some(c) = score.chord_rest(cr) else {
            return;
        };
        let (track, tick) = (c.track, c.tick);
        match phase {
            Phase::None => {}
            Phase::Start => {
                if self.open.remove(&track).is_some() {
                    log::debug!("slur start on track {} while one is open; dropping the old one", track);
                }
                self.start(score, cr, track, tick);
            }
            Phase::Mediate => {
                self.close(score, cr, track, tick);
                self.start(score, cr, track, tick);
            }
            Phase::End => {
                if !self.close(score, cr, track, tick) {
                    log::debug!("slur end on track {} without an open slur", track);
                }
            }
        }
    }

    fn start(&mut self, score: &mut Score, cr: ChordRestId, track: usize, tick: Fraction) {
        let mut slur = Spanner::new(SpannerKind::Slur, tick, track);
        slur.start_element = Some(cr);
        slur.end_element = None;
        let id = score.add_spanner(slur);
        self.created.push(id);
        self.open.insert(track, id);
    }

    fn close(&mut self, score: &mut Score, cr: ChordRestId, track: usize, tick: Fraction) -> bool {
        let Some(id) = self.open.remove(&track) else {
            return false;
        };
        if let Some(slur) = score.spanner_mut(id) {
            slur.track2 = track;
            slur.tick2 = tick;
            slur.end_element = Some(cr);
        }
        true
    }

    /// Delete slurs that never got an end; returns how many were discarded
    pub fn discard_open(&mut self, score: &mut Score) -> usize {
        self.open.clear();
        let mut discarded = 0;
        for id in std::mem::take(&mut self.created) {
            if score.spanner(id).is_some_and(|s| s.end_element.is_none()) {
                log::warn!("discarding unterminated slur {:?}", id);
                score.delete_spanner(id);
                discarded += 1;
            }
        }
        discarded
    }
}

/// Closed slur from `start` to `end`
pub fn slur_between(score: &mut Score, start: ChordRestId, end: ChordRestId) -> Option<SpannerId> {
    let (track, tick) = score.chord_rest(start).map(|c| (c.track, c.tick))?;
    let (track2, tick2) = score.chord_rest(end).map(|c| (c.track, c.tick))?;
    let mut slur = Spanner::new(SpannerKind::Slur, tick, track);
    slur.start_element = Some(start);
    slur.end_element = Some(end);
    slur.track2 = track2;
    slur.tick2 = tick2;
    Some(score.add_spanner(slur))
}

// ============================================================================
// TUPLETS
// ============================================================================

/// Whether `cr` can join the running tuplet
pub fn tuplet_continues(
    tuplet: &Tuplet,
    last_measure: Option<usize>,
    elements_duration: Fraction,
    cr: &ChordRest,
) -> bool {
    let full = elements_duration == tuplet.base_len * tuplet.ratio.0;
    last_measure == cr.measure && tuplet.track == cr.track && !full
}

/// Single running tuplet shared by all tracks
#[derive(Debug, Default)]
pub struct TupletTracker {
    last: Option<TupletId>,
}

impl TupletTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, score: &mut Score, ratio: Option<TupletRatio>, cr: ChordRestId) {
        let Some(ratio) = ratio.filter(TupletRatio::is_valid) else {
            self.last = None;
            return;
        };
        let Some(c) = score.chord_rest(cr) else {
            return;
        };
        if let Some(last) = self.last {
            let keep = score.tuplet(last).is_some_and(|t| {
                let last_measure = t
                    .elements
                    .last()
                    .and_then(|e| score.chord_rest(*e))
                    .and_then(|e| e.measure);
                tuplet_continues(t, last_measure, score.tuplet_elements_duration(last), c)
            });
            if !keep {
                self.last = None;
            }
        }

        let id = match self.last {
            Some(id) => id,
            None => {
                let Some(measure) = c.measure else {
                    return;
                };
                let tuplet = Tuplet {
                    track: c.track,
                    measure,
                    base_len: c.duration,
                    ratio: (ratio.numerator, ratio.denominator),
                    ticks: c.duration * ratio.denominator,
                    elements: Vec::new(),
                };
                let id = score.add_tuplet(tuplet);
                self.last = Some(id);
                id
            }
        };
        score.add_to_tuplet(id, cr);
    }
}

// ============================================================================
// HAIRPINS
// ============================================================================

/// Single running hairpin shared by all tracks; a beat without a hairpin
/// ends it
#[derive(Debug, Default)]
pub struct HairpinTracker {
    last: Option<SpannerId>,
}

impl HairpinTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, score: &mut Score, hairpin: Hairpin, cr: ChordRestId) {
        let kind = match hairpin {
            Hairpin::None => {
                self.last = None;
                return;
            }
            Hairpin::Crescendo => HairpinType::Crescendo,
            Hairpin::Decrescendo => HairpinType::Decrescendo,
        };
        let Some((track, tick)) = score.chord_rest(cr).map(|c| (c.track, c.tick)) else {
            return;
        };
        let id = match self.last {
            Some(id) => id,
            None => {
                let id = score.add_spanner(Spanner::new(SpannerKind::Hairpin(kind), tick, track));
                self.last = Some(id);
                id
            }
        };
        if let Some(sp) = score.spanner_mut(id) {
            sp.tick2 = tick;
            sp.end_element = Some(cr);
            if sp.start_element.is_none() {
                sp.start_element = Some(cr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i32) -> Fraction {
        Fraction::new(n, 4)
    }

    /// Score with one 4/4 measure and quarter chords at the given beats
    fn score_with_chords(track: usize, beats: &[i32]) -> (Score, Vec<ChordRestId>) {
        let mut score = Score::new();
        score.add_measure(Fraction::new(0, 1), (4, 4));
        let ids = beats
            .iter()
            .map(|&b| {
                let mut cr = ChordRest::chord(track);
                cr.set_duration(q(1));
                let id = score.create_chord_rest(cr);
                score.attach_chord_rest(id, q(b)).unwrap();
                id
            })
            .collect();
        (score, ids)
    }

    #[test]
    fn test_decide_run_policies() {
        let mut open = Spanner::new(SpannerKind::LetRing, q(0), 0);
        open.tick2 = q(1);
        open.end_element = Some(ChordRestId(0));

        assert_eq!(decide_run(None, &SpannerKind::LetRing, ChordRestId(1), q(1)), RunStep::Start { replaced: false });
        assert_eq!(decide_run(Some(&open), &SpannerKind::LetRing, ChordRestId(0), q(0)), RunStep::Ignore);
        assert_eq!(decide_run(Some(&open), &SpannerKind::LetRing, ChordRestId(1), q(1)), RunStep::Extend);
        assert_eq!(
            decide_run(Some(&open), &SpannerKind::LetRing, ChordRestId(2), q(2)),
            RunStep::Start { replaced: true }
        );
        assert_eq!(
            decide_run(Some(&open), &SpannerKind::PalmMute, ChordRestId(1), q(1)),
            RunStep::Start { replaced: true }
        );
    }

    #[test]
    fn test_run_over_consecutive_chords() {
        let (mut score, ids) = score_with_chords(0, &[0, 1, 2]);
        let mut runs = RunTracker::new();
        for id in &ids {
            runs.step(&mut score, SpannerKind::PalmMute, *id);
        }
        // second note of the same chord is a no-op
        assert_eq!(runs.step(&mut score, SpannerKind::PalmMute, ids[2]), RunStep::Ignore);

        let spanners: Vec<_> = score.spanners().map(|(_, s)| s.clone()).collect();
        assert_eq!(spanners.len(), 1);
        assert_eq!(spanners[0].end_element, Some(ids[2]));
        assert_eq!(spanners[0].tick2, q(3));
    }

    #[test]
    fn test_run_restarts_after_gap() {
        let (mut score, ids) = score_with_chords(0, &[0, 1, 3]);
        let mut runs = RunTracker::new();
        for id in &ids {
            runs.step(&mut score, SpannerKind::LetRing, *id);
        }
        let spanners: Vec<_> = score.spanners().map(|(_, s)| s.clone()).collect();
        assert_eq!(spanners.len(), 2);
        assert_eq!(spanners[0].end_element, Some(ids[1]));
        assert_eq!(spanners[1].start_element, Some(ids[2]));
    }

    #[test]
    fn test_tie_start_end_matches_pitch() {
        let (mut score, ids) = score_with_chords(0, &[0, 1]);
        let a = score.add_note(ids[0], Note::new(ids[0])).unwrap();
        let b = score.add_note(ids[0], Note { pitch: 64, ..Note::new(ids[0]) }).unwrap();
        let c = score.add_note(ids[1], Note { pitch: 64, ..Note::new(ids[1]) }).unwrap();

        let mut ties = TieTracker::new();
        ties.apply(&mut score, Phase::Start, a, 0);
        ties.apply(&mut score, Phase::Start, b, 0);
        ties.apply(&mut score, Phase::End, c, 0);

        let tie = score.note(c).unwrap().tie_back.unwrap();
        assert_eq!(score.tie(tie).unwrap().start_note, Some(b));
        assert_eq!(ties.open_count(), 1);

        assert_eq!(ties.discard_open(&mut score), 1);
        assert!(score.note(a).unwrap().tie_for.is_none());
        assert_eq!(score.ties().count(), 1);
    }

    #[test]
    fn test_tie_end_without_start() {
        let (mut score, ids) = score_with_chords(0, &[0]);
        let a = score.add_note(ids[0], Note::new(ids[0])).unwrap();
        let mut ties = TieTracker::new();
        ties.apply(&mut score, Phase::End, a, 0);
        assert_eq!(score.ties().count(), 0);
        assert!(score.note(a).unwrap().tie_back.is_none());
    }

    #[test]
    fn test_slur_mediate_makes_chain() {
        let (mut score, ids) = score_with_chords(0, &[0, 1, 2]);
        let mut slurs = SlurTracker::new();
        slurs.apply(&mut score, Phase::Start, ids[0]);
        slurs.apply(&mut score, Phase::Mediate, ids[1]);
        slurs.apply(&mut score, Phase::End, ids[2]);
        assert_eq!(slurs.discard_open(&mut score), 0);

        let spans: Vec<_> = score
            .spanners()
            .map(|(_, s)| (s.start_element, s.end_element))
            .collect();
        assert_eq!(
            spans,
            vec![(Some(ids[0]), Some(ids[1])), (Some(ids[1]), Some(ids[2]))]
        );
    }

    #[test]
    fn test_unterminated_slur_discarded() {
        let (mut score, ids) = score_with_chords(0, &[0, 1]);
        let mut slurs = SlurTracker::new();
        slurs.apply(&mut score, Phase::Start, ids[0]);
        slurs.apply(&mut score, Phase::Start, ids[1]);
        assert_eq!(slurs.discard_open(&mut score), 2);
        assert_eq!(score.spanners().count(), 0);
    }

    #[test]
    fn test_degenerate_tuplet_ratio_ignored() {
        let (mut score, ids) = score_with_chords(0, &[0, 1]);
        let mut tuplets = TupletTracker::new();
        tuplets.apply(&mut score, Some(TupletRatio { numerator: 3, denominator: 0 }), ids[0]);
        tuplets.apply(&mut score, Some(TupletRatio { numerator: 0, denominator: 2 }), ids[1]);

        assert_eq!(score.tuplets().count(), 0);
        assert!(score.chord_rest(ids[0]).unwrap().tuplet.is_none());
        assert_eq!(score.actual_duration(ids[1]), q(1));
    }

    #[test]
    fn test_hairpin_extends_until_cleared() {
        let (mut score, ids) = score_with_chords(0, &[0, 1, 2, 3]);
        let mut hp = HairpinTracker::new();
        hp.apply(&mut score, Hairpin::Crescendo, ids[0]);
        hp.apply(&mut score, Hairpin::Crescendo, ids[1]);
        hp.apply(&mut score, Hairpin::None, ids[2]);
        hp.apply(&mut score, Hairpin::Decrescendo, ids[3]);

        let spans: Vec<_> = score.spanners().map(|(_, s)| s.clone()).collect();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].kind, SpannerKind::Hairpin(HairpinType::Crescendo));
        assert_eq!(spans[0].tick2, q(1));
        assert_eq!(spans[1].kind, SpannerKind::Hairpin(HairpinType::Decrescendo));
    }
}
