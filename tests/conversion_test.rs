// Test: whole-document conversion
//
// Builds small tablature documents in code and checks the resulting score:
// measure layout, fill rests, signatures, markers, tempo and drum parts.

use tab_import_wasm::converters::tablature::{convert_document, ConversionStatus};
use tab_import_wasm::models::*;
use tab_import_wasm::score::{
    to_ticks, ChordRest, ChordRestKind, ClefKind, DurationType, Element, Fraction, Score, SegmentType, StaffType,
    SymId,
};

fn note(midi: i32) -> Note {
    Note { pitch: MidiPitch { midi, ..Default::default() }, ..Default::default() }
}

fn beat(unit: RhythmUnit, notes: Vec<Note>) -> Beat {
    Beat { rhythm: Rhythm { unit, dots: 0 }, notes, ..Default::default() }
}

fn quarter(midi: i32) -> Beat {
    beat(RhythmUnit::Quarter, vec![note(midi)])
}

fn guitar(idx: usize) -> SourceTrack {
    SourceTrack {
        idx,
        name: format!("Guitar {}", idx + 1),
        staff_count: 1,
        staff_properties: vec![StaffProperty {
            tuning: vec![40, 45, 50, 55, 59, 64],
            fret_count: 24,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn bar(beats: Vec<Beat>) -> Bar {
    Bar { voices: vec![Voice { beats }], ..Default::default() }
}

fn master_bar(bars: Vec<Bar>) -> MasterBar {
    MasterBar { bars, ..Default::default() }
}

fn document(tracks: Vec<SourceTrack>, master_bars: Vec<MasterBar>) -> SourceDocument {
    SourceDocument { tracks, master_tracks: MasterTracks::default(), master_bars }
}

/// Placed chords and rests of a track, by tick
fn on_track(score: &Score, track: usize) -> Vec<&ChordRest> {
    let mut crs: Vec<&ChordRest> = score
        .chord_rests()
        .map(|(_, cr)| cr)
        .filter(|cr| cr.track == track)
        .filter(|cr| cr.as_chord().map_or(true, |c| !c.note_type.is_grace()))
        .collect();
    crs.sort_by_key(|cr| cr.tick);
    crs
}

#[test]
fn test_two_tracks_one_silent() {
    let doc = document(
        vec![guitar(0), guitar(1)],
        vec![master_bar(vec![bar(vec![quarter(60), quarter(60), quarter(60), quarter(60)]), Bar::default()])],
    );

    let result = convert_document(&doc, None).expect("conversion should succeed");
    let score = &result.score;

    assert_eq!(score.measures.len(), 1);
    assert_eq!(result.status, ConversionStatus::Complete);

    let track0 = on_track(score, 0);
    let ticks: Vec<i32> = track0.iter().map(|cr| to_ticks(cr.tick)).collect();
    assert_eq!(ticks, vec![0, 480, 960, 1440]);
    for cr in &track0 {
        assert!(cr.is_chord());
        assert_eq!(cr.duration, Fraction::new(1, 4));
        assert_eq!(cr.duration_type, DurationType::Quarter);
    }

    // second part starts at staff 1 = track 4
    let track4 = on_track(score, 4);
    assert_eq!(track4.len(), 1);
    assert!(track4[0].is_rest());
    assert_eq!(to_ticks(track4[0].tick), 0);
    assert_eq!(track4[0].duration, Fraction::new(1, 1));
    assert_eq!(track4[0].duration_type, DurationType::Measure);
}

#[test]
fn test_underfilled_voice_padded_with_one_rest() {
    let doc = document(vec![guitar(0)], vec![master_bar(vec![bar(vec![quarter(60)])])]);
    let result = convert_document(&doc, None).unwrap();

    let track0 = on_track(&result.score, 0);
    assert_eq!(track0.len(), 2);
    assert!(track0[1].is_rest());
    assert_eq!(to_ticks(track0[1].tick), 480);
    assert_eq!(track0[1].duration, Fraction::new(3, 4));
}

#[test]
fn test_measures_follow_time_signatures() {
    let mut second = master_bar(vec![bar(vec![quarter(60), quarter(62), quarter(64)])]);
    second.time_sig = TimeSig { numerator: 3, denominator: 4 };
    let doc = document(vec![guitar(0)], vec![master_bar(vec![Bar::default()]), second]);

    let result = convert_document(&doc, None).unwrap();
    let score = &result.score;
    assert_eq!(score.measures.len(), 2);
    assert_eq!(score.measures[1].tick, Fraction::new(1, 1));
    assert_eq!(score.measures[1].ticks, Fraction::new(3, 4));

    // both measures carry a time signature since it changed
    assert_eq!(score.measures[0].items_of(SegmentType::TimeSig, 0).count(), 1);
    assert_eq!(score.measures[1].items_of(SegmentType::TimeSig, 0).count(), 1);
}

#[test]
fn test_unchanged_key_signature_not_repeated() {
    let mut first = master_bar(vec![Bar::default()]);
    first.key_sig = KeySig::G;
    let mut second = master_bar(vec![Bar::default()]);
    second.key_sig = KeySig::G;
    let doc = document(vec![guitar(0)], vec![first, second]);

    let score = convert_document(&doc, None).unwrap().score;
    let keys: Vec<_> = score.measures[0].items_of(SegmentType::KeySig, 0).map(|(_, e)| e.clone()).collect();
    assert_eq!(keys, vec![Element::KeySig(1)]);
    assert_eq!(score.measures[1].items_of(SegmentType::KeySig, 0).count(), 0);
}

#[test]
fn test_beat_past_measure_end_is_skipped() {
    let beats = vec![quarter(60), quarter(60), quarter(60), quarter(60), quarter(60)];
    let doc = document(vec![guitar(0)], vec![master_bar(vec![bar(beats)])]);

    let result = convert_document(&doc, None).unwrap();
    assert_eq!(on_track(&result.score, 0).len(), 4);
    assert_eq!(result.status, ConversionStatus::Partial);
    assert!(result.skipped_elements.iter().any(|s| s.element_type == "beat"));
}

#[test]
fn test_pitch_resolves_to_highest_free_string() {
    let chord = beat(RhythmUnit::Whole, vec![note(64), note(64)]);
    let doc = document(vec![guitar(0)], vec![master_bar(vec![bar(vec![chord])])]);

    let score = convert_document(&doc, None).unwrap().score;
    let cr = on_track(&score, 0)[0];
    let chord = cr.as_chord().unwrap();
    let strings: Vec<(i32, i32)> = chord
        .notes
        .iter()
        .map(|n| score.note(*n).map(|n| (n.string, n.fret)).unwrap())
        .collect();
    // open high E, then the B string at fret 5
    assert_eq!(strings, vec![(0, 0), (1, 5)]);
}

#[test]
fn test_tempo_automation_becomes_tempo_text() {
    let mut doc = document(vec![guitar(0)], vec![master_bar(vec![Bar::default()])]);
    doc.master_tracks.tempo.push(TempoAutomation { bar: 0, position: 0.5, value: 90, tempo_unit: 0 });

    let score = convert_document(&doc, None).unwrap().score;
    assert_eq!(score.tempo_map.get(&960), Some(&1.5));

    let texts: Vec<_> = score.measures[0].items_of(SegmentType::ChordRest, 0).collect();
    assert!(texts.iter().any(|(tick, e)| {
        *tick == Fraction::new(1, 2)
            && matches!(e, Element::TempoText { text, .. } if text == "<sym>metNoteQuarterUp</sym> = 90")
    }));
}

#[test]
fn test_drum_track_set_up() {
    let drums = SourceTrack {
        idx: 0,
        name: "Drums".to_string(),
        staff_count: 1,
        program: 38,
        midi_channel: 9,
        ..Default::default()
    };
    let hit = beat(RhythmUnit::Whole, vec![Note::default()]);
    let doc = document(vec![drums], vec![master_bar(vec![bar(vec![hit])])]);

    let score = convert_document(&doc, None).unwrap().score;
    let part = &score.parts[0];
    assert!(part.instrument.use_drumset);
    assert_eq!(score.staves[0].staff_type, StaffType::Percussion);
    // pitch came from the program, which is then reset
    assert_eq!(part.instrument.channels[0].program, 0);
    let cr = on_track(&score, 0)[0];
    let pitch = score.note(cr.as_chord().unwrap().notes[0]).unwrap().pitch;
    assert_eq!(pitch, 38);
}

#[test]
fn test_two_staff_part_gets_brace() {
    let piano = SourceTrack { idx: 0, name: "Piano".to_string(), staff_count: 2, ..Default::default() };
    let doc = document(vec![piano], vec![master_bar(vec![Bar::default(), Bar::default()])]);

    let score = convert_document(&doc, None).unwrap().score;
    assert_eq!(score.parts[0].staves, vec![0, 1]);
    assert_eq!(score.staves[0].brackets.len(), 1);
    assert_eq!(score.staves[0].bar_line_span, 2);
    // both staves are filled
    assert_eq!(on_track(&score, 0).len(), 1);
    assert_eq!(on_track(&score, 4).len(), 1);
}

#[test]
fn test_simile_mark_places_measure_repeat() {
    let mut b = bar(vec![quarter(60)]);
    b.simile_mark = SimileMark::Simple;
    let doc = document(vec![guitar(0)], vec![master_bar(vec![b])]);

    let score = convert_document(&doc, None).unwrap().score;
    let track0 = on_track(&score, 0);
    assert_eq!(track0.len(), 1);
    assert!(matches!(track0[0].kind, ChordRestKind::MeasureRepeat { span: 1, .. }));
}

#[test]
fn test_dynamics_only_emitted_on_change() {
    let mut beats = vec![quarter(60), quarter(60), quarter(60), quarter(60)];
    beats[0].dynamic = Some(DynamicType::MF);
    beats[1].dynamic = Some(DynamicType::MF);
    beats[2].dynamic = Some(DynamicType::F);
    let doc = document(vec![guitar(0)], vec![master_bar(vec![bar(beats)])]);

    let score = convert_document(&doc, None).unwrap().score;
    let dynamics = score.measures[0]
        .items_of(SegmentType::ChordRest, 0)
        .filter(|(_, e)| matches!(e, Element::Dynamic(_)))
        .count();
    assert_eq!(dynamics, 2);
}

#[test]
fn test_direction_target_and_jump() {
    let mut mb = master_bar(vec![Bar::default()]);
    mb.direction = Direction { jump: "DaCapoAlFine".to_string(), target: "Fine".to_string() };
    let doc = document(vec![guitar(0)], vec![mb]);

    let score = convert_document(&doc, None).unwrap().score;
    let barline: Vec<_> = score.measures[0].items_of(SegmentType::BarLine, 0).collect();
    assert!(barline.iter().any(|(_, e)| matches!(e, Element::StaffText(t) if t == "fine")));
}

#[test]
fn test_source_document_untouched() {
    let doc = document(vec![guitar(0)], vec![master_bar(vec![bar(vec![quarter(60)])])]);
    let before = serde_json::to_string(&doc).unwrap();
    let _ = convert_document(&doc, None).unwrap();
    assert_eq!(serde_json::to_string(&doc).unwrap(), before);
}

#[test]
fn test_clef_emitted_only_on_change() {
    let g = Bar { clef: Clef { kind: ClefType::G2, ..Default::default() }, ..Default::default() };
    let f = Bar { clef: Clef { kind: ClefType::F4, ..Default::default() }, ..Default::default() };
    let doc = document(
        vec![guitar(0)],
        vec![master_bar(vec![g.clone()]), master_bar(vec![g]), master_bar(vec![f])],
    );

    let score = convert_document(&doc, None).unwrap().score;
    let clefs: Vec<Vec<Element>> = score
        .measures
        .iter()
        .map(|m| m.items_of(SegmentType::Clef, 0).map(|(_, e)| e.clone()).collect())
        .collect();
    assert_eq!(clefs, vec![vec![Element::Clef(ClefKind::G)], vec![], vec![Element::Clef(ClefKind::F)]]);
}

#[test]
fn test_fermata_placed_on_every_staff() {
    let four = || bar(vec![quarter(60), quarter(60), quarter(60), quarter(60)]);
    let mut mb = master_bar(vec![four(), four()]);
    mb.fermatas.push(Fermata { kind: FermataType::Long, length: 0.5, offset_numerator: 1, offset_denominator: 4 });
    let doc = document(vec![guitar(0), guitar(1)], vec![mb]);

    let score = convert_document(&doc, None).unwrap().score;
    for track in [0, 4] {
        let fermatas: Vec<_> = score.measures[0]
            .items_of(SegmentType::ChordRest, track)
            .filter(|(_, e)| matches!(e, Element::Fermata { .. }))
            .map(|(tick, e)| (tick, e.clone()))
            .collect();
        assert_eq!(
            fermatas,
            vec![(Fraction::new(1, 4), Element::Fermata { sym: SymId::FermataLongAbove, time_stretch: 2.0 })]
        );
    }
}

#[test]
fn test_fermata_without_chord_rest_not_placed() {
    let mut mb = master_bar(vec![bar(vec![beat(RhythmUnit::Half, vec![note(60)])])]);
    // an eighth in, inside the half note
    mb.fermatas.push(Fermata { offset_numerator: 1, offset_denominator: 8, ..Default::default() });
    let doc = document(vec![guitar(0)], vec![mb]);

    let score = convert_document(&doc, None).unwrap().score;
    let placed = score.measures[0]
        .items_of(SegmentType::ChordRest, 0)
        .filter(|(_, e)| matches!(e, Element::Fermata { .. }))
        .count();
    assert_eq!(placed, 0);
    assert!(score.measures[0].find_segment(SegmentType::ChordRest, Fraction::new(1, 8)).is_none());
}

#[test]
fn test_accent_bits_in_ascending_order() {
    let accented = Note { accents: 0b0000_1101, ..note(60) };
    let doc = document(vec![guitar(0)], vec![master_bar(vec![bar(vec![beat(RhythmUnit::Whole, vec![accented])])])]);

    let score = convert_document(&doc, None).unwrap().score;
    let chord = on_track(&score, 0)[0].as_chord().unwrap();
    let syms: Vec<SymId> = chord.articulations.iter().map(|a| a.sym).collect();
    assert_eq!(syms, vec![SymId::ArticStaccatoAbove, SymId::ArticMarcatoAbove, SymId::DynamicSforzando]);
}

#[test]
fn test_excess_dots_capped_and_reported() {
    let mut dotted = quarter(60);
    dotted.rhythm.dots = 40;
    let doc = document(vec![guitar(0)], vec![master_bar(vec![bar(vec![dotted])])]);

    let result = convert_document(&doc, None).unwrap();
    let track0 = on_track(&result.score, 0);
    // 1/4 + 1/8 + 1/16 + 1/24
    assert_eq!(track0[0].duration, Fraction::new(23, 48));
    assert_eq!(result.status, ConversionStatus::Partial);
    assert!(result.skipped_elements.iter().any(|s| s.element_type == "dots"));
}

#[test]
fn test_degenerate_tuplet_ratio_ignored() {
    for (numerator, denominator) in [(3, 0), (0, 2)] {
        let mut eighth = beat(RhythmUnit::Eighth, vec![note(60)]);
        eighth.tuplet = Some(TupletRatio { numerator, denominator });
        let doc = document(vec![guitar(0)], vec![master_bar(vec![bar(vec![eighth, quarter(62)])])]);

        let result = convert_document(&doc, None).unwrap();
        let score = &result.score;
        assert_eq!(score.tuplets().count(), 0);
        let ticks: Vec<i32> = on_track(score, 0).iter().map(|cr| to_ticks(cr.tick)).collect();
        assert_eq!(&ticks[..2], &[0, 240]);
        assert!(result.skipped_elements.iter().any(|s| s.element_type == "tuplet"));
    }
}

#[test]
fn test_voices_past_staff_limit_dropped() {
    let voices = (0..5).map(|_| Voice { beats: vec![beat(RhythmUnit::Whole, vec![note(60)])] }).collect();
    let doc = document(vec![guitar(0)], vec![master_bar(vec![Bar { voices, ..Default::default() }])]);

    let result = convert_document(&doc, None).unwrap();
    let tracks: Vec<usize> = result.score.chord_rests().map(|(_, cr)| cr.track).collect();
    assert_eq!(tracks.len(), 4);
    assert!(tracks.iter().all(|&t| t < 4));
    assert!(result.skipped_elements.iter().any(|s| s.element_type == "voice"));
}
