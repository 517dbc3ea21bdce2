// Test: conversion settings loaded from YAML files and their effect
//
// Settings files are written to a temp dir, loaded, and passed to a
// conversion to check that switches reach the converter.

use std::io::Write;

use tab_import_wasm::converters::tablature::{convert_document, ConversionError, ConversionSettings, SettingsError};
use tab_import_wasm::models::*;
use tab_import_wasm::score::{Element, SegmentType};

fn lyric_document() -> SourceDocument {
    let beat = Beat {
        rhythm: Rhythm { unit: RhythmUnit::Whole, dots: 0 },
        notes: vec![Note { pitch: MidiPitch { midi: 57, ..Default::default() }, ..Default::default() }],
        lyrics: vec![LyricRef { track: 0, master_bar: 0, text: "la".to_string() }],
        ..Default::default()
    };
    let mut doc = SourceDocument {
        tracks: vec![SourceTrack { idx: 0, staff_count: 1, ..Default::default() }],
        master_tracks: MasterTracks::default(),
        master_bars: vec![MasterBar {
            bars: vec![Bar { voices: vec![Voice { beats: vec![beat] }], ..Default::default() }],
            ..Default::default()
        }],
    };
    doc.master_tracks.tempo.push(TempoAutomation { bar: 0, position: 0.0, value: 100, tempo_unit: 0 });
    doc
}

fn write_settings(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(yaml.as_bytes()).expect("write settings");
    file
}

#[test]
fn test_settings_file_loads() {
    let file = write_settings("default_tuning: [38, 45, 50, 55, 59, 64]\ndefault_fret_count: 21\n");
    let settings = ConversionSettings::from_yaml_file(file.path()).unwrap();

    assert_eq!(settings.default_tuning[0], 38);
    assert_eq!(settings.default_fret_count, 21);
    assert!(settings.convert_lyrics);
}

#[test]
fn test_missing_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConversionSettings::from_yaml_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, SettingsError::Io(_)));
}

#[test]
fn test_default_tuning_used_for_track_without_tuning() {
    let file = write_settings("default_tuning: [38, 45, 50, 55, 59, 64]\n");
    let settings = ConversionSettings::from_yaml_file(file.path()).unwrap();

    let score = convert_document(&lyric_document(), Some(settings)).unwrap().score;
    assert_eq!(score.parts[0].instrument.string_data.strings[0], 38);
}

#[test]
fn test_switches_reach_the_converter() {
    let doc = lyric_document();

    let full = convert_document(&doc, None).unwrap().score;
    let (_, cr) = full.chord_rests().next().unwrap();
    assert_eq!(cr.lyrics, vec!["la".to_string()]);
    assert_eq!(full.tempo_map.len(), 1);

    let file = write_settings("convert_lyrics: false\nconvert_tempo_map: false\n");
    let settings = ConversionSettings::from_yaml_file(file.path()).unwrap();
    let bare = convert_document(&doc, Some(settings)).unwrap().score;
    let (_, cr) = bare.chord_rests().next().unwrap();
    assert!(cr.lyrics.is_empty());
    assert!(bare.tempo_map.is_empty());
    let tempo_texts = bare.measures[0]
        .items_of(SegmentType::ChordRest, 0)
        .filter(|(_, e)| matches!(e, Element::TempoText { .. }))
        .count();
    assert_eq!(tempo_texts, 0);
}

#[test]
fn test_invalid_settings_rejected_before_conversion() {
    let settings = ConversionSettings { default_fret_count: 0, ..Default::default() };
    let err = convert_document(&lyric_document(), Some(settings)).unwrap_err();
    assert!(matches!(err, ConversionError::Settings(SettingsError::Invalid(_))));
}
