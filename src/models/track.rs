//! Track, tuning and automation descriptions of a source document

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// MIDI channel reserved for percussion
pub const DRUM_CHANNEL: i32 = 9;

/// Tuning and layout of one staff
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffProperty {
    /// Open-string pitches, lowest-pitched string first
    pub tuning: Vec<i32>,
    pub capo_fret: i32,
    pub fret_count: i32,
    /// Render this staff as tablature
    pub tablature: bool,
}

/// Chord diagram attached to beats via [`crate::models::DiagramRef`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FretDiagram {
    pub name: String,
    pub string_count: i32,
    pub base_fret: i32,
    /// Fretted strings (string index, highest string = 0) to fret; 0 = open.
    /// Strings absent from the map are not played.
    pub frets: BTreeMap<i32, i32>,
}

/// Instrument track of the source document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceTrack {
    pub idx: usize,
    pub name: String,
    pub instrument: String,
    pub staff_count: usize,
    pub program: i32,
    pub midi_channel: i32,
    /// Mixer volume, 0.0..=1.0
    pub volume: f32,
    /// Mixer balance, 0.0 (left)..=1.0 (right)
    pub pan: f32,
    pub transpose: i32,
    pub staff_properties: Vec<StaffProperty>,
    pub diagrams: BTreeMap<i32, FretDiagram>,
}

impl Default for SourceTrack {
    fn default() -> Self {
        SourceTrack {
            idx: 0,
            name: String::new(),
            instrument: String::new(),
            staff_count: 1,
            program: 0,
            midi_channel: 0,
            volume: 0.8,
            pan: 0.5,
            transpose: 0,
            staff_properties: Vec::new(),
            diagrams: BTreeMap::new(),
        }
    }
}

impl SourceTrack {
    pub fn is_drum(&self) -> bool {
        self.midi_channel == DRUM_CHANNEL
    }
}

/// Tempo change at `position` (0..1 of the bar) of master bar `bar`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoAutomation {
    pub bar: usize,
    pub position: f32,
    pub value: i32,
    /// Beat unit code: 0 = value already in quarter bpm, 5 = dotted half,
    /// others scale by `unit / 2`
    pub tempo_unit: i32,
}

impl Default for TempoAutomation {
    fn default() -> Self {
        TempoAutomation { bar: 0, position: 0.0, value: 120, tempo_unit: 0 }
    }
}

/// Document-wide automation lanes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterTracks {
    pub tempo: Vec<TempoAutomation>,
}
