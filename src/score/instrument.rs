//! Parts, staves, instruments and string tuning

use serde::{Deserialize, Serialize};

/// Tuning of a fretted instrument
///
/// `strings` holds open pitches lowest-pitched string first, while note
/// string numbers count from the highest-pitched string (0 = highest).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringData {
    pub frets: i32,
    pub strings: Vec<i32>,
}

impl StringData {
    pub fn new(frets: i32, strings: Vec<i32>) -> Self {
        StringData { frets, strings }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Open pitch of note string `string` (0 = highest)
    pub fn open_pitch(&self, string: i32) -> Option<i32> {
        let n = self.strings.len() as i32;
        if string < 0 || string >= n {
            return None;
        }
        self.strings.get((n - 1 - string) as usize).copied()
    }

    pub fn get_pitch(&self, string: i32, fret: i32) -> Option<i32> {
        self.open_pitch(string).map(|open| open + fret)
    }

    /// Fret producing `pitch` on `string`, if reachable
    pub fn fret_for(&self, pitch: i32, string: i32) -> Option<i32> {
        let fret = pitch - self.open_pitch(string)?;
        (0..=self.frets.max(0)).contains(&fret).then_some(fret)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub program: i32,
    pub midi_channel: i32,
    pub volume: i32,
    pub pan: i32,
}

impl Default for Channel {
    fn default() -> Self {
        Channel { program: 0, midi_channel: 0, volume: 100, pan: 64 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub channels: Vec<Channel>,
    pub string_data: StringData,
    /// Semitones between written and sounding pitch
    pub transpose: i32,
    pub use_drumset: bool,
}

impl Instrument {
    pub fn channel(&self, idx: usize) -> Option<&Channel> {
        self.channels.get(idx)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaffType {
    #[default]
    Standard,
    Percussion,
    Tablature,
}

impl StaffType {
    /// Whether time and key signatures are drawn on this staff
    pub fn gen_timesig(self) -> bool {
        self != StaffType::Tablature
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BracketType {
    Brace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub kind: BracketType,
    /// Number of staves covered
    pub span: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    /// Index into `Score::parts`
    pub part: usize,
    pub staff_type: StaffType,
    pub brackets: Vec<Bracket>,
    pub bar_line_span: usize,
    pub capo_fret: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Source track index
    pub id: usize,
    pub long_name: String,
    pub short_name: String,
    /// Indices into `Score::staves`
    pub staves: Vec<usize>,
    pub instrument: Instrument,
}

impl Part {
    pub fn is_drum(&self) -> bool {
        self.instrument.use_drumset
    }
}
