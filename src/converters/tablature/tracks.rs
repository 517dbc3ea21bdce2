//! Part, staff and instrument set-up

use crate::models::SourceTrack;
use crate::score::*;

use super::converter::TablatureConverter;

/// Mixer value 0.0..=1.0 to MIDI 0..=127
fn midi_level(value: f32) -> i32 {
    ((value * 127.0).round() as i32).clamp(0, 127)
}

impl<'a> TablatureConverter<'a> {
    pub(super) fn set_up_tracks(&mut self) {
        let doc = self.doc;
        let mut tracks: Vec<&SourceTrack> = doc.tracks.iter().collect();
        tracks.sort_by_key(|t| t.idx);
        for track in tracks {
            self.set_up_track(track);
        }
    }

    fn set_up_track(&mut self, track: &SourceTrack) {
        let part_idx = self.score.append_part(Part {
            id: track.idx,
            long_name: track.name.clone(),
            short_name: track.instrument.clone(),
            staves: Vec::new(),
            instrument: Instrument::default(),
        });

        let tablature = track
            .staff_properties
            .first()
            .map(|p| p.tablature)
            .unwrap_or(false);

        for _ in 0..track.staff_count {
            let staff_type = if tablature { StaffType::Tablature } else { StaffType::Standard };
            self.score.append_staff(Staff {
                part: part_idx,
                staff_type,
                brackets: Vec::new(),
                bar_line_span: 1,
                capo_fret: 0,
            });
        }

        let first_staff = self.score.parts[part_idx].staves.first().copied();

        if track.staff_count > 1 {
            if let Some(s) = first_staff {
                let staff = &mut self.score.staves[s];
                staff.brackets.push(Bracket { kind: BracketType::Brace, span: track.staff_count });
                staff.bar_line_span = track.staff_count;
            }
        }

        let string_data = if track.staff_count == 1 {
            match track.staff_properties.first() {
                Some(prop) => {
                    if let Some(s) = first_staff {
                        self.score.staves[s].capo_fret = prop.capo_fret;
                    }
                    let tuning = if prop.tuning.is_empty() {
                        self.settings.default_tuning.clone()
                    } else {
                        prop.tuning.clone()
                    };
                    let frets = if prop.fret_count > 0 { prop.fret_count } else { self.settings.default_fret_count };
                    StringData::new(frets, tuning)
                }
                None => StringData::new(self.settings.default_fret_count, self.settings.default_tuning.clone()),
            }
        } else {
            // tuning is only kept for single-staff parts
            StringData::default()
        };

        let part = &mut self.score.parts[part_idx];
        part.instrument = Instrument {
            channels: vec![Channel {
                program: track.program,
                midi_channel: track.midi_channel,
                volume: midi_level(track.volume),
                pan: midi_level(track.pan),
            }],
            string_data,
            transpose: track.transpose,
            use_drumset: track.is_drum(),
        };

        if track.is_drum() {
            if let Some(s) = first_staff {
                self.score.staves[s].staff_type = StaffType::Percussion;
            }
        }

        log::debug!(
            "track {} '{}': {} staves, program {}, channel {}",
            track.idx,
            track.name,
            track.staff_count,
            track.program,
            track.midi_channel
        );
    }

    /// Single-drum parts carry note pitches in their program; reset it
    pub(super) fn reset_drum_programs(&mut self) {
        let drum_parts: Vec<usize> = self
            .doc
            .tracks
            .iter()
            .filter(|t| t.is_drum())
            .map(|t| t.idx)
            .collect();

        for idx in drum_parts {
            let Some(part) = self.score.parts.iter_mut().find(|p| p.id == idx) else {
                log::error!("drum track {} has no part", idx);
                continue;
            };
            for channel in part
                .instrument
                .channels
                .iter_mut()
                .filter(|c| c.midi_channel == crate::models::DRUM_CHANNEL)
            {
                channel.program = 0;
            }
        }
    }
}
