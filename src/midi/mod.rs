//! Lean representation for Standard MIDI File export
//!
//! Holds just what the SMF writer needs: a tempo map, a time-signature
//! map, and per-part note lists with absolute start ticks and durations.
//! Built from a [`Timeline`] by pairing note-on and note-off events.

pub mod write;

use std::collections::HashMap;

use log::warn;

use crate::timeline::defaults::DEFAULT_PROGRAM;
use crate::timeline::{ConductorKind, Timeline, TimedEventKind};

pub use write::write_smf;

#[derive(Debug, Clone)]
pub struct SmfScore {
    pub ppq: u16,
    pub tempos: Vec<TempoChange>,
    pub timesigs: Vec<TimeSigChange>,
    pub parts: Vec<SmfPart>,
}

#[derive(Debug, Clone, Copy)]
pub struct TempoChange {
    pub tick: u64,
    pub micros_per_quarter: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TimeSigChange {
    pub tick: u64,
    pub numerator: u8,
    pub denominator: u8,
    pub clocks_per_click: u8,
}

#[derive(Debug, Clone)]
pub struct SmfPart {
    pub name: String,
    pub channel: u8,
    pub program: Option<u8>,
    pub notes: Vec<SmfNote>,
}

#[derive(Debug, Clone, Copy)]
pub struct SmfNote {
    pub start_tick: u64,
    pub dur_tick: u64,
    pub pitch: u8,
    pub velocity: u8,
}

impl SmfScore {
    /// Collapse a timeline's on/off event pairs into notes with durations.
    /// Offs are matched first-on-first-off per pitch; an unmatched off is
    /// logged and dropped.
    pub fn from_timeline(timeline: &Timeline) -> Self {
        let mut tempos = Vec::new();
        let mut timesigs = Vec::new();
        for entry in &timeline.conductor {
            match entry.kind {
                ConductorKind::Tempo { micros_per_quarter } => tempos.push(TempoChange {
                    tick: entry.tick,
                    micros_per_quarter,
                }),
                ConductorKind::TimeSignature {
                    numerator,
                    denominator,
                    clocks_per_click,
                } => timesigs.push(TimeSigChange {
                    tick: entry.tick,
                    numerator,
                    denominator,
                    clocks_per_click,
                }),
            }
        }

        let mut parts = Vec::new();
        for track in &timeline.tracks {
            let mut notes: Vec<SmfNote> = Vec::new();
            let mut open: HashMap<u8, Vec<usize>> = HashMap::new();
            for event in &track.events {
                match event.kind {
                    TimedEventKind::NoteOn { pitch, velocity } => {
                        notes.push(SmfNote {
                            start_tick: event.tick,
                            dur_tick: 0,
                            pitch,
                            velocity,
                        });
                        open.entry(pitch).or_default().push(notes.len() - 1);
                    }
                    TimedEventKind::NoteOff { pitch } => {
                        match open.get_mut(&pitch).and_then(|v| {
                            if v.is_empty() {
                                None
                            } else {
                                Some(v.remove(0))
                            }
                        }) {
                            Some(idx) => {
                                notes[idx].dur_tick = event.tick - notes[idx].start_tick;
                            }
                            None => {
                                warn!(
                                    "note off without matching note on: pitch {pitch} at tick {}",
                                    event.tick
                                );
                            }
                        }
                    }
                    TimedEventKind::Rest => {}
                }
            }
            // A note never closed keeps zero duration; give it one tick so
            // it is audible rather than dropped by strict players.
            for note in &mut notes {
                if note.dur_tick == 0 {
                    note.dur_tick = 1;
                }
            }
            parts.push(SmfPart {
                name: track.name.clone(),
                channel: track.channel,
                program: Some(DEFAULT_PROGRAM),
                notes,
            });
        }

        SmfScore {
            ppq: timeline.ppq,
            tempos,
            timesigs,
            parts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{TimedEvent, TrackTimeline};

    fn track_of(events: Vec<TimedEvent>) -> Timeline {
        Timeline {
            ppq: 480,
            conductor: vec![],
            tracks: vec![TrackTimeline {
                track_id: 0,
                name: "t".into(),
                channel: 0,
                events,
            }],
        }
    }

    fn on(tick: u64, pitch: u8) -> TimedEvent {
        TimedEvent {
            track_id: 0,
            tick,
            kind: TimedEventKind::NoteOn {
                pitch,
                velocity: 90,
            },
        }
    }

    fn off(tick: u64, pitch: u8) -> TimedEvent {
        TimedEvent {
            track_id: 0,
            tick,
            kind: TimedEventKind::NoteOff { pitch },
        }
    }

    #[test]
    fn test_on_off_pairing() {
        let tl = track_of(vec![on(0, 60), off(480, 60), on(480, 62), off(720, 62)]);
        let score = SmfScore::from_timeline(&tl);
        let notes = &score.parts[0].notes;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].dur_tick, 480);
        assert_eq!(notes[1].start_tick, 480);
        assert_eq!(notes[1].dur_tick, 240);
    }

    #[test]
    fn test_overlapping_same_pitch_pairs_in_order() {
        let tl = track_of(vec![on(0, 60), on(10, 60), off(100, 60), off(200, 60)]);
        let score = SmfScore::from_timeline(&tl);
        let notes = &score.parts[0].notes;
        assert_eq!(notes[0].dur_tick, 100);
        assert_eq!(notes[1].dur_tick, 190);
    }

    #[test]
    fn test_rests_produce_no_notes() {
        let tl = track_of(vec![TimedEvent {
            track_id: 0,
            tick: 0,
            kind: TimedEventKind::Rest,
        }]);
        let score = SmfScore::from_timeline(&tl);
        assert!(score.parts[0].notes.is_empty());
    }
}
