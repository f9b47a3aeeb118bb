//! Standard MIDI File (SMF) Format 1 output

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

use crate::error::{Result, TabError};
use crate::midi::{SmfPart, SmfScore};

/// Write an [`SmfScore`] as SMF Format 1 bytes: one conductor track,
/// then one track per part.
pub fn write_smf(score: &SmfScore, out: &mut Vec<u8>) -> Result<()> {
    let mut tracks = Vec::new();

    tracks.push(build_conductor_track(score));
    for part in &score.parts {
        tracks.push(build_part_track(part));
    }

    let header = Header {
        format: Format::Parallel,
        timing: Timing::Metrical(score.ppq.into()),
    };

    let smf = Smf { header, tracks };
    smf.write(out)
        .map_err(|e| TabError::Midi(format!("failed to write MIDI: {e}")))?;

    Ok(())
}

fn build_conductor_track<'a>(score: &SmfScore) -> Track<'a> {
    let mut events = Vec::new();

    for tempo in &score.tempos {
        events.push(TrackEvent {
            delta: (tempo.tick as u32).into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(tempo.micros_per_quarter.into())),
        });
    }

    for ts in &score.timesigs {
        // Denominator as a power of 2 (4 -> 2, 8 -> 3)
        let denominator_power = (ts.denominator as f32).log2() as u8;
        events.push(TrackEvent {
            delta: (ts.tick as u32).into(),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
                ts.numerator,
                denominator_power,
                ts.clocks_per_click,
                8, // 32nd notes per quarter note
            )),
        });
    }

    events.sort_by_key(|e| e.delta.as_int());
    convert_to_delta_times(&mut events);

    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    events
}

fn build_part_track(part: &SmfPart) -> Track<'_> {
    let mut events = Vec::new();

    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(part.name.as_bytes())),
    });

    if let Some(program) = part.program {
        events.push(TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Midi {
                channel: part.channel.into(),
                message: MidiMessage::ProgramChange {
                    program: program.into(),
                },
            },
        });
    }

    for note in &part.notes {
        events.push(TrackEvent {
            delta: (note.start_tick as u32).into(),
            kind: TrackEventKind::Midi {
                channel: part.channel.into(),
                message: MidiMessage::NoteOn {
                    key: note.pitch.into(),
                    vel: note.velocity.into(),
                },
            },
        });
        events.push(TrackEvent {
            delta: ((note.start_tick + note.dur_tick) as u32).into(),
            kind: TrackEventKind::Midi {
                channel: part.channel.into(),
                message: MidiMessage::NoteOff {
                    key: note.pitch.into(),
                    vel: 0.into(),
                },
            },
        });
    }

    events.sort_by_key(|e| e.delta.as_int());
    convert_to_delta_times(&mut events);

    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    events
}

/// Convert absolute tick times in `delta` to actual delta times
fn convert_to_delta_times(events: &mut [TrackEvent]) {
    let mut prev_tick = 0u32;
    for event in events.iter_mut() {
        let current_tick = event.delta.as_int();
        let delta = current_tick.saturating_sub(prev_tick);
        event.delta = delta.into();
        prev_tick = current_tick;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{SmfNote, TempoChange, TimeSigChange};

    fn minimal_score() -> SmfScore {
        SmfScore {
            ppq: 480,
            tempos: vec![TempoChange {
                tick: 0,
                micros_per_quarter: 500_000,
            }],
            timesigs: vec![TimeSigChange {
                tick: 0,
                numerator: 4,
                denominator: 4,
                clocks_per_click: 24,
            }],
            parts: vec![SmfPart {
                name: "Guitar".to_string(),
                channel: 0,
                program: Some(24),
                notes: vec![
                    SmfNote {
                        start_tick: 0,
                        dur_tick: 480,
                        pitch: 64,
                        velocity: 90,
                    },
                    SmfNote {
                        start_tick: 480,
                        dur_tick: 240,
                        pitch: 66,
                        velocity: 90,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_write_minimal_smf() {
        let score = minimal_score();
        let mut out = Vec::new();
        write_smf(&score, &mut out).expect("writes");
        assert!(out.starts_with(b"MThd"));
        // Format 1, two tracks
        assert_eq!(&out[8..14], &[0, 1, 0, 2, 1, 224]);
    }

    #[test]
    fn test_round_trip_through_midly() {
        let score = minimal_score();
        let mut out = Vec::new();
        write_smf(&score, &mut out).expect("writes");
        let smf = Smf::parse(&out).expect("parses back");
        assert_eq!(smf.tracks.len(), 2);
        let ons = smf.tracks[1]
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    TrackEventKind::Midi {
                        message: MidiMessage::NoteOn { .. },
                        ..
                    }
                )
            })
            .count();
        assert_eq!(ons, 2);
    }
}
