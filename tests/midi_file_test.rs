//! SMF output tests: full pipeline down to bytes on disk.

use std::fs;
use std::io::Write;

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use tabulator::midi::{write_smf, SmfScore};
use tabulator::parse::parse_tab;
use tabulator::timeline::{build_timeline, TimelineOptions};

const SONG: &str = "\
Title: T
Artist: A

4/4
Q=120

  Q Q Q Q
E|-0-2-3-5-|
";

fn smf_bytes(input: &str, opts: &TimelineOptions) -> Vec<u8> {
    let score = parse_tab(input).expect("parses");
    let timeline = build_timeline(&score, opts);
    let smf = SmfScore::from_timeline(&timeline);
    let mut out = Vec::new();
    write_smf(&smf, &mut out).expect("writes");
    out
}

#[test]
fn test_format1_conductor_plus_one_track() {
    let bytes = smf_bytes(SONG, &TimelineOptions::default());
    let smf = Smf::parse(&bytes).expect("parses back");
    assert_eq!(smf.header.format, Format::Parallel);
    assert_eq!(smf.header.timing, Timing::Metrical(480.into()));
    assert_eq!(smf.tracks.len(), 2);

    // Conductor carries tempo and time signature
    let has_tempo = smf.tracks[0].iter().any(|e| {
        matches!(
            e.kind,
            TrackEventKind::Meta(MetaMessage::Tempo(t)) if t.as_int() == 500_000
        )
    });
    assert!(has_tempo);
    let has_ts = smf.tracks[0].iter().any(|e| {
        matches!(
            e.kind,
            TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8))
        )
    });
    assert!(has_ts);
}

#[test]
fn test_note_track_contents() {
    let bytes = smf_bytes(SONG, &TimelineOptions::default());
    let smf = Smf::parse(&bytes).expect("parses back");
    let track = &smf.tracks[1];

    let mut pitches = Vec::new();
    let mut tick = 0u32;
    let mut on_ticks = Vec::new();
    for event in track {
        tick += event.delta.as_int();
        if let TrackEventKind::Midi {
            message: MidiMessage::NoteOn { key, vel },
            ..
        } = event.kind
        {
            pitches.push(key.as_int());
            assert_eq!(vel.as_int(), 90);
            on_ticks.push(tick);
        }
    }
    assert_eq!(pitches, vec![64, 66, 67, 69]);
    assert_eq!(on_ticks, vec![0, 480, 960, 1440]);

    let has_program = track.iter().any(|e| {
        matches!(
            e.kind,
            TrackEventKind::Midi {
                message: MidiMessage::ProgramChange { program },
                ..
            } if program.as_int() == 24
        )
    });
    assert!(has_program);
}

#[test]
fn test_velocity_option_applies() {
    let opts = TimelineOptions {
        velocity: 64,
        ..TimelineOptions::default()
    };
    let bytes = smf_bytes(SONG, &opts);
    let smf = Smf::parse(&bytes).expect("parses back");
    let vels: Vec<u8> = smf.tracks[1]
        .iter()
        .filter_map(|e| match e.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { vel, .. },
                ..
            } => Some(vel.as_int()),
            _ => None,
        })
        .collect();
    assert!(!vels.is_empty());
    assert!(vels.iter().all(|&v| v == 64));
}

#[test]
fn test_ppq_option_scales_ticks() {
    let opts = TimelineOptions {
        ppq: 960,
        ..TimelineOptions::default()
    };
    let score = parse_tab(SONG).expect("parses");
    let timeline = build_timeline(&score, &opts);
    assert_eq!(timeline.ppq, 960);
    let first_off = timeline.tracks[0]
        .events
        .iter()
        .find(|e| matches!(e.kind, tabulator::timeline::TimedEventKind::NoteOff { .. }))
        .expect("off");
    assert_eq!(first_off.tick, 960);
}

#[test]
fn test_writes_playable_file_to_disk() {
    let bytes = smf_bytes(SONG, &TimelineOptions::default());
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("song.mid");
    let mut file = fs::File::create(&path).expect("create");
    file.write_all(&bytes).expect("write");
    drop(file);

    let read_back = fs::read(&path).expect("read");
    assert_eq!(read_back, bytes);
    assert!(Smf::parse(&read_back).is_ok());
}
