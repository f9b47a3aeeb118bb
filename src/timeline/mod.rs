//! Timeline projection: walks a resolved [`Score`] and emits absolutely
//! timed note-on/note-off/rest events per track plus a conductor stream
//! of tempo and time-signature changes.
//!
//! Section starts honor timestamp anchors: a section begins at
//! `max(track cursor, anchor)` so an anchor can insert silence but never
//! moves time backward over already placed events.

pub mod defaults;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::core::Score;
use crate::models::events::{Event, NoteEvent, Technique};
use crate::models::timing::{ticks_per_whole, TempoMarker, TimeSignature, DEFAULT_PPQ};
use defaults::{assign_channel, DEFAULT_VELOCITY, GHOST_VELOCITY, MUTED_VELOCITY};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimedEventKind {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    Rest,
}

/// One absolutely positioned playback event
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedEvent {
    pub track_id: usize,
    pub tick: u64,
    pub kind: TimedEventKind,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConductorKind {
    Tempo {
        micros_per_quarter: u32,
    },
    TimeSignature {
        numerator: u8,
        denominator: u8,
        clocks_per_click: u8,
    },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConductorEvent {
    pub tick: u64,
    pub kind: ConductorKind,
}

/// Per-track event stream, sorted and ready for encoding
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackTimeline {
    pub track_id: usize,
    pub name: String,
    pub channel: u8,
    pub events: Vec<TimedEvent>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Timeline {
    pub ppq: u16,
    pub conductor: Vec<ConductorEvent>,
    pub tracks: Vec<TrackTimeline>,
}

#[derive(Clone, Copy, Debug)]
pub struct TimelineOptions {
    pub ppq: u16,
    pub velocity: u8,
    /// Replaces every section tempo with `Q=<bpm>` when set
    pub tempo_override: Option<f64>,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        TimelineOptions {
            ppq: DEFAULT_PPQ,
            velocity: DEFAULT_VELOCITY,
            tempo_override: None,
        }
    }
}

/// Piecewise-constant tempo segments keyed by start tick
struct TempoMap {
    ppq: u16,
    segments: Vec<(u64, u32)>,
}

impl TempoMap {
    fn new(ppq: u16) -> Self {
        TempoMap {
            ppq,
            segments: Vec::new(),
        }
    }

    fn push(&mut self, tick: u64, micros_per_quarter: u32) {
        match self.segments.last_mut() {
            Some((t, mpq)) if *t == tick => *mpq = micros_per_quarter,
            Some((_, mpq)) if *mpq == micros_per_quarter => {}
            _ => self.segments.push((tick, micros_per_quarter)),
        }
    }

    /// Convert an absolute wall-clock offset to a tick position under the
    /// segments recorded so far, extrapolating the last tempo.
    fn tick_at_seconds(&self, seconds: f64) -> u64 {
        let ppq = self.ppq as f64;
        let mut remaining = seconds;
        let mut idx = 0;
        while idx + 1 < self.segments.len() {
            let (t0, mpq) = self.segments[idx];
            let (t1, _) = self.segments[idx + 1];
            let span_secs = (t1 - t0) as f64 * mpq as f64 / (ppq * 1_000_000.0);
            if remaining < span_secs {
                return t0 + (remaining * 1_000_000.0 * ppq / mpq as f64).round() as u64;
            }
            remaining -= span_secs;
            idx += 1;
        }
        let (t0, mpq) = self.segments.last().copied().unwrap_or((0, 500_000));
        t0 + (remaining * 1_000_000.0 * ppq / mpq as f64).round() as u64
    }
}

fn event_rank(kind: &TimedEventKind) -> (u8, u8) {
    match kind {
        TimedEventKind::NoteOff { pitch } => (0, *pitch),
        TimedEventKind::Rest => (1, 0),
        TimedEventKind::NoteOn { pitch, .. } => (2, *pitch),
    }
}

struct TrackCursor<'a> {
    track_id: usize,
    cursor: u64,
    events: Vec<TimedEvent>,
    velocity: u8,
    grace_ticks: u64,
    open_pitches: &'a [u8],
}

impl<'a> TrackCursor<'a> {
    fn emit(&mut self, tick: u64, kind: TimedEventKind) {
        self.events.push(TimedEvent {
            track_id: self.track_id,
            tick,
            kind,
        });
    }

    fn note_velocity(&self, note: &NoteEvent) -> u8 {
        if note.techniques.iter().any(|t| matches!(t, Technique::Muted)) {
            MUTED_VELOCITY
        } else if note.ghost {
            GHOST_VELOCITY
        } else {
            self.velocity
        }
    }

    fn note_pitch(&self, note: &NoteEvent) -> Option<u8> {
        // A muted hit has no definite pitch; sound the open string as a
        // percussive stand-in.
        note.pitch
            .or_else(|| self.open_pitches.get(note.string).copied())
    }

    fn sound_note(&mut self, note: &NoteEvent, start: u64, sounding: u64) {
        let Some(pitch) = self.note_pitch(note) else {
            return;
        };
        let velocity = self.note_velocity(note);
        self.emit(start, TimedEventKind::NoteOn { pitch, velocity });
        self.emit(start + sounding.max(1), TimedEventKind::NoteOff { pitch });
    }

    fn place(&mut self, event: &Event) {
        match event {
            Event::Rest(rest) => {
                self.emit(self.cursor, TimedEventKind::Rest);
                self.cursor += rest.ticks;
            }
            Event::Note(note) => {
                if note.grace {
                    let start = self.cursor;
                    self.sound_note(note, start, self.grace_ticks);
                    return;
                }
                let sounding = sounding_span(note.ticks, note.staccato);
                let start = self.cursor;
                self.sound_note(note, start, sounding);
                self.cursor += note.ticks;
            }
            Event::Chord(chord) => {
                if chord.grace {
                    let start = self.cursor;
                    let grace = self.grace_ticks;
                    for note in &chord.notes {
                        self.sound_note(note, start, grace);
                    }
                    return;
                }
                let sounding = sounding_span(chord.ticks, chord.staccato);
                let start = self.cursor;
                for note in &chord.notes {
                    self.sound_note(note, start, sounding);
                }
                self.cursor += chord.ticks;
            }
        }
    }
}

/// Staccato halves the sounding portion; the rhythmic slot is unchanged.
fn sounding_span(slot: u64, staccato: bool) -> u64 {
    if staccato {
        slot / 2
    } else {
        slot
    }
}

/// Project a resolved score onto absolute ticks.
pub fn build_timeline(score: &Score, opts: &TimelineOptions) -> Timeline {
    let tpw = ticks_per_whole(opts.ppq);
    let tracks = score.tracks();
    let mut conductor: Vec<ConductorEvent> = Vec::new();
    let mut tempo_map = TempoMap::new(opts.ppq);
    let mut out_tracks: Vec<TrackTimeline> = Vec::new();

    // The conductor stream is shaped by section context; build it while
    // walking the first track and reuse it for the rest.
    for (ti, track) in tracks.iter().enumerate() {
        let open_pitches = track.tuning.open_pitches();
        let mut cursor = TrackCursor {
            track_id: track.id,
            cursor: 0,
            events: Vec::new(),
            velocity: opts.velocity,
            grace_ticks: (tpw / 64).max(1),
            open_pitches: &open_pitches,
        };

        let mut current_tempo: Option<u32> = None;
        let mut current_ts: Option<TimeSignature> = None;

        for section in &score.sections {
            let tempo = match opts.tempo_override {
                Some(bpm) => TempoMarker::new('Q', bpm),
                None => section.tempo,
            };
            let mpq = tempo.micros_per_quarter();
            if ti == 0 && tempo_map.segments.is_empty() {
                tempo_map.push(0, mpq);
            }

            let start = match section.timestamp {
                Some(ts) => {
                    let anchor = tempo_map.tick_at_seconds(ts.seconds as f64);
                    cursor.cursor.max(anchor)
                }
                None => cursor.cursor,
            };
            cursor.cursor = start;

            if ti == 0 {
                if current_tempo != Some(mpq) {
                    let tick = if current_tempo.is_none() { 0 } else { start };
                    conductor.push(ConductorEvent {
                        tick,
                        kind: ConductorKind::Tempo {
                            micros_per_quarter: mpq,
                        },
                    });
                    tempo_map.push(tick, mpq);
                    current_tempo = Some(mpq);
                }
                if current_ts != Some(section.time_signature) {
                    let tick = if current_ts.is_none() { 0 } else { start };
                    conductor.push(ConductorEvent {
                        tick,
                        kind: ConductorKind::TimeSignature {
                            numerator: section.time_signature.numerator,
                            denominator: section.time_signature.denominator,
                            clocks_per_click: 24,
                        },
                    });
                    current_ts = Some(section.time_signature);
                }
            }

            for system in &section.systems {
                for measure in &system.measures {
                    for event in &measure.events {
                        cursor.place(event);
                    }
                }
            }
        }

        let mut events = cursor.events;
        events.sort_by_key(|e| (e.tick, event_rank(&e.kind)));
        debug!(
            "track {} ({}): {} timed events",
            track.id,
            track.name,
            events.len()
        );
        out_tracks.push(TrackTimeline {
            track_id: track.id,
            name: track.name.clone(),
            channel: assign_channel(ti),
            events,
        });
    }

    Timeline {
        ppq: opts.ppq,
        conductor,
        tracks: out_tracks,
    }
}
