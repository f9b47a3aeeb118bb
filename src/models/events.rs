//! Events, techniques, duration tokens, and column spans
//!
//! `Event` is a closed tagged union; every downstream consumer matches all
//! three variants exhaustively. By the time an event reaches a measure its
//! duration is a resolved tick count, never a symbolic token. The raw
//! duration token text is kept for round-trip rendering.

use serde::{Deserialize, Serialize};

/// Expressive technique attached to a note
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Technique {
    HammerOn { from_fret: u8, to_fret: u8 },
    PullOff { from_fret: u8, to_fret: u8 },
    SlideIn { direction: char },
    Vibrato,
    Muted,
}

/// One parsed duration token, e.g. `Q`, `h.`, `+E`, `Wx2`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DurationToken {
    /// Exact source text, for round-trip rendering
    pub raw: String,
    /// Letter with case preserved
    pub symbol: char,
    /// Number of trailing dots (each multiplies by 3/2)
    pub dots: u8,
    /// Leading `+`: merge into the preceding event instead of starting one
    pub tie: bool,
    /// Lowercase letter: halve the sounding portion, keep the slot
    pub staccato: bool,
    /// `a`: zero-tick grace token
    pub grace: bool,
    /// `WxN`: N consecutive whole-note rests
    pub multibar: Option<u32>,
}

/// A single fretted (or muted) note on one string
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NoteEvent {
    /// Column of the token within the system
    pub col: usize,
    /// String index, top line first
    pub string: usize,
    /// None for muted (pitchless) notes
    pub fret: Option<u8>,
    /// Open-string pitch plus fret, assigned after tokenizing
    pub pitch: Option<u8>,
    pub ghost: bool,
    pub grace: bool,
    pub staccato: bool,
    pub techniques: Vec<Technique>,
    /// Rhythmic slot in ticks
    pub ticks: u64,
}

/// Simultaneous notes at one column across two or more strings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChordEvent {
    pub col: usize,
    pub ticks: u64,
    pub grace: bool,
    pub staccato: bool,
    pub notes: Vec<NoteEvent>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RestEvent {
    pub col: usize,
    pub ticks: u64,
}

/// Closed event union; consumers must handle all three kinds
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Note(NoteEvent),
    Chord(ChordEvent),
    Rest(RestEvent),
}

impl Event {
    pub fn col(&self) -> usize {
        match self {
            Event::Note(e) => e.col,
            Event::Chord(e) => e.col,
            Event::Rest(e) => e.col,
        }
    }

    pub fn ticks(&self) -> u64 {
        match self {
            Event::Note(e) => e.ticks,
            Event::Chord(e) => e.ticks,
            Event::Rest(e) => e.ticks,
        }
    }

    /// Extend the rhythmic slot, used when merging a tie continuation
    pub fn extend_ticks(&mut self, add: u64) {
        match self {
            Event::Note(e) => e.ticks += add,
            Event::Chord(e) => {
                e.ticks += add;
                for note in &mut e.notes {
                    note.ticks += add;
                }
            }
            Event::Rest(e) => e.ticks += add,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Event::Rest(_))
    }
}

/// Which annotation a span carries
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    PalmMute,
}

/// Half-open column range over a system, independent of any single string
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnotationSpan {
    pub kind: AnnotationKind,
    pub start_col: usize,
    pub end_col: usize,
}

/// Captured tuplet grouping; never applied to durations
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TupletSpan {
    pub actual: u8,
    pub normal: u8,
    pub start_col: usize,
    pub end_col: usize,
}

impl AnnotationSpan {
    pub fn contains(&self, col: usize) -> bool {
        self.start_col <= col && col < self.end_col
    }
}

impl TupletSpan {
    pub fn contains(&self, col: usize) -> bool {
        self.start_col <= col && col < self.end_col
    }
}
