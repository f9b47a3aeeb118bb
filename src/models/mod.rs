//! Data model for parsed tablature
//!
//! The model keeps both resolved values (ticks, MIDI pitches) and enough
//! raw source text to re-render a textually equivalent tab.

pub mod barlines;
pub mod core;
pub mod events;
pub mod pitch;
pub mod timing;

pub use barlines::{find_bar_tokens, Barline};
pub use core::{Measure, Score, Section, TabSystem, Track, Tuning};
pub use events::{
    AnnotationKind, AnnotationSpan, ChordEvent, DurationToken, Event, NoteEvent, RestEvent,
    Technique, TupletSpan,
};
pub use pitch::open_midi_pitches;
pub use timing::{ticks_per_whole, TempoMarker, TimeSignature, Timestamp, DEFAULT_PPQ};
