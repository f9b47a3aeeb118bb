//! Extended ASCII guitar tablature toolkit.
//!
//! Parses column-aligned tab text (string/fret grids with duration
//! pre-lines, timestamp/tempo/time-signature markers, and technique
//! tokens) into a structured [`Score`](models::Score), projects it onto
//! an absolute tick timeline, and writes the result as a Format 1
//! Standard MIDI File. A renderer reproduces the original tab text from
//! the parsed model.
//!
//! ```
//! use tabulator::parse::parse_tab;
//! use tabulator::timeline::{build_timeline, TimelineOptions};
//!
//! let score = parse_tab("Title: T\nArtist: A\n\n Q\nE|-2--|\n").unwrap();
//! let timeline = build_timeline(&score, &TimelineOptions::default());
//! assert_eq!(timeline.tracks.len(), 1);
//! ```

pub mod diagnostics;
pub mod error;
pub mod midi;
pub mod models;
pub mod parse;
pub mod render;
pub mod timeline;

pub use diagnostics::{Warning, WarningKind, Warnings};
pub use error::{Result, TabError};
pub use midi::{write_smf, SmfScore};
pub use models::{Score, Section, TabSystem, Track, Tuning};
pub use parse::{parse_tab, parse_tab_with_ticks};
pub use render::{render_tab, render_tab_from_model};
pub use timeline::{build_timeline, Timeline, TimelineOptions};
