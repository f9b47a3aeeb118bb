//! Score tree: Score → Section → TabSystem → Measure → Event
//!
//! Ownership is strictly tree-shaped; spans reference column ranges by
//! value, so the model is cycle-free and serializes cleanly.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Warnings;
use crate::models::barlines::Barline;
use crate::models::events::{AnnotationSpan, Event, TupletSpan};
use crate::models::pitch::open_midi_pitches;
use crate::models::timing::{TempoMarker, TimeSignature, Timestamp};

/// Open-string labels, top line first
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Tuning {
    pub labels: Vec<String>,
}

impl Tuning {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Standard six-string display-order tuning
    pub fn standard() -> Self {
        Self::new(
            ["E", "B", "G", "D", "A", "E"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    pub fn string_count(&self) -> usize {
        self.labels.len()
    }

    /// MIDI numbers of the open strings, top line first
    pub fn open_pitches(&self) -> Vec<u8> {
        open_midi_pitches(&self.labels)
    }
}

/// One instrument voice
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Track {
    pub id: usize,
    pub name: String,
    pub tuning: Tuning,
}

/// A rhythmic unit bounded by barlines
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Measure {
    pub barline_left: Barline,
    pub barline_right: Barline,
    pub time_signature: TimeSignature,
    /// Time slices in column order; one event per occupied column
    pub events: Vec<Event>,
    /// First column of the measure body within the system
    pub start_col: usize,
    /// Column width of the measure body in the source text
    pub raw_columns: usize,
}

/// One aligned block of string lines plus optional pre-lines
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TabSystem {
    pub tuning: Tuning,
    pub measures: Vec<Measure>,
    pub annotations: Vec<AnnotationSpan>,
    pub tuplets: Vec<TupletSpan>,
    /// Width-padded duration pre-line, when the system has one
    pub duration_line: Option<String>,
    /// Source lines kept verbatim for round-trip rendering
    pub raw_lines: Vec<String>,
}

/// A contiguous run of systems under one timestamp anchor and one
/// time-signature/tempo snapshot
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Section {
    pub timestamp: Option<Timestamp>,
    pub time_signature: TimeSignature,
    pub tempo: TempoMarker,
    pub systems: Vec<TabSystem>,
}

/// Root of the parsed model
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Score {
    pub title: String,
    pub artist: String,
    pub capo: Option<u8>,
    pub difficulty: Option<String>,
    /// Tuning declared in the header, if any
    pub tuning: Option<Tuning>,
    pub sections: Vec<Section>,
    pub warnings: Warnings,
}

impl Score {
    /// Effective tuning: header declaration, else the first system's
    /// labels, else standard
    pub fn effective_tuning(&self) -> Tuning {
        if let Some(t) = &self.tuning {
            return t.clone();
        }
        self.sections
            .iter()
            .flat_map(|s| s.systems.iter())
            .map(|sys| sys.tuning.clone())
            .next()
            .unwrap_or_else(Tuning::standard)
    }

    /// Tracks of this score. This document shape carries one implicit
    /// guitar track; the timeline and SMF writer are multi-track-shaped.
    pub fn tracks(&self) -> Vec<Track> {
        vec![Track {
            id: 0,
            name: format!("{} - {}", self.artist, self.title),
            tuning: self.effective_tuning(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tuning_labels() {
        let t = Tuning::standard();
        assert_eq!(t.string_count(), 6);
        assert_eq!(t.labels[0], "E");
        assert_eq!(t.labels[5], "E");
        assert_eq!(t.open_pitches()[5], 40); // low E2
    }

    #[test]
    fn test_implicit_track() {
        let score = Score {
            title: "Song".into(),
            artist: "Artist".into(),
            capo: Some(2),
            difficulty: None,
            tuning: None,
            sections: vec![],
            warnings: Warnings::new(),
        };
        let tracks = score.tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 0);
        assert_eq!(tracks[0].tuning, Tuning::standard());
        assert_eq!(tracks[0].name, "Artist - Song");
    }
}
