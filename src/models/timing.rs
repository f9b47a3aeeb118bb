//! Time signatures, tempo markers, and timestamp anchors
//!
//! These are context values attached to sections as immutable snapshots at
//! the moment a section is closed; they carry forward until overridden.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticks per quarter note used when nothing else is requested
pub const DEFAULT_PPQ: u16 = 480;

/// Ticks spanned by one whole note at a given PPQ
pub fn ticks_per_whole(ppq: u16) -> u64 {
    ppq as u64 * 4
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo given as a rhythmic unit and a rate, e.g. `Q=120`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct TempoMarker {
    /// Rhythmic unit letter: W H Q E S T X
    pub unit: char,
    /// Units per minute
    pub bpm: f64,
}

impl TempoMarker {
    pub fn new(unit: char, bpm: f64) -> Self {
        Self { unit, bpm }
    }

    /// Quarter notes spanned by one unit (Q = 1.0, H = 2.0, E = 0.5, ...)
    pub fn unit_quarters(&self) -> f64 {
        match self.unit.to_ascii_uppercase() {
            'W' => 4.0,
            'H' => 2.0,
            'Q' => 1.0,
            'E' => 0.5,
            'S' => 0.25,
            'T' => 0.125,
            'X' => 0.0625,
            _ => 1.0,
        }
    }

    /// Effective quarter-note beats per minute
    pub fn quarter_bpm(&self) -> f64 {
        self.bpm * self.unit_quarters()
    }

    /// MIDI tempo meta value
    pub fn micros_per_quarter(&self) -> u32 {
        (60_000_000.0 / self.quarter_bpm()).round() as u32
    }
}

impl Default for TempoMarker {
    fn default() -> Self {
        Self::new('Q', 120.0)
    }
}

impl fmt::Display for TempoMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bpm.fract() == 0.0 {
            write!(f, "{}={}", self.unit, self.bpm as u64)
        } else {
            write!(f, "{}={}", self.unit, self.bpm)
        }
    }
}

/// A `m:ss` anchor opening a section
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: u32,
}

impl Timestamp {
    pub fn new(minutes: u32, seconds: u32) -> Self {
        Self {
            seconds: minutes * 60 + seconds,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}
