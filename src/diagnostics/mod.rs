//! Parse warnings
//!
//! Non-fatal problems found while parsing are accumulated here and carried
//! on the score. The collector is threaded through the pipeline by mutable
//! reference, scoped to one parse call, so parsing stays reentrant.

use serde::{Deserialize, Serialize};

/// What went wrong, independent of the human-readable message
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Line matched no known shape and was skipped
    UnrecognizedLine,
    /// Barline columns disagree across strings; majority column used
    InconsistentBarlines,
    /// Text under a claimed column was not a valid note token
    UnrecognizedToken,
    /// A `+` continuation with no preceding event on that string
    DanglingTie,
    /// Duplicate or out-of-order tempo marker; last value wins
    DuplicateTempo,
    /// Strings produced differing slice counts; shorter strings padded
    MisalignedSlices,
}

/// A single warning with its source location
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Warning {
    /// 1-based line number in the input text
    pub line: usize,
    /// Column within the system, when one applies
    pub col: Option<usize>,
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(line: usize, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            line,
            col: None,
            kind,
            message: message.into(),
        }
    }

    /// Attach a column to the warning
    pub fn at_col(mut self, col: usize) -> Self {
        self.col = Some(col);
        self
    }
}

/// Collection of warnings for one parse call
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, warning: Warning) {
        log::debug!(
            "warning at line {}: {:?}: {}",
            warning.line,
            warning.kind,
            warning.message
        );
        self.items.push(warning);
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for w in warnings {
            self.add(w);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn any_of(&self, kind: WarningKind) -> bool {
        self.items.iter().any(|w| w.kind == kind)
    }
}
