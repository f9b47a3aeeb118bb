//! Renders a score back to tab text.
//!
//! Two renderers share the document scaffolding. [`render_tab`] replays
//! the raw line text each system retains, so round-tripping a well-formed
//! document reproduces every duration token, barline, and note token at
//! its original column. [`render_tab_from_model`] reconstructs the lines
//! from the measure/event tree instead, for scores assembled or modified
//! programmatically. Context lines are re-emitted only when their value
//! differs from the one already in force.

pub mod model;

use std::fmt::Write as _;

use crate::models::core::{Score, Section, TabSystem};
use crate::models::timing::{TempoMarker, TimeSignature};

pub use model::render_tab_from_model;

/// Render a score as tab text ending in a single trailing newline.
pub fn render_tab(score: &Score) -> String {
    render_with(score, |out, system| {
        for line in &system.raw_lines {
            writeln!(out, "{line}").ok();
        }
    })
}

/// Shared document scaffolding: header block, then per section a
/// timestamp line plus time-signature/tempo lines when they differ from
/// the values already in force, then the systems.
fn render_with(score: &Score, mut render_system: impl FnMut(&mut String, &TabSystem)) -> String {
    let mut out = String::new();
    write_header(&mut out, score);

    let mut current_ts = TimeSignature::default();
    let mut current_tempo = TempoMarker::default();

    for section in &score.sections {
        write_section_context(&mut out, section, &mut current_ts, &mut current_tempo);
        for system in &section.systems {
            render_system(&mut out, system);
            out.push('\n');
        }
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

fn write_header(out: &mut String, score: &Score) {
    writeln!(out, "Title: {}", score.title).ok();
    writeln!(out, "Artist: {}", score.artist).ok();
    if let Some(tuning) = &score.tuning {
        writeln!(out, "Tuning: {}", tuning.labels.join(" ")).ok();
    }
    if let Some(capo) = score.capo {
        writeln!(out, "Capo: {capo}").ok();
    }
    if let Some(difficulty) = &score.difficulty {
        writeln!(out, "Difficulty: {difficulty}").ok();
    }
    out.push('\n');
}

fn write_section_context(
    out: &mut String,
    section: &Section,
    current_ts: &mut TimeSignature,
    current_tempo: &mut TempoMarker,
) {
    if let Some(ts) = section.timestamp {
        writeln!(out, "{ts}").ok();
    }
    if section.time_signature != *current_ts {
        writeln!(out, "{}", section.time_signature).ok();
        *current_ts = section.time_signature;
    }
    if section.tempo != *current_tempo {
        writeln!(out, "{}", section.tempo).ok();
        *current_tempo = section.tempo;
    }
    if !out.ends_with("\n\n") {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_tab;

    #[test]
    fn test_raw_lines_survive_round_trip() {
        let input = "Title: T\nArtist: A\n\n0:10\n3/4\nH=80\n\n Q E\nE|-2-3-|\nB|-----|\n";
        let score = parse_tab(input).expect("parses");
        let rendered = render_tab(&score);
        assert!(rendered.contains(" Q E\n"));
        assert!(rendered.contains("E|-2-3-|\n"));
        assert!(rendered.contains("B|-----|\n"));
        assert!(rendered.contains("0:10\n"));
        assert!(rendered.contains("3/4\n"));
        assert!(rendered.contains("H=80\n"));
        assert!(rendered.ends_with('\n'));
        assert!(!rendered.ends_with("\n\n"));
    }

    #[test]
    fn test_defaults_not_reemitted() {
        let score = parse_tab("Title: T\nArtist: A\n\n Q\nE|2--|\n").expect("parses");
        let rendered = render_tab(&score);
        assert!(!rendered.contains("4/4"));
        assert!(!rendered.contains("Q=120"));
    }

    #[test]
    fn test_reparse_renders_identically() {
        let input =
            "Title: T\nArtist: A\nTuning: E B G D A E\nCapo: 3\n\n1:00\nQ=90\n\n Q Q\nE|-2-3-|\n";
        let score = parse_tab(input).expect("parses");
        let rendered = render_tab(&score);
        let score2 = parse_tab(&rendered).expect("reparses");
        assert_eq!(render_tab(&score2), rendered);
    }
}
