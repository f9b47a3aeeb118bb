//! Model-driven tab rendering
//!
//! Reconstructs string lines, a duration pre-line, and barlines from the
//! measure/event tree. Event columns are measure-relative offsets of the
//! retained source columns, so output from a parsed score lines up with
//! the input; scores built by hand just need consistent `col` values.
//! Ghost and muted notes re-tokenize; other techniques render as their
//! destination fret.

use crate::models::core::{Score, TabSystem};
use crate::models::events::{Event, NoteEvent};
use crate::models::timing::{ticks_per_whole, DEFAULT_PPQ};

/// Render tab text from the resolved model rather than retained raw
/// lines. Tick values are mapped back to duration letters at the default
/// resolution.
pub fn render_tab_from_model(score: &Score) -> String {
    let tpw = ticks_per_whole(DEFAULT_PPQ);
    super::render_with(score, |out, system| {
        for line in render_system(system, tpw) {
            out.push_str(&line);
            out.push('\n');
        }
    })
}

fn render_system(system: &TabSystem, tpw: u64) -> Vec<String> {
    let n_strings = system.tuning.string_count();
    let has_durations = system.duration_line.is_some();

    let mut string_rows: Vec<String> = vec![String::new(); n_strings];
    let mut dur_row = String::new();

    for (mi, measure) in system.measures.iter().enumerate() {
        let left = measure.barline_left.token();
        let right = measure.barline_right.token();
        let width = measure.raw_columns.max(1);

        let mut grid: Vec<Vec<char>> = vec![vec!['-'; width]; n_strings];
        let mut dur: Vec<char> = vec![' '; width];

        for event in &measure.events {
            let col = event.col().saturating_sub(measure.start_col).min(width - 1);
            match event {
                Event::Rest(rest) => {
                    if has_durations {
                        place(&mut dur, col, &duration_token_for(rest.ticks, tpw, false, false));
                    }
                }
                Event::Note(note) => {
                    place_note(&mut grid, note, col);
                    if has_durations {
                        place(
                            &mut dur,
                            col,
                            &duration_token_for(note.ticks, tpw, note.staccato, note.grace),
                        );
                    }
                }
                Event::Chord(chord) => {
                    for note in &chord.notes {
                        place_note(&mut grid, note, col);
                    }
                    if has_durations {
                        place(
                            &mut dur,
                            col,
                            &duration_token_for(chord.ticks, tpw, chord.staccato, chord.grace),
                        );
                    }
                }
            }
        }

        // Adjacent measures share their inner barline, so only the first
        // measure emits its left token.
        if mi == 0 {
            for row in &mut string_rows {
                row.push_str(left);
            }
            dur_row.push_str(&" ".repeat(left.chars().count()));
        }
        for (si, row) in string_rows.iter_mut().enumerate() {
            row.extend(grid[si].iter());
            row.push_str(right);
        }
        dur_row.extend(dur.iter());
        dur_row.push_str(&" ".repeat(right.chars().count()));
    }

    let mut lines = Vec::new();
    if has_durations {
        lines.push(dur_row.trim_end().to_string());
    }
    for (label, row) in system.tuning.labels.iter().zip(string_rows) {
        lines.push(format!("{label}{row}"));
    }
    lines
}

fn place_note(grid: &mut [Vec<char>], note: &NoteEvent, col: usize) {
    let Some(row) = grid.get_mut(note.string) else {
        return;
    };
    let token = match note.fret {
        None => "x".to_string(),
        Some(fret) if note.ghost => format!("({fret})"),
        Some(fret) => fret.to_string(),
    };
    place(row, col, &token);
}

/// Best-effort overlay that never writes past the row end
fn place(row: &mut [char], col: usize, token: &str) {
    for (i, ch) in token.chars().enumerate() {
        if let Some(cell) = row.get_mut(col + i) {
            *cell = ch;
        }
    }
}

/// Map a tick count back to a duration letter, trying plain, dotted, and
/// double-dotted values of each base; quarter note as a last resort.
fn duration_token_for(ticks: u64, tpw: u64, staccato: bool, grace: bool) -> String {
    if grace {
        return "a".to_string();
    }
    let mut token = None;
    for (symbol, div) in [
        ('W', 1u64),
        ('H', 2),
        ('Q', 4),
        ('E', 8),
        ('S', 16),
        ('T', 32),
        ('X', 64),
    ] {
        let base = tpw / div;
        if ticks == base {
            token = Some(symbol.to_string());
        } else if ticks == base * 3 / 2 {
            token = Some(format!("{symbol}."));
        } else if ticks == base * 9 / 4 {
            token = Some(format!("{symbol}.."));
        }
        if token.is_some() {
            break;
        }
    }
    let mut token = token.unwrap_or_else(|| "Q".to_string());
    if staccato {
        token = token.to_ascii_lowercase();
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::barlines::Barline;
    use crate::models::core::{Measure, Section, Tuning};
    use crate::models::events::{ChordEvent, RestEvent};
    use crate::models::timing::{TempoMarker, TimeSignature};
    use crate::parse::parse_tab;

    const TPW: u64 = 1920;

    fn note(col: usize, string: usize, fret: u8, ticks: u64) -> NoteEvent {
        NoteEvent {
            col,
            string,
            fret: Some(fret),
            pitch: None,
            ghost: false,
            grace: false,
            staccato: false,
            techniques: vec![],
            ticks,
        }
    }

    #[test]
    fn test_renders_duration_line_and_notes() {
        let mut ghost = note(8, 1, 7, 480);
        ghost.ghost = true;
        let muted = NoteEvent {
            fret: None,
            ..note(6, 0, 0, 480)
        };
        let measure = Measure {
            barline_left: Barline::Single,
            barline_right: Barline::Single,
            time_signature: TimeSignature::new(4, 4),
            events: vec![
                Event::Chord(ChordEvent {
                    col: 1,
                    ticks: 960,
                    grace: false,
                    staccato: false,
                    notes: vec![note(1, 0, 3, 960), note(1, 1, 5, 960)],
                }),
                Event::Rest(RestEvent { col: 4, ticks: 480 }),
                Event::Note(muted),
                Event::Note(ghost),
            ],
            start_col: 1,
            raw_columns: 12,
        };
        let system = TabSystem {
            tuning: Tuning::new(vec!["E".into(), "B".into()]),
            measures: vec![measure],
            annotations: vec![],
            tuplets: vec![],
            duration_line: Some(String::new()),
            raw_lines: vec![],
        };
        let score = Score {
            title: "Title".into(),
            artist: "Artist".into(),
            capo: Some(3),
            difficulty: None,
            tuning: None,
            sections: vec![Section {
                timestamp: Some(crate::models::timing::Timestamp::new(0, 11)),
                time_signature: TimeSignature::new(4, 4),
                tempo: TempoMarker::default(),
                systems: vec![system],
            }],
            warnings: crate::diagnostics::Warnings::new(),
        };

        let out = render_tab_from_model(&score);
        assert!(out.starts_with("Title: Title"));
        assert!(out.contains("Capo: 3"));
        assert!(out.contains("0:11"));
        assert!(out.contains("E|3----x------|"));
        assert!(out.contains("B|5------(7)--|"));
        // H under the chord, Q under the rest and the single notes
        assert!(out.contains(" H  Q Q Q"));
    }

    #[test]
    fn test_matches_raw_renderer_for_parsed_input() {
        let input = "Title: T\nArtist: A\n\n  Q E\nE|-3-5--|\n";
        let score = parse_tab(input).expect("parses");
        let out = render_tab_from_model(&score);
        assert!(out.contains("E|-3-5--|\n"));
        assert!(out.contains("  Q E\n"));
    }

    #[test]
    fn test_model_render_reparses_to_same_timeline() {
        let input = "Title: T\nArtist: A\n\n0:05\nQ=90\n\n  Q E E  H\nE|-3-5-7--8---|\nB|-3----------|\n";
        let score = parse_tab(input).expect("parses");
        let rendered = render_tab_from_model(&score);
        let reparsed = parse_tab(&rendered).expect("reparses");
        let opts = crate::timeline::TimelineOptions::default();
        assert_eq!(
            crate::timeline::build_timeline(&score, &opts),
            crate::timeline::build_timeline(&reparsed, &opts)
        );
    }

    #[test]
    fn test_duration_token_inversion() {
        assert_eq!(duration_token_for(1920, TPW, false, false), "W");
        assert_eq!(duration_token_for(1440, TPW, false, false), "H.");
        assert_eq!(duration_token_for(2160, TPW, false, false), "H..");
        assert_eq!(duration_token_for(480, TPW, true, false), "q");
        assert_eq!(duration_token_for(0, TPW, false, true), "a");
        // Unmappable values degrade to a quarter
        assert_eq!(duration_token_for(7, TPW, false, false), "Q");
    }

    #[test]
    fn test_free_mode_omits_duration_line() {
        let score = parse_tab("Title: T\nArtist: A\n\nE|-3-5-|\n").expect("parses");
        let out = render_tab_from_model(&score);
        assert!(out.contains("E|-3-5-|"));
        assert!(!out.contains("Q Q"));
    }
}
