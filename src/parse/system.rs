//! System alignment and measure segmentation
//!
//! Builds one aligned block out of {optional duration pre-line, optional
//! annotation pre-lines, one or more string lines}, maps duration and note
//! tokens by shared column index, splits the column range into measures at
//! validated barline columns, and resolves rhythm into tick values.
//!
//! Labeled string lines are read from their first `|` onward, so string
//! content, duration pre-lines, and annotation pre-lines share one column
//! coordinate space.

use crate::diagnostics::{Warning, WarningKind, Warnings};
use crate::models::barlines::{find_bar_tokens, Barline};
use crate::models::events::{
    AnnotationKind, AnnotationSpan, ChordEvent, DurationToken, Event, NoteEvent, RestEvent,
    TupletSpan,
};
use crate::models::core::{Measure, TabSystem, Tuning};
use crate::models::timing::TimeSignature;
use crate::parse::duration;
use crate::parse::lines::{
    self, HEADER_RE, PM_RE, STRING_LABELED_RE, TEMPO_RE, TIMESTAMP_RE, TUPLET_RE,
};
use crate::parse::note::{self, NoteToken};

/// Collect a maximal system-ish block starting at `start`, returning
/// `(line_no, text)` pairs and the number of lines consumed. Returns an
/// empty block when no system starts here.
pub fn collect_system_block(
    input: &[&str],
    start: usize,
    line_offset: usize,
) -> (Vec<(usize, String)>, usize) {
    let mut block: Vec<(usize, String)> = Vec::new();
    let mut i = start;

    // Leading annotation/duration pre-lines; a blank, timestamp, or tempo
    // line means no system starts here.
    while i < input.len() {
        let s = input[i];
        if s.trim().is_empty() {
            return (Vec::new(), 0);
        }
        if TIMESTAMP_RE.is_match(s) || TEMPO_RE.is_match(s) {
            return (Vec::new(), 0);
        }
        if lines::is_string_line(s) {
            break;
        }
        if lines::is_annotation_or_duration(s) {
            block.push((line_offset + i + 1, s.trim_end().to_string()));
            i += 1;
            continue;
        }
        // Unknown line before any strings: not a system start
        return (Vec::new(), 0);
    }

    // At least one string line is required; annotation lines may also
    // interleave after the strings.
    let mut string_count = 0;
    while i < input.len() {
        let s = input[i];
        if s.trim().is_empty() || TIMESTAMP_RE.is_match(s) || TEMPO_RE.is_match(s) {
            break;
        }
        if HEADER_RE.is_match(s) {
            break;
        }
        if lines::is_string_line(s) {
            string_count += 1;
            block.push((line_offset + i + 1, s.trim_end().to_string()));
            i += 1;
            continue;
        }
        if lines::is_annotation_or_duration(s) {
            block.push((line_offset + i + 1, s.trim_end().to_string()));
            i += 1;
            continue;
        }
        break;
    }

    if string_count == 0 {
        return (Vec::new(), 0);
    }
    let consumed = block.len();
    (block, consumed)
}

pub fn count_string_lines(block: &[(usize, String)]) -> usize {
    block.iter().filter(|(_, ln)| lines::is_string_line(ln)).count()
}

/// String rows reduced to a shared column space
struct AlignedStrings {
    labels: Vec<String>,
    /// Per-string content, starting at the first barline, width-padded
    rows: Vec<Vec<char>>,
    line_nos: Vec<usize>,
    width: usize,
}

fn byte_to_char_idx(s: &str, byte_idx: usize) -> usize {
    s[..byte_idx].chars().count()
}

fn align_strings(
    string_lines: &[(usize, String)],
    header_tuning: Option<&Tuning>,
) -> AlignedStrings {
    let mut labels = Vec::new();
    let mut rows: Vec<Vec<char>> = Vec::new();
    let mut line_nos = Vec::new();

    for (ln_no, ln) in string_lines {
        line_nos.push(*ln_no);
        if let Some(caps) = STRING_LABELED_RE.captures(ln) {
            let letter = caps[1].to_ascii_uppercase();
            let accidental = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            labels.push(format!("{letter}{accidental}"));
            // content starts at the first '|' so every string shares the
            // same column origin regardless of label width
            let bar_byte = caps.get(0).map(|m| m.end() - 1).unwrap_or(0);
            let bar_char = byte_to_char_idx(ln, bar_byte);
            rows.push(ln.chars().skip(bar_char).collect());
        } else {
            labels.push("?".to_string());
            rows.push(ln.trim_start().chars().collect());
        }
    }

    // Unlabeled systems: prefer the header tuning, else standard
    // display-order labels for six strings.
    if labels.iter().all(|l| l == "?") {
        if let Some(t) = header_tuning {
            if t.string_count() == labels.len() {
                labels = t.labels.clone();
            }
        }
        if labels.iter().all(|l| l == "?") && labels.len() == 6 {
            labels = Tuning::standard().labels;
        }
    }

    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, ' ');
    }

    AlignedStrings {
        labels,
        rows,
        line_nos,
        width,
    }
}

/// Pick the barline column set shared by the most strings; disagreement is
/// a warning, never a failure. Returns the chosen tokens plus whether the
/// degraded path was taken.
fn resolve_bar_columns(
    aligned: &AlignedStrings,
    warnings: &mut Warnings,
) -> (Vec<(usize, usize, Barline)>, bool) {
    let per_string: Vec<Vec<(usize, usize, Barline)>> = aligned
        .rows
        .iter()
        .map(|row| find_bar_tokens(row))
        .collect();

    let positions: Vec<Vec<usize>> = per_string
        .iter()
        .map(|toks| toks.iter().map(|t| t.0).collect())
        .collect();

    // Majority vote over full column lists, first-seen wins ties.
    let mut best_idx = 0;
    let mut best_count = 0;
    for (i, pos) in positions.iter().enumerate() {
        if pos.is_empty() {
            continue;
        }
        let count = positions.iter().filter(|p| *p == pos).count();
        if count > best_count {
            best_count = count;
            best_idx = i;
        }
    }

    let chosen_positions = positions.get(best_idx).cloned().unwrap_or_default();
    let mut degraded = false;
    for (i, pos) in positions.iter().enumerate() {
        if !pos.is_empty() && *pos != chosen_positions {
            degraded = true;
            let bad_col = pos
                .iter()
                .zip(chosen_positions.iter())
                .find(|(a, b)| a != b)
                .map(|(a, _)| *a)
                .or_else(|| pos.get(chosen_positions.len()).copied())
                .unwrap_or(0);
            warnings.add(
                Warning::new(
                    aligned.line_nos[i],
                    WarningKind::InconsistentBarlines,
                    format!(
                        "inconsistent barline at column {bad_col}; using majority columns (best-effort parsing)"
                    ),
                )
                .at_col(bad_col),
            );
        }
    }

    let mut chosen = per_string.into_iter().nth(best_idx).unwrap_or_default();
    if chosen.len() < 2 {
        // No explicit barlines: treat the whole width as one measure
        // bounded by synthetic bars.
        chosen = vec![
            (0, 0, Barline::Single),
            (aligned.width, aligned.width, Barline::Single),
        ];
    }
    (chosen, degraded)
}

fn collect_spans(
    pre_lines: &[(usize, String)],
) -> (Vec<AnnotationSpan>, Vec<TupletSpan>) {
    let mut annotations = Vec::new();
    let mut tuplets = Vec::new();
    for (_, ln) in pre_lines {
        for m in PM_RE.find_iter(ln) {
            annotations.push(AnnotationSpan {
                kind: AnnotationKind::PalmMute,
                start_col: byte_to_char_idx(ln, m.start()),
                end_col: byte_to_char_idx(ln, m.end()),
            });
        }
        for caps in TUPLET_RE.captures_iter(ln) {
            let Some(whole) = caps.get(0) else { continue };
            let actual: u8 = caps[1].parse().unwrap_or(3);
            let normal = match actual {
                0 | 1 | 2 => 2,
                3 | 4 => 2,
                5 | 6 | 7 => 4,
                _ => 8,
            };
            tuplets.push(TupletSpan {
                actual,
                normal,
                start_col: byte_to_char_idx(ln, whole.start()),
                end_col: byte_to_char_idx(ln, whole.end()),
            });
        }
    }
    (annotations, tuplets)
}

/// Parse one collected block into a [`TabSystem`].
pub fn parse_system_block(
    block: &[(usize, String)],
    effective_ts: TimeSignature,
    header_tuning: Option<&Tuning>,
    ticks_per_whole: u64,
    warnings: &mut Warnings,
) -> TabSystem {
    let mut string_lines: Vec<(usize, String)> = Vec::new();
    let mut pre_lines: Vec<(usize, String)> = Vec::new();
    for (ln_no, ln) in block {
        if lines::is_string_line(ln) {
            string_lines.push((*ln_no, ln.clone()));
        } else {
            pre_lines.push((*ln_no, ln.clone()));
        }
    }
    debug_assert!(!string_lines.is_empty(), "collector guarantees string lines");

    let aligned = align_strings(&string_lines, header_tuning);
    let tuning = Tuning::new(aligned.labels.clone());
    let open_pitches = tuning.open_pitches();

    // First pre-line shaped like a duration line drives rhythm resolution.
    let duration_line: Option<Vec<char>> = pre_lines
        .iter()
        .find(|(_, ln)| lines::is_duration_line(ln))
        .map(|(_, ln)| {
            let mut chars: Vec<char> = ln.chars().collect();
            chars.resize(chars.len().max(aligned.width), ' ');
            chars
        });

    let (annotations, tuplets) = collect_spans(&pre_lines);
    let (bars, degraded) = resolve_bar_columns(&aligned, warnings);

    if degraded {
        let trimmed: Vec<usize> = string_lines
            .iter()
            .map(|(_, ln)| ln.trim_end().chars().count())
            .collect();
        if trimmed.iter().any(|&l| l != trimmed[0]) {
            warnings.add(Warning::new(
                string_lines[0].0,
                WarningKind::MisalignedSlices,
                "string lines differ in length; shorter strings padded with rests",
            ));
        }
    }

    let mut builder = MeasureBuilder {
        measures: Vec::new(),
        last_event: None,
        ticks_per_whole,
    };

    for window in bars.windows(2) {
        let (_, left_end, left_bar) = window[0];
        let (right_start, _, right_bar) = window[1];
        let m_start = left_end;
        let m_end = right_start.max(m_start);

        builder.begin_measure(Measure {
            barline_left: left_bar,
            barline_right: right_bar,
            time_signature: effective_ts,
            events: Vec::new(),
            start_col: m_start,
            raw_columns: m_end - m_start,
        });

        match &duration_line {
            Some(dur) => builder.parse_rhythm_measure(
                dur,
                &aligned,
                &open_pitches,
                m_start,
                m_end,
                warnings,
            ),
            None => builder.parse_free_measure(&aligned, &open_pitches, m_start, m_end),
        }
    }

    TabSystem {
        tuning,
        measures: builder.measures,
        annotations,
        tuplets,
        duration_line: duration_line.map(|c| c.into_iter().collect()),
        raw_lines: block.iter().map(|(_, ln)| ln.clone()).collect(),
    }
}

/// Walks measure spans and accumulates events; the tie cursor survives
/// measure boundaries so a `+` opening a measure extends the previous
/// measure's final event.
struct MeasureBuilder {
    measures: Vec<Measure>,
    /// (measure index, event index) of the most recent event
    last_event: Option<(usize, usize)>,
    ticks_per_whole: u64,
}

impl MeasureBuilder {
    fn begin_measure(&mut self, measure: Measure) {
        self.measures.push(measure);
    }

    fn push_event(&mut self, event: Event) {
        let mi = self.measures.len() - 1;
        let measure = &mut self.measures[mi];
        measure.events.push(event);
        self.last_event = Some((mi, measure.events.len() - 1));
    }

    fn extend_last(&mut self, add: u64) -> bool {
        match self.last_event {
            Some((mi, ei)) => {
                self.measures[mi].events[ei].extend_ticks(add);
                true
            }
            None => false,
        }
    }

    /// Duration-driven mode: walk duration tokens over the measure span
    /// and pair each with the note tokens beneath it.
    #[allow(clippy::too_many_arguments)]
    fn parse_rhythm_measure(
        &mut self,
        dur: &[char],
        aligned: &AlignedStrings,
        open_pitches: &[u8],
        m_start: usize,
        m_end: usize,
        warnings: &mut Warnings,
    ) {
        let mut col = m_start;
        while col < m_end.min(dur.len()) {
            let Some((mut token, consumed)) = duration::scan_token(dur, col) else {
                col += 1;
                continue;
            };

            let slot = if let Some(n) = token.multibar {
                self.ticks_per_whole * n as u64
            } else {
                duration::resolve_ticks(&token, self.ticks_per_whole)
            };

            if token.tie {
                if self.extend_last(slot) {
                    col += consumed;
                    continue;
                }
                // A tie with nothing before it: warn and treat the token
                // as a fresh duration.
                warnings.add(
                    Warning::new(
                        aligned.line_nos[0],
                        WarningKind::DanglingTie,
                        format!("'+' with no preceding event at column {col}"),
                    )
                    .at_col(col),
                );
                token.tie = false;
            }

            if let Some(n) = token.multibar {
                let rest_ticks = self.ticks_per_whole;
                for _ in 0..n {
                    self.push_event(Event::Rest(RestEvent {
                        col,
                        ticks: rest_ticks,
                    }));
                }
                col += consumed;
                continue;
            }

            let mut notes = self.notes_at_column(aligned, open_pitches, col, &token, warnings);
            if notes.is_empty() {
                self.push_event(Event::Rest(RestEvent { col, ticks: slot }));
            } else if notes.len() == 1 {
                self.push_event(Event::Note(notes.remove(0)));
            } else {
                self.push_event(Event::Chord(ChordEvent {
                    col,
                    ticks: slot,
                    grace: token.grace,
                    staccato: token.staccato,
                    notes,
                }));
            }

            col += consumed;
        }
    }

    fn notes_at_column(
        &self,
        aligned: &AlignedStrings,
        open_pitches: &[u8],
        col: usize,
        token: &DurationToken,
        warnings: &mut Warnings,
    ) -> Vec<NoteEvent> {
        let slot = duration::resolve_ticks(token, self.ticks_per_whole);
        let mut notes = Vec::new();
        for (si, row) in aligned.rows.iter().enumerate() {
            match note::scan_note(row, col) {
                Some(tok) => notes.push(make_note(col, si, &tok, open_pitches, token, slot)),
                None => {
                    if col < row.len() && !note::is_padding(row[col]) {
                        warnings.add(
                            Warning::new(
                                aligned.line_nos[si],
                                WarningKind::UnrecognizedToken,
                                format!(
                                    "unrecognized token '{}' under duration column {col}",
                                    row[col]
                                ),
                            )
                            .at_col(col),
                        );
                    }
                }
            }
        }
        notes
    }

    /// Unknown-rhythm mode: no duration line, so notes are taken in column
    /// order with a placeholder quarter-note duration.
    fn parse_free_measure(
        &mut self,
        aligned: &AlignedStrings,
        open_pitches: &[u8],
        m_start: usize,
        m_end: usize,
    ) {
        use std::collections::BTreeMap;

        let quarter = self.ticks_per_whole / 4;
        let mut by_col: BTreeMap<usize, Vec<NoteEvent>> = BTreeMap::new();

        for (si, row) in aligned.rows.iter().enumerate() {
            let mut col = m_start;
            while col < m_end.min(row.len()) {
                match note::scan_note(row, col) {
                    Some(tok) => {
                        let consumed = tok.consumed;
                        let note = NoteEvent {
                            col,
                            string: si,
                            pitch: pitch_for(open_pitches, si, tok.fret),
                            fret: tok.fret,
                            ghost: tok.ghost,
                            grace: false,
                            staccato: false,
                            techniques: tok.techniques,
                            ticks: quarter,
                        };
                        by_col.entry(col).or_default().push(note);
                        col += consumed;
                    }
                    None => col += 1,
                }
            }
        }

        for (col, mut notes) in by_col {
            if notes.len() == 1 {
                self.push_event(Event::Note(notes.remove(0)));
            } else {
                self.push_event(Event::Chord(ChordEvent {
                    col,
                    ticks: quarter,
                    grace: false,
                    staccato: false,
                    notes,
                }));
            }
        }
    }
}

/// Open-string pitch plus fret, saturating so an absurd fret number
/// degrades instead of overflowing
fn pitch_for(open_pitches: &[u8], string: usize, fret: Option<u8>) -> Option<u8> {
    fret.and_then(|f| open_pitches.get(string).map(|p| p.saturating_add(f)))
}

fn make_note(
    col: usize,
    string: usize,
    tok: &NoteToken,
    open_pitches: &[u8],
    duration: &DurationToken,
    slot: u64,
) -> NoteEvent {
    NoteEvent {
        col,
        string,
        pitch: pitch_for(open_pitches, string, tok.fret),
        fret: tok.fret,
        ghost: tok.ghost,
        grace: duration.grace,
        staccato: duration.staccato,
        techniques: tok.techniques.clone(),
        ticks: slot,
    }
}
