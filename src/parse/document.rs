//! Document-level parsing: header block, then sections of systems with
//! timestamp, time-signature, and tempo context carried forward.

use log::debug;

use crate::diagnostics::{Warning, WarningKind, Warnings};
use crate::error::{Result, TabError};
use crate::models::core::{Score, Section, Tuning};
use crate::models::timing::{TempoMarker, TimeSignature, Timestamp};
use crate::parse::lines::{classify, ClassifiedLine, HeaderKey};
use crate::parse::system;

/// Header fields gathered from the top of the document. Title and artist
/// are mandatory; the rest are optional.
#[derive(Debug, Default)]
struct Header {
    title: Option<String>,
    artist: Option<String>,
    tuning: Option<Tuning>,
    difficulty: Option<String>,
    capo: Option<u8>,
}

fn parse_tuning_value(value: &str) -> Option<Tuning> {
    let labels: Vec<String> = value
        .split_whitespace()
        .map(|s| {
            let mut chars = s.chars();
            let letter = chars.next()?.to_ascii_uppercase();
            let rest: String = chars.collect();
            Some(format!("{letter}{rest}"))
        })
        .collect::<Option<Vec<_>>>()?;
    if labels.is_empty() {
        None
    } else {
        Some(Tuning::new(labels))
    }
}

/// Running per-section context. A time signature or tempo persists until
/// replaced; a timestamp is consumed by the section it opens.
struct SectionContext {
    timestamp: Option<Timestamp>,
    time_signature: TimeSignature,
    tempo: TempoMarker,
    tempo_line: Option<usize>,
    systems: Vec<crate::models::core::TabSystem>,
}

impl SectionContext {
    fn initial() -> Self {
        SectionContext {
            timestamp: None,
            time_signature: TimeSignature::default(),
            tempo: TempoMarker::default(),
            tempo_line: None,
            systems: Vec::new(),
        }
    }

    /// Close the current section (if it holds any systems) and open the
    /// next one, inheriting time signature and tempo but not timestamp.
    fn flush(&mut self, sections: &mut Vec<Section>) {
        if self.systems.is_empty() {
            // Nothing rendered yet; updated context applies to the
            // section still being assembled.
            return;
        }
        let systems = std::mem::take(&mut self.systems);
        sections.push(Section {
            timestamp: self.timestamp.take(),
            time_signature: self.time_signature,
            tempo: self.tempo.clone(),
            systems,
        });
        self.tempo_line = None;
    }

    fn finish(mut self, sections: &mut Vec<Section>) {
        self.flush(sections);
    }
}

/// Parse a complete tab document into a [`Score`].
///
/// Fails only when the mandatory `Title:` or `Artist:` header is missing;
/// everything else degrades to warnings on the returned score.
pub fn parse_tab(input: &str) -> Result<Score> {
    parse_tab_with_ticks(input, crate::models::timing::ticks_per_whole(
        crate::models::timing::DEFAULT_PPQ,
    ))
}

/// As [`parse_tab`], with an explicit ticks-per-whole-note resolution.
pub fn parse_tab_with_ticks(input: &str, ticks_per_whole: u64) -> Result<Score> {
    let lines: Vec<&str> = input.lines().collect();
    let mut warnings = Warnings::new();

    let mut header = Header::default();
    let mut i = 0;

    // Header block: leading header lines and blanks; anything else starts
    // the body.
    while i < lines.len() {
        match classify(lines[i]) {
            ClassifiedLine::Blank => {}
            ClassifiedLine::Header { key, value } => match key {
                HeaderKey::Title => header.title = Some(value),
                HeaderKey::Artist => header.artist = Some(value),
                HeaderKey::Tuning => header.tuning = parse_tuning_value(&value),
                HeaderKey::Difficulty => header.difficulty = Some(value),
                HeaderKey::Capo => header.capo = value.trim().parse().ok(),
            },
            _ => break,
        }
        i += 1;
    }

    let title = header.title.ok_or(TabError::MissingHeader("Title"))?;
    let artist = header.artist.ok_or(TabError::MissingHeader("Artist"))?;
    debug!("parsing tab: {artist} - {title}");

    let mut sections: Vec<Section> = Vec::new();
    let mut ctx = SectionContext::initial();

    while i < lines.len() {
        let line = lines[i];
        let line_no = i + 1;
        match classify(line) {
            ClassifiedLine::Blank => {
                i += 1;
            }
            ClassifiedLine::Timestamp(ts) => {
                // A timestamp always opens a new section.
                ctx.flush(&mut sections);
                ctx.timestamp = Some(ts);
                i += 1;
            }
            ClassifiedLine::TimeSignature(ts) => {
                ctx.flush(&mut sections);
                ctx.time_signature = ts;
                i += 1;
            }
            ClassifiedLine::Tempo(tempo) => {
                ctx.flush(&mut sections);
                if let Some(prev_line) = ctx.tempo_line {
                    warnings.add(Warning::new(
                        line_no,
                        WarningKind::DuplicateTempo,
                        format!(
                            "tempo {tempo} replaces the one on line {prev_line} before any system used it"
                        ),
                    ));
                }
                ctx.tempo = tempo;
                ctx.tempo_line = Some(line_no);
                i += 1;
            }
            ClassifiedLine::Header { .. } => {
                // Header fields inside the body carry no meaning here.
                warnings.add(Warning::new(
                    line_no,
                    WarningKind::UnrecognizedLine,
                    format!("header field after the body started: '{}'", line.trim()),
                ));
                i += 1;
            }
            _ => {
                let (block, consumed) = system::collect_system_block(&lines, i, 0);
                if consumed > 0 {
                    let sys = system::parse_system_block(
                        &block,
                        ctx.time_signature,
                        header.tuning.as_ref(),
                        ticks_per_whole,
                        &mut warnings,
                    );
                    ctx.systems.push(sys);
                    i += consumed;
                } else {
                    warnings.add(Warning::new(
                        line_no,
                        WarningKind::UnrecognizedLine,
                        format!("skipping unrecognized line: '{}'", line.trim()),
                    ));
                    i += 1;
                }
            }
        }
    }

    ctx.finish(&mut sections);

    Ok(Score {
        title,
        artist,
        capo: header.capo,
        difficulty: header.difficulty,
        tuning: header.tuning,
        sections,
        warnings,
    })
}
