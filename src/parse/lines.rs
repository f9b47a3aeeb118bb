//! Line classification
//!
//! Tags each raw input line by shape before any structural parsing. Rules
//! run in priority order; anything that matches nothing is Unrecognized,
//! which the caller records as a warning, never a failure.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::timing::{TempoMarker, TimeSignature, Timestamp};

pub static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+):(\d{2})\s*$").unwrap());
pub static TIMESIG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s*/\s*(\d+)\s*$").unwrap());
pub static TEMPO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([WHQESTXwhqestx])\s*=\s*(\d+(?:\.\d+)?)\s*$").unwrap());
pub static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(title|artist|tuning|difficulty|capo)\s*:\s*(.*?)\s*$").unwrap());
pub static STRING_LABELED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Ga-g])([#b])?\s*\|").unwrap());
pub static STRING_UNLABELED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\|").unwrap());
// Tuplet markers like "|-3-|", with ASCII or common Unicode dash variants
pub static TUPLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[|│]\s*[-–—−]+\s*(\d+)\s*[-–—−]+\s*[|│]").unwrap());
pub static PM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"PM[-\s]*\|").unwrap());
static BARLINE_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[|o*]+\s*$").unwrap());

/// Header keys this format recognizes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderKey {
    Title,
    Artist,
    Tuning,
    Difficulty,
    Capo,
}

impl HeaderKey {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Some(HeaderKey::Title),
            "artist" => Some(HeaderKey::Artist),
            "tuning" => Some(HeaderKey::Tuning),
            "difficulty" => Some(HeaderKey::Difficulty),
            "capo" => Some(HeaderKey::Capo),
            _ => None,
        }
    }
}

/// Classified line shape
#[derive(Clone, Debug, PartialEq)]
pub enum ClassifiedLine {
    Blank,
    Header { key: HeaderKey, value: String },
    Timestamp(Timestamp),
    TimeSignature(TimeSignature),
    Tempo(TempoMarker),
    StringLine,
    DurationLine,
    AnnotationLine,
    BarlineOnly,
    Unrecognized,
}

/// Letters that open a duration token (case carries staccato)
pub fn is_duration_symbol(c: char) -> bool {
    matches!(
        c,
        'W' | 'H' | 'Q' | 'E' | 'S' | 'T' | 'X' | 'w' | 'h' | 'q' | 'e' | 's' | 't' | 'x' | 'a'
    )
}

fn has_duration_symbol(s: &str) -> bool {
    s.chars().any(is_duration_symbol)
}

/// A string line is a labeled line (`E|...`, `F#|...`) or an unlabeled one
/// opening with `|`, excluding tuplet and palm-mute annotation shapes.
pub fn is_string_line(line: &str) -> bool {
    if STRING_LABELED_RE.is_match(line) {
        return true;
    }
    if STRING_UNLABELED_RE.is_match(line) {
        let s = line.trim();
        if TUPLET_RE.is_match(s) {
            return false;
        }
        if s.starts_with("PM") {
            return false;
        }
        return true;
    }
    false
}

/// A duration line contains only duration tokens, padding, and bar
/// characters; it must carry at least one duration letter.
pub fn is_duration_line(line: &str) -> bool {
    let s = line.trim();
    if s.is_empty() || !has_duration_symbol(s) {
        return false;
    }
    s.chars().all(|c| {
        c.is_whitespace() || c == '|' || c == '+' || c == '.' || c.is_ascii_digit() || is_duration_symbol(c)
    })
}

/// Annotation pre-lines: palm-mute runs and tuplet markers
pub fn is_annotation_line(line: &str) -> bool {
    PM_RE.is_match(line) || TUPLET_RE.is_match(line)
}

/// Loose test used while collecting a system block: anything that may
/// legitimately sit next to string lines without ending the block.
pub fn is_annotation_or_duration(line: &str) -> bool {
    let s = line.trim();
    if s.is_empty() {
        return false;
    }
    if TIMESIG_RE.is_match(s) || TIMESTAMP_RE.is_match(s) {
        return true;
    }
    if s.contains("PM") || TUPLET_RE.is_match(s) {
        return true;
    }
    has_duration_symbol(s)
}

/// Classify one raw line; rules are checked in priority order.
pub fn classify(line: &str) -> ClassifiedLine {
    if line.trim().is_empty() {
        return ClassifiedLine::Blank;
    }
    if let Some(caps) = HEADER_RE.captures(line) {
        if let Some(key) = HeaderKey::from_str(&caps[1]) {
            return ClassifiedLine::Header {
                key,
                value: caps[2].to_string(),
            };
        }
    }
    if let Some(caps) = TIMESTAMP_RE.captures(line) {
        let minutes: u32 = caps[1].parse().unwrap_or(0);
        let seconds: u32 = caps[2].parse().unwrap_or(0);
        return ClassifiedLine::Timestamp(Timestamp::new(minutes, seconds));
    }
    if let Some(caps) = TIMESIG_RE.captures(line) {
        if let (Ok(n), Ok(d)) = (caps[1].parse::<u8>(), caps[2].parse::<u8>()) {
            return ClassifiedLine::TimeSignature(TimeSignature::new(n, d));
        }
    }
    if let Some(caps) = TEMPO_RE.captures(line) {
        let unit = caps[1].chars().next().unwrap_or('Q').to_ascii_uppercase();
        if let Ok(bpm) = caps[2].parse::<f64>() {
            return ClassifiedLine::Tempo(TempoMarker::new(unit, bpm));
        }
    }
    if is_string_line(line) {
        return ClassifiedLine::StringLine;
    }
    if is_duration_line(line) {
        return ClassifiedLine::DurationLine;
    }
    if is_annotation_line(line) {
        return ClassifiedLine::AnnotationLine;
    }
    if BARLINE_ONLY_RE.is_match(line) {
        return ClassifiedLine::BarlineOnly;
    }
    ClassifiedLine::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_line_shapes() {
        assert!(is_string_line("E|---0---|"));
        assert!(is_string_line("F#|--2--|"));
        assert!(is_string_line("|---0---|"));
        assert!(!is_string_line("|-3-|"));
        assert!(!is_string_line("PM---|"));
        assert!(!is_string_line("  Q E S"));
    }

    #[test]
    fn test_annotation_or_duration_shapes() {
        assert!(is_annotation_or_duration("6/8"));
        assert!(is_annotation_or_duration("1:23"));
        assert!(is_annotation_or_duration("PM----|"));
        assert!(is_annotation_or_duration("|-3-|"));
        assert!(is_annotation_or_duration("  Q E S"));
        assert!(is_annotation_or_duration("  Q|E|S"));
        assert!(!is_annotation_or_duration("zzzz"));
    }

    #[test]
    fn test_duration_line_shape() {
        assert!(is_duration_line(" +QaEqWx2"));
        assert!(is_duration_line("Q E S"));
        assert!(is_duration_line("Q.|H..|"));
        assert!(!is_duration_line("PM---|"));
        assert!(!is_duration_line("-----"));
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify(""), ClassifiedLine::Blank);
        assert!(matches!(
            classify("title: My Song"),
            ClassifiedLine::Header {
                key: HeaderKey::Title,
                ..
            }
        ));
        assert_eq!(
            classify("1:07"),
            ClassifiedLine::Timestamp(Timestamp::new(1, 7))
        );
        assert_eq!(
            classify("3/4"),
            ClassifiedLine::TimeSignature(TimeSignature::new(3, 4))
        );
        assert_eq!(
            classify("Q=96"),
            ClassifiedLine::Tempo(TempoMarker::new('Q', 96.0))
        );
        assert_eq!(classify("E|--0--|"), ClassifiedLine::StringLine);
        assert_eq!(classify(" Q E"), ClassifiedLine::DurationLine);
        assert_eq!(classify("PM---|"), ClassifiedLine::AnnotationLine);
        assert_eq!(classify("%%%%"), ClassifiedLine::Unrecognized);
    }

    #[test]
    fn test_tuplet_regex_unicode_dashes() {
        assert!(TUPLET_RE.is_match("|-3-|"));
        assert!(TUPLET_RE.is_match("| – 3 – |"));
        assert!(TUPLET_RE.is_match("|—3—|"));
    }

    #[test]
    fn test_header_values_trimmed() {
        match classify("artist:  The Band  ") {
            ClassifiedLine::Header { key, value } => {
                assert_eq!(key, HeaderKey::Artist);
                assert_eq!(value, "The Band");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
