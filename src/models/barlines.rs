//! Barline tokens and classification
//!
//! Barlines are the structural cut points of a system. Token scanning
//! prefers longer tokens, so `||o` never reads as `||` plus `o`.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Barline {
    Single,       // |
    Double,       // ||
    RepeatStart,  // ||o
    RepeatEnd,    // o||
    DoubleEnding, // *|
}

impl Barline {
    /// Parse a barline from its exact token text
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "|" => Some(Barline::Single),
            "||" => Some(Barline::Double),
            "||o" => Some(Barline::RepeatStart),
            "o||" => Some(Barline::RepeatEnd),
            "*|" => Some(Barline::DoubleEnding),
            _ => None,
        }
    }

    /// Token text used when rendering
    pub fn token(&self) -> &'static str {
        match self {
            Barline::Single => "|",
            Barline::Double => "||",
            Barline::RepeatStart => "||o",
            Barline::RepeatEnd => "o||",
            Barline::DoubleEnding => "*|",
        }
    }
}

/// All tokens in scan order, longest first
pub const BAR_TOKENS: [&str; 5] = ["||o", "o||", "||", "*|", "|"];

/// Scan a row for barline tokens, yielding `(start_col, end_col, barline)`
/// with a half-open column range. Longer tokens win at equal positions.
pub fn find_bar_tokens(row: &[char]) -> Vec<(usize, usize, Barline)> {
    let mut found = Vec::new();
    let mut col = 0;
    while col < row.len() {
        let mut matched = false;
        for tok in BAR_TOKENS {
            let tok_chars: Vec<char> = tok.chars().collect();
            if col + tok_chars.len() <= row.len() && row[col..col + tok_chars.len()] == tok_chars[..]
            {
                // `parse` cannot fail for tokens out of BAR_TOKENS
                if let Some(bar) = Barline::parse(tok) {
                    found.push((col, col + tok_chars.len(), bar));
                    col += tok_chars.len();
                    matched = true;
                    break;
                }
            }
        }
        if !matched {
            col += 1;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(Barline::parse("|"), Some(Barline::Single));
        assert_eq!(Barline::parse("||"), Some(Barline::Double));
        assert_eq!(Barline::parse("||o"), Some(Barline::RepeatStart));
        assert_eq!(Barline::parse("o||"), Some(Barline::RepeatEnd));
        assert_eq!(Barline::parse("*|"), Some(Barline::DoubleEnding));
        assert_eq!(Barline::parse("x"), None);
    }

    #[test]
    fn test_find_bar_tokens_prefers_longest() {
        let row = chars("||o x o|| y || z *| w |");
        let kinds: Vec<Barline> = find_bar_tokens(&row).iter().map(|t| t.2).collect();
        assert_eq!(
            kinds,
            vec![
                Barline::RepeatStart,
                Barline::RepeatEnd,
                Barline::Double,
                Barline::DoubleEnding,
                Barline::Single,
            ]
        );
    }

    #[test]
    fn test_round_trip_token_text() {
        for tok in BAR_TOKENS {
            assert_eq!(Barline::parse(tok).unwrap().token(), tok);
        }
    }
}
