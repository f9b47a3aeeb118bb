//! Note and technique tokenizing
//!
//! Parses the text under one column on one string into a typed note token.
//! Recognized forms, first match wins: `(n)` ghost, `x` muted, `/n` and
//! `\n` slide-in, `nhm`/`npm` inline legato, `n~` vibrato, plain digits.

use crate::models::events::Technique;

/// One recognized note token
#[derive(Clone, Debug, PartialEq)]
pub struct NoteToken {
    /// None for muted (pitchless) notes
    pub fret: Option<u8>,
    pub ghost: bool,
    pub techniques: Vec<Technique>,
    /// Columns consumed by the token text
    pub consumed: usize,
}

fn scan_digits(row: &[char], start: usize) -> Option<(u8, usize)> {
    let mut end = start;
    while end < row.len() && row[end].is_ascii_digit() {
        end += 1;
    }
    if end == start {
        return None;
    }
    let value: u32 = row[start..end].iter().collect::<String>().parse().ok()?;
    Some((value.min(u8::MAX as u32) as u8, end))
}

/// Scan a note token starting at `col`. Returns None when the column
/// holds padding (`-`, space, barline) or nothing recognizable.
pub fn scan_note(row: &[char], col: usize) -> Option<NoteToken> {
    if col >= row.len() {
        return None;
    }

    let ch = row[col];

    // slide-in marker immediately before a fret: "/8" or "\7"
    if (ch == '/' || ch == '\\') && col + 1 < row.len() && row[col + 1].is_ascii_digit() {
        let (fret, end) = scan_digits(row, col + 1)?;
        return Some(NoteToken {
            fret: Some(fret),
            ghost: false,
            techniques: vec![Technique::SlideIn { direction: ch }],
            consumed: end - col,
        });
    }

    if ch.is_ascii_digit() {
        let (mut fret, mut end) = scan_digits(row, col)?;
        let mut techniques = Vec::new();

        // Inline legato like "0h3" or "4p2": the destination fret owns
        // the rhythmic column.
        if end < row.len() {
            let nxt = row[end];
            if (nxt == 'h' || nxt == 'p') && end + 1 < row.len() && row[end + 1].is_ascii_digit() {
                if let Some((to_fret, legato_end)) = scan_digits(row, end + 1) {
                    techniques.push(if nxt == 'h' {
                        Technique::HammerOn {
                            from_fret: fret,
                            to_fret,
                        }
                    } else {
                        Technique::PullOff {
                            from_fret: fret,
                            to_fret,
                        }
                    });
                    fret = to_fret;
                    end = legato_end;
                }
            }
        }

        // vibrato marker directly after the token span
        if end < row.len() && row[end] == '~' {
            techniques.push(Technique::Vibrato);
        }

        return Some(NoteToken {
            fret: Some(fret),
            ghost: false,
            techniques,
            consumed: end - col,
        });
    }

    // ghost note "(7)"
    if ch == '(' {
        if let Some((fret, end)) = scan_digits(row, col + 1) {
            if end < row.len() && row[end] == ')' {
                return Some(NoteToken {
                    fret: Some(fret),
                    ghost: true,
                    techniques: vec![],
                    consumed: end + 1 - col,
                });
            }
        }
    }

    if ch.eq_ignore_ascii_case(&'x') {
        return Some(NoteToken {
            fret: None,
            ghost: false,
            techniques: vec![Technique::Muted],
            consumed: 1,
        });
    }

    None
}

/// Whether a character is legitimate inter-event padding on a string line
pub fn is_padding(ch: char) -> bool {
    ch == '-' || ch == ' ' || ch == '|' || ch == 'o' || ch == '*'
}
