//! Duration token resolution
//!
//! Converts symbolic duration tokens into exact tick values. Base values
//! are fractions of one whole note; each trailing dot multiplies the
//! remaining duration by 3/2 cumulatively, so `H..` is 2.25 times `H`.
//! Lowercase letters mark staccato, which shortens the sounding portion of
//! a note but never the rhythmic slot it occupies.

use num_rational::Rational32;

use crate::models::events::DurationToken;
use crate::parse::lines::is_duration_symbol;

/// Scan a duration token starting at `idx`, returning the token and the
/// number of columns it consumed. Forgiving grammar:
/// `+` prefix (tie), trailing dots, lowercase staccato, and `WxN`.
pub fn scan_token(row: &[char], idx: usize) -> Option<(DurationToken, usize)> {
    if idx >= row.len() {
        return None;
    }

    let mut raw = String::new();
    let mut k = idx;
    let tie = row[k] == '+';
    if tie {
        if k + 1 >= row.len() || !is_duration_symbol(row[k + 1]) {
            return None;
        }
        raw.push('+');
        k += 1;
    } else if !is_duration_symbol(row[k]) {
        return None;
    }

    let symbol = row[k];
    raw.push(symbol);
    k += 1;

    let mut dots = 0u8;
    while k < row.len() && row[k] == '.' {
        raw.push('.');
        dots = dots.saturating_add(1);
        k += 1;
    }

    // WxN multibar rest marker
    let mut multibar = None;
    if symbol.eq_ignore_ascii_case(&'W') && k < row.len() && row[k] == 'x' {
        let digits_start = k + 1;
        let mut digits_end = digits_start;
        while digits_end < row.len() && row[digits_end].is_ascii_digit() {
            digits_end += 1;
        }
        if digits_end > digits_start {
            let n: u32 = row[digits_start..digits_end]
                .iter()
                .collect::<String>()
                .parse()
                .unwrap_or(1);
            multibar = Some(n);
            raw.push('x');
            raw.extend(&row[digits_start..digits_end]);
            k = digits_end;
        }
    }

    let staccato = symbol.is_ascii_lowercase() && symbol != 'a';
    let grace = symbol.eq_ignore_ascii_case(&'a');

    let token = DurationToken {
        raw,
        symbol,
        dots,
        tie,
        staccato,
        grace,
        multibar,
    };
    Some((token, (k - idx).max(1)))
}

/// Base value of one letter as a fraction of a whole note
fn base_fraction(symbol: char) -> Rational32 {
    match symbol.to_ascii_uppercase() {
        'W' => Rational32::new(1, 1),
        'H' => Rational32::new(1, 2),
        'Q' => Rational32::new(1, 4),
        'E' => Rational32::new(1, 8),
        'S' => Rational32::new(1, 16),
        'T' => Rational32::new(1, 32),
        'X' => Rational32::new(1, 64),
        'A' => Rational32::new(0, 1),
        _ => Rational32::new(1, 4),
    }
}

/// Upper bound on applied dots; keeps the accumulated 3/2 factors well
/// inside the rational's 32-bit numerator
const MAX_DOTS: u8 = 6;

/// Token value as a fraction of a whole note, dots applied. Grace tokens
/// resolve to zero; staccato does not change the slot. A `WxN` token
/// reports the span of a single whole note (the caller expands the rests).
pub fn whole_fraction(token: &DurationToken) -> Rational32 {
    let mut frac = base_fraction(token.symbol);
    for _ in 0..token.dots.min(MAX_DOTS) {
        frac *= Rational32::new(3, 2);
    }
    frac
}

/// Resolve the rhythmic slot to ticks under a given whole-note tick span
pub fn resolve_ticks(token: &DurationToken, ticks_per_whole: u64) -> u64 {
    let frac = whole_fraction(token);
    if *frac.numer() <= 0 {
        return 0;
    }
    ticks_per_whole * (*frac.numer() as u64) / (*frac.denom() as u64)
}
