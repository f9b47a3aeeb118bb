//! Note-name to MIDI pitch resolution
//!
//! Open-string pitches are inferred from tuning labels. For six strings the
//! conventional top-to-bottom octave profile (E4 B3 G3 D3 A2 E2) is kept
//! even under alternate tunings, so a dropped-D tab keeps sensible octaves.

/// Semitone offset within an octave for a normalized note name
pub fn semitone_for(name: &str) -> Option<u8> {
    let s = name.trim().to_ascii_uppercase();
    let semi = match s.as_str() {
        "C" => 0,
        "C#" | "DB" => 1,
        "D" => 2,
        "D#" | "EB" => 3,
        "E" => 4,
        "F" => 5,
        "F#" | "GB" => 6,
        "G" => 7,
        "G#" | "AB" => 8,
        "A" => 9,
        "A#" | "BB" => 10,
        "B" => 11,
        _ => return None,
    };
    Some(semi)
}

/// Octave profile per string position, top line first
fn default_octaves(string_count: usize) -> Vec<i8> {
    if string_count == 6 {
        vec![4, 3, 3, 3, 2, 2]
    } else {
        vec![4; string_count]
    }
}

/// Resolve tuning labels (top-to-bottom) to open-string MIDI numbers.
/// Unknown labels fall back to E on the same string position.
pub fn open_midi_pitches(labels: &[String]) -> Vec<u8> {
    let octaves = default_octaves(labels.len());
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let name = label.trim().to_ascii_uppercase();
            let key = if name.len() >= 2 && (name.as_bytes()[1] == b'#' || name.as_bytes()[1] == b'B')
            {
                &name[..2]
            } else {
                &name[..name.len().min(1)]
            };
            let semi = semitone_for(key).unwrap_or(4);
            let octave = octaves.get(i).copied().unwrap_or(3);
            (12 * (octave as i16 + 1) + semi as i16).clamp(0, 127) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_standard_tuning() {
        let pitches = open_midi_pitches(&labels(&["E", "B", "G", "D", "A", "E"]));
        assert_eq!(pitches, vec![64, 59, 55, 50, 45, 40]);
    }

    #[test]
    fn test_accidentals_and_fallback() {
        let pitches = open_midi_pitches(&labels(&["E", "Bb", "Q", "G#", "Db", "A"]));
        assert_eq!(pitches[0], 64);
        assert_eq!(pitches[1], 58);
        // unknown label falls back to E at this string's octave
        assert_eq!(pitches[2], 52);
        assert_eq!(pitches[3], 56);
        assert_eq!(pitches[4], 37);
        assert_eq!(pitches[5], 45);
    }

    #[test]
    fn test_non_six_string_profile() {
        let pitches = open_midi_pitches(&labels(&["E", "A", "D"]));
        assert_eq!(pitches.len(), 3);
        assert_eq!(pitches[0], 64); // E4
    }

    #[test]
    fn test_semitone_names() {
        assert_eq!(semitone_for("c"), Some(0));
        assert_eq!(semitone_for("F#"), Some(6));
        assert_eq!(semitone_for("eb"), Some(3));
        assert_eq!(semitone_for("H"), None);
    }
}
