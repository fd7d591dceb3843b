//! Root-only progression labels between neighbouring segments.
//!
//! This is a nearest-label heuristic over a small table of common root
//! motions, not functional harmony: it ignores chord quality and key.

use crate::types::{note_name, Key, KeyMode, ProgressionKind, ProgressionLink, Segment};

/// Known root motions, checked in chord-list order.
const KNOWN_PROGRESSIONS: [(&str, &str, ProgressionKind); 6] = [
    ("C", "F", ProgressionKind::OneFour),
    ("C", "G", ProgressionKind::OneFive),
    ("A", "F", ProgressionKind::SixFour),
    ("F", "G", ProgressionKind::FourFive),
    ("G", "C", ProgressionKind::FiveOne),
    ("A", "C", ProgressionKind::SixOne),
];

/// Root name of a chord symbol: letter plus optional sharp ("C#m7" -> "C#").
pub fn chord_root(symbol: &str) -> Option<&str> {
    let mut chars = symbol.char_indices();
    let (_, letter) = chars.next()?;
    if !('A'..='G').contains(&letter) {
        return None;
    }
    match chars.next() {
        Some((i, '#')) => Some(&symbol[..i + 1]),
        _ => Some(&symbol[..letter.len_utf8()]),
    }
}

/// Label the move from one chord list to the next.
///
/// Every (from, to) pair is tried in list order; the first known root
/// motion wins, otherwise [`ProgressionKind::Custom`].
pub fn classify_progression(from_chords: &[String], to_chords: &[String]) -> ProgressionKind {
    for from in from_chords {
        let Some(from_root) = chord_root(from) else {
            continue;
        };
        for to in to_chords {
            let Some(to_root) = chord_root(to) else {
                continue;
            };
            if let Some((_, _, kind)) = KNOWN_PROGRESSIONS
                .iter()
                .find(|(a, b, _)| *a == from_root && *b == to_root)
            {
                return *kind;
            }
        }
    }
    ProgressionKind::Custom
}

/// One link per pair of adjacent segments that both have chords.
pub fn analyze_progressions(segments: &[Segment]) -> Vec<ProgressionLink> {
    segments
        .windows(2)
        .filter(|pair| !pair[0].chords.is_empty() && !pair[1].chords.is_empty())
        .map(|pair| ProgressionLink {
            start_time: pair[0].start_time,
            end_time: pair[1].end_time,
            from_chords: pair[0].chords.clone(),
            to_chords: pair[1].chords.clone(),
            progression_type: classify_progression(&pair[0].chords, &pair[1].chords),
        })
        .collect()
}

/// Scale steps and chord suffixes of the diatonic triads, degrees I..vii.
const MAJOR_STEPS: [(u8, &str); 7] = [
    (0, ""),
    (2, "m"),
    (4, "m"),
    (5, ""),
    (7, ""),
    (9, "m"),
    (11, "dim"),
];
const MINOR_STEPS: [(u8, &str); 7] = [
    (0, "m"),
    (2, "dim"),
    (3, ""),
    (5, "m"),
    (7, "m"),
    (8, ""),
    (10, ""),
];

/// Degree sequences (0-based) offered as practice progressions.
const MAJOR_PATTERNS: [[usize; 4]; 4] = [[0, 3, 4, 0], [0, 5, 3, 4], [5, 3, 0, 4], [0, 1, 3, 4]];
const MINOR_PATTERNS: [[usize; 4]; 4] = [[0, 3, 4, 0], [0, 5, 6, 0], [0, 2, 5, 6], [0, 3, 5, 4]];

/// Common diatonic progressions spelled in `key`.
///
/// Major: I-IV-V-I, I-vi-IV-V, vi-IV-I-V, I-ii-IV-V.
/// Minor: i-iv-v-i, i-VI-VII-i, i-III-VI-VII, i-iv-VI-v.
pub fn suggest_progressions(key: Key) -> Vec<Vec<String>> {
    let (steps, patterns) = match key.mode {
        KeyMode::Major => (&MAJOR_STEPS, &MAJOR_PATTERNS),
        KeyMode::Minor => (&MINOR_STEPS, &MINOR_PATTERNS),
    };

    patterns
        .iter()
        .map(|pattern| {
            pattern
                .iter()
                .map(|&degree| {
                    let (step, suffix) = steps[degree];
                    format!("{}{}", note_name(key.tonic + step), suffix)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyEstimate;

    fn chords(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn seg(start: f64, symbols: &[&str]) -> Segment {
        Segment {
            start_time: start,
            end_time: start + 3.0,
            key: KeyEstimate::silent(),
            chords: chords(symbols),
            stability: 1.0,
        }
    }

    #[test]
    fn chord_root_strips_quality() {
        assert_eq!(chord_root("C"), Some("C"));
        assert_eq!(chord_root("Am"), Some("A"));
        assert_eq!(chord_root("C#m7"), Some("C#"));
        assert_eq!(chord_root("Fmaj7"), Some("F"));
        assert_eq!(chord_root("Gdim7"), Some("G"));
        assert_eq!(chord_root("Dsus4"), Some("D"));
        assert_eq!(chord_root("x"), None);
        assert_eq!(chord_root(""), None);
    }

    #[test]
    fn known_root_motions() {
        assert_eq!(classify_progression(&chords(&["C"]), &chords(&["F"])), ProgressionKind::OneFour);
        assert_eq!(classify_progression(&chords(&["G7"]), &chords(&["Cmaj7"])), ProgressionKind::FiveOne);
        assert_eq!(classify_progression(&chords(&["Am"]), &chords(&["F"])), ProgressionKind::SixFour);
        assert_eq!(classify_progression(&chords(&["Am7"]), &chords(&["C"])), ProgressionKind::SixOne);
    }

    #[test]
    fn first_hit_in_list_order_wins() {
        // (C, G) is tried before (F, G).
        let kind = classify_progression(&chords(&["C", "F"]), &chords(&["G"]));
        assert_eq!(kind, ProgressionKind::OneFive);

        // Unknown pairs are skipped until a known one appears.
        let kind = classify_progression(&chords(&["D", "F"]), &chords(&["E", "G"]));
        assert_eq!(kind, ProgressionKind::FourFive);
    }

    #[test]
    fn unknown_motion_is_custom() {
        let kind = classify_progression(&chords(&["D", "E"]), &chords(&["B"]));
        assert_eq!(kind, ProgressionKind::Custom);
        // Table is directional.
        let kind = classify_progression(&chords(&["F"]), &chords(&["C"]));
        assert_eq!(kind, ProgressionKind::Custom);
    }

    #[test]
    fn links_skip_segments_without_chords() {
        let segments = vec![
            seg(0.0, &["C"]),
            seg(1.5, &["G"]),
            seg(3.0, &[]),
            seg(4.5, &["F"]),
            seg(6.0, &["G", "Em"]),
        ];
        let links = analyze_progressions(&segments);
        assert_eq!(links.len(), 2);

        assert_eq!(links[0].start_time, 0.0);
        assert_eq!(links[0].end_time, 4.5);
        assert_eq!(links[0].progression_type, ProgressionKind::OneFive);

        assert_eq!(links[1].from_chords, chords(&["F"]));
        assert_eq!(links[1].to_chords, chords(&["G", "Em"]));
        assert_eq!(links[1].progression_type, ProgressionKind::FourFive);
    }

    #[test]
    fn suggestions_in_c_major() {
        let key = Key {
            tonic: 0,
            mode: KeyMode::Major,
        };
        let suggestions = suggest_progressions(key);
        assert_eq!(suggestions.len(), 4);
        assert_eq!(suggestions[0], chords(&["C", "F", "G", "C"]));
        assert_eq!(suggestions[1], chords(&["C", "Am", "F", "G"]));
        assert_eq!(suggestions[3], chords(&["C", "Dm", "F", "G"]));
    }

    #[test]
    fn suggestions_in_a_minor_wrap_pitch_classes() {
        let key = Key {
            tonic: 9,
            mode: KeyMode::Minor,
        };
        let suggestions = suggest_progressions(key);
        assert_eq!(suggestions[0], chords(&["Am", "Dm", "Em", "Am"]));
        assert_eq!(suggestions[1], chords(&["Am", "F", "G", "Am"]));
        assert_eq!(suggestions[2], chords(&["Am", "C", "F", "G"]));
    }
}
