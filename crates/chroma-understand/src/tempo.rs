//! Tempo summary from an externally tracked beat list.

/// Beats per minute from the median inter-beat interval.
///
/// Non-positive intervals (duplicate or unsorted beats) are ignored.
/// Returns `None` when there is no usable interval.
pub fn estimate_tempo(beat_times: &[f64]) -> Option<f64> {
    let mut intervals: Vec<f64> = beat_times
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|interval| interval.is_finite() && *interval > 0.0)
        .collect();

    if intervals.is_empty() {
        return None;
    }

    intervals.sort_by(|a, b| a.total_cmp(b));
    let mid = intervals.len() / 2;
    let median = if intervals.len() % 2 == 0 {
        (intervals[mid - 1] + intervals[mid]) / 2.0
    } else {
        intervals[mid]
    };

    Some(60.0 / median)
}
