//! Sliding-window harmonic analysis and key-change detection.
//!
//! Windows of fixed length step across the chroma matrix with a fractional
//! overlap. Each window gets a key, a short chord list and a stability
//! score; consecutive windows are then compared for modulations.

use chromaconf::AnalysisConfig;
use tracing::debug;

use crate::analyzer::HarmonicAnalyzer;
use crate::chords::{scan_chords, ChordScan};
use crate::chroma::{ChromaMatrix, ChromaVector, FrameTiming};
use crate::types::{KeyChangeEvent, Segment};

/// Segmenter settings derived from [`AnalysisConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParams {
    pub segment_length_s: f64,
    pub overlap_ratio: f64,
    pub key_change_threshold: f64,
    pub chord_scan: ChordScan,
}

impl SegmentParams {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            segment_length_s: config.segment_length_s,
            overlap_ratio: config.overlap_ratio,
            key_change_threshold: config.key_change_threshold,
            chord_scan: ChordScan {
                window_frames: config.segment_chord_window_frames,
                top_k: config.segment_chord_top_k,
                min_confidence: config.min_chord_confidence,
            },
        }
    }

    /// `(segment_frames, hop_frames)` at the given frame rate, both at least 1.
    pub fn frame_counts(&self, timing: &FrameTiming) -> (usize, usize) {
        let segment_frames = timing.frames_in(self.segment_length_s).max(1);
        let hop_frames = ((segment_frames as f64 * (1.0 - self.overlap_ratio)) as usize).max(1);
        (segment_frames, hop_frames)
    }
}

/// Segments and key changes, both in start-time order.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub segments: Vec<Segment>,
    pub key_changes: Vec<KeyChangeEvent>,
}

/// Scan the whole matrix with overlapping windows.
///
/// Only full windows are analyzed, so a track shorter than one segment
/// produces no segments.
pub fn segment(
    analyzer: &dyn HarmonicAnalyzer,
    chroma: &ChromaMatrix,
    timing: &FrameTiming,
    params: &SegmentParams,
) -> Segmentation {
    let frames = chroma.frames();
    let (segment_frames, hop_frames) = params.frame_counts(timing);

    let mut segments = Vec::new();
    let mut start = 0;
    while start + segment_frames <= frames.len() {
        let window = &frames[start..start + segment_frames];

        segments.push(Segment {
            start_time: timing.time_of(start),
            end_time: timing
                .time_of(start + segment_frames)
                .min(timing.duration_seconds),
            key: analyzer.estimate_key(window),
            chords: scan_chords(analyzer, window, &params.chord_scan),
            stability: harmonic_stability(window),
        });

        start += hop_frames;
    }

    let key_changes = detect_key_changes(&segments, params.key_change_threshold);

    debug!(
        segment_frames,
        hop_frames,
        segments = segments.len(),
        key_changes = key_changes.len(),
        "segmentation complete"
    );

    Segmentation {
        segments,
        key_changes,
    }
}

/// `1 - mean(per-pitch-class variance over time)`, clamped to [0, 1].
///
/// Sustained harmony scores near 1; transitional or noisy windows lower.
pub fn harmonic_stability(frames: &[ChromaVector]) -> f64 {
    if frames.is_empty() {
        return 1.0;
    }
    let n = frames.len() as f64;

    let mut variance_sum = 0.0;
    for pc in 0..12 {
        let mean = frames.iter().map(|f| f[pc]).sum::<f64>() / n;
        let variance = frames.iter().map(|f| (f[pc] - mean).powi(2)).sum::<f64>() / n;
        variance_sum += variance;
    }

    (1.0 - variance_sum / 12.0).clamp(0.0, 1.0)
}

/// Key changes between consecutive segments.
///
/// A change needs a different key label *and* a confidence swing above
/// `threshold`; a relabel with near-equal confidence is treated as wobble.
pub fn detect_key_changes(segments: &[Segment], threshold: f64) -> Vec<KeyChangeEvent> {
    segments
        .windows(2)
        .filter_map(|pair| {
            let (prev, cur) = (&pair[0], &pair[1]);
            let delta = (cur.key.confidence - prev.key.confidence).abs();
            (prev.key.key() != cur.key.key() && delta > threshold).then(|| KeyChangeEvent {
                time: cur.start_time,
                from_key: prev.key.key(),
                to_key: cur.key.key(),
                confidence_delta: delta,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::TemplateAnalyzer;
    use crate::types::{KeyEstimate, KeyMode};

    fn timing(n_frames: usize) -> FrameTiming {
        FrameTiming::for_frames(22050, 512, n_frames).unwrap()
    }

    fn c_major_frames(n: usize) -> Vec<ChromaVector> {
        let mut f = [0.0; 12];
        f[0] = 1.0;
        f[4] = 0.8;
        f[7] = 0.9;
        vec![f; n]
    }

    fn seg(start: f64, tonic: u8, mode: KeyMode, confidence: f64) -> Segment {
        Segment {
            start_time: start,
            end_time: start + 3.0,
            key: KeyEstimate {
                tonic,
                mode,
                confidence,
            },
            chords: vec![],
            stability: 1.0,
        }
    }

    #[test]
    fn frame_counts_follow_segment_length_and_overlap() {
        let params = SegmentParams::from_config(&AnalysisConfig::default());
        assert_eq!(params.frame_counts(&timing(430)), (129, 64));

        let no_overlap = SegmentParams {
            overlap_ratio: 0.0,
            ..params
        };
        assert_eq!(no_overlap.frame_counts(&timing(430)), (129, 129));
    }

    #[test]
    fn windows_step_by_hop_until_full_window_no_longer_fits() {
        let chroma = ChromaMatrix::from_frames(c_major_frames(430)).unwrap();
        let params = SegmentParams::from_config(&AnalysisConfig::default());
        let result = segment(&TemplateAnalyzer::new(), &chroma, &timing(430), &params);

        // starts at 0, 64, 128, 192, 256 (256 + 129 <= 430, 320 + 129 > 430)
        assert_eq!(result.segments.len(), 5);
        let hop_s = 64.0 * 512.0 / 22050.0;
        for (i, s) in result.segments.iter().enumerate() {
            assert!((s.start_time - i as f64 * hop_s).abs() < 1e-9);
            assert!(s.end_time > s.start_time);
            assert_eq!(s.chords.first().map(String::as_str), Some("C"));
            assert!((s.stability - 1.0).abs() < 1e-12);
        }
        assert!(result.key_changes.is_empty());
    }

    #[test]
    fn end_time_is_clamped_to_duration() {
        let chroma = ChromaMatrix::from_frames(c_major_frames(200)).unwrap();
        let short = FrameTiming::new(22050, 512, 2.5).unwrap();
        let params = SegmentParams::from_config(&AnalysisConfig::default());
        let result = segment(&TemplateAnalyzer::new(), &chroma, &short, &params);
        assert!(result.segments.iter().all(|s| s.end_time <= 2.5));
    }

    #[test]
    fn track_shorter_than_a_segment_has_no_segments() {
        let chroma = ChromaMatrix::from_frames(c_major_frames(100)).unwrap();
        let params = SegmentParams::from_config(&AnalysisConfig::default());
        let result = segment(&TemplateAnalyzer::new(), &chroma, &timing(100), &params);
        assert!(result.segments.is_empty());
        assert!(result.key_changes.is_empty());
    }

    #[test]
    fn stability_of_changing_content_is_lower() {
        let steady = c_major_frames(10);
        assert_eq!(harmonic_stability(&steady), 1.0);

        let flicker: Vec<ChromaVector> = (0..10)
            .map(|t| if t % 2 == 0 { [1.0; 12] } else { [0.0; 12] })
            .collect();
        // variance 0.25 in every row
        assert!((harmonic_stability(&flicker) - 0.75).abs() < 1e-12);

        let wild: Vec<ChromaVector> = (0..10)
            .map(|t| if t % 2 == 0 { [10.0; 12] } else { [0.0; 12] })
            .collect();
        assert_eq!(harmonic_stability(&wild), 0.0);
    }

    #[test]
    fn key_change_needs_label_change_and_confidence_swing() {
        let segments = vec![
            seg(0.0, 0, KeyMode::Major, 0.90),
            // new label, small swing: wobble
            seg(1.5, 7, KeyMode::Major, 0.85),
            // same label, large swing: not a change
            seg(3.0, 7, KeyMode::Major, 0.40),
            // new label, large swing: change
            seg(4.5, 9, KeyMode::Minor, 0.80),
        ];

        let changes = detect_key_changes(&segments, 0.15);
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.time, 4.5);
        assert_eq!(change.from_key.to_string(), "G major");
        assert_eq!(change.to_key.to_string(), "A minor");
        assert!((change.confidence_delta - 0.40).abs() < 1e-12);
    }

    #[test]
    fn segmentation_is_deterministic() {
        let frames: Vec<ChromaVector> = (0..500)
            .map(|t| {
                let mut f = [0.05; 12];
                f[(t / 40) % 12] += 1.0;
                f[(t / 40 + 7) % 12] += 0.7;
                f
            })
            .collect();
        let chroma = ChromaMatrix::from_frames(frames).unwrap();
        let params = SegmentParams::from_config(&AnalysisConfig::default());
        let analyzer = TemplateAnalyzer::new();

        let a = segment(&analyzer, &chroma, &timing(500), &params);
        let b = segment(&analyzer, &chroma, &timing(500), &params);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.segments).unwrap(),
            serde_json::to_string(&b.segments).unwrap()
        );

        for change in &a.key_changes {
            assert_ne!(change.from_key, change.to_key);
            assert!(change.confidence_delta > params.key_change_threshold);
        }
    }
}
