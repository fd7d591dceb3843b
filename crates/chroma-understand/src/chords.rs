use tracing::trace;

use crate::analyzer::HarmonicAnalyzer;
use crate::chord_templates::{apply_weights, ChordTemplateBank};
use crate::chroma::{mean_vector, ChromaVector};
use crate::correlation::{normalize_sum, pearson};
use crate::types::ChordEstimate;

/// Scores a single chroma vector against every (root, quality) template.
///
/// A pure scorer: it never applies a confidence threshold, that is up to
/// whoever aggregates its output.
#[derive(Debug, Clone, Default)]
pub struct ChordEstimator {
    bank: ChordTemplateBank,
}

impl ChordEstimator {
    pub fn new() -> Self {
        Self {
            bank: ChordTemplateBank::new(),
        }
    }

    /// Best-matching chord for one (already time-averaged) chroma vector.
    ///
    /// Zero-energy input gives [`ChordEstimate::none`]. Ties go to the
    /// lowest root, then to the earlier quality in catalog order.
    pub fn estimate(&self, vector: &ChromaVector) -> ChordEstimate {
        let mut best: Option<ChordEstimate> = None;
        for candidate in self.candidates(vector) {
            if best
                .as_ref()
                .map_or(true, |b| candidate.confidence > b.confidence)
            {
                best = Some(candidate);
            }
        }
        best.unwrap_or_else(ChordEstimate::none)
    }

    /// Every template with a defined weighted correlation, in search order.
    pub fn candidates(&self, vector: &ChromaVector) -> Vec<ChordEstimate> {
        let Some(normalized) = normalize_sum(vector) else {
            return Vec::new();
        };
        let observed = apply_weights(&normalized);

        self.bank
            .iter()
            .filter_map(|template| {
                pearson(&observed, &template.weighted).map(|confidence| ChordEstimate {
                    root: template.root,
                    quality: Some(template.quality),
                    confidence,
                })
            })
            .collect()
    }
}

/// Parameters of a windowed chord scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordScan {
    /// Frames averaged per window; windows start every half window
    pub window_frames: usize,
    /// Chords returned
    pub top_k: usize,
    /// Window results at or below this confidence are dropped
    pub min_confidence: f64,
}

/// Most probable chords over a run of frames, strongest first.
///
/// Each window's mean vector is scored; confident hits accumulate their
/// confidence per chord symbol and the `top_k` highest totals are returned.
/// Equal totals keep the order in which the chords were first seen.
pub fn scan_chords(
    analyzer: &dyn HarmonicAnalyzer,
    frames: &[ChromaVector],
    scan: &ChordScan,
) -> Vec<String> {
    let window = scan.window_frames.max(1);
    let step = (window / 2).max(1);
    let mut totals: Vec<(String, f64)> = Vec::new();

    for start in (0..frames.len()).step_by(step) {
        let end = (start + window).min(frames.len());
        let estimate = analyzer.estimate_chord(&mean_vector(&frames[start..end]));

        let Some(symbol) = estimate.symbol() else {
            continue;
        };
        if estimate.confidence <= scan.min_confidence {
            continue;
        }

        trace!(start, symbol = %symbol, confidence = estimate.confidence, "chord hit");
        match totals.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, total)) => *total += estimate.confidence,
            None => totals.push((symbol, estimate.confidence)),
        }
    }

    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
        .into_iter()
        .take(scan.top_k)
        .map(|(symbol, _)| symbol)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::TemplateAnalyzer;
    use crate::chroma::rotate;
    use crate::types::ChordQuality;

    fn chord_frame(root: usize, quality: ChordQuality) -> ChromaVector {
        rotate(&quality.template(), root)
    }

    fn scan(window_frames: usize, top_k: usize) -> ChordScan {
        ChordScan {
            window_frames,
            top_k,
            min_confidence: 0.65,
        }
    }

    #[test]
    fn exact_c_major_scores_one_and_outranks_everything() {
        let estimator = ChordEstimator::new();
        let input = chord_frame(0, ChordQuality::Major);

        let best = estimator.estimate(&input);
        assert_eq!(best.symbol().as_deref(), Some("C"));
        assert!((best.confidence - 1.0).abs() < 1e-9);

        let candidates = estimator.candidates(&input);
        assert_eq!(candidates.len(), 180);
        let others: Vec<_> = candidates
            .iter()
            .filter(|c| !(c.root == 0 && c.quality == Some(ChordQuality::Major)))
            .collect();
        assert_eq!(others.len(), 179);
        assert!(others.iter().all(|c| c.confidence < best.confidence));
    }

    #[test]
    fn every_quality_recognized_at_every_root() {
        let estimator = ChordEstimator::new();
        for quality in ChordQuality::ALL {
            for root in 0..12 {
                let result = estimator.estimate(&chord_frame(root, quality));
                assert_eq!(result.root as usize, root, "{:?} at {}", quality, root);
                assert_eq!(result.quality, Some(quality), "{:?} at {}", quality, root);
            }
        }
    }

    #[test]
    fn symbols_use_conventional_suffixes() {
        let estimator = ChordEstimator::new();
        let cases = [
            (9, ChordQuality::Minor, "Am"),
            (7, ChordQuality::Dominant7, "G7"),
            (5, ChordQuality::Major7, "Fmaj7"),
            (2, ChordQuality::Minor7, "Dm7"),
            (11, ChordQuality::Diminished, "Bdim"),
            (1, ChordQuality::Suspended4, "C#sus4"),
        ];
        for (root, quality, symbol) in cases {
            let result = estimator.estimate(&chord_frame(root, quality));
            assert_eq!(result.symbol().as_deref(), Some(symbol));
        }
    }

    #[test]
    fn silent_vector_is_no_chord() {
        let result = ChordEstimator::new().estimate(&[0.0; 12]);
        assert_eq!(result, ChordEstimate::none());
    }

    #[test]
    fn scan_orders_by_accumulated_confidence() {
        let analyzer = TemplateAnalyzer::new();
        let mut frames = vec![chord_frame(7, ChordQuality::Major); 10];
        frames.extend(vec![chord_frame(0, ChordQuality::Major); 30]);

        let chords = scan_chords(&analyzer, &frames, &scan(4, 8));
        assert_eq!(chords.first().map(String::as_str), Some("C"));
        assert!(chords.contains(&"G".to_string()));
    }

    #[test]
    fn scan_truncates_to_top_k() {
        let analyzer = TemplateAnalyzer::new();
        let mut frames = vec![chord_frame(0, ChordQuality::Major); 20];
        frames.extend(vec![chord_frame(9, ChordQuality::Minor); 10]);

        let chords = scan_chords(&analyzer, &frames, &scan(4, 1));
        assert_eq!(chords, vec!["C".to_string()]);
    }

    #[test]
    fn scan_of_silence_is_empty() {
        let analyzer = TemplateAnalyzer::new();
        let chords = scan_chords(&analyzer, &[[0.0; 12]; 30], &scan(11, 4));
        assert!(chords.is_empty());
    }

    #[test]
    fn scan_respects_threshold() {
        let analyzer = TemplateAnalyzer::new();
        let frames = vec![chord_frame(0, ChordQuality::Major); 12];
        let strict = ChordScan {
            window_frames: 4,
            top_k: 4,
            min_confidence: 1.5,
        };
        assert!(scan_chords(&analyzer, &frames, &strict).is_empty());
    }
}
