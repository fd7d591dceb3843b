//! Harmonic analysis of chroma matrices.
//!
//! A chroma matrix (12 pitch-class energies per frame) goes in; a single
//! [`AnalysisReport`] comes out with the global key, the most probable
//! chords, windowed key/chord segments, key changes, coarse sections and
//! root-motion progression labels.
//!
//! ```text
//! chroma ─► smooth ─┬─► global key
//!                   ├─► global chord scan
//!                   ├─► segmenter ─► key changes
//!                   │            └─► progressions
//!                   └─► structure (k-means over blocks)
//! ```

pub mod analyzer;
pub mod chord_templates;
pub mod chords;
pub mod chroma;
pub mod correlation;
pub mod error;
pub mod key;
pub mod kmeans;
pub mod progression;
pub mod segments;
pub mod structure;
pub mod tempo;
pub mod types;

pub use analyzer::{HarmonicAnalyzer, TemplateAnalyzer};
pub use chroma::{ChromaMatrix, ChromaVector, FrameTiming};
pub use error::{AnalysisError, Result};
pub use kmeans::{Clusterer, KMeans};
pub use types::{
    AnalysisReport, ChordEstimate, ChordQuality, Key, KeyChangeEvent, KeyEstimate, KeyMode,
    ProgressionKind, ProgressionLink, Section, SectionLabel, Segment, StructureAnalysis,
};

use std::sync::Arc;

use chromaconf::AnalysisConfig;
use tracing::{debug, info};

use crate::chords::{scan_chords, ChordScan};
use crate::segments::SegmentParams;
use crate::structure::StructureParams;

/// Current algorithm version, echoed in every report.
pub const CURRENT_VERSION: u32 = 1;

/// Runs the full pipeline with a fixed configuration.
///
/// The engine holds no per-call state, so one instance can analyze any
/// number of tracks, from several threads at once.
pub struct HarmonyEngine {
    analyzer: Arc<dyn HarmonicAnalyzer>,
    clusterer: Arc<dyn Clusterer>,
    config: AnalysisConfig,
}

impl HarmonyEngine {
    /// Create with the template analyzer and the built-in k-means.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_backends(
            Arc::new(TemplateAnalyzer::new()),
            Arc::new(KMeans::default()),
            config,
        )
    }

    /// Create with custom scoring and clustering backends.
    pub fn with_backends(
        analyzer: Arc<dyn HarmonicAnalyzer>,
        clusterer: Arc<dyn Clusterer>,
        config: AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            analyzer,
            clusterer,
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one track.
    ///
    /// `beat_times` (seconds) only feeds the tempo summary.
    pub fn analyze(
        &self,
        chroma: &ChromaMatrix,
        timing: &FrameTiming,
        beat_times: Option<&[f64]>,
    ) -> Result<AnalysisReport> {
        info!(
            frames = chroma.n_frames(),
            duration = timing.duration_seconds,
            "starting harmonic analysis"
        );

        let smoothed = chroma.smoothed(self.config.smoothing_window);
        let frames = smoothed.frames();

        let global_key = self.analyzer.estimate_key(frames);
        debug!(key = %global_key, confidence = global_key.confidence, "global key");

        let global_scan = ChordScan {
            window_frames: self.config.global_chord_window_frames,
            top_k: self.config.global_chord_top_k,
            min_confidence: self.config.min_chord_confidence,
        };
        let global_chords = scan_chords(self.analyzer.as_ref(), frames, &global_scan);
        debug!(chords = ?global_chords, "global chords");

        let segmentation = segments::segment(
            self.analyzer.as_ref(),
            &smoothed,
            timing,
            &SegmentParams::from_config(&self.config),
        );

        let structure = structure::analyze_structure(
            self.clusterer.as_ref(),
            &smoothed,
            timing,
            &StructureParams::from_config(&self.config),
        );

        let progressions = progression::analyze_progressions(&segmentation.segments);
        let tempo_bpm = beat_times.and_then(tempo::estimate_tempo);
        let suggested_progressions = progression::suggest_progressions(global_key.key());

        info!(
            key = %global_key,
            segments = segmentation.segments.len(),
            key_changes = segmentation.key_changes.len(),
            sections = structure.n_sections,
            "harmonic analysis complete"
        );

        Ok(AnalysisReport {
            version: CURRENT_VERSION,
            duration_seconds: timing.duration_seconds,
            tempo_bpm,
            global_key,
            global_chords,
            segments: segmentation.segments,
            key_changes: segmentation.key_changes,
            structure,
            progressions,
            suggested_progressions,
        })
    }
}

/// One-shot analysis with the default backends.
pub fn analyze(
    chroma: &ChromaMatrix,
    sample_rate: u32,
    hop_length: u32,
    duration_seconds: f64,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    let timing = FrameTiming::new(sample_rate, hop_length, duration_seconds)?;
    HarmonyEngine::new(config.clone())?.analyze(chroma, &timing, None)
}
