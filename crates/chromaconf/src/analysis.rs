//! Analysis parameters - the knobs of the harmonic pipeline.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Parameters for one analysis run.
///
/// Window sizes given in frames are relative to the chroma frame rate
/// (`sample_rate / hop_length`); the defaults correspond to roughly 0.25s,
/// 0.5s and 1s at 22050 Hz with a 512-sample hop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Segment length in seconds.
    /// Default: 3.0
    #[serde(default = "AnalysisConfig::default_segment_length_s")]
    pub segment_length_s: f64,

    /// Fraction of a segment shared with the next one, in [0, 1).
    /// Default: 0.5
    #[serde(default = "AnalysisConfig::default_overlap_ratio")]
    pub overlap_ratio: f64,

    /// Chord hits at or below this correlation are discarded.
    /// Default: 0.65
    #[serde(default = "AnalysisConfig::default_min_chord_confidence")]
    pub min_chord_confidence: f64,

    /// Minimum confidence swing for a key change to be reported.
    /// Default: 0.15
    #[serde(default = "AnalysisConfig::default_key_change_threshold")]
    pub key_change_threshold: f64,

    /// Moving-average width in frames (odd).
    /// Default: 5
    #[serde(default = "AnalysisConfig::default_smoothing_window")]
    pub smoothing_window: usize,

    /// Sub-window for the chord scan inside a segment.
    /// Default: 11
    #[serde(default = "AnalysisConfig::default_segment_chord_window_frames")]
    pub segment_chord_window_frames: usize,

    /// Window for the whole-track chord scan.
    /// Default: 22
    #[serde(default = "AnalysisConfig::default_global_chord_window_frames")]
    pub global_chord_window_frames: usize,

    /// Chords kept per segment.
    /// Default: 4
    #[serde(default = "AnalysisConfig::default_segment_chord_top_k")]
    pub segment_chord_top_k: usize,

    /// Chords kept for the whole track.
    /// Default: 8
    #[serde(default = "AnalysisConfig::default_global_chord_top_k")]
    pub global_chord_top_k: usize,

    /// Block size for structural feature vectors.
    /// Default: 44
    #[serde(default = "AnalysisConfig::default_structure_block_frames")]
    pub structure_block_frames: usize,

    /// Upper bound on structural clusters.
    /// Default: 4
    #[serde(default = "AnalysisConfig::default_max_sections")]
    pub max_sections: usize,

    /// Seed handed to the clusterer.
    /// Default: 42
    #[serde(default = "AnalysisConfig::default_cluster_seed")]
    pub cluster_seed: u64,
}

impl AnalysisConfig {
    fn default_segment_length_s() -> f64 {
        3.0
    }

    fn default_overlap_ratio() -> f64 {
        0.5
    }

    fn default_min_chord_confidence() -> f64 {
        0.65
    }

    fn default_key_change_threshold() -> f64 {
        0.15
    }

    fn default_smoothing_window() -> usize {
        5
    }

    fn default_segment_chord_window_frames() -> usize {
        11
    }

    fn default_global_chord_window_frames() -> usize {
        22
    }

    fn default_segment_chord_top_k() -> usize {
        4
    }

    fn default_global_chord_top_k() -> usize {
        8
    }

    fn default_structure_block_frames() -> usize {
        44
    }

    fn default_max_sections() -> usize {
        4
    }

    fn default_cluster_seed() -> u64 {
        42
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.segment_length_s.is_finite() || self.segment_length_s <= 0.0 {
            return Err(invalid("segment_length_s", "must be a positive number of seconds"));
        }
        if !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err(invalid("overlap_ratio", "must be in [0, 1)"));
        }
        if !self.min_chord_confidence.is_finite() {
            return Err(invalid("min_chord_confidence", "must be finite"));
        }
        if !self.key_change_threshold.is_finite() || self.key_change_threshold < 0.0 {
            return Err(invalid("key_change_threshold", "must be a non-negative number"));
        }

        let counts = [
            ("segment_chord_window_frames", self.segment_chord_window_frames),
            ("global_chord_window_frames", self.global_chord_window_frames),
            ("segment_chord_top_k", self.segment_chord_top_k),
            ("global_chord_top_k", self.global_chord_top_k),
            ("structure_block_frames", self.structure_block_frames),
            ("max_sections", self.max_sections),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
        }

        Ok(())
    }
}

fn invalid(field: &'static str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.to_string(),
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            segment_length_s: Self::default_segment_length_s(),
            overlap_ratio: Self::default_overlap_ratio(),
            min_chord_confidence: Self::default_min_chord_confidence(),
            key_change_threshold: Self::default_key_change_threshold(),
            smoothing_window: Self::default_smoothing_window(),
            segment_chord_window_frames: Self::default_segment_chord_window_frames(),
            global_chord_window_frames: Self::default_global_chord_window_frames(),
            segment_chord_top_k: Self::default_segment_chord_top_k(),
            global_chord_top_k: Self::default_global_chord_top_k(),
            structure_block_frames: Self::default_structure_block_frames(),
            max_sections: Self::default_max_sections(),
            cluster_seed: Self::default_cluster_seed(),
        }
    }
}

/// Logging settings for binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `tracing` filter directive.
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn overlap_of_one_rejected() {
        let config = AnalysisConfig {
            overlap_ratio: 1.0,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "overlap_ratio"),
            other => panic!("expected invalid overlap, got {:?}", other),
        }
    }

    #[test]
    fn zero_segment_length_rejected() {
        let config = AnalysisConfig {
            segment_length_s: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_top_k_rejected() {
        let config = AnalysisConfig {
            global_chord_top_k: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "global_chord_top_k"),
            other => panic!("expected invalid top-k, got {:?}", other),
        }
    }

    #[test]
    fn smoothing_window_zero_is_allowed() {
        // Clamped by the smoother rather than rejected.
        let config = AnalysisConfig {
            smoothing_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
