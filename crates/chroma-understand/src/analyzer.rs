use crate::chords::ChordEstimator;
use crate::chroma::ChromaVector;
use crate::key::KeyEstimator;
use crate::types::{ChordEstimate, KeyEstimate};

/// Trait for harmonic scoring backends.
///
/// Both operations must be pure: the segmenter calls them once per window
/// and relies on identical input giving identical output.
pub trait HarmonicAnalyzer: Send + Sync {
    /// Key of a run of chroma frames.
    fn estimate_key(&self, frames: &[ChromaVector]) -> KeyEstimate;

    /// Chord of a single time-averaged chroma vector.
    fn estimate_chord(&self, vector: &ChromaVector) -> ChordEstimate;
}

/// Template-correlation analyzer: Krumhansl-Schmuckler keys and weighted
/// chord templates, with all template tables built once up front.
#[derive(Debug, Clone, Default)]
pub struct TemplateAnalyzer {
    keys: KeyEstimator,
    chords: ChordEstimator,
}

impl TemplateAnalyzer {
    pub fn new() -> Self {
        Self {
            keys: KeyEstimator::new(),
            chords: ChordEstimator::new(),
        }
    }
}

impl HarmonicAnalyzer for TemplateAnalyzer {
    fn estimate_key(&self, frames: &[ChromaVector]) -> KeyEstimate {
        self.keys.estimate(frames)
    }

    fn estimate_chord(&self, vector: &ChromaVector) -> ChordEstimate {
        self.chords.estimate(vector)
    }
}
