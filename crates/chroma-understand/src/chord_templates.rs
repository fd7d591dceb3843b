use crate::chroma::{rotate, ChromaVector};
use crate::correlation::normalize_sum;
use crate::types::ChordQuality;

/// Per-pitch-class emphasis applied to both sides before correlating.
///
/// C, E and G carry full weight; the rest are damped so incidental overtone
/// energy in weaker classes moves the score less.
pub const PITCH_CLASS_WEIGHTS: ChromaVector =
    [1.0, 0.7, 0.8, 0.9, 1.0, 0.8, 0.7, 1.0, 0.8, 0.8, 0.7, 0.8];

impl ChordQuality {
    /// Expected energy profile of the chord rooted on C.
    ///
    /// Root 1.0, fifth 0.9, third 0.8; added tones 0.5–0.7.
    pub fn template(&self) -> ChromaVector {
        match self {
            ChordQuality::Major => [1.0, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0],
            ChordQuality::Minor => [1.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0],
            ChordQuality::Diminished => [1.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.7, 0.0, 0.0, 0.0, 0.0, 0.0],
            ChordQuality::Augmented => [1.0, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.7, 0.0, 0.0, 0.0],
            ChordQuality::Suspended2 => [1.0, 0.0, 0.7, 0.0, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0],
            ChordQuality::Suspended4 => [1.0, 0.0, 0.0, 0.0, 0.0, 0.7, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0],
            ChordQuality::Major7 => [1.0, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.7],
            ChordQuality::Minor7 => [1.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0, 0.6, 0.0],
            ChordQuality::Dominant7 => [1.0, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.9, 0.0, 0.0, 0.7, 0.0],
            ChordQuality::Diminished7 => [1.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.7, 0.0, 0.0, 0.6, 0.0, 0.0],
            ChordQuality::Major9 => [1.0, 0.0, 0.6, 0.0, 0.8, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.7],
            ChordQuality::Minor9 => [1.0, 0.0, 0.6, 0.8, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0, 0.6, 0.0],
            ChordQuality::Add9 => [1.0, 0.0, 0.5, 0.0, 0.8, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0],
            ChordQuality::Minor6 => [1.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.9, 0.0, 0.6, 0.0, 0.0],
            ChordQuality::Major6 => [1.0, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.9, 0.0, 0.6, 0.0, 0.0],
        }
    }
}

/// A quality template rotated to a root, normalized, and pre-weighted.
#[derive(Debug, Clone)]
pub struct ChordTemplate {
    pub root: u8,
    pub quality: ChordQuality,
    /// Unit-sum template, already multiplied by [`PITCH_CLASS_WEIGHTS`]
    pub weighted: ChromaVector,
}

/// All 12 × 15 chord templates in search order: root ascending, then
/// catalog order within each root.
#[derive(Debug, Clone)]
pub struct ChordTemplateBank {
    templates: Vec<ChordTemplate>,
}

impl ChordTemplateBank {
    pub fn new() -> Self {
        let mut templates = Vec::with_capacity(12 * ChordQuality::ALL.len());
        for root in 0..12u8 {
            for quality in ChordQuality::ALL {
                let rotated = rotate(&quality.template(), root as usize);
                let normalized = normalize_sum(&rotated).unwrap_or(rotated);
                templates.push(ChordTemplate {
                    root,
                    quality,
                    weighted: apply_weights(&normalized),
                });
            }
        }
        Self { templates }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChordTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for ChordTemplateBank {
    fn default() -> Self {
        Self::new()
    }
}

pub fn apply_weights(v: &ChromaVector) -> ChromaVector {
    let mut out = *v;
    for (x, w) in out.iter_mut().zip(PITCH_CLASS_WEIGHTS) {
        *x *= w;
    }
    out
}
