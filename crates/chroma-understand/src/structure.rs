use chromaconf::AnalysisConfig;
use tracing::debug;

use crate::chroma::{mean_vector, ChromaMatrix, ChromaVector, FrameTiming};
use crate::kmeans::Clusterer;
use crate::types::{Section, SectionLabel, StructureAnalysis};

/// Fewer coarse blocks than this is too little material to cluster.
pub const MIN_BLOCKS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureParams {
    /// Frames averaged into one feature vector; blocks overlap by half
    pub block_frames: usize,
    pub max_sections: usize,
    pub seed: u64,
}

impl StructureParams {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            block_frames: config.structure_block_frames,
            max_sections: config.max_sections,
            seed: config.cluster_seed,
        }
    }

    fn step(&self) -> usize {
        (self.block_frames / 2).max(1)
    }
}

/// Mean chroma of each full block, blocks starting every half block.
pub fn block_features(frames: &[ChromaVector], params: &StructureParams) -> Vec<ChromaVector> {
    let block = params.block_frames.max(1);
    let mut features = Vec::new();
    let mut start = 0;
    while start + block <= frames.len() {
        features.push(mean_vector(&frames[start..start + block]));
        start += params.step();
    }
    features
}

/// Group coarse blocks into sections with the given clusterer.
///
/// Cluster ids get display names cyclically (Intro, Verse, Chorus, Bridge)
/// purely for readability. Too short a track yields
/// [`StructureAnalysis::empty`].
pub fn analyze_structure(
    clusterer: &dyn Clusterer,
    chroma: &ChromaMatrix,
    timing: &FrameTiming,
    params: &StructureParams,
) -> StructureAnalysis {
    let features = block_features(chroma.frames(), params);
    if features.len() < MIN_BLOCKS {
        debug!(blocks = features.len(), "too few blocks for structure analysis");
        return StructureAnalysis::empty();
    }

    let k = params.max_sections.min(features.len() / 2);
    let clustering = clusterer.cluster(&features, k, params.seed);

    let block_seconds = params.step() as f64 * timing.frame_seconds();
    let sections = clustering
        .labels
        .iter()
        .enumerate()
        .map(|(i, &cluster_id)| Section {
            label: SectionLabel::for_cluster(cluster_id),
            start_time: i as f64 * block_seconds,
            cluster_id,
        })
        .collect();

    let coordinates: Vec<f64> = clustering.centroids.iter().flatten().copied().collect();
    let structure_confidence = if coordinates.is_empty() {
        0.0
    } else {
        coordinates.iter().sum::<f64>() / coordinates.len() as f64
    };

    debug!(blocks = features.len(), k, "structure clustered");

    StructureAnalysis {
        sections,
        n_sections: k,
        structure_confidence,
    }
}
