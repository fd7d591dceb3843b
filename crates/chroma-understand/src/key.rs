use tracing::debug;

use crate::chroma::{rotate, ChromaVector};
use crate::correlation::{normalize_sum, pearson};
use crate::types::{Key, KeyEstimate, KeyMode};

/// Krumhansl-Kessler major key profile (duration-weighted perception studies).
const MAJOR_PROFILE: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];

/// Krumhansl-Kessler minor key profile.
const MINOR_PROFILE: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Time weights ramp linearly from the first to the last frame of a window.
const RAMP_START: f64 = 0.8;
const RAMP_END: f64 = 1.2;

/// Key finder using the Krumhansl-Schmuckler algorithm.
///
/// The 24 rotated, unit-sum key profiles are built once at construction;
/// `estimate` is a pure function of its input.
#[derive(Debug, Clone)]
pub struct KeyEstimator {
    /// Search order: C major, C minor, C# major, C# minor, ...
    templates: [(Key, ChromaVector); 24],
}

impl KeyEstimator {
    pub fn new() -> Self {
        let templates = std::array::from_fn(|i| {
            let tonic = (i / 2) as u8;
            let (mode, profile) = if i % 2 == 0 {
                (KeyMode::Major, &MAJOR_PROFILE)
            } else {
                (KeyMode::Minor, &MINOR_PROFILE)
            };
            let rotated = rotate(profile, tonic as usize);
            // Profiles are strictly positive, so the sum is too.
            let template = normalize_sum(&rotated).unwrap_or(rotated);
            (Key { tonic, mode }, template)
        });
        Self { templates }
    }

    pub fn templates(&self) -> &[(Key, ChromaVector); 24] {
        &self.templates
    }

    /// Estimate the key of a run of chroma frames.
    ///
    /// Later frames weigh more. A window with no energy yields
    /// [`KeyEstimate::silent`].
    pub fn estimate(&self, frames: &[ChromaVector]) -> KeyEstimate {
        match weighted_profile(frames) {
            Some(profile) => self.estimate_profile(&profile),
            None => KeyEstimate::silent(),
        }
    }

    /// Correlate an aggregated 12-bin profile against all 24 keys.
    ///
    /// Undefined correlations are skipped. Ties go to the first template in
    /// search order.
    pub fn estimate_profile(&self, profile: &ChromaVector) -> KeyEstimate {
        let mut best: Option<(Key, f64)> = None;

        for (key, template) in &self.templates {
            let Some(corr) = pearson(profile, template) else {
                continue;
            };
            if best.map_or(true, |(_, best_corr)| corr > best_corr) {
                best = Some((*key, corr));
            }
        }

        match best {
            Some((key, confidence)) => KeyEstimate {
                tonic: key.tonic,
                mode: key.mode,
                confidence,
            },
            None => {
                debug!("key profile has no variance, returning silent estimate");
                KeyEstimate::silent()
            }
        }
    }
}

impl Default for KeyEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Time-weighted pitch-class profile, normalized to unit sum.
///
/// Returns `None` when the window is empty or carries no energy.
pub fn weighted_profile(frames: &[ChromaVector]) -> Option<ChromaVector> {
    let n = frames.len();
    if n == 0 {
        return None;
    }

    let mut profile = [0.0; 12];
    for (t, frame) in frames.iter().enumerate() {
        let weight = if n > 1 {
            RAMP_START + (RAMP_END - RAMP_START) * t as f64 / (n - 1) as f64
        } else {
            RAMP_START
        };
        for (p, v) in profile.iter_mut().zip(frame) {
            *p += v * weight;
        }
    }

    normalize_sum(&profile)
}
