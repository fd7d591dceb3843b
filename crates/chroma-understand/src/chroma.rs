//! Chroma matrix storage, frame timing, and temporal smoothing.

use crate::error::{AnalysisError, Result};

/// Energies of the 12 pitch classes C..B for one frame.
pub type ChromaVector = [f64; 12];

/// A 12×T chroma matrix stored frame by frame.
///
/// Construction validates shape and values, so every analysis stage can
/// assume at least one frame of finite, non-negative energies.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaMatrix {
    frames: Vec<ChromaVector>,
}

impl ChromaMatrix {
    /// Build from 12 pitch-class rows of equal length (the usual
    /// `chroma[pitch_class][frame]` layout of feature extractors).
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.len() != 12 {
            return Err(AnalysisError::InvalidChroma(format!(
                "expected 12 pitch-class rows, got {}",
                rows.len()
            )));
        }

        let n_frames = rows[0].len();
        if let Some((pc, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_frames) {
            return Err(AnalysisError::InvalidChroma(format!(
                "row {} has {} frames, row 0 has {}",
                pc,
                row.len(),
                n_frames
            )));
        }

        let frames = (0..n_frames)
            .map(|t| {
                let mut frame = [0.0; 12];
                for (pc, row) in rows.iter().enumerate() {
                    frame[pc] = row[t];
                }
                frame
            })
            .collect();

        Self::from_frames(frames)
    }

    pub fn from_frames(frames: Vec<ChromaVector>) -> Result<Self> {
        if frames.is_empty() {
            return Err(AnalysisError::InvalidChroma("matrix has no frames".into()));
        }

        for (t, frame) in frames.iter().enumerate() {
            if let Some(pc) = frame.iter().position(|v| !v.is_finite() || *v < 0.0) {
                return Err(AnalysisError::InvalidChroma(format!(
                    "frame {} pitch class {} is {} (must be finite and non-negative)",
                    t, pc, frame[pc]
                )));
            }
        }

        Ok(Self { frames })
    }

    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[ChromaVector] {
        &self.frames
    }

    /// Back to `[pitch_class][frame]` layout.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..12)
            .map(|pc| self.frames.iter().map(|f| f[pc]).collect())
            .collect()
    }

    /// Moving average over `window_size` frames. See [`smooth_chroma`].
    pub fn smoothed(&self, window_size: usize) -> ChromaMatrix {
        ChromaMatrix {
            frames: smooth_chroma(&self.frames, window_size),
        }
    }

    /// Shift every frame up by `semitones` (negative shifts down).
    pub fn transposed(&self, semitones: i32) -> ChromaMatrix {
        let shift = semitones.rem_euclid(12) as usize;
        ChromaMatrix {
            frames: self.frames.iter().map(|f| rotate(f, shift)).collect(),
        }
    }
}

/// Circular shift towards higher pitch classes: `out[(i + shift) % 12] = v[i]`.
pub fn rotate(v: &ChromaVector, shift: usize) -> ChromaVector {
    let mut out = [0.0; 12];
    for (i, value) in v.iter().enumerate() {
        out[(i + shift) % 12] = *value;
    }
    out
}

/// Per-pitch-class mean over a run of frames. Empty input gives zeros.
pub fn mean_vector(frames: &[ChromaVector]) -> ChromaVector {
    let mut mean = [0.0; 12];
    if frames.is_empty() {
        return mean;
    }
    for frame in frames {
        for (m, v) in mean.iter_mut().zip(frame) {
            *m += v;
        }
    }
    let n = frames.len() as f64;
    for m in &mut mean {
        *m /= n;
    }
    mean
}

/// Unweighted moving average along time.
///
/// The window is clamped to `[1, frames.len()]` and even sizes widen to the
/// next odd size. Frames near either edge average over the neighbours that
/// exist, so no padding leaks into the result.
pub fn smooth_chroma(frames: &[ChromaVector], window_size: usize) -> Vec<ChromaVector> {
    let n = frames.len();
    if n == 0 {
        return Vec::new();
    }
    let half = window_size.clamp(1, n) / 2;

    let mut prefix = vec![[0.0; 12]; n + 1];
    for (t, frame) in frames.iter().enumerate() {
        for pc in 0..12 {
            prefix[t + 1][pc] = prefix[t][pc] + frame[pc];
        }
    }

    (0..n)
        .map(|t| {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(n);
            let count = (hi - lo) as f64;
            let mut out = [0.0; 12];
            for pc in 0..12 {
                out[pc] = (prefix[hi][pc] - prefix[lo][pc]) / count;
            }
            out
        })
        .collect()
}

/// Conversion between frame indices and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub sample_rate: u32,
    pub hop_length: u32,
    pub duration_seconds: f64,
}

impl FrameTiming {
    pub fn new(sample_rate: u32, hop_length: u32, duration_seconds: f64) -> Result<Self> {
        if sample_rate == 0 || hop_length == 0 {
            return Err(AnalysisError::InvalidTiming(format!(
                "sample rate ({}) and hop length ({}) must be non-zero",
                sample_rate, hop_length
            )));
        }
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(AnalysisError::InvalidTiming(format!(
                "duration {} is not a non-negative number of seconds",
                duration_seconds
            )));
        }
        Ok(Self {
            sample_rate,
            hop_length,
            duration_seconds,
        })
    }

    /// Timing whose duration is exactly `n_frames` hops.
    pub fn for_frames(sample_rate: u32, hop_length: u32, n_frames: usize) -> Result<Self> {
        let duration = n_frames as f64 * hop_length as f64 / sample_rate.max(1) as f64;
        Self::new(sample_rate, hop_length, duration)
    }

    pub fn frame_seconds(&self) -> f64 {
        self.hop_length as f64 / self.sample_rate as f64
    }

    /// Whole frames covered by `seconds` (truncating).
    pub fn frames_in(&self, seconds: f64) -> usize {
        (seconds * self.sample_rate as f64 / self.hop_length as f64) as usize
    }

    pub fn time_of(&self, frame: usize) -> f64 {
        frame as f64 * self.frame_seconds()
    }
}
