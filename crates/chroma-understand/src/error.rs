use thiserror::Error;

/// Errors that abort an analysis.
///
/// Only malformed input lands here. Numeric dead ends inside the pipeline
/// (silent frames, zero-variance profiles, too little material to cluster)
/// resolve to defined empty results instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid chroma matrix: {0}")]
    InvalidChroma(String),

    #[error("invalid frame timing: {0}")]
    InvalidTiming(String),

    #[error(transparent)]
    Config(#[from] chromaconf::ConfigError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
