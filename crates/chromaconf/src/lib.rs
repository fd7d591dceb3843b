//! Configuration loading for chroma harmonic analysis.
//!
//! Both the analysis library and the command-line front end read their
//! parameters from here, so this crate stays small and dependency-light.
//!
//! # Usage
//!
//! ```rust,no_run
//! use chromaconf::ChromaConfig;
//!
//! let config = ChromaConfig::load().expect("Failed to load config");
//! println!("segment length: {}s", config.analysis.segment_length_s);
//! println!("log level: {}", config.telemetry.log_level);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/chromaharmony/config.toml` (system)
//! 2. `~/.config/chromaharmony/config.toml` (user)
//! 3. `./chromaharmony.toml` (local override, or an explicit path)
//! 4. Environment variables (`CHROMA_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [analysis]
//! segment_length_s = 4.0
//! overlap_ratio = 0.5
//! min_chord_confidence = 0.7
//! key_change_threshold = 0.15
//! smoothing_window = 5
//!
//! [telemetry]
//! log_level = "debug"
//! ```

pub mod analysis;
pub mod loader;

pub use analysis::{AnalysisConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChromaConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ChromaConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/chromaharmony/config.toml`
    /// 3. `~/.config/chromaharmony/config.toml`
    /// 4. `./chromaharmony.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` replacing the local override.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report where values came from.
    ///
    /// The merged result is validated before it is returned.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ChromaConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);
        config.analysis.validate()?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let a = &self.analysis;
        let mut output = String::new();

        output.push_str("# Chroma harmonic analysis configuration\n\n");

        output.push_str("[analysis]\n");
        output.push_str(&format!("segment_length_s = {:?}\n", a.segment_length_s));
        output.push_str(&format!("overlap_ratio = {:?}\n", a.overlap_ratio));
        output.push_str(&format!("min_chord_confidence = {:?}\n", a.min_chord_confidence));
        output.push_str(&format!("key_change_threshold = {:?}\n", a.key_change_threshold));
        output.push_str(&format!("smoothing_window = {}\n", a.smoothing_window));
        output.push_str(&format!(
            "segment_chord_window_frames = {}\n",
            a.segment_chord_window_frames
        ));
        output.push_str(&format!(
            "global_chord_window_frames = {}\n",
            a.global_chord_window_frames
        ));
        output.push_str(&format!("segment_chord_top_k = {}\n", a.segment_chord_top_k));
        output.push_str(&format!("global_chord_top_k = {}\n", a.global_chord_top_k));
        output.push_str(&format!("structure_block_frames = {}\n", a.structure_block_frames));
        output.push_str(&format!("max_sections = {}\n", a.max_sections));
        output.push_str(&format!("cluster_seed = {}\n", a.cluster_seed));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}
