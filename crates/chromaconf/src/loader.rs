//! Config file discovery, loading, and environment variable overlay.

use crate::{AnalysisConfig, ChromaConfig, ConfigError, TelemetryConfig};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli). Only existing
/// files are returned.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/chromaharmony/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("chromaharmony/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("chromaharmony.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<ChromaConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse config from TOML string.
fn parse_toml(contents: &str, path: &Path) -> Result<ChromaConfig, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_err(e.to_string()))?;

    let analysis: AnalysisConfig = match table.get("analysis") {
        Some(section) => section
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| parse_err(format!("[analysis]: {}", e)))?,
        None => AnalysisConfig::default(),
    };

    let telemetry: TelemetryConfig = match table.get("telemetry") {
        Some(section) => section
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| parse_err(format!("[telemetry]: {}", e)))?,
        None => TelemetryConfig::default(),
    };

    Ok(ChromaConfig {
        analysis,
        telemetry,
    })
}

/// Pick `overlay` when it was set away from the compiled default.
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configs field by field, with `overlay` taking precedence.
pub fn merge_configs(base: ChromaConfig, overlay: ChromaConfig) -> ChromaConfig {
    let d = AnalysisConfig::default();
    let (b, o) = (base.analysis, overlay.analysis);

    ChromaConfig {
        analysis: AnalysisConfig {
            segment_length_s: pick(b.segment_length_s, o.segment_length_s, d.segment_length_s),
            overlap_ratio: pick(b.overlap_ratio, o.overlap_ratio, d.overlap_ratio),
            min_chord_confidence: pick(
                b.min_chord_confidence,
                o.min_chord_confidence,
                d.min_chord_confidence,
            ),
            key_change_threshold: pick(
                b.key_change_threshold,
                o.key_change_threshold,
                d.key_change_threshold,
            ),
            smoothing_window: pick(b.smoothing_window, o.smoothing_window, d.smoothing_window),
            segment_chord_window_frames: pick(
                b.segment_chord_window_frames,
                o.segment_chord_window_frames,
                d.segment_chord_window_frames,
            ),
            global_chord_window_frames: pick(
                b.global_chord_window_frames,
                o.global_chord_window_frames,
                d.global_chord_window_frames,
            ),
            segment_chord_top_k: pick(
                b.segment_chord_top_k,
                o.segment_chord_top_k,
                d.segment_chord_top_k,
            ),
            global_chord_top_k: pick(b.global_chord_top_k, o.global_chord_top_k, d.global_chord_top_k),
            structure_block_frames: pick(
                b.structure_block_frames,
                o.structure_block_frames,
                d.structure_block_frames,
            ),
            max_sections: pick(b.max_sections, o.max_sections, d.max_sections),
            cluster_seed: pick(b.cluster_seed, o.cluster_seed, d.cluster_seed),
        },
        telemetry: TelemetryConfig {
            log_level: pick(
                base.telemetry.log_level,
                overlay.telemetry.log_level,
                TelemetryConfig::default().log_level,
            ),
        },
    }
}

/// Parse `name` from the environment into `target`, recording the override.
///
/// Values that fail to parse are ignored.
fn env_override<T: FromStr>(name: &str, target: &mut T, sources: &mut ConfigSources) {
    if let Ok(v) = env::var(name) {
        if let Ok(parsed) = v.trim().parse() {
            *target = parsed;
            sources.env_overrides.push(name.to_string());
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ChromaConfig, sources: &mut ConfigSources) {
    let a = &mut config.analysis;
    env_override("CHROMA_SEGMENT_LENGTH", &mut a.segment_length_s, sources);
    env_override("CHROMA_OVERLAP_RATIO", &mut a.overlap_ratio, sources);
    env_override("CHROMA_MIN_CHORD_CONFIDENCE", &mut a.min_chord_confidence, sources);
    env_override("CHROMA_KEY_CHANGE_THRESHOLD", &mut a.key_change_threshold, sources);
    env_override("CHROMA_SMOOTHING_WINDOW", &mut a.smoothing_window, sources);
    env_override("CHROMA_CLUSTER_SEED", &mut a.cluster_seed, sources);

    env_override("CHROMA_LOG_LEVEL", &mut config.telemetry.log_level, sources);
    // Also support RUST_LOG
    env_override("RUST_LOG", &mut config.telemetry.log_level, sources);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files();
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[analysis]
segment_length_s = 4.5
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.analysis.segment_length_s, 4.5);
        // Other values should be defaults
        assert_eq!(config.analysis.overlap_ratio, 0.5);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[analysis]
segment_length_s = 2.0
overlap_ratio = 0.25
min_chord_confidence = 0.7
key_change_threshold = 0.2
smoothing_window = 7
segment_chord_window_frames = 9
global_chord_window_frames = 20
segment_chord_top_k = 3
global_chord_top_k = 6
structure_block_frames = 40
max_sections = 3
cluster_seed = 7

[telemetry]
log_level = "debug"
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();
        let expected = ChromaConfig {
            analysis: AnalysisConfig {
                segment_length_s: 2.0,
                overlap_ratio: 0.25,
                min_chord_confidence: 0.7,
                key_change_threshold: 0.2,
                smoothing_window: 7,
                segment_chord_window_frames: 9,
                global_chord_window_frames: 20,
                segment_chord_top_k: 3,
                global_chord_top_k: 6,
                structure_block_frames: 40,
                max_sections: 3,
                cluster_seed: 7,
            },
            telemetry: TelemetryConfig {
                log_level: "debug".into(),
            },
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_parse_wrong_type_is_error() {
        let toml = r#"
[analysis]
smoothing_window = "wide"
"#;
        let err = parse_toml(toml, Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_merge_keeps_base_for_default_overlay() {
        let mut base = ChromaConfig::default();
        base.analysis.segment_length_s = 6.0;
        base.telemetry.log_level = "warn".into();

        let mut overlay = ChromaConfig::default();
        overlay.analysis.overlap_ratio = 0.75;

        let merged = merge_configs(base, overlay);
        assert_eq!(merged.analysis.segment_length_s, 6.0);
        assert_eq!(merged.analysis.overlap_ratio, 0.75);
        assert_eq!(merged.telemetry.log_level, "warn");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chromaharmony.toml");
        std::fs::write(&path, "[analysis]\nkey_change_threshold = 0.3\n").unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.analysis.key_change_threshold, 0.3);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_from_file(Path::new("/nonexistent/chromaharmony.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
