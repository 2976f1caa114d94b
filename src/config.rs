//! Tool configuration module.
//!
//! Handles loading, validating, and merging `image-kitchen.toml`. User values
//! are layered over stock defaults, so a config file only needs the keys it
//! changes. Command-line flags override both.
//!
//! ## Config File Location
//!
//! `--config <FILE>` names a file explicitly (it must exist). Without it,
//! `image-kitchen.toml` in the current directory is used when present.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! jpeg_quality = 75         # JPEG encoding quality (1-100)
//!
//! [resize]
//! filter = "lanczos3"       # nearest | triangle | catmull-rom | gaussian | lanczos3
//!
//! [processing]
//! max_processes = 1         # Parallel workers; 0 = one per CPU core
//! on_error = "isolate"      # isolate: keep going | abort: stop at first failure
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::engine::{EngineOptions, FailurePolicy};
use crate::imaging::{EncodeSettings, Quality, ResampleFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "image-kitchen.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `image-kitchen.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Encoder settings.
    pub output: OutputConfig,
    /// Resampling settings for resize and thumbnail.
    pub resize: ResizeConfig,
    /// Parallelism and failure handling.
    pub processing: ProcessingConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::Validation(
                "output.jpeg_quality must be 1-100".into(),
            ));
        }
        Ok(())
    }

    /// Engine options described by this config.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            settings: EncodeSettings {
                quality: Quality::new(self.output.jpeg_quality),
                filter: self.resize.filter,
            },
            on_error: self.processing.on_error,
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG quality (1 = worst, 100 = best). PNG output is always lossless.
    pub jpeg_quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: Quality::default().value(),
        }
    }
}

/// Resampling settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: ResampleFilter,
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Number of files processed at once. `0` means one per CPU core.
    /// Values larger than the core count are clamped down.
    pub max_processes: usize,
    /// What a failed file does to the rest of the batch.
    pub on_error: FailurePolicy,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_processes: 1,
            on_error: FailurePolicy::default(),
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `0` → use all available cores
/// - `n` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    match config.max_processes {
        0 => cores,
        n => n.min(cores),
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Used as the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ToolConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the tool config.
///
/// An explicit `path` must exist. Otherwise `image-kitchen.toml` in `cwd` is
/// read when present, and stock defaults are used when it is not.
pub fn load_config(path: Option<&Path>, cwd: &Path) -> Result<ToolConfig, ConfigError> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default_path = cwd.join(CONFIG_FILENAME);
            if !default_path.exists() {
                log::debug!("no {CONFIG_FILENAME} in {}, using defaults", cwd.display());
                return resolve_config(None);
            }
            default_path
        }
    };
    log::debug!("loading config from {}", config_path.display());
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `image-kitchen.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-kitchen configuration
# ===========================
#
# Place this file in the directory you run image-kitchen from, or pass it
# with --config <FILE>. Every key is optional; remove the ones you do not
# want to change. Command-line flags override values set here.

[output]
# JPEG encoding quality, 1 (smallest) to 100 (best).
# Used for to-jpg and for crop/resize/thumbnail of .jpg/.jpeg files.
# PNG output is always lossless.
jpeg_quality = 75

[resize]
# Resampling filter for resize and thumbnail:
#   nearest | triangle | catmull-rom | gaussian | lanczos3
filter = "lanczos3"

[processing]
# Number of files processed at once. 1 = one file at a time,
# 0 = one worker per CPU core. Capped at the number of cores.
max_processes = 1

# What happens when a file fails:
#   isolate - report it and continue with the remaining files
#   abort   - stop the batch at the first failure
on_error = "isolate"
"##
}
